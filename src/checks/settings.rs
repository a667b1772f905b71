use std::time::Duration;

use serde::{Deserialize, Serialize};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Tunables shared by the standard checks.
///
/// Selectors and phrase lists are configuration data: the defaults cover the
/// common consent-management platforms and German/English wording, sites
/// with unusual markup are handled by overriding them in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckSettings {
    /// Per-attempt page load timeout
    pub navigation_timeout_secs: u64,
    /// Page load attempts before a navigation error is reported
    pub navigation_attempts: u32,
    /// Network-idle wait after each load
    pub idle_timeout_secs: u64,
    pub selectors: SelectorProfile,

    /// Minimum banner size; smaller matches are treated as icons or links
    pub banner_min_width: f64,
    pub banner_min_height: f64,
    pub banner_keywords: Vec<String>,
    /// Words of the template used to locate its start and end in banner text
    pub banner_anchor_words: usize,

    pub reject_phrases: Vec<String>,
    pub expected_cookie_options: Vec<String>,
    /// Link texts that count as an imprint link inside a banner or preference center
    pub imprint_link_texts: Vec<String>,
    /// Link texts that count as a privacy policy link inside a banner or preference center
    pub privacy_link_texts: Vec<String>,

    pub cta_phrases: Vec<String>,
    pub age_phrases: Vec<String>,
    /// Substrings of a URL that mark it as a newsletter page already
    pub newsletter_url_keywords: Vec<String>,
    /// Substrings of a link target worth following for newsletter checks
    pub newsletter_link_keywords: Vec<String>,
    /// Substrings of a link target that rule it out for newsletter checks
    pub newsletter_ignore_keywords: Vec<String>,
    pub max_followed_links: usize,

    pub footer_links: Vec<FooterLinkRule>,
    pub imprint_high_priority: Vec<String>,
    pub imprint_low_priority: Vec<String>,
    pub imprint_terms: Vec<String>,
    /// Words a heading on the imprint page is expected to contain
    pub imprint_heading_keywords: Vec<String>,
    /// Longest acceptable imprint, in viewport heights; unset only reports
    pub imprint_max_screens: Option<f64>,
}

/// CSS selectors handed to the page driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorProfile {
    pub banner: Vec<String>,
    pub reject_controls: Vec<String>,
    pub cookie_settings: Vec<String>,
    /// Containers of an opened preference center
    pub preference_center: Vec<String>,
    /// Per-category "more information" expanders in the preference center
    pub more_info: Vec<String>,
    pub option_label: String,
    /// Labels of options that are checked when the settings open
    pub preselected_option: String,
    pub checkbox_label: String,
    pub links: String,
    pub footer_links: String,
    /// Elements scanned for CTA and age-restriction wording
    pub scan: String,
    pub body: String,
    pub headings: String,
    /// Control revealing the long consent text on a newsletter page
    pub more_details_button: Vec<String>,
    /// Element holding the revealed consent text
    pub more_details_content: Vec<String>,
}

/// One required footer link category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FooterLinkRule {
    pub category: String,
    pub keywords: Vec<String>,
    pub href_patterns: Vec<String>,
}

impl FooterLinkRule {
    fn new(category: &str, keywords: &[&str], href_patterns: &[&str]) -> Self {
        Self {
            category: category.to_string(),
            keywords: strings(keywords),
            href_patterns: strings(href_patterns),
        }
    }
}

impl Default for SelectorProfile {
    fn default() -> Self {
        Self {
            banner: strings(&[
                "#onetrust-banner-sdk",
                "[data-testid=\"uc-default-banner\"]",
                "div[data-testid=\"uc-default-wall\"]",
                "div#BorlabsCookieBox",
                "div[data-borlabs-cookie-consent-required]",
                "div.cmp-container",
                "div.ccm-modal",
                "div.cc-banner",
                "section.consentDrawer",
                "div[role=\"dialog\"]",
                "[aria-label*=\"cookie\"]",
                "[data-cookie-banner]",
                "div[class*=\"cookie-banner\"]",
                "div[class*=\"cookie-notice\"]",
                "div[class*=\"cookie\"]",
                "div[class*=\"consent\"]",
                "div[id*=\"banner\"]",
                "div.sticky",
            ]),
            reject_controls: strings(&["button", "a", "[role=\"button\"]"]),
            cookie_settings: strings(&[
                "button#onetrust-pc-btn-handler",
                "button[data-testid=\"uc-more-button\"]",
                "button[data-ccm-modal=\"ccm-control-panel\"]",
                "a.cookie-settings",
                "#cookie-settings-link",
                "[data-testid=\"cookie-settings-button\"]",
            ]),
            preference_center: strings(&[
                "div#onetrust-pc-sdk",
                "div[role=\"dialog\"][aria-label*=\"Preference center\"]",
                "div[role=\"dialog\"][aria-label*=\"Einstellungen\"]",
                "div[class*=\"preference\"]",
                "section[aria-label*=\"Privacy Preferences\"]",
                "div[aria-modal=\"true\"]",
                "#cookieSettings > div",
                "#privacy-container",
                "#hc-panel",
            ]),
            more_info: strings(&[".ot-plus-minus", "button.ot-accordion-toggle"]),
            option_label: "input[type=\"checkbox\"] + label, div.ot-checkbox-label".to_string(),
            preselected_option: "input[type=\"checkbox\"]:checked + label".to_string(),
            checkbox_label: "input[type=\"checkbox\"] + label, label[for]".to_string(),
            links: "a[href]".to_string(),
            footer_links: "footer a".to_string(),
            scan: "a, button, input, label, span".to_string(),
            body: "body".to_string(),
            headings: "h1, h2, h3, h4, h5, h6".to_string(),
            more_details_button: strings(&["button.further_button_up"]),
            more_details_content: strings(&["div.further_content"]),
        }
    }
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 30,
            navigation_attempts: 3,
            idle_timeout_secs: 10,
            selectors: SelectorProfile::default(),
            banner_min_width: 300.0,
            banner_min_height: 50.0,
            banner_keywords: strings(&[
                "cookie",
                "consent",
                "gdpr",
                "privacy",
                "tracking",
                "preferences",
                "datenschutz",
                "einwilligung",
            ]),
            banner_anchor_words: 4,
            reject_phrases: strings(&["Ohne Einwilligung", "Ohne Einwilligung fortfahren"]),
            expected_cookie_options: strings(&[
                "Leistungs-Cookies",
                "Funktionelle Cookies",
                "Werbe-Cookies",
                "Social-Media-Cookies",
            ]),
            imprint_link_texts: strings(&["Impressum", "Imprint"]),
            privacy_link_texts: strings(&["Datenschutzinformationen", "Privacy Policy"]),
            cta_phrases: strings(&[
                "subscribe now",
                "join our newsletter",
                "sign up",
                "get updates",
                "newsletter signup",
                "subscribe",
                "subscribe to our newsletter",
                "email alerts",
                "get emails",
                "sign up for updates",
                "jetzt anmelden",
                "newsletter abonnieren",
                "anmelden",
                "erhalte updates",
                "newsletter-registrierung",
                "abonniere",
                "abonniere unseren newsletter",
                "e-mail benachrichtigungen",
                "updates erhalten",
                "anmeldung",
                "registrieren",
            ]),
            age_phrases: strings(&[
                "You must be 18 or older",
                "18+",
                "You must be over 18",
                "Age verification",
                "Enter your birthdate",
                "Please confirm your age",
                "Restricted to users 18 and older",
                "Date of Birth",
                "Birth date",
                "Sie müssen 18 Jahre oder älter sein",
                "Sie müssen über 18 Jahre alt sein",
                "Altersverifikation",
                "Geben Sie Ihr Geburtsdatum ein",
                "Bitte bestätigen Sie Ihr Alter",
                "Beschränkt auf Benutzer ab 18 Jahren",
                "Geburtsdatum",
                "Geburtstag",
            ]),
            newsletter_url_keywords: strings(&["newsletter", "subscribe", "email", "signup"]),
            newsletter_link_keywords: strings(&[
                "newsroom",
                "press",
                "enews",
                "newsletter",
                "subscribe",
                "signup",
            ]),
            newsletter_ignore_keywords: strings(&["impressum", "datenschutz", "agb", "privacy", "legal"]),
            max_followed_links: 3,
            footer_links: vec![
                FooterLinkRule::new(
                    "imprint",
                    &["impressum", "imprint"],
                    &["/impressum", "impressum", "imprint"],
                ),
                FooterLinkRule::new(
                    "privacy policy",
                    &["datenschutz", "privacy policy", "datenschutzerklärung"],
                    &["/datenschutz", "privacy", "datenschutzerklärung"],
                ),
                FooterLinkRule::new(
                    "cookie settings",
                    &["cookie", "cookies", "cookie-einstellungen", "cookie einstellungen", "cookie settings"],
                    &["/cookies", "cookie", "optanon.toggleinfo", "#uc-central-modal-show"],
                ),
            ],
            imprint_high_priority: strings(&["impressum", "imprint", "legal"]),
            imprint_low_priority: strings(&["terms", "about", "contact"]),
            imprint_terms: strings(&["Impressum", "Geschäftsführer", "Handelsregister"]),
            imprint_heading_keywords: strings(&["impressum", "imprint", "legal"]),
            imprint_max_screens: None,
        }
    }
}

impl CheckSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Worst-case time to load one page with all retries
    pub fn page_budget(&self) -> Duration {
        self.navigation_timeout()
            .checked_mul(self.navigation_attempts.max(1))
            .unwrap_or(Duration::MAX)
            .saturating_add(self.idle_timeout())
    }

    /// Deadline for a check that loads up to `pages` pages, plus slack for
    /// element queries.
    pub fn check_timeout(&self, pages: u32) -> Duration {
        self.page_budget()
            .checked_mul(pages.max(1))
            .unwrap_or(Duration::MAX)
            .saturating_add(Duration::from_secs(30))
    }
}
