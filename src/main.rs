use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use site_conformity::output::read_report;
use site_conformity::{
    AuditConfig, CheckRegistry, ConformityEngine, HttpLinkChecker, LinkChecker, RouteTable, render_summary,
};

/// Site-Conformity CLI: website compliance checks and template conformity
#[derive(Parser, Debug)]
#[command(name = "site-conformity")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare a website text fragment against a reference template
    Compare {
        /// File holding the reference template
        #[arg(short, long)]
        template: PathBuf,

        /// File holding the text found on the website
        #[arg(short, long)]
        actual: PathBuf,

        /// Word list for spelling checks (overrides the configured one)
        #[arg(short, long)]
        dictionary: Option<PathBuf>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the standard checks with their deadlines
    Checks {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show where each check would start for a target url
    Route {
        url: String,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the summary of a saved JSON report
    Summary { report: PathBuf },

    /// Report the HTTP status of each url, as the footer link check sees it
    Status {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Request timeout in seconds
        #[arg(short, long, default_value_t = 15)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Command::Compare {
            template,
            actual,
            dictionary,
            config,
        } => handle_compare(template, actual, dictionary, config),
        Command::Checks { config } => handle_checks(config),
        Command::Route { url, config } => handle_route(url, config),
        Command::Summary { report } => handle_summary(report).await,
        Command::Status { urls, timeout } => handle_status(urls, timeout).await,
    }
}

fn handle_compare(
    template: PathBuf,
    actual: PathBuf,
    dictionary: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let mut config = AuditConfig::load_or_default(config.as_ref())?;
    if let Some(path) = dictionary {
        config.conformity.dictionary_path = Some(path);
    }

    let template_text = std::fs::read_to_string(&template)
        .with_context(|| format!("Failed to read template: {:?}", template))?;
    let actual_text = std::fs::read_to_string(&actual)
        .with_context(|| format!("Failed to read website text: {:?}", actual))?;

    let engine = ConformityEngine::from_config(&config.conformity).with_context(|| {
        format!(
            "Failed to load dictionary: {:?}",
            config.conformity.dictionary_path
        )
    })?;
    info!("Lexicon holds {} words", engine.lexicon().len());

    let result = engine.compare(&template_text, &actual_text);
    println!("{}", result.evidence());
    println!("Conform: {}", if result.conform { "Yes" } else { "No" });

    if !result.conform {
        std::process::exit(1);
    }
    Ok(())
}

fn handle_checks(config: Option<PathBuf>) -> Result<()> {
    let config = AuditConfig::load_or_default(config.as_ref())?;
    let registry = CheckRegistry::standard(&config.checks);

    for spec in registry.iter() {
        let timeout = spec
            .timeout()
            .unwrap_or_else(|| config.orchestrator.default_timeout());
        println!("{} ({}s)", spec.name(), timeout.as_secs());
        if !spec.description().is_empty() {
            println!("    {}", spec.description());
        }
        if let Some(key) = spec.template_key() {
            println!("    template: {}", key);
        }
    }
    Ok(())
}

fn handle_route(url: String, config: Option<PathBuf>) -> Result<()> {
    let config = AuditConfig::load_or_default(config.as_ref())?;
    let routes = RouteTable::new(&config.routes).context("Invalid route table")?;
    let registry = CheckRegistry::standard(&config.checks);
    let target = config.target(&url)?;

    println!("Target: {}", target.url());
    for key in target.templates().keys() {
        println!("Template: {}", key);
    }
    for spec in registry.iter() {
        println!("{}: {}", spec.name(), routes.resolve(target.url(), spec.name()));
    }
    Ok(())
}

async fn handle_summary(report: PathBuf) -> Result<()> {
    let report = read_report(&report).await?;
    print!("{}", render_summary(&report));
    Ok(())
}

async fn handle_status(urls: Vec<String>, timeout: u64) -> Result<()> {
    let checker = HttpLinkChecker::new(Duration::from_secs(timeout))?;

    let mut broken = 0;
    for url in &urls {
        match checker.status(url).await {
            Ok(status) if status < 400 => println!("{} {}", status, url),
            Ok(status) => {
                broken += 1;
                println!("{} {}", status, url);
            }
            Err(e) => {
                broken += 1;
                println!("ERR {}: {}", url, e);
            }
        }
    }
    info!("{} of {} urls broken", broken, urls.len());

    if broken > 0 {
        std::process::exit(1);
    }
    Ok(())
}
