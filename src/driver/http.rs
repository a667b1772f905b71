use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::{LinkChecker, LinkError};

const USER_AGENT: &str = concat!("site-conformity/", env!("CARGO_PKG_VERSION"));

/// [`LinkChecker`] over plain HTTP: HEAD first, GET when the server refuses HEAD.
#[derive(Debug, Clone)]
pub struct HttpLinkChecker {
    client: Client,
}

impl HttpLinkChecker {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn request_error(url: &str, err: reqwest::Error) -> LinkError {
    LinkError::Request {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl LinkChecker for HttpLinkChecker {
    async fn status(&self, url: &str) -> Result<u16, LinkError> {
        let parsed = Url::parse(url).map_err(|_| LinkError::InvalidUrl(url.to_string()))?;

        let head = self
            .client
            .head(parsed.clone())
            .send()
            .await
            .map_err(|e| request_error(url, e))?;
        if head.status() != StatusCode::METHOD_NOT_ALLOWED {
            return Ok(head.status().as_u16());
        }

        debug!("HEAD refused by {}, retrying with GET", url);
        let get = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;
        Ok(get.status().as_u16())
    }
}
