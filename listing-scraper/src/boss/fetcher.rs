use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client,
};

use crate::Result;

/// Raw result of a GET, `ok` is false for any non-2xx status.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    pub ok: bool,
}

/// Issues one GET per call. Transport failures come back as `Err`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_user_agent(crate::boss::USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(user_agent).unwrap_or_else(|_| {
            log::warn!("invalid user agent '{}', using the default one", user_agent);
            HeaderValue::from_static(crate::boss::USER_AGENT)
        });
        headers.insert(USER_AGENT, value);
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        log::debug!("GET {}", url);
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            log::error!("Request not successful, status code: {}, url: {}", status, url);
        }
        Ok(FetchedPage {
            body,
            ok: status.is_success(),
        })
    }
}
