use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use url::Url;

use crate::error::FetchError;

const USER_AGENT_VALUE: &str = concat!("bookscrape/", env!("CARGO_PKG_VERSION"));

/// A successful response. `url` is the final URL after redirects.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub body: Vec<u8>,
}

impl Page {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Plain HTTP GET that follows redirects and rejects non-2xx statuses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Page, FetchError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(&self, url: &Url) -> Result<Page, FetchError> {
        (**self).get(url).await
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|err| classify(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.clone(),
                status,
            });
        }

        let final_url = response.url().clone();
        let body = response.bytes().await.map_err(|err| classify(url, err))?;
        Ok(Page {
            url: final_url,
            body: body.to_vec(),
        })
    }
}

fn classify(url: &Url, err: reqwest::Error) -> FetchError {
    let url = url.clone();
    let message = err.to_string();
    if err.is_timeout() {
        FetchError::Timeout { url }
    } else if err.is_connect() || err.is_request() {
        FetchError::Connection { url, message }
    } else {
        FetchError::Protocol { url, message }
    }
}

/// Fetches pages from one site and turns "redirected to the home page" into
/// [`FetchError::Redirect`].
pub struct PageFetcher<T> {
    transport: T,
    home: Url,
}

impl<T: Transport> PageFetcher<T> {
    pub fn new(transport: T, home: Url) -> Self {
        Self { transport, home }
    }

    pub fn home(&self) -> &Url {
        &self.home
    }

    pub async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        let page = self.transport.get(url).await?;
        if is_home(&page.url, &self.home) {
            return Err(FetchError::Redirect { url: url.clone() });
        }
        Ok(page)
    }
}

fn is_home(url: &Url, home: &Url) -> bool {
    let strip = |url: &Url| {
        let mut url = url.clone();
        url.set_fragment(None);
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&path);
        url
    };
    strip(url) == strip(home)
}
