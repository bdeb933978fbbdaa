//! In-memory [`Transport`] for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::error::FetchError;
use crate::fetch::{Page, Transport};

#[derive(Debug, Clone)]
enum Route {
    Body(Vec<u8>),
    Redirect(String),
    Status(u16),
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Timeout,
    Refused,
}

#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    routes: HashMap<String, Route>,
    failures: Mutex<HashMap<String, (Failure, u32)>>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(url.to_owned(), Route::Body(body.into()));
        self
    }

    pub(crate) fn redirect(mut self, url: &str, to: &str) -> Self {
        self.routes
            .insert(url.to_owned(), Route::Redirect(to.to_owned()));
        self
    }

    pub(crate) fn status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(url.to_owned(), Route::Status(status));
        self
    }

    /// The next `count` requests for `url` time out.
    pub(crate) fn timeouts(self, url: &str, count: u32) -> Self {
        self.fail(url, Failure::Timeout, count)
    }

    /// The next `count` requests for `url` fail to connect.
    pub(crate) fn refusals(self, url: &str, count: u32) -> Self {
        self.fail(url, Failure::Refused, count)
    }

    fn fail(self, url: &str, failure: Failure, count: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(url.to_owned(), (failure, count));
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn resolve(&self, requested: &Url) -> Result<Page, FetchError> {
        let mut current = requested.to_string();
        for _ in 0..10 {
            match self.routes.get(&current) {
                Some(Route::Body(body)) => {
                    return Ok(Page {
                        url: Url::parse(&current).unwrap(),
                        body: body.clone(),
                    });
                }
                Some(Route::Redirect(to)) => {
                    let target = Url::parse(to).unwrap();
                    if !self.routes.contains_key(target.as_str()) {
                        return Ok(Page {
                            url: target,
                            body: b"<html>home</html>".to_vec(),
                        });
                    }
                    current = target.to_string();
                }
                Some(Route::Status(code)) => {
                    return Err(FetchError::Http {
                        url: requested.clone(),
                        status: StatusCode::from_u16(*code).unwrap(),
                    });
                }
                None => {
                    return Err(FetchError::Http {
                        url: requested.clone(),
                        status: StatusCode::NOT_FOUND,
                    });
                }
            }
        }
        Err(FetchError::Protocol {
            url: requested.clone(),
            message: "too many redirects".to_owned(),
        })
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<Page, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        if let Some((failure, remaining)) = self.failures.lock().unwrap().get_mut(url.as_str())
            && *remaining > 0
        {
            *remaining -= 1;
            let url = url.clone();
            return Err(match failure {
                Failure::Timeout => FetchError::Timeout { url },
                Failure::Refused => FetchError::Connection {
                    url,
                    message: "connection refused".to_owned(),
                },
            });
        }

        self.resolve(url)
    }
}
