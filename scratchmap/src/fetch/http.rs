//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Errors from a single HTTP exchange.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HttpError {
    /// Connection, timeout or body read failure.
    #[error("Request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
}

impl HttpError {
    /// Status code of the response, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(_) => None,
        }
    }
}

/// Async HTTP operations used by the tile fetcher and the backend control.
///
/// Implementations must be cheap to share between concurrent fetches.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;

    /// Performs an HTTP POST request with an empty body.
    fn post(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with a 30 second request timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(30)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HttpError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn read(url: &str, response: reqwest::Response) -> Result<Vec<u8>, HttpError> {
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| HttpError::Request(format!("Failed to read response: {}", e)))
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError::Request(e.to_string()))?;
        Self::read(url, response).await
    }

    async fn post(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| HttpError::Request(e.to_string()))?;
        Self::read(url, response).await
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Mock HTTP client returning a fixed response and recording requested URLs.
    pub struct MockAsyncHttpClient {
        pub response: Result<Vec<u8>, HttpError>,
        pub requests: Mutex<Vec<String>>,
    }

    impl MockAsyncHttpClient {
        pub fn new(response: Result<Vec<u8>, HttpError>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
            self.requests.lock().unwrap().push(format!("GET {}", url));
            self.response.clone()
        }

        async fn post(&self, url: &str) -> Result<Vec<u8>, HttpError> {
            self.requests.lock().unwrap().push(format!("POST {}", url));
            self.response.clone()
        }
    }

    /// Fails the first `failures` GET requests, then returns `body`.
    pub struct FlakyHttpClient {
        pub failures: u32,
        pub body: Vec<u8>,
        pub calls: AtomicU32,
    }

    impl FlakyHttpClient {
        pub fn new(failures: u32, body: Vec<u8>) -> Self {
            Self {
                failures,
                body,
                calls: AtomicU32::new(0),
            }
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AsyncHttpClient for FlakyHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(HttpError::Status {
                    url: url.to_string(),
                    status: 503,
                });
            }
            Ok(self.body.clone())
        }

        async fn post(&self, _url: &str) -> Result<Vec<u8>, HttpError> {
            Err(HttpError::Request("POST not supported".to_string()))
        }
    }

    #[tokio::test]
    async fn test_mock_client_records_requests() {
        let mock = MockAsyncHttpClient::new(Ok(vec![1, 2, 3, 4]));

        assert_eq!(mock.get("http://example.com/a").await.unwrap(), vec![1, 2, 3, 4]);
        mock.post("http://example.com/b").await.unwrap();

        assert_eq!(
            mock.requests(),
            vec!["GET http://example.com/a", "POST http://example.com/b"]
        );
    }

    #[test]
    fn test_status_accessor() {
        let err = HttpError::Status {
            url: "http://example.com".to_string(),
            status: 404,
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(HttpError::Request("boom".to_string()).status(), None);
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(AsyncReqwestClient::with_timeout(5).is_ok());
    }
}
