use std::time::Duration;

use log::debug;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::ConnectError;

const USER_AGENT: &str = concat!("tickerlink/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin HTTP wrapper shared by every connector: one client, one timeout,
/// one status-handling path. Rate-limit responses surface as a dedicated
/// error so callers can back off instead of failing the fetch.
pub struct ApiClient {
    http: Client,
}

impl ApiClient {
    pub fn new() -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http }
    }

    async fn check(response: Response) -> Result<Response, ConnectError> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ConnectError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ConnectError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ConnectError> {
        debug!("GET {url}");
        let response = self.http.get(url).query(query).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// GET with a bearer token, for cursor URLs that already embed their
    /// query string.
    pub async fn get_json_bearer<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
    ) -> Result<T, ConnectError> {
        debug!("GET {url}");
        let response = self.http.get(url).bearer_auth(token).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ConnectError> {
        debug!("GET {url}");
        let response = self.http.get(url).send().await?;
        Ok(Self::check(response).await?.bytes().await?.to_vec())
    }

    pub async fn get_text(&self, url: &str) -> Result<String, ConnectError> {
        debug!("GET {url}");
        let response = self.http.get(url).send().await?;
        Ok(Self::check(response).await?.text().await?)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T, ConnectError> {
        debug!("POST {url}");
        let response = self.http.post(url).query(query).json(body).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}
