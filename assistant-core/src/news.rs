use anyhow::{Context, Result, anyhow};
use reqwest::Client;

use crate::provider::truncate_body;

/// Fetches the plain-text "60 seconds" daily digest.
#[derive(Debug, Clone)]
pub struct NewsClient {
    base_url: String,
    http: Client,
}

impl NewsClient {
    pub fn new(news_host: &str) -> Self {
        Self::with_base_url(format!("https://{news_host}"))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    pub async fn fetch_digest(&self) -> Result<String> {
        let url = format!("{}/v2/60s", self.base_url.trim_end_matches('/'));

        let res = self
            .http
            .get(&url)
            .query(&[("encoding", "text")])
            .send()
            .await
            .context("Failed to send news request")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read news response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "HTTP错误: news request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_digest_text() {
        let server = MockServer::start().await;
        let digest = "每天60秒读懂世界\n1. 第一条\n2. 第二条\n";

        Mock::given(method("GET"))
            .and(path("/v2/60s"))
            .and(query_param("encoding", "text"))
            .respond_with(ResponseTemplate::new(200).set_body_string(digest))
            .expect(1)
            .mount(&server)
            .await;

        let text = NewsClient::with_base_url(server.uri())
            .fetch_digest()
            .await
            .expect("fetch should succeed");

        assert_eq!(text, digest);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = NewsClient::with_base_url(server.uri()).fetch_digest().await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("maintenance"));
    }

    #[test]
    fn host_becomes_https_base() {
        assert_eq!(NewsClient::new("60s.viki.moe").base_url, "https://60s.viki.moe");
    }
}
