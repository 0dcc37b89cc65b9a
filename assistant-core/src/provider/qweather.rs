use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::{auth::TokenSigner, model::ForecastPayload, provider::truncate_body};

use super::ForecastProvider;

/// Grid-weather 24h forecasts from QWeather.
#[derive(Debug, Clone)]
pub struct QWeatherProvider {
    base_url: String,
    signer: TokenSigner,
    http: Client,
}

impl QWeatherProvider {
    /// `api_host` is the per-account host, e.g. `abc1234xyz.re.qweatherapi.com`.
    pub fn new(api_host: &str, signer: TokenSigner) -> Self {
        Self::with_base_url(format!("https://{api_host}"), signer)
    }

    pub fn with_base_url(base_url: impl Into<String>, signer: TokenSigner) -> Self {
        Self {
            base_url: base_url.into(),
            signer,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl ForecastProvider for QWeatherProvider {
    async fn hourly_forecast(&self, location: &str) -> Result<ForecastPayload> {
        let url = format!("{}/v7/grid-weather/24h", self.base_url.trim_end_matches('/'));
        let token = self.signer.sign()?;

        let res = self
            .http
            .get(&url)
            .query(&[("location", location)])
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Failed to send forecast request for location {location}"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read forecast response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Forecast request for location {} failed with status {}: {}",
                location,
                status,
                truncate_body(&body),
            ));
        }

        let payload: ForecastPayload =
            serde_json::from_str(&body).context("Failed to parse forecast JSON")?;

        match payload.code.as_deref() {
            None | Some("200") => {}
            Some(code) => {
                return Err(anyhow!(
                    "Forecast API returned code {} for location {}",
                    code,
                    location
                ));
            }
        }

        debug!(location, hours = payload.hourly.len(), "forecast request succeeded");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_keys;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_hourly_forecast_with_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v7/grid-weather/24h"))
            .and(query_param("location", "116.41,39.92"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "200",
                "updateTime": "2024-06-01T06:00+08:00",
                "hourly": [
                    {"fxTime": "2024-06-01T08:00+08:00", "temp": "21", "icon": "305", "text": "小雨"},
                    {"fxTime": "2024-06-01T09:00+08:00", "temp": "22", "icon": "101", "text": "多云"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = QWeatherProvider::with_base_url(server.uri(), test_keys::signer());
        let payload = provider.hourly_forecast("116.41,39.92").await.expect("fetch should succeed");

        assert_eq!(payload.hourly.len(), 2);
        assert_eq!(payload.hourly[0].text, "小雨");
        assert_eq!(payload.hourly[1].temp, Some(22.0));
    }

    #[tokio::test]
    async fn http_error_carries_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v7/grid-weather/24h"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let provider = QWeatherProvider::with_base_url(server.uri(), test_keys::signer());
        let err = provider.hourly_forecast("1,2").await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("invalid token"));
    }

    #[tokio::test]
    async fn non_success_api_code_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v7/grid-weather/24h"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"code": "402", "hourly": []})),
            )
            .mount(&server)
            .await;

        let provider = QWeatherProvider::with_base_url(server.uri(), test_keys::signer());
        let err = provider.hourly_forecast("1,2").await.unwrap_err();

        assert!(err.to_string().contains("code 402"));
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let provider = QWeatherProvider::with_base_url(server.uri(), test_keys::signer());
        let err = provider.hourly_forecast("1,2").await.unwrap_err();

        assert!(err.to_string().contains("Failed to parse forecast JSON"));
    }
}
