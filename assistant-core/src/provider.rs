use crate::{
    auth::TokenSigner, config::RainReportConfig, model::ForecastPayload,
    provider::qweather::QWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod qweather;

/// Source of hourly forecasts for a location.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn hourly_forecast(&self, location: &str) -> anyhow::Result<ForecastPayload>;
}

/// Construct the forecast provider described by the `[rain_report]` section.
pub fn provider_from_config(config: &RainReportConfig) -> anyhow::Result<Box<dyn ForecastProvider>> {
    if config.api_host.trim().is_empty() {
        return Err(anyhow::anyhow!(
            "No API host configured for the rain report.\n\
                 Hint: run `assistant configure rain` and enter your API host."
        ));
    }

    let signer = TokenSigner::from_pem(&config.sub, &config.kid, &config.private_key)?;

    Ok(Box::new(QWeatherProvider::new(&config.api_host, signer)))
}

/// Keep error messages short; bodies can be whole HTML pages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_keys;

    fn rain_config() -> RainReportConfig {
        RainReportConfig {
            api_host: "abc.qweatherapi.com".into(),
            sub: "sub".into(),
            kid: "kid".into(),
            private_key: test_keys::PRIVATE_KEY_PEM.into(),
            location_list: vec!["116.41,39.92".into()],
        }
    }

    #[test]
    fn provider_from_config_builds_with_valid_key() {
        assert!(provider_from_config(&rain_config()).is_ok());
    }

    #[test]
    fn provider_from_config_errors_without_host() {
        let mut cfg = rain_config();
        cfg.api_host = String::new();

        let err = provider_from_config(&cfg).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No API host configured"));
        assert!(msg.contains("Hint: run `assistant configure rain`"));
    }

    #[test]
    fn provider_from_config_errors_on_bad_key() {
        let mut cfg = rain_config();
        cfg.private_key = "not a pem".into();

        assert!(provider_from_config(&cfg).is_err());
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "雨".repeat(300);
        let truncated = truncate_body(&body);

        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
