use std::fmt;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Deserializer};

use crate::{config::BalanceConfig, provider::truncate_body};

pub const DEFAULT_BALANCE_API: &str = "https://api.siliconflow.cn";

/// Account balance as reported by the model provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub provider_name: String,
    /// Promotional credit.
    pub gift_balance: String,
    pub charge_balance: String,
    pub total_balance: String,
}

impl fmt::Display for AccountBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}账户余额信息:", self.provider_name)?;
        writeln!(f, "赠费余额: {}", self.gift_balance)?;
        writeln!(f, "充值余额: {}", self.charge_balance)?;
        writeln!(f, "总余额: {}", self.total_balance)
    }
}

#[derive(Debug, Clone)]
pub struct BalanceClient {
    provider_name: String,
    api_key: String,
    base_url: String,
    http: Client,
}

impl BalanceClient {
    pub fn new(
        provider_name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &BalanceConfig) -> Self {
        Self::new(
            &config.provider_name,
            &config.api_key,
            config.api_base.as_deref().unwrap_or(DEFAULT_BALANCE_API),
        )
    }

    pub async fn fetch(&self) -> Result<AccountBalance> {
        let url = format!("{}/v1/user/info", self.base_url.trim_end_matches('/'));

        let res = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("Failed to send balance request")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read balance response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "请求错误: balance request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: UserInfoResponse =
            serde_json::from_str(&body).context("Failed to parse balance JSON")?;

        match (parsed.status, parsed.data) {
            (true, Some(data)) => Ok(AccountBalance {
                provider_name: self.provider_name.clone(),
                gift_balance: data.balance,
                charge_balance: data.charge_balance,
                total_balance: data.total_balance,
            }),
            _ => Err(anyhow!(
                "获取{}余额失败：{}",
                self.provider_name,
                parsed.message.as_deref().unwrap_or("未知错误")
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<UserInfoData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserInfoData {
    #[serde(deserialize_with = "amount")]
    balance: String,
    #[serde(deserialize_with = "amount")]
    charge_balance: String,
    #[serde(deserialize_with = "amount")]
    total_balance: String,
}

/// Amounts come back as decimal strings, but accept plain numbers too.
fn amount<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_and_formats_balance() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/user/info"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 20000,
                "message": "OK",
                "status": true,
                "data": {
                    "id": "user-1",
                    "balance": "0.88",
                    "chargeBalance": "88.00",
                    "totalBalance": 88.88
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BalanceClient::new("硅基流动", "sk-test", server.uri());
        let balance = client.fetch().await.expect("fetch should succeed");

        assert_eq!(balance.gift_balance, "0.88");
        assert_eq!(balance.total_balance, "88.88");
        assert_eq!(
            balance.to_string(),
            "硅基流动账户余额信息:\n赠费余额: 0.88\n充值余额: 88.00\n总余额: 88.88\n"
        );
    }

    #[tokio::test]
    async fn status_false_reports_server_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/user/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": false,
                "message": "Invalid token"
            })))
            .mount(&server)
            .await;

        let client = BalanceClient::new("硅基流动", "sk-bad", server.uri());
        let err = client.fetch().await.unwrap_err();

        assert_eq!(err.to_string(), "获取硅基流动余额失败：Invalid token");
    }

    #[tokio::test]
    async fn missing_message_falls_back_to_unknown_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": true})))
            .mount(&server)
            .await;

        let client = BalanceClient::new("硅基流动", "sk", server.uri());
        let err = client.fetch().await.unwrap_err();

        assert!(err.to_string().ends_with("未知错误"));
    }

    #[tokio::test]
    async fn http_failure_is_a_request_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = BalanceClient::new("硅基流动", "sk", server.uri());
        let msg = client.fetch().await.unwrap_err().to_string();

        assert!(msg.starts_with("请求错误"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn from_config_defaults_to_public_api() {
        let cfg = BalanceConfig {
            provider_name: "硅基流动".into(),
            api_key: "sk".into(),
            api_base: None,
        };

        assert_eq!(BalanceClient::from_config(&cfg).base_url, DEFAULT_BALANCE_API);
    }
}
