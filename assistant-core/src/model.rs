use std::{fmt, ops::BitOr};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Raw grid-weather 24h response as returned by the forecast API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPayload {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
    #[serde(default)]
    pub hourly: Vec<HourlyRecord>,
}

/// One forecast hour. Fields the API leaves out, nulls, or values of the
/// wrong type default to empty, so a bad field only affects its own record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    #[serde(rename = "fxTime", default, deserialize_with = "lenient_string")]
    pub fx_time: String,
    #[serde(default, deserialize_with = "number_or_string")]
    pub temp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub icon: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,
}

impl HourlyRecord {
    /// Parse `fxTime`, which the API sends either as full RFC 3339 or without
    /// seconds (`2024-06-01T12:00+08:00`).
    pub fn parse_time(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(&self.fx_time)
            .or_else(|_| DateTime::parse_from_str(&self.fx_time, "%Y-%m-%dT%H:%M%:z"))
    }
}

fn number_or_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Strings pass through, numbers are rendered, anything else is empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Rain expectation for the two report periods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RainVerdict {
    pub morning: bool,
    pub afternoon: bool,
}

impl RainVerdict {
    pub const fn new(morning: bool, afternoon: bool) -> Self {
        Self { morning, afternoon }
    }

    pub fn any(&self) -> bool {
        self.morning || self.afternoon
    }
}

impl BitOr for RainVerdict {
    type Output = RainVerdict;

    fn bitor(self, rhs: Self) -> Self::Output {
        RainVerdict {
            morning: self.morning || rhs.morning,
            afternoon: self.afternoon || rhs.afternoon,
        }
    }
}

/// The single message a rain query answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    MorningRain,
    AfternoonRain,
    NoRain,
    OutsideReportingWindows,
}

impl Verdict {
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::MorningRain => "上午可能有雨",
            Verdict::AfternoonRain => "下午可能有雨",
            Verdict::NoRain => "无雨",
            Verdict::OutsideReportingWindows => "请在6-9点或12-15点发起查询",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
