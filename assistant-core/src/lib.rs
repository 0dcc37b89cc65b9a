//! Core library for the `assistant` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Rain detection over hourly forecasts and the multi-location rain report
//! - Clients for the forecast, mailbox, balance and news collaborators
//!
//! It is used by `assistant-cli`, but can also be reused by a chat bot host.

pub mod auth;
pub mod balance;
pub mod config;
pub mod error;
pub mod forecast;
pub mod mailbox;
pub mod model;
pub mod news;
pub mod provider;
pub mod report;

pub use balance::{AccountBalance, BalanceClient};
pub use config::{BalanceConfig, Config, EmailConfig, RainReportConfig, Section};
pub use error::ForecastError;
pub use mailbox::MailboxChecker;
pub use model::{ForecastPayload, HourlyRecord, RainVerdict, Verdict};
pub use news::NewsClient;
pub use provider::ForecastProvider;
pub use report::{RainReport, RainReportOutcome};
