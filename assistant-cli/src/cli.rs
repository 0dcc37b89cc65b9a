use std::path::PathBuf;

use anyhow::Context;
use assistant_core::{
    BalanceClient, Config, MailboxChecker, NewsClient, RainReport, Section, mailbox::DEFAULT_MAILBOX,
    report::now_in_report_zone,
};
use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::configure;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "assistant", version, about = "Online assistant: mailbox, rain, balance and news")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for one section.
    Configure {
        /// Section name: "rain", "email", "balance" or "news".
        section: String,
    },

    /// Show the number of unread emails.
    Email {
        #[arg(long, default_value = DEFAULT_MAILBOX)]
        mailbox: String,
    },

    /// Check whether rain is expected at any configured location.
    Weather {
        /// Wall clock (HH:MM, UTC+8) to decide the reply for; defaults to now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Show the model provider account balance.
    Balance,

    /// Print today's 60-second news digest.
    News,
}

impl Cli {
    pub fn init_logging(&self) {
        let filter = match self.verbose {
            0 => "warn",
            1 => "assistant=info,assistant_core=info",
            2 => "assistant=debug,assistant_core=debug",
            _ => "trace",
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn")));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.load_config()?;

        match self.command {
            Command::Configure { section } => {
                let section = Section::try_from(section.as_str())?;
                let mut config = config;
                configure::prompt_section(&mut config, section)?;

                let path = match &self.config {
                    Some(path) => {
                        config.save_to(path)?;
                        path.clone()
                    }
                    None => config.save()?,
                };
                println!("Saved {section} settings to {}", path.display());
            }
            Command::Email { mailbox } => {
                info!("mailbox query started");
                let checker = MailboxChecker::from_config(config.email_monitor()?);
                let count = tokio::task::spawn_blocking(move || checker.unread_count(&mailbox))
                    .await
                    .context("Mailbox check task failed")??;
                println!("未读邮件: {count}封");
            }
            Command::Weather { at } => {
                info!("rain query started");
                let now = match at {
                    Some(at) => parse_clock(&at)?,
                    None => now_in_report_zone(),
                };

                let report = RainReport::from_config(config.rain_report()?)?;
                let outcome = report.run(now).await;
                if outcome.evaluated() == 0 && !report.locations().is_empty() {
                    warn!(
                        failures = outcome.diagnostics.len(),
                        "no location forecast could be fetched"
                    );
                }
                println!("{}", outcome.verdict);
            }
            Command::Balance => {
                let balance = BalanceClient::from_config(config.balance_check()?).fetch().await?;
                print!("{balance}");
            }
            Command::News => {
                let digest = NewsClient::new(config.news_host()?).fetch_digest().await?;
                println!("{digest}");
            }
        }

        Ok(())
    }
}

fn parse_clock(value: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .with_context(|| format!("Invalid time '{value}', expected HH:MM"))
}
