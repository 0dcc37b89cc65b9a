use std::fs;

use anyhow::{Context, Result};
use assistant_core::{
    BalanceConfig, Config, EmailConfig, RainReportConfig, Section, auth::TokenSigner,
    config::{DEFAULT_BALANCE_PROVIDER, DEFAULT_IMAP_PORT},
};
use inquire::{Confirm, CustomType, Password, Text};

/// Ask for one section's settings, pre-filling whatever is already configured.
pub fn prompt_section(config: &mut Config, section: Section) -> Result<()> {
    match section {
        Section::Rain => {
            let current = config.rain_report.clone();
            config.rain_report = Some(prompt_rain(current)?);
        }
        Section::Email => {
            let current = config.email_monitor.clone();
            config.email_monitor = Some(prompt_email(current)?);
        }
        Section::Balance => {
            let current = config.balance_check.clone();
            config.balance_check = Some(prompt_balance(current)?);
        }
        Section::News => {
            let current = config.news_host.clone().unwrap_or_default();
            let host = Text::new("News API host:")
                .with_initial_value(&current)
                .with_help_message("Host only, e.g. 60s.viki.moe")
                .prompt()?;
            config.news_host = Some(host.trim().to_string());
        }
    }

    Ok(())
}

fn prompt_rain(current: Option<RainReportConfig>) -> Result<RainReportConfig> {
    let current = current.unwrap_or(RainReportConfig {
        api_host: String::new(),
        sub: String::new(),
        kid: String::new(),
        private_key: String::new(),
        location_list: Vec::new(),
    });

    let api_host = Text::new("Forecast API host:")
        .with_initial_value(&current.api_host)
        .prompt()?;
    let sub = Text::new("Project id (token subject):")
        .with_initial_value(&current.sub)
        .prompt()?;
    let kid = Text::new("Credential id (token kid):")
        .with_initial_value(&current.kid)
        .prompt()?;

    let key_path = Text::new("Path to Ed25519 private key (PEM):")
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    let private_key = if key_path.trim().is_empty() {
        current.private_key
    } else {
        fs::read_to_string(key_path.trim())
            .with_context(|| format!("Failed to read private key: {}", key_path.trim()))?
    };
    // Fail here rather than on the first weather query.
    TokenSigner::from_pem(&sub, &kid, &private_key)?;

    let locations = Text::new("Locations:")
        .with_initial_value(&current.location_list.join("; "))
        .with_help_message("lon,lat pairs separated by ';', e.g. 116.41,39.92; 121.47,31.23")
        .prompt()?;

    Ok(RainReportConfig {
        api_host: api_host.trim().to_string(),
        sub: sub.trim().to_string(),
        kid: kid.trim().to_string(),
        private_key,
        location_list: parse_locations(&locations),
    })
}

fn prompt_email(current: Option<EmailConfig>) -> Result<EmailConfig> {
    let url = Text::new("IMAP server:")
        .with_initial_value(current.as_ref().map_or("", |c| c.url.as_str()))
        .prompt()?;
    let port = CustomType::<u16>::new("IMAP port:")
        .with_default(current.as_ref().map_or(DEFAULT_IMAP_PORT, |c| c.port))
        .prompt()?;
    let username = Text::new("Username:")
        .with_initial_value(current.as_ref().map_or("", |c| c.username.as_str()))
        .prompt()?;
    let password = Password::new("Password / app token:")
        .without_confirmation()
        .with_help_message("Leave empty to keep the current password")
        .prompt()?;
    let password = keep_if_empty(password, current.as_ref().map(|c| c.password.as_str()));
    let use_ssl = Confirm::new("Use SSL?")
        .with_default(current.as_ref().is_none_or(|c| c.use_ssl))
        .prompt()?;

    Ok(EmailConfig {
        url: url.trim().to_string(),
        port,
        username: username.trim().to_string(),
        password,
        use_ssl,
    })
}

fn prompt_balance(current: Option<BalanceConfig>) -> Result<BalanceConfig> {
    let provider_name = Text::new("Provider display name:")
        .with_initial_value(
            current
                .as_ref()
                .map_or(DEFAULT_BALANCE_PROVIDER, |c| c.provider_name.as_str()),
        )
        .prompt()?;
    let api_key = Password::new("API key:")
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    let api_key = keep_if_empty(
        api_key.trim().to_string(),
        current.as_ref().map(|c| c.api_key.as_str()),
    );

    Ok(BalanceConfig {
        provider_name: provider_name.trim().to_string(),
        api_key,
        api_base: current.and_then(|c| c.api_base),
    })
}

/// Empty secret input keeps the stored value.
fn keep_if_empty(input: String, current: Option<&str>) -> String {
    match current {
        Some(current) if input.is_empty() => current.to_string(),
        _ => input,
    }
}

fn parse_locations(input: &str) -> Vec<String> {
    input
        .split(';')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_split_on_semicolons() {
        assert_eq!(
            parse_locations(" 116.41,39.92; 121.47,31.23 ;;"),
            vec!["116.41,39.92".to_string(), "121.47,31.23".to_string()]
        );
        assert!(parse_locations("  ").is_empty());
    }

    #[test]
    fn empty_secret_keeps_stored_value() {
        assert_eq!(keep_if_empty(String::new(), Some("old-secret")), "old-secret");
        assert_eq!(keep_if_empty("new-secret".into(), Some("old-secret")), "new-secret");
        assert_eq!(keep_if_empty(String::new(), None), "");
    }
}
