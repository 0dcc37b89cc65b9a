use std::{
    io::{Read, Write},
    net::TcpStream,
};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::EmailConfig;

pub const DEFAULT_MAILBOX: &str = "INBOX";

/// Counts unread messages over IMAP.
///
/// Every call opens a fresh connection and logs out afterwards. The calls
/// block, so async callers should go through `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct MailboxChecker {
    server: String,
    port: u16,
    username: String,
    password: String,
    use_ssl: bool,
}

impl MailboxChecker {
    pub fn new(
        server: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        use_ssl: bool,
    ) -> Self {
        Self {
            server: server.into(),
            port,
            username: username.into(),
            password: password.into(),
            use_ssl,
        }
    }

    pub fn from_config(config: &EmailConfig) -> Self {
        Self::new(
            &config.url,
            config.port,
            &config.username,
            &config.password,
            config.use_ssl,
        )
    }

    pub fn unread_count(&self, mailbox: &str) -> Result<usize> {
        if self.use_ssl {
            let tls = native_tls::TlsConnector::builder()
                .build()
                .context("Failed to build TLS connector")?;
            let client = imap::connect((self.server.as_str(), self.port), &self.server, &tls)
                .with_context(|| self.connect_error())?;
            self.count_unseen(client, mailbox)
        } else {
            let stream = TcpStream::connect((self.server.as_str(), self.port))
                .with_context(|| self.connect_error())?;
            let mut client = imap::Client::new(stream);
            client
                .read_greeting()
                .context("IMAP server did not send a greeting")?;
            self.count_unseen(client, mailbox)
        }
    }

    fn connect_error(&self) -> String {
        format!("Failed to connect to IMAP server {}:{}", self.server, self.port)
    }

    fn count_unseen<T: Read + Write>(&self, client: imap::Client<T>, mailbox: &str) -> Result<usize> {
        let mut session = client
            .login(&self.username, &self.password)
            .map_err(|(err, _client)| err)
            .with_context(|| format!("Failed to log in as {}", self.username))?;
        info!(server = %self.server, "connected to mailbox server");

        let unseen = session
            .select(mailbox)
            .with_context(|| format!("Failed to select mailbox {mailbox}"))
            .and_then(|_| session.search("UNSEEN").context("Failed to search unread messages"));

        if let Err(err) = session.logout() {
            debug!(error = %err, "IMAP logout failed");
        }

        let count = unseen?.len();
        debug!(mailbox, count, "counted unread messages");
        Ok(count)
    }
}
