use crate::error::{MailmanError, Result};
use crate::render::RenderConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable that overrides the configured SMTP password.
pub const SMTP_PASSWORD_ENV: &str = "MAILMAN_SMTP_PASSWORD";

/// SMTP relay settings used when sending merged mail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Sender mailbox, e.g. `Mailman <mailman@example.com>`.
    pub from: String,
}

fn default_port() -> u16 {
    465
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailmanConfig {
    pub render: RenderConfig,
    pub smtp: Option<SmtpConfig>,
}

impl MailmanConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MailmanError::Config(e.to_string()))
    }

    /// Read a config file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&json)?;
        config.apply_env(std::env::var(SMTP_PASSWORD_ENV).ok());
        Ok(config)
    }

    fn apply_env(&mut self, password: Option<String>) {
        if let (Some(smtp), Some(password)) = (self.smtp.as_mut(), password) {
            smtp.password = password;
        }
    }

    pub fn smtp(&self) -> Result<&SmtpConfig> {
        self.smtp
            .as_ref()
            .ok_or_else(|| MailmanError::Config("no smtp section".to_string()))
    }
}
