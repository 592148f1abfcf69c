//! Application settings loaded from `config.toml` and the environment.
//!
//! Values come from three layers, later ones winning:
//! 1. built-in defaults,
//! 2. an optional TOML file (`ELOG_CONFIG`, default `./config.toml`),
//! 3. environment variables (usually provided through `.env`).

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// HTTP listener
    pub server: ServerSettings,
    /// Outbound email links
    pub email: EmailSettings,
    /// Image host allow-list
    pub images: ImageSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to bind, e.g. `"0.0.0.0:8080"`
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Settings used to build links in outgoing emails.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmailSettings {
    /// Public base URL of the web application
    pub base_url: String,
    /// Path of the login page
    pub login_path: String,
    /// Path of the change-password page shown on first login
    pub change_password_path: String,
    /// Sender address
    pub from: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            login_path: "/login".to_string(),
            change_password_path: "/change-password".to_string(),
            from: "no-reply@elogbook.local".to_string(),
        }
    }
}

impl EmailSettings {
    /// Absolute link to the login page.
    #[must_use]
    pub fn login_link(&self) -> String {
        join_url(&self.base_url, &self.login_path)
    }

    /// Absolute link to the change-password page.
    #[must_use]
    pub fn change_password_link(&self) -> String {
        join_url(&self.base_url, &self.change_password_path)
    }
}

/// Image hosting settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImageSettings {
    /// Hosts (and their subdomains) profile images may be served from
    pub allowed_domains: Vec<String>,
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

impl Settings {
    /// Parses settings from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse settings: {e}"),
        })
    }

    /// Applies environment overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ELOG_BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = lookup("EMAIL_BASE_URL") {
            self.email.base_url = v;
        }
        if let Some(v) = lookup("EMAIL_LOGIN_PATH") {
            self.email.login_path = v;
        }
        if let Some(v) = lookup("EMAIL_CHANGE_PASSWORD_PATH") {
            self.email.change_password_path = v;
        }
        if let Some(v) = lookup("EMAIL_FROM") {
            self.email.from = v;
        }
        if let Some(v) = lookup("IMAGE_ALLOWED_DOMAINS") {
            self.images.allowed_domains = v
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(ToString::to_string)
                .collect();
        }
    }
}

/// Loads settings from `path`, falling back to defaults when it does not exist.
pub fn load_settings_from<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("No settings file at {:?}, using defaults", path);
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path.display()),
    })?;
    Settings::from_toml(&contents)
}

/// Loads settings from the configured file and applies environment overrides.
pub fn load_settings() -> Result<Settings> {
    let path = std::env::var("ELOG_CONFIG")
        .map_or_else(|_| PathBuf::from("config.toml"), PathBuf::from);
    let mut settings = load_settings_from(&path)?;
    settings.apply_overrides(|key| std::env::var(key).ok());
    info!(
        bind_addr = %settings.server.bind_addr,
        image_domains = settings.images.allowed_domains.len(),
        "Settings loaded"
    );
    Ok(settings)
}
