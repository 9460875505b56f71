// File: config.rs
// Location: /src/config.rs

use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// A network configuration submitted from the modify dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
    pub security: WifiSecurity,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WifiSecurity {
    Open,
    Wep,
    Wpa,
    Sae,
}

impl WifiConfig {
    pub fn validate_ssid(&self) -> Result<()> {
        if self.ssid.is_empty() || self.ssid.len() > 32 {
            anyhow::bail!("SSID must be 1-32 characters");
        }

        if !self.ssid.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
            anyhow::bail!("SSID contains invalid characters");
        }

        Ok(())
    }

    pub fn validate_password(&self) -> Result<()> {
        if self.security == WifiSecurity::Open {
            if !self.password.is_empty() {
                anyhow::bail!("Open networks take no password");
            }
            return Ok(());
        }

        if self.password.len() < 8 || self.password.len() > 63 {
            anyhow::bail!("Password must be 8-63 characters");
        }

        if !self.password.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
            anyhow::bail!("Password contains invalid characters");
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_ssid()?;
        self.validate_password()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Wi-Fi interface to watch; the first Wi-Fi device when unset.
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default = "default_captive_portal_url")]
    pub captive_portal_url: String,
    #[serde(default = "default_qr_output_dir")]
    pub qr_output_dir: PathBuf,
}

impl Default for DetailsSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            interface: None,
            captive_portal_url: default_captive_portal_url(),
            qr_output_dir: default_qr_output_dir(),
        }
    }
}

impl DetailsSettings {
    pub fn validate(&self) -> Result<()> {
        if !(250..=60_000).contains(&self.poll_interval_ms) {
            anyhow::bail!("Poll interval must be 250-60000 ms");
        }

        if !(self.captive_portal_url.starts_with("http://")
            || self.captive_portal_url.starts_with("https://"))
        {
            anyhow::bail!("Captive portal URL must be http or https");
        }

        if let Some(iface) = &self.interface {
            if iface.is_empty() || iface.len() > 15 || iface.contains('/') {
                anyhow::bail!("Invalid interface name");
            }
        }

        Ok(())
    }
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_captive_portal_url() -> String {
    "http://nmcheck.gnome.org/check_network_status.txt".to_string()
}

fn default_qr_output_dir() -> PathBuf {
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".local/share/wifi-details"))
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

pub fn load_settings(path: &Path) -> Result<DetailsSettings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let settings: DetailsSettings = serde_json::from_str(&content)?;
    settings.validate()?;
    Ok(settings)
}

/// Settings from `path`, or defaults when the file is missing or invalid.
pub fn load_settings_or_default(path: &Path) -> DetailsSettings {
    if !path.exists() {
        return DetailsSettings::default();
    }
    match load_settings(path) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Ignoring settings file {}: {}", path.display(), e);
            DetailsSettings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &DetailsSettings) -> Result<()> {
    settings.validate()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;

    Ok(())
}

pub fn settings_path() -> PathBuf {
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".config/wifi-details/settings.json"))
        .unwrap_or_else(|_| PathBuf::from("/tmp/wifi-details-settings.json"))
}
