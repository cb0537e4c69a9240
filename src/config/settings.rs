//! Application settings and paths.
//!
//! Settings live in `settings.json` under the XDG config directory
//! (`~/.config/netsweep` on Linux). Every field has a default, so a partial
//! or missing file is fine.

use crate::error::{ConfigError, ConfigResult};
use crate::orchestrator::ScanSettings;
use crate::types::{PortSpec, ScanRequest};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following the XDG Base Directory layout.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/netsweep)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the platform directories. Nothing is created on disk.
    pub fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "netsweep", "netsweep")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// User-facing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Workers used when a scan doesn't ask for a specific number.
    pub default_workers: usize,
    /// Hard cap on workers for any scan.
    pub max_workers: usize,
    /// ICMP echo timeout in milliseconds.
    pub ping_timeout_ms: u64,
    /// TCP connect timeout in milliseconds.
    pub port_timeout_ms: u64,
    /// Per-step hostname lookup timeout in milliseconds.
    pub resolve_timeout_ms: u64,
    /// Bound on reading the ARP cache, in milliseconds.
    pub arp_timeout_ms: u64,
    /// Fall back to the ARP cache for hosts that ignore ICMP.
    pub use_arp_table: bool,
    /// Hosts dispatched per second, 0 for unlimited.
    pub rate_limit: u32,
    /// Port specification used by `--ports` without a value.
    pub default_ports: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_workers: ScanRequest::DEFAULT_WORKERS,
            max_workers: 256,
            ping_timeout_ms: 2000,
            port_timeout_ms: 1000,
            resolve_timeout_ms: 2000,
            arp_timeout_ms: 10_000,
            use_arp_table: true,
            rate_limit: 0,
            default_ports: PortSpec::COMMON_KEYWORD.to_string(),
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, or defaults if there is no
    /// settings file yet.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::new()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to the default location.
    pub fn save(&self) -> ConfigResult<PathBuf> {
        let file = Paths::new()?.settings_file();
        self.save_to(&file)?;
        Ok(file)
    }

    /// Save settings to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_workers == 0 {
            return Err(ConfigError::InvalidFormat(
                "max_workers must be greater than zero".to_string(),
            ));
        }
        if self.max_workers > ScanSettings::WORKER_CAP {
            return Err(ConfigError::InvalidFormat(format!(
                "max_workers must be at most {}",
                ScanSettings::WORKER_CAP
            )));
        }
        if self.default_workers == 0 {
            return Err(ConfigError::InvalidFormat(
                "default_workers must be greater than zero".to_string(),
            ));
        }
        self.default_ports
            .parse::<PortSpec>()
            .map_err(|e| ConfigError::InvalidFormat(format!("default_ports: {}", e)))?;
        Ok(())
    }

    /// Engine settings derived from these settings.
    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            ping_timeout: Duration::from_millis(self.ping_timeout_ms),
            port_timeout: Duration::from_millis(self.port_timeout_ms),
            resolve_timeout: Duration::from_millis(self.resolve_timeout_ms),
            arp_timeout: Duration::from_millis(self.arp_timeout_ms),
            use_arp_table: self.use_arp_table,
            max_workers: self.max_workers,
            rate_limit: self.rate_limit,
        }
    }
}
