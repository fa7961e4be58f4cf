//! Run Configuration
//!
//! Connection credentials, device mode, timeouts and the tolerated-error
//! list for a single run, plus loading of an optional TOML defaults file.

pub mod loader;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::executor::ToleratedErrors;

pub use loader::ConfigLoader;

/// Which Gaia variant the target device runs.
///
/// On `Full` (full Gaia OS) every clish command is wrapped in a single-shot
/// `clish -s -c '<cmd>'` invocation; on `Spark` (embedded Gaia) commands go
/// to the restricted shell directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    #[default]
    Spark,
    Full,
}

impl FromStr for DeviceMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spark" => Ok(DeviceMode::Spark),
            "full" => Ok(DeviceMode::Full),
            other => Err(format!("unknown gaia mode '{}' (expected spark or full)", other)),
        }
    }
}

/// Per-operation timeouts, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Bound on each login wait
    #[serde(default = "Timeouts::default_login")]
    pub login_secs: u64,
    /// Bound on each clish command wait
    #[serde(default = "Timeouts::default_clish")]
    pub clish_secs: u64,
    /// Bound on each expert-mode wait
    #[serde(default = "Timeouts::default_expert")]
    pub expert_secs: u64,
}

impl Timeouts {
    fn default_login() -> u64 {
        30
    }
    fn default_clish() -> u64 {
        120
    }
    fn default_expert() -> u64 {
        180
    }

    pub fn login(&self) -> Duration {
        Duration::from_secs(self.login_secs)
    }
    pub fn clish(&self) -> Duration {
        Duration::from_secs(self.clish_secs)
    }
    pub fn expert(&self) -> Duration {
        Duration::from_secs(self.expert_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            login_secs: Self::default_login(),
            clish_secs: Self::default_clish(),
            expert_secs: Self::default_expert(),
        }
    }
}

/// Connection descriptor for the target device.
///
/// Passwords live in `Zeroizing` buffers and are wiped on drop; the Debug
/// impl never prints them.
pub struct ConnectionProfile {
    pub host: String,
    pub user: String,
    pub password: Option<Zeroizing<String>>,
    pub keyfile: Option<PathBuf>,
    pub port: u16,
}

impl ConnectionProfile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: "admin".to_string(),
            password: None,
            keyfile: None,
            port: 22,
        }
    }

    /// Whether a usable login password was supplied
    pub fn has_password(&self) -> bool {
        self.password.as_deref().map(|p| !p.is_empty()).unwrap_or(false)
    }

    /// Whether any authentication material is available
    pub fn has_credentials(&self) -> bool {
        self.has_password() || self.keyfile.is_some()
    }
}

impl std::fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("keyfile", &self.keyfile)
            .field("port", &self.port)
            .finish()
    }
}

/// Everything the executor and orchestrator need for one run
pub struct RunConfig {
    pub device_mode: DeviceMode,
    pub timeouts: Timeouts,
    pub tolerated: ToleratedErrors,
    /// Run-level expert password override (fallback after the block-local
    /// password, before the login password)
    pub expert_password: Option<Zeroizing<String>>,
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            device_mode: DeviceMode::default(),
            timeouts: Timeouts::default(),
            tolerated: ToleratedErrors::default(),
            expert_password: None,
            dry_run: false,
        }
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("device_mode", &self.device_mode)
            .field("timeouts", &self.timeouts)
            .field("tolerated", &self.tolerated)
            .field(
                "expert_password",
                &self.expert_password.as_ref().map(|_| "<redacted>"),
            )
            .field("dry_run", &self.dry_run)
            .finish()
    }
}
