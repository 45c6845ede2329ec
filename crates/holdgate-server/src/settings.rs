//! TOML settings file.
//!
//! Every key is optional. Sections and keys that are absent take the
//! documented defaults; unknown keys are rejected so that typos surface at
//! startup instead of silently falling back.
//!
//! ```toml
//! [totp]
//! secret = "JBSWY3DPEHPK3PXP"
//! window = 1
//!
//! [wol]
//! mac = "00:11:22:33:44:55"
//! timeout = 60
//! interval = 2
//!
//! [target]
//! host = "10.0.0.5"
//! port = 3389
//! ```

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use holdgate_core::{
    DEFAULT_OVERALL_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_PROBE_TIMEOUT, DEFAULT_SCREEN_HEIGHT,
    DEFAULT_SCREEN_WIDTH, DEFAULT_TARGET_HOST, DEFAULT_TARGET_PORT, DEFAULT_TOLERANCE_WINDOW,
    GateConfig, LivenessConfig, MacAddress, PasscodeConfig, ScreenSize, SharedSecret,
};
use serde::Deserialize;

use crate::error::SettingsError;

/// Shared secret used when none is configured.
pub const DEFAULT_SECRET: &str = "JBSWY3DPEHPK3PXP";

/// Wake target used when none is configured.
pub const DEFAULT_MAC: &str = "00:11:22:33:44:55";

/// Status font used when none is configured.
pub const DEFAULT_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Status font pixel size used when none is configured.
pub const DEFAULT_FONT_SIZE: u32 = 32;

/// Whole settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `[totp]` section
    pub totp: TotpSettings,
    /// `[wol]` section
    pub wol: WolSettings,
    /// `[target]` section
    pub target: TargetSettings,
    /// `[display]` section
    pub display: DisplaySettings,
}

/// Passcode settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TotpSettings {
    /// Base32 shared secret
    pub secret: String,
    /// Accepted steps on either side of the current one, at most
    /// [`MAX_TOLERANCE_WINDOW`](holdgate_core::MAX_TOLERANCE_WINDOW)
    pub window: u32,
    /// Failed submissions before the session is denied; unlimited if unset
    pub max_attempts: Option<u32>,
}

impl Default for TotpSettings {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            window: DEFAULT_TOLERANCE_WINDOW,
            max_attempts: None,
        }
    }
}

impl fmt::Debug for TotpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotpSettings")
            .field("secret", &"<redacted>")
            .field("window", &self.window)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Wake-on-LAN and polling settings. Durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WolSettings {
    /// Target MAC address, `AA:BB:CC:DD:EE:FF`
    pub mac: String,
    /// Overall budget for the target to come up
    pub timeout: u64,
    /// Pause between polls
    pub interval: u64,
    /// Budget for a single connect attempt
    pub probe_timeout: u64,
}

impl Default for WolSettings {
    fn default() -> Self {
        Self {
            mac: DEFAULT_MAC.to_string(),
            timeout: DEFAULT_OVERALL_TIMEOUT.as_secs(),
            interval: DEFAULT_POLL_INTERVAL.as_secs(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT.as_secs(),
        }
    }
}

/// Probe target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetSettings {
    /// Hostname or address literal
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self { host: DEFAULT_TARGET_HOST.to_string(), port: DEFAULT_TARGET_PORT }
    }
}

/// Status screen settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySettings {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Scalable font file
    pub font: PathBuf,
    /// Rasterization size in pixels
    pub font_size: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
            font: PathBuf::from(DEFAULT_FONT),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// - `SettingsError::Io` if the file cannot be read
    /// - `SettingsError::Parse` if it is not valid settings TOML
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let Some(path) = path else {
            tracing::debug!("no settings file given, using defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .map_err(|source| SettingsError::Io { path: path.to_path_buf(), source })?;
        let settings = Self::from_toml(&content)?;
        tracing::info!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Parse settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Parse` for invalid TOML, unknown keys or
    /// mistyped values.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Build a validated gate configuration.
    ///
    /// A malformed MAC address is not fatal: it is logged and the wake step is
    /// disabled while polling still runs.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` if the secret is not base32 or a port,
    /// timeout, interval or attempt limit is zero.
    pub fn gate_config(&self) -> Result<GateConfig, SettingsError> {
        let secret = SharedSecret::from_base32(&self.totp.secret)?;

        let mac_address = match self.wol.mac.parse::<MacAddress>() {
            Ok(mac) => Some(mac),
            Err(e) => {
                tracing::warn!(error = %e, "wake disabled");
                None
            },
        };

        let config = GateConfig {
            passcode: PasscodeConfig {
                secret,
                tolerance_window: self.totp.window,
                max_attempts: self.totp.max_attempts,
            },
            liveness: LivenessConfig {
                mac_address,
                target_host: self.target.host.clone(),
                target_port: self.target.port,
                overall_timeout: Duration::from_secs(self.wol.timeout),
                poll_interval: Duration::from_secs(self.wol.interval),
                probe_timeout: Duration::from_secs(self.wol.probe_timeout),
            },
            screen: ScreenSize { width: self.display.width, height: self.display.height },
        };
        config.validate()?;
        Ok(config)
    }
}
