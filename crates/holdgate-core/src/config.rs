//! Per-session gate configuration.
//!
//! A [`GateConfig`] is built once per session from the external settings and
//! handed to the [`crate::Gate`] by value. Nothing in it changes while the
//! gate runs.

use std::{fmt, str::FromStr, time::Duration};

use crate::{error::ConfigError, totp::SharedSecret};

/// Time-step tolerance used when `totp.window` is absent.
pub const DEFAULT_TOLERANCE_WINDOW: u32 = 30;

/// Largest accepted time-step tolerance (one hour either side).
///
/// Every submission computes `2 * window + 1` codes on the gate's thread.
pub const MAX_TOLERANCE_WINDOW: u32 = 120;

/// Overall liveness budget used when `wol.timeout` is absent.
pub const DEFAULT_OVERALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Spacing between liveness polls used when `wol.interval` is absent.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Bound on a single TCP connect attempt.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Target host used when `target.host` is absent.
pub const DEFAULT_TARGET_HOST: &str = "127.0.0.1";

/// Target port used when `target.port` is absent (RDP).
pub const DEFAULT_TARGET_PORT: u16 = 3389;

/// Status screen width in pixels.
pub const DEFAULT_SCREEN_WIDTH: u32 = 800;

/// Status screen height in pixels.
pub const DEFAULT_SCREEN_HEIGHT: u32 = 600;

/// A 48-bit hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Wrap raw address bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes in transmission order.
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = ConfigError;

    /// Parse the colon-separated `AA:BB:CC:DD:EE:FF` form. Hex digits are
    /// case-insensitive; each group is one or two digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidMac(s.to_string());

        let mut bytes = [0u8; 6];
        let mut groups = s.trim().split(':');
        for byte in &mut bytes {
            let group = groups.next().ok_or_else(invalid)?;
            if group.is_empty() || group.len() > 2 {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(group, 16).map_err(|_| invalid())?;
        }

        if groups.next().is_some() {
            return Err(invalid());
        }

        Ok(Self(bytes))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// Size of the client display the status screen is drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self { width: DEFAULT_SCREEN_WIDTH, height: DEFAULT_SCREEN_HEIGHT }
    }
}

/// Passcode strategy settings.
#[derive(Debug, Clone)]
pub struct PasscodeConfig {
    /// Secret shared with the user's authenticator
    pub secret: SharedSecret,
    /// Accepted clock skew, in 30-second steps either side of now
    pub tolerance_window: u32,
    /// Failed submissions allowed before the gate denies. `None` retries
    /// forever, until the client disconnects.
    pub max_attempts: Option<u32>,
}

/// Liveness strategy settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessConfig {
    /// Address woken with a magic packet. `None` skips the wake step.
    pub mac_address: Option<MacAddress>,
    /// Host probed for reachability (name, IPv4 or IPv6 literal)
    pub target_host: String,
    /// Port probed on `target_host`
    pub target_port: u16,
    /// Total time to wait for the target
    pub overall_timeout: Duration,
    /// Time between polls
    pub poll_interval: Duration,
    /// Bound on a single connect attempt
    pub probe_timeout: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            mac_address: None,
            target_host: DEFAULT_TARGET_HOST.to_string(),
            target_port: DEFAULT_TARGET_PORT,
            overall_timeout: DEFAULT_OVERALL_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// Immutable configuration for one gate invocation.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Passcode strategy settings
    pub passcode: PasscodeConfig,
    /// Liveness strategy settings
    pub liveness: LivenessConfig,
    /// Display the status screen is rendered for
    pub screen: ScreenSize,
}

impl GateConfig {
    /// Configuration with documented defaults around the given secret.
    pub fn new(secret: SharedSecret) -> Self {
        Self {
            passcode: PasscodeConfig {
                secret,
                tolerance_window: DEFAULT_TOLERANCE_WINDOW,
                max_attempts: None,
            },
            liveness: LivenessConfig::default(),
            screen: ScreenSize::default(),
        }
    }

    /// Check the invariants the gate relies on.
    ///
    /// # Errors
    ///
    /// - `ConfigError::ZeroPort` if the target port is 0
    /// - `ConfigError::ZeroDuration` if a timeout or interval is zero
    /// - `ConfigError::WindowTooLarge` above [`MAX_TOLERANCE_WINDOW`]
    /// - `ConfigError::ZeroAttempts` if an attempt limit of zero is set
    /// - `ConfigError::EmptyScreen` if either screen dimension is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let liveness = &self.liveness;
        if liveness.target_port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if liveness.overall_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration { field: "wol.timeout" });
        }
        if liveness.poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration { field: "wol.interval" });
        }
        if liveness.probe_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration { field: "wol.probe_timeout" });
        }
        if self.passcode.tolerance_window > MAX_TOLERANCE_WINDOW {
            return Err(ConfigError::WindowTooLarge {
                window: self.passcode.tolerance_window,
                max: MAX_TOLERANCE_WINDOW,
            });
        }
        if self.passcode.max_attempts == Some(0) {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(ConfigError::EmptyScreen {
                width: self.screen.width,
                height: self.screen.height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GateConfig {
        GateConfig::new(SharedSecret::from_bytes(b"12345678901234567890".to_vec()).unwrap())
    }

    #[test]
    fn parse_mac_address() {
        let mac: MacAddress = "00:11:22:aa:BB:ff".parse().unwrap();
        assert_eq!(mac.octets(), [0x00, 0x11, 0x22, 0xAA, 0xBB, 0xFF]);
        assert_eq!(mac.to_string(), "00:11:22:AA:BB:FF");
    }

    #[test]
    fn parse_mac_rejects_malformed() {
        for bad in [
            "",
            "00:11:22:33:44",
            "00:11:22:33:44:55:66",
            "00-11-22-33-44-55",
            "0g:11:22:33:44:55",
            "001:1:22:33:44:55",
        ] {
            assert_eq!(
                bad.parse::<MacAddress>(),
                Err(ConfigError::InvalidMac(bad.to_string())),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn defaults_validate() {
        assert_eq!(config().validate(), Ok(()));
    }

    #[test]
    fn zero_knobs_rejected() {
        let mut cfg = config();
        cfg.liveness.target_port = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroPort));

        let mut cfg = config();
        cfg.liveness.poll_interval = Duration::ZERO;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDuration { field: "wol.interval" }));

        let mut cfg = config();
        cfg.passcode.max_attempts = Some(0);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroAttempts));

        let mut cfg = config();
        cfg.screen.height = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyScreen { .. })));
    }

    #[test]
    fn tolerance_window_is_bounded() {
        let mut cfg = config();
        cfg.passcode.tolerance_window = MAX_TOLERANCE_WINDOW;
        assert_eq!(cfg.validate(), Ok(()));

        cfg.passcode.tolerance_window = MAX_TOLERANCE_WINDOW + 1;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::WindowTooLarge { window: 121, max: MAX_TOLERANCE_WINDOW })
        );

        cfg.passcode.tolerance_window = u32::MAX;
        assert!(matches!(cfg.validate(), Err(ConfigError::WindowTooLarge { .. })));
    }
}
