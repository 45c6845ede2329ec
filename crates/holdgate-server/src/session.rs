//! Blocking host adapter.
//!
//! Proxies call their session-start hook synchronously on the thread that
//! establishes the session. [`SessionGate`] bridges that hook to the async
//! [`GateRuntime`] by driving it on a current-thread Tokio runtime built for
//! the one session, so concurrent sessions never share gate state.

use holdgate_app::{GateRuntime, KeyReceiver, SessionHost};
use holdgate_core::{GateConfig, GateOutcome, Strategy};

use crate::{FontGlyphs, NetProber, Settings, SystemEnv, error::SettingsError};

/// Per-proxy admission gate factory.
///
/// Holds only immutable configuration; every session gets its own gate.
#[derive(Debug)]
pub struct SessionGate {
    config: GateConfig,
    strategy: Strategy,
    font: Option<FontGlyphs>,
    prober: NetProber,
}

impl SessionGate {
    /// Gate with an explicit configuration and optional status font.
    pub fn new(config: GateConfig, strategy: Strategy, font: Option<FontGlyphs>) -> Self {
        Self { config, strategy, font, prober: NetProber::new() }
    }

    /// Gate built from a settings file.
    ///
    /// A font that cannot be loaded is logged and leaves the status screen
    /// blank; it does not fail the gate.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` if the settings do not form a valid
    /// gate configuration.
    pub fn from_settings(settings: &Settings, strategy: Strategy) -> Result<Self, SettingsError> {
        let config = settings.gate_config()?;
        let display = &settings.display;
        let font = FontGlyphs::load_or_warn(&display.font, display.font_size as f32);
        Ok(Self::new(config, strategy, font))
    }

    /// Strategy this gate applies.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Validated configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Hold a session on the calling thread until the gate decides.
    ///
    /// Returns whether the session may proceed. `keys` is the receiving end of
    /// the session's key channel; the liveness strategy never reads it. Fails
    /// closed if the session runtime cannot be built, or if called from a
    /// thread that is already inside a Tokio runtime (use [`Self::run`]
    /// there).
    pub fn on_session_start<H: SessionHost>(&self, host: &H, keys: KeyReceiver) -> bool {
        if tokio::runtime::Handle::try_current().is_ok() {
            tracing::error!("session hook called inside a Tokio runtime, refusing session");
            return false;
        }

        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(error = %e, "cannot build session runtime, refusing session");
                return false;
            },
        };

        runtime.block_on(self.run(host, keys)).admits()
    }

    /// Hold a session inside an existing Tokio runtime.
    pub async fn run<H: SessionHost>(&self, host: &H, keys: KeyReceiver) -> GateOutcome {
        GateRuntime::new(
            SystemEnv::new(),
            host,
            self.prober,
            self.font.as_ref(),
            self.config.clone(),
            self.strategy,
        )
        .with_keys(keys)
        .run()
        .await
    }
}
