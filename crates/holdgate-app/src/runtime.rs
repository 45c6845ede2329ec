//! Generic runtime that executes gate actions.
//!
//! The runtime drives one [`Gate`] for one session, coordinating between:
//! - [`Gate`]: admission state machine (pure)
//! - [`SessionHost`]: disconnect flag and display surface
//! - [`Prober`]: reachability probe and magic packet
//! - [`KeyReceiver`]: key events from the host's dispatch context
//!
//! Time comes from the [`Environment`], so the same loop runs against the
//! wall clock in production and a virtual clock in simulation.

use std::{collections::VecDeque, time::Duration};

use holdgate_core::{
    FrameBuffer, Gate, GateAction, GateConfig, GateError, GateEvent, GateOutcome, GlyphSource,
    Strategy, env::Environment, render_text,
};

use crate::{KeyPress, KeyReceiver, Prober, SessionHost};

/// How often the disconnect flag is re-checked while waiting for a key.
pub const DISCONNECT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Runtime that owns a gate and executes its actions.
///
/// # Type Parameters
///
/// - `E`: Environment providing time and sleep
/// - `H`: Host holding the session
/// - `P`: Network prober for the liveness strategy
/// - `G`: Glyph source for status frames
pub struct GateRuntime<E, H, P, G>
where
    E: Environment,
    H: SessionHost,
    P: Prober,
    G: GlyphSource,
{
    env: E,
    host: H,
    prober: P,
    glyphs: G,
    gate: Gate<E::Instant>,
    keys: Option<KeyReceiver>,
}

impl<E, H, P, G> GateRuntime<E, H, P, G>
where
    E: Environment,
    H: SessionHost,
    P: Prober,
    G: GlyphSource,
{
    /// Create a runtime for a fresh gate.
    pub fn new(
        env: E,
        host: H,
        prober: P,
        glyphs: G,
        config: GateConfig,
        strategy: Strategy,
    ) -> Self {
        Self { env, host, prober, glyphs, gate: Gate::new(config, strategy), keys: None }
    }

    /// Attach the receiving end of the session's key channel.
    ///
    /// Required for the passcode strategy; a passcode gate without keys is
    /// treated as disconnected.
    #[must_use]
    pub fn with_keys(mut self, keys: KeyReceiver) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Run the gate to completion and return its terminal outcome.
    ///
    /// Never returns [`GateOutcome::Pending`]. Render, submit and wake
    /// failures are logged and do not end the gate.
    pub async fn run(mut self) -> GateOutcome {
        let strategy = self.gate.strategy();
        tracing::info!(strategy = strategy.name(), "holding session");

        let mut pending: VecDeque<GateAction> = match self.gate.start(self.env.now()) {
            Ok(actions) => actions.into(),
            Err(e) => return fail_closed(&e),
        };

        loop {
            let event = match pending.pop_front() {
                Some(action) => match self.execute(action).await {
                    Step::Continue => continue,
                    Step::Feed(event) => event,
                    Step::Done(outcome) => {
                        tracing::info!(strategy = strategy.name(), ?outcome, "gate finished");
                        return outcome;
                    },
                },
                None => self.next_key_event().await,
            };

            match self.gate.handle(event) {
                Ok(actions) => pending.extend(actions),
                Err(e) => return fail_closed(&e),
            }
        }
    }

    async fn execute(&mut self, action: GateAction) -> Step<E::Instant> {
        match action {
            GateAction::Render(text) => {
                self.render(&text);
                Step::Continue
            },
            GateAction::SendWake(mac) => {
                match self.prober.wake(mac).await {
                    Ok(()) => tracing::info!(%mac, "wake packet sent"),
                    Err(e) => tracing::warn!(%mac, error = %e, "failed to send wake packet"),
                }
                Step::Continue
            },
            GateAction::Probe => {
                let liveness = &self.gate.config().liveness;
                let reachable = self
                    .prober
                    .is_reachable(&liveness.target_host, liveness.target_port, liveness.probe_timeout)
                    .await;
                tracing::debug!(reachable, "probe finished");
                Step::Feed(GateEvent::ProbeCompleted { reachable, now: self.env.now() })
            },
            GateAction::Wait(duration) => {
                if self.host.shall_disconnect() {
                    return Step::Feed(GateEvent::Disconnected);
                }
                self.env.sleep(duration).await;
                Step::Feed(GateEvent::WaitElapsed { now: self.env.now() })
            },
            GateAction::Finish(outcome) => Step::Done(outcome),
        }
    }

    /// Block until a key arrives, re-checking the disconnect flag every
    /// [`DISCONNECT_CHECK_INTERVAL`].
    async fn next_key_event(&mut self) -> GateEvent<E::Instant> {
        let Some(keys) = self.keys.as_mut() else {
            tracing::warn!("gate is waiting for keys but has no key source");
            return GateEvent::Disconnected;
        };

        loop {
            if self.host.shall_disconnect() {
                return GateEvent::Disconnected;
            }

            tokio::select! {
                biased;

                key = keys.recv() => {
                    return match key {
                        Some(KeyPress { scan_code, flags }) => {
                            GateEvent::Key { scan_code, flags, unix_time: self.env.unix_time() }
                        },
                        None => {
                            tracing::debug!("key channel closed");
                            GateEvent::Disconnected
                        },
                    };
                },
                () = self.env.sleep(DISCONNECT_CHECK_INTERVAL) => {},
            }
        }
    }

    fn render(&self, text: &str) {
        let mut frame = match FrameBuffer::try_new(self.gate.config().screen) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "status frame skipped");
                return;
            },
        };

        render_text(&mut frame, &self.glyphs, text);
        if let Err(e) = self.host.submit_frame(&frame.as_bitmap()) {
            tracing::warn!(error = %e, "failed to submit status frame");
        }
    }
}

enum Step<I> {
    Continue,
    Feed(GateEvent<I>),
    Done(GateOutcome),
}

// A gate that refuses the driver's own events cannot make a decision; keep
// the session out.
fn fail_closed(error: &GateError) -> GateOutcome {
    tracing::error!(%error, "gate driver fault, refusing session");
    GateOutcome::Deny
}
