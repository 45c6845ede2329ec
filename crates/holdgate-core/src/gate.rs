//! Admission gate state machine.
//!
//! Holds a session at the proxy until an external condition is verified. Uses
//! the action pattern: methods take time as input and return actions for the
//! driver to execute. The gate never sleeps, probes or draws by itself, which
//! keeps it pure and lets tests drive it with a virtual clock.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐  start   ┌────────────────┐  code accepted / target up  ┌───────┐
//! │ Init │─────────>│ AwaitingSignal │────────────────────────────>│ Allow │
//! └──────┘          └────────────────┘                             └───────┘
//!                      │    ↑     │
//!        wrong code    │    │     │ attempts exhausted ─────────> Deny
//!        (retry)       └────┘     │ budget exhausted ───────────> Timeout
//!                                 │ client hung up ─────────────> Disconnected
//! ```
//!
//! # Strategies
//!
//! - [`Strategy::Passcode`]: key events build a six-digit code that is checked
//!   against the shared secret. Wrong codes send the gate back to waiting.
//! - [`Strategy::Liveness`]: the target is probed; if it is down a magic packet
//!   is sent and the target is polled until it answers or the budget runs out.
//!   An absent target is always `Timeout`, never `Deny`.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use crate::{
    collector::{CodeCollector, CollectorEvent, KBD_FLAGS_RELEASE},
    config::{GateConfig, MacAddress},
    error::GateError,
    totp::{self, CODE_DIGITS},
};

/// Signal source the gate waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Interactive one-time passcode typed by the client
    Passcode,
    /// Wake the target and wait until it accepts connections
    Liveness,
}

impl Strategy {
    /// Lowercase name used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            Self::Passcode => "passcode",
            Self::Liveness => "liveness",
        }
    }
}

/// Admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Still waiting. Never returned to the host.
    Pending,
    /// Session may proceed
    Allow,
    /// Verification failed for good
    Deny,
    /// Signal did not arrive within the budget
    Timeout,
    /// Client hung up while waiting
    Disconnected,
}

impl GateOutcome {
    /// Whether this value ends the gate.
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }

    /// Whether the host should continue the session.
    pub fn admits(self) -> bool {
        self == Self::Allow
    }
}

/// Gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Created, not yet started
    Init,
    /// Waiting for a key event or a poll result
    AwaitingSignal,
    /// Terminal outcome reached
    Finished(GateOutcome),
}

/// Inputs to the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent<I> {
    /// Raw keyboard event from the client (passcode strategy)
    Key {
        /// RDP scan code
        scan_code: u16,
        /// RDP keyboard flags
        flags: u16,
        /// Wall-clock seconds since the Unix epoch
        unix_time: u64,
    },

    /// A reachability probe finished (liveness strategy)
    ProbeCompleted {
        /// Whether the target accepted the connection
        reachable: bool,
        /// When the probe finished
        now: I,
    },

    /// A requested [`GateAction::Wait`] ran to completion (liveness strategy)
    WaitElapsed {
        /// When the wait ended
        now: I,
    },

    /// Host reported that the client connection is gone
    Disconnected,
}

impl<I> GateEvent<I> {
    fn name(&self) -> &'static str {
        match self {
            Self::Key { .. } => "key",
            Self::ProbeCompleted { .. } => "probe",
            Self::WaitElapsed { .. } => "wait",
            Self::Disconnected => "disconnect",
        }
    }
}

/// Actions returned by the gate.
///
/// The driver executes them in order:
/// - `Render`: rasterize the text and submit it to the client display
/// - `SendWake`: broadcast a magic packet, best effort
/// - `Probe`: test target reachability, then feed `ProbeCompleted`
/// - `Wait`: check for disconnect, sleep, then feed `WaitElapsed`
/// - `Finish`: return the outcome to the host; always last
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    /// Show this status line
    Render(String),
    /// Send a magic packet to this address
    SendWake(MacAddress),
    /// Probe the configured target
    Probe,
    /// Sleep before the next poll
    Wait(Duration),
    /// Gate is done; carries a terminal outcome
    Finish(GateOutcome),
}

#[derive(Debug, Clone)]
enum Signal<I> {
    Passcode { collector: CodeCollector, failed: bool, attempts: u32 },
    Liveness { started: Option<I>, probes: u32 },
}

/// Admission gate for one session.
///
/// Pure state machine: no I/O, no environment storage. Time is passed into
/// the methods that need it. Generic over `Instant` to support both real and
/// virtual time.
#[derive(Debug, Clone)]
pub struct Gate<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    config: GateConfig,
    strategy: Strategy,
    state: GateState,
    signal: Signal<I>,
}

impl<I> Gate<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a gate in [`GateState::Init`].
    pub fn new(config: GateConfig, strategy: Strategy) -> Self {
        let signal = match strategy {
            Strategy::Passcode => {
                Signal::Passcode { collector: CodeCollector::new(), failed: false, attempts: 0 }
            },
            Strategy::Liveness => Signal::Liveness { started: None, probes: 0 },
        };
        Self { config, strategy, state: GateState::Init, signal }
    }

    /// Current state.
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Signal source this gate waits on.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Configuration the gate was built with.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Terminal outcome, or [`GateOutcome::Pending`] while still waiting.
    pub fn outcome(&self) -> GateOutcome {
        match self.state {
            GateState::Finished(outcome) => outcome,
            GateState::Init | GateState::AwaitingSignal => GateOutcome::Pending,
        }
    }

    /// Digits entered so far. Empty for the liveness strategy.
    pub fn code(&self) -> &str {
        match &self.signal {
            Signal::Passcode { collector, .. } => collector.code(),
            Signal::Liveness { .. } => "",
        }
    }

    /// Failed passcode submissions so far.
    pub fn attempts(&self) -> u32 {
        match &self.signal {
            Signal::Passcode { attempts, .. } => *attempts,
            Signal::Liveness { .. } => 0,
        }
    }

    /// Reachability probes issued, including the initial one.
    pub fn probes(&self) -> u32 {
        match &self.signal {
            Signal::Liveness { probes, .. } => *probes,
            Signal::Passcode { .. } => 0,
        }
    }

    /// Probes issued after the initial one, i.e. after a wait.
    pub fn polls(&self) -> u32 {
        self.probes().saturating_sub(1)
    }

    /// Leave [`GateState::Init`] and produce the first actions.
    ///
    /// # Errors
    ///
    /// - `GateError::InvalidState` if the gate was already started
    pub fn start(&mut self, now: I) -> Result<Vec<GateAction>, GateError> {
        if self.state != GateState::Init {
            return Err(GateError::InvalidState { state: self.state, operation: "start" });
        }

        self.state = GateState::AwaitingSignal;
        tracing::debug!(strategy = self.strategy.name(), "admission gate started");

        match &mut self.signal {
            Signal::Passcode { collector, failed, attempts } => {
                collector.clear();
                *failed = false;
                *attempts = 0;
                Ok(vec![GateAction::Render(self.prompt())])
            },
            Signal::Liveness { started, probes } => {
                *started = Some(now);
                *probes = 1;
                Ok(vec![GateAction::Probe])
            },
        }
    }

    /// Process an event and return the resulting actions.
    ///
    /// # Errors
    ///
    /// - `GateError::InvalidState` if the gate is not awaiting a signal
    /// - `GateError::UnexpectedEvent` if the event belongs to the other
    ///   strategy
    pub fn handle(&mut self, event: GateEvent<I>) -> Result<Vec<GateAction>, GateError> {
        if self.state != GateState::AwaitingSignal {
            return Err(GateError::InvalidState { state: self.state, operation: "handle" });
        }

        match (self.strategy, event) {
            (_, GateEvent::Disconnected) => Ok(self.handle_disconnect()),
            (Strategy::Passcode, GateEvent::Key { scan_code, flags, unix_time }) => {
                Ok(self.handle_key(scan_code, flags, unix_time))
            },
            (Strategy::Liveness, GateEvent::ProbeCompleted { reachable, now }) => {
                self.handle_probe(reachable, now)
            },
            (Strategy::Liveness, GateEvent::WaitElapsed { now }) => self.handle_wait_elapsed(now),
            (strategy, event) => Err(GateError::UnexpectedEvent {
                event: event.name(),
                strategy: strategy.name(),
            }),
        }
    }

    fn handle_disconnect(&mut self) -> Vec<GateAction> {
        tracing::info!(strategy = self.strategy.name(), "client disconnected while gated");
        match self.strategy {
            Strategy::Passcode => vec![
                GateAction::Render("Verification aborted".to_string()),
                self.finish(GateOutcome::Disconnected),
            ],
            Strategy::Liveness => vec![self.finish(GateOutcome::Disconnected)],
        }
    }

    fn handle_key(&mut self, scan_code: u16, flags: u16, unix_time: u64) -> Vec<GateAction> {
        let Signal::Passcode { collector, .. } = &mut self.signal else {
            return vec![];
        };

        let is_key_down = flags & KBD_FLAGS_RELEASE == 0;
        if !is_key_down {
            return vec![];
        }

        let event = collector.on_key_event(scan_code, is_key_down);
        tracing::trace!(scan_code, ?event, "key event");
        if event != CollectorEvent::Submit {
            return vec![GateAction::Render(self.prompt())];
        }

        self.submit(unix_time)
    }

    fn submit(&mut self, unix_time: u64) -> Vec<GateAction> {
        let max_attempts = self.config.passcode.max_attempts;
        let Signal::Passcode { collector, failed, attempts } = &mut self.signal else {
            return vec![];
        };

        let passcode = &self.config.passcode;
        let matched =
            totp::matching_step(&passcode.secret, passcode.tolerance_window, collector.code(), unix_time);
        match matched {
            Some(drift) => {
                tracing::info!(drift, "passcode accepted");
                vec![
                    GateAction::Render("Passcode accepted".to_string()),
                    self.finish(GateOutcome::Allow),
                ]
            },
            None => {
                collector.clear();
                *failed = true;
                *attempts = attempts.saturating_add(1);
                tracing::info!(attempts = *attempts, "passcode rejected");

                if max_attempts.is_some_and(|max| *attempts >= max) {
                    return vec![
                        GateAction::Render("Passcode rejected".to_string()),
                        self.finish(GateOutcome::Deny),
                    ];
                }
                vec![GateAction::Render(self.prompt())]
            },
        }
    }

    fn handle_probe(&mut self, reachable: bool, now: I) -> Result<Vec<GateAction>, GateError> {
        let Signal::Liveness { started: Some(started), probes } = self.signal else {
            return Err(GateError::InvalidState { state: self.state, operation: "probe" });
        };

        let liveness = &self.config.liveness;
        let elapsed = now - started;

        if reachable {
            tracing::info!(?elapsed, probes, "target is up");
            return Ok(vec![self.finish(GateOutcome::Allow)]);
        }

        let mut actions = Vec::new();
        if probes == 1 {
            match liveness.mac_address {
                Some(mac) => actions.push(GateAction::SendWake(mac)),
                None => tracing::warn!("no valid MAC address configured, skipping wake"),
            }
        }

        tracing::debug!(?elapsed, probes, "target not reachable yet");
        actions.push(GateAction::Render(format!(
            "Waking {}... ({}/{} s)",
            liveness.target_host,
            elapsed.as_secs(),
            liveness.overall_timeout.as_secs()
        )));
        actions.push(GateAction::Wait(liveness.poll_interval));
        Ok(actions)
    }

    // The budget is checked before every re-probe, so no probe is issued
    // once `overall_timeout` has elapsed.
    fn handle_wait_elapsed(&mut self, now: I) -> Result<Vec<GateAction>, GateError> {
        let Signal::Liveness { started: Some(started), probes } = &mut self.signal else {
            return Err(GateError::InvalidState { state: self.state, operation: "wait" });
        };

        let elapsed = now - *started;
        if elapsed >= self.config.liveness.overall_timeout {
            tracing::info!(?elapsed, probes = *probes, "target did not come up in time");
            return Ok(vec![self.finish(GateOutcome::Timeout)]);
        }

        *probes = probes.saturating_add(1);
        tracing::trace!(?elapsed, "poll interval elapsed");
        Ok(vec![GateAction::Probe])
    }

    fn finish(&mut self, outcome: GateOutcome) -> GateAction {
        debug_assert!(outcome.is_terminal());
        if let Signal::Passcode { collector, .. } = &mut self.signal {
            collector.clear();
        }
        self.state = GateState::Finished(outcome);
        GateAction::Finish(outcome)
    }

    fn prompt(&self) -> String {
        let (code, failed) = match &self.signal {
            Signal::Passcode { collector, failed, .. } => (collector.code(), *failed),
            Signal::Liveness { .. } => ("", false),
        };
        let blanks = "_".repeat(CODE_DIGITS - code.len());
        if failed {
            format!("Wrong passcode, try again: {code}{blanks}")
        } else {
            format!("Enter passcode: {code}{blanks}")
        }
    }
}
