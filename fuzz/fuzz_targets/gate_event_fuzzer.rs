//! Fuzz target for the admission gate state machine
//!
//! # Strategy
//!
//! - Both strategies, with and without an attempt limit or MAC address
//! - Arbitrary scan codes and flags, including releases and unmapped keys
//! - Probe results and waits in any order, with time moving forward only
//! - Disconnects at any point, and events after the gate has finished
//!
//! # Invariants
//!
//! - Exactly one `Finish` action over the gate's life, and it is last
//! - `Finish` carries a terminal outcome matching `Gate::outcome`
//! - Liveness never denies; passcode denies only with an attempt limit
//! - A finished gate refuses every event without changing its outcome

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use holdgate_core::{
    Gate, GateAction, GateConfig, GateEvent, GateOutcome, GateState, MacAddress, SharedSecret,
    Strategy,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Setup {
    liveness: bool,
    max_attempts: Option<u8>,
    with_mac: bool,
    timeout_s: u8,
    interval_s: u8,
    ops: Vec<Op>,
}

#[derive(Debug, Arbitrary)]
enum Op {
    Key { scan_code: u16, flags: u16, unix_time: u32 },
    Probe { reachable: bool, advance_ms: u16 },
    Wait { advance_ms: u16 },
    Disconnect,
}

fuzz_target!(|setup: Setup| {
    let secret = SharedSecret::from_bytes(b"12345678901234567890".to_vec()).unwrap();
    let mut config = GateConfig::new(secret);
    config.passcode.max_attempts = setup.max_attempts.map(|n| u32::from(n).max(1));
    config.liveness.mac_address =
        setup.with_mac.then(|| MacAddress::new([0x02, 0, 0, 0, 0, 0x01]));
    config.liveness.overall_timeout = Duration::from_secs(u64::from(setup.timeout_s).max(1));
    config.liveness.poll_interval = Duration::from_secs(u64::from(setup.interval_s).max(1));

    let strategy = if setup.liveness { Strategy::Liveness } else { Strategy::Passcode };
    let has_limit = config.passcode.max_attempts.is_some();
    let mut gate: Gate<Duration> = Gate::new(config, strategy);
    let mut now = Duration::ZERO;
    let mut finished = false;

    let mut check = |actions: Vec<GateAction>, gate: &Gate<Duration>| {
        for (i, action) in actions.iter().enumerate() {
            if let GateAction::Finish(outcome) = action {
                assert!(!finished, "second Finish action");
                assert_eq!(i, actions.len() - 1, "Finish was not the last action");
                assert!(outcome.is_terminal());
                assert_eq!(*outcome, gate.outcome());
                if *outcome == GateOutcome::Deny {
                    assert_eq!(strategy, Strategy::Passcode, "liveness denied");
                    assert!(has_limit, "denied without an attempt limit");
                }
                finished = true;
            }
        }
    };

    let actions = gate.start(now).unwrap();
    check(actions, &gate);

    for op in setup.ops {
        let event = match op {
            Op::Key { scan_code, flags, unix_time } => {
                GateEvent::Key { scan_code, flags, unix_time: u64::from(unix_time) }
            },
            Op::Probe { reachable, advance_ms } => {
                now += Duration::from_millis(u64::from(advance_ms));
                GateEvent::ProbeCompleted { reachable, now }
            },
            Op::Wait { advance_ms } => {
                now += Duration::from_millis(u64::from(advance_ms));
                GateEvent::WaitElapsed { now }
            },
            Op::Disconnect => GateEvent::Disconnected,
        };

        let before = gate.state();
        match gate.handle(event) {
            Ok(actions) => {
                assert_eq!(before, GateState::AwaitingSignal);
                check(actions, &gate);
            },
            Err(_) => assert_eq!(gate.state(), before, "rejected event changed state"),
        }
    }
});
