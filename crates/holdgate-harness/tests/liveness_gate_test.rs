//! Liveness gate scenarios under virtual time.
//!
//! # Test Strategy
//!
//! Each test runs the production [`GateRuntime`] against a scripted target
//! and a recording host. The virtual clock only moves when the runtime
//! sleeps, so elapsed time and probe counts are exact.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks on:
//! - the terminal outcome (never `Deny` for liveness)
//! - probe and wake counts seen by the prober
//! - elapsed virtual time and frames seen by the host

use std::time::Duration;

use holdgate_app::GateRuntime;
use holdgate_core::{
    GateConfig, GateOutcome, MacAddress, ScreenSize, SharedSecret, Strategy, env::Environment,
};
use holdgate_harness::{BlockGlyphs, Reachability, RecordingHost, ScriptedProber, SimEnv};
use proptest::prelude::*;

fn config(timeout_s: u64, interval_s: u64) -> GateConfig {
    let mut config = GateConfig::new(SharedSecret::from_base32("JBSWY3DPEHPK3PXP").unwrap());
    config.liveness.mac_address = Some(MacAddress::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]));
    config.liveness.overall_timeout = Duration::from_secs(timeout_s);
    config.liveness.poll_interval = Duration::from_secs(interval_s);
    config.screen = ScreenSize { width: 400, height: 40 };
    config
}

async fn run(
    config: GateConfig,
    env: &SimEnv,
    host: &RecordingHost,
    prober: &ScriptedProber,
) -> GateOutcome {
    GateRuntime::new(
        env.clone(),
        host.clone(),
        prober.clone(),
        BlockGlyphs::default(),
        config,
        Strategy::Liveness,
    )
    .run()
    .await
}

#[tokio::test]
async fn reachable_target_admits_without_polling() {
    let env = SimEnv::default();
    let host = RecordingHost::new();
    let prober = ScriptedProber::new(Reachability::Always);

    let outcome = run(config(60, 2), &env, &host, &prober).await;

    assert_eq!(outcome, GateOutcome::Allow);
    assert_eq!(prober.probes(), 1);
    assert_eq!(prober.wakes(), 0);
    assert_eq!(env.now(), Duration::ZERO);
    assert_eq!(host.frame_count(), 0);
}

#[tokio::test]
async fn target_up_after_k_polls() {
    let env = SimEnv::default();
    let host = RecordingHost::new();
    // Entry probe plus 4 failing polls, the 5th poll succeeds
    let prober = ScriptedProber::new(Reachability::AfterProbes(5));

    let outcome = run(config(60, 2), &env, &host, &prober).await;

    assert_eq!(outcome, GateOutcome::Allow);
    assert_eq!(prober.probes(), 5 + 1);
    assert_eq!(prober.wakes(), 1);
    assert_eq!(env.now(), Duration::from_secs(10));
    // One status frame before each wait, nothing on success
    assert_eq!(host.frame_count(), 5);
    assert!(host.frames().iter().all(|f| f.lit_pixels() > 0));
}

#[tokio::test]
async fn unreachable_target_times_out() {
    let env = SimEnv::default();
    let host = RecordingHost::new();
    let prober = ScriptedProber::new(Reachability::Never);

    let outcome = run(config(7, 3), &env, &host, &prober).await;

    // Probes at 0, 3 and 6 s; the wait ending at 9 s is past the 7 s budget
    assert_eq!(outcome, GateOutcome::Timeout);
    assert_eq!(prober.probes(), 3);
    assert_eq!(prober.wakes(), 1);
    assert_eq!(env.now(), Duration::from_secs(9));
}

#[tokio::test]
async fn target_answering_after_budget_is_not_admitted() {
    let env = SimEnv::default();
    let host = RecordingHost::new();
    // Would answer the fourth probe, due at 9 s
    let prober = ScriptedProber::new(Reachability::AfterProbes(3));

    let outcome = run(config(7, 3), &env, &host, &prober).await;

    assert_eq!(outcome, GateOutcome::Timeout);
    assert_eq!(prober.probes(), 3);
    assert_eq!(env.now(), Duration::from_secs(9));
}

#[tokio::test]
async fn disconnect_mid_wait_stops_polling() {
    let env = SimEnv::default();
    let host = RecordingHost::disconnecting_after(3);
    let prober = ScriptedProber::new(Reachability::Never);

    let outcome = run(config(60, 2), &env, &host, &prober).await;

    assert_eq!(outcome, GateOutcome::Disconnected);
    // Three waits went ahead, the fourth check saw the client gone
    assert_eq!(host.checks(), 4);
    assert_eq!(prober.probes(), 1 + 3);
    assert_eq!(env.now(), Duration::from_secs(6));
}

#[tokio::test]
async fn wake_failure_is_not_fatal() {
    let env = SimEnv::default();
    let host = RecordingHost::new();
    let prober = ScriptedProber::new(Reachability::AfterProbes(2)).failing_wake();

    let outcome = run(config(60, 2), &env, &host, &prober).await;

    assert_eq!(outcome, GateOutcome::Allow);
    assert_eq!(prober.wakes(), 1);
    assert_eq!(prober.probes(), 3);
}

#[tokio::test]
async fn missing_mac_skips_wake_but_polls() {
    let env = SimEnv::default();
    let host = RecordingHost::new();
    let prober = ScriptedProber::new(Reachability::AfterProbes(3));
    let mut config = config(60, 2);
    config.liveness.mac_address = None;

    let outcome = run(config, &env, &host, &prober).await;

    assert_eq!(outcome, GateOutcome::Allow);
    assert_eq!(prober.wakes(), 0);
    assert_eq!(prober.probes(), 4);
}

#[tokio::test]
async fn rejected_frames_do_not_stop_gate() {
    let env = SimEnv::default();
    let host = RecordingHost::new().rejecting_frames();
    let prober = ScriptedProber::new(Reachability::AfterProbes(2));

    let outcome = run(config(60, 2), &env, &host, &prober).await;

    assert_eq!(outcome, GateOutcome::Allow);
    assert_eq!(host.frame_count(), 0);
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(future)
}

proptest! {
    /// A target that comes up after `k` polls, with `k * interval` inside the
    /// budget, is admitted after exactly `k + 1` probes.
    #[test]
    fn prop_admits_after_k_polls(k in 1u32..20, interval_s in 1u64..10, slack in 1u64..30) {
        let timeout_s = u64::from(k) * interval_s + slack;
        let env = SimEnv::default();
        let host = RecordingHost::new();
        let prober = ScriptedProber::new(Reachability::AfterProbes(k));

        let outcome = block_on(run(config(timeout_s, interval_s), &env, &host, &prober));

        prop_assert_eq!(outcome, GateOutcome::Allow);
        prop_assert_eq!(prober.probes(), k + 1);
        prop_assert_eq!(env.now(), Duration::from_secs(u64::from(k) * interval_s));
    }

    /// A target that never comes up times out after `ceil(timeout / interval)`
    /// probes, entry probe included, no more, no fewer.
    #[test]
    fn prop_never_reachable_polls_ceil(timeout_s in 1u64..120, interval_s in 1u64..15) {
        let env = SimEnv::default();
        let host = RecordingHost::new();
        let prober = ScriptedProber::new(Reachability::Never);

        let outcome = block_on(run(config(timeout_s, interval_s), &env, &host, &prober));

        let probes = timeout_s.div_ceil(interval_s);
        prop_assert_eq!(outcome, GateOutcome::Timeout);
        prop_assert_eq!(u64::from(prober.probes()), probes);
        prop_assert_eq!(prober.wakes(), 1);
        prop_assert_eq!(env.now(), Duration::from_secs(probes * interval_s));
    }

    /// Disconnecting at any check point ends the gate as `Disconnected`.
    #[test]
    fn prop_disconnect_never_admits(after in 0u32..40) {
        let env = SimEnv::default();
        let host = RecordingHost::disconnecting_after(after);
        let prober = ScriptedProber::new(Reachability::Never);

        let outcome = block_on(run(config(60, 2), &env, &host, &prober));

        // 30 probes fit the budget, each followed by one check; later
        // disconnects are never observed
        if after < 30 {
            prop_assert_eq!(outcome, GateOutcome::Disconnected);
        } else {
            prop_assert_eq!(outcome, GateOutcome::Timeout);
        }
    }
}
