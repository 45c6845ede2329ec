//! Passcode gate scenarios under virtual time.
//!
//! Keys travel through the real key channel, either queued before the run or
//! typed by a concurrent task, so the handoff between the host's dispatch
//! context and the waiting gate is exercised the same way as in production.

use std::time::Duration;

use holdgate_app::{
    DISCONNECT_CHECK_INTERVAL, GateRuntime, KeyReceiver, KeySender, key_channel,
};
use holdgate_core::{
    GateConfig, GateOutcome, KBD_FLAGS_RELEASE, SCAN_BACKSPACE, SCAN_DIGITS, SCAN_ENTER,
    ScreenSize, SharedSecret, Strategy, env::Environment, totp,
};
use holdgate_harness::{BlockGlyphs, Reachability, RecordingHost, ScriptedProber, SimEnv};

const EPOCH: u64 = 1_700_000_010;

fn secret() -> SharedSecret {
    SharedSecret::from_base32("JBSWY3DPEHPK3PXP").unwrap()
}

fn config() -> GateConfig {
    let mut config = GateConfig::new(secret());
    config.passcode.tolerance_window = 1;
    config.screen = ScreenSize { width: 400, height: 40 };
    config
}

fn current_code() -> String {
    totp::expected_code(&secret(), EPOCH)
}

/// A code that is wrong for every step around `EPOCH`.
fn wrong_code() -> String {
    let window: Vec<String> = (-2i64..=2)
        .map(|step| totp::expected_code(&secret(), EPOCH.saturating_add_signed(step * 30)))
        .collect();
    (0..10)
        .map(|d| d.to_string().repeat(6))
        .find(|candidate| !window.contains(candidate))
        .unwrap()
}

fn type_code(keys: &KeySender, code: &str) {
    for ch in code.chars() {
        let scan_code = SCAN_DIGITS[ch.to_digit(10).unwrap() as usize];
        keys.on_key_event(scan_code, 0);
        keys.on_key_event(scan_code, KBD_FLAGS_RELEASE);
    }
    keys.on_key_event(SCAN_ENTER, 0);
}

/// Pixels the block glyph source lights for `text`.
fn lit_for(text: &str) -> usize {
    text.chars().filter(char::is_ascii_graphic).count() * 6 * 10
}

async fn run(
    config: GateConfig,
    env: &SimEnv,
    host: &RecordingHost,
    keys: KeyReceiver,
) -> GateOutcome {
    GateRuntime::new(
        env.clone(),
        host.clone(),
        ScriptedProber::new(Reachability::Never),
        BlockGlyphs::default(),
        config,
        Strategy::Passcode,
    )
    .with_keys(keys)
    .run()
    .await
}

#[tokio::test]
async fn correct_code_first_attempt_admits() {
    let env = SimEnv::new(EPOCH);
    let host = RecordingHost::new();
    let (keys, rx) = key_channel();
    type_code(&keys, &current_code());

    let outcome = run(config(), &env, &host, rx).await;

    assert_eq!(outcome, GateOutcome::Allow);
    let frames = host.frames();
    // Prompt, six digits, success
    assert_eq!(frames.len(), 1 + 6 + 1);
    assert_eq!(frames[0].lit_pixels(), lit_for("Enter passcode: ______"));
    assert_eq!(frames[7].lit_pixels(), lit_for("Passcode accepted"));
}

#[tokio::test]
async fn retries_are_unbounded_by_default() {
    let env = SimEnv::new(EPOCH);
    let host = RecordingHost::new();
    let (keys, rx) = key_channel();
    for _ in 0..10 {
        type_code(&keys, &wrong_code());
    }
    type_code(&keys, &current_code());

    let outcome = run(config(), &env, &host, rx).await;

    assert_eq!(outcome, GateOutcome::Allow);
    // Each failed Enter shows the retry prompt with an empty buffer
    let frames = host.frames();
    assert_eq!(frames[7].lit_pixels(), lit_for("Wrong passcode, try again: ______"));
    assert_eq!(frames.len(), 1 + 11 * 7);
}

#[tokio::test]
async fn attempt_limit_denies() {
    let env = SimEnv::new(EPOCH);
    let host = RecordingHost::new();
    let (keys, rx) = key_channel();
    for _ in 0..3 {
        type_code(&keys, &wrong_code());
    }
    type_code(&keys, &current_code());

    let mut config = config();
    config.passcode.max_attempts = Some(3);
    let outcome = run(config, &env, &host, rx).await;

    assert_eq!(outcome, GateOutcome::Deny);
    let frames = host.frames();
    assert_eq!(frames.last().unwrap().lit_pixels(), lit_for("Passcode rejected"));
}

#[tokio::test]
async fn editing_keys_render_and_releases_do_not() {
    let env = SimEnv::new(EPOCH);
    let host = RecordingHost::new();
    let (keys, rx) = key_channel();
    let code = current_code();

    // Submit early, erase past empty, press an unmapped key, then the real code
    type_code(&keys, "1234");
    for _ in 0..6 {
        keys.on_key_event(SCAN_BACKSPACE, 0);
        keys.on_key_event(SCAN_BACKSPACE, KBD_FLAGS_RELEASE);
    }
    keys.on_key_event(0x1E, 0);
    type_code(&keys, &code);

    let outcome = run(config(), &env, &host, rx).await;

    assert_eq!(outcome, GateOutcome::Allow);
    // Prompt + (4 digits + Enter) + 6 backspaces + 1 unmapped + (6 digits + Enter)
    assert_eq!(host.frame_count(), 1 + 5 + 6 + 1 + 7);
    assert_eq!(host.frames()[5].lit_pixels(), lit_for("Enter passcode: 1234__"));
}

#[tokio::test]
async fn disconnect_while_waiting_for_keys() {
    let env = SimEnv::new(EPOCH);
    let host = RecordingHost::disconnecting_after(5);
    let (_keys, rx) = key_channel();

    let outcome = run(config(), &env, &host, rx).await;

    assert_eq!(outcome, GateOutcome::Disconnected);
    // Rechecked once per interval while idle
    assert_eq!(env.now(), DISCONNECT_CHECK_INTERVAL * 5);
    let frames = host.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].lit_pixels(), lit_for("Verification aborted"));
}

#[tokio::test]
async fn closed_key_channel_is_a_disconnect() {
    let env = SimEnv::new(EPOCH);
    let host = RecordingHost::new();
    let (keys, rx) = key_channel();
    type_code(&keys, "12");
    drop(keys);

    let outcome = run(config(), &env, &host, rx).await;

    assert_eq!(outcome, GateOutcome::Disconnected);
    assert_eq!(env.now(), Duration::ZERO);
}

#[tokio::test]
async fn concurrent_typist_is_admitted() {
    let env = SimEnv::new(EPOCH);
    let host = RecordingHost::new();
    let (keys, rx) = key_channel();

    let typist_env = env.clone();
    let typist = tokio::spawn(async move {
        // Client takes a few seconds before typing
        typist_env.sleep(Duration::from_secs(3)).await;
        let code = totp::expected_code(&secret(), typist_env.unix_time());
        type_code(&keys, &code);
        keys
    });

    let outcome = run(config(), &env, &host, rx).await;
    drop(typist.await.unwrap());

    assert_eq!(outcome, GateOutcome::Allow);
    assert_eq!(host.frame_count(), 1 + 7);
}
