//! Key event handoff between the host's dispatch context and the gate.
//!
//! The host delivers key events on its own thread while the gate waits on
//! another. Events cross over an unbounded channel so the dispatch path never
//! blocks and the gate owns its passcode buffer exclusively.

use tokio::sync::mpsc;

/// One raw keyboard event as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// RDP scan code
    pub scan_code: u16,
    /// RDP keyboard flags
    pub flags: u16,
}

/// Host-side end of the key channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct KeySender {
    tx: mpsc::UnboundedSender<KeyPress>,
}

impl KeySender {
    /// Forward a key event to the gate.
    ///
    /// Always returns `true`: the event is observed, never swallowed, even
    /// when the gate has already finished.
    pub fn on_key_event(&self, scan_code: u16, flags: u16) -> bool {
        if self.tx.send(KeyPress { scan_code, flags }).is_err() {
            tracing::trace!(scan_code, "gate gone, key event dropped");
        }
        true
    }
}

/// Gate-side end of the key channel.
#[derive(Debug)]
pub struct KeyReceiver {
    rx: mpsc::UnboundedReceiver<KeyPress>,
}

impl KeyReceiver {
    /// Next key event. `None` once every sender has been dropped.
    pub async fn recv(&mut self) -> Option<KeyPress> {
        self.rx.recv().await
    }
}

/// Create a connected sender/receiver pair for one session.
pub fn key_channel() -> (KeySender, KeyReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (KeySender { tx }, KeyReceiver { rx })
}
