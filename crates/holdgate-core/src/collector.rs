//! Passcode entry from raw keyboard scan codes.
//!
//! The client types its passcode into the remote session before the session
//! exists, so the proxy only ever sees RDP scan codes. [`CodeCollector`]
//! turns key-down events into a bounded digit buffer with backspace and
//! submit semantics. Layout mapping is deliberately limited to the numeric
//! row; everything else is an explicit no-op.

use crate::totp::CODE_DIGITS;

/// Scan code flag set on key-release events.
pub const KBD_FLAGS_RELEASE: u16 = 0x8000;

/// Scan code of the Backspace key.
pub const SCAN_BACKSPACE: u16 = 0x0E;

/// Scan code of the Enter key (main and keypad share it).
pub const SCAN_ENTER: u16 = 0x1C;

/// Numeric-row scan codes, indexed by the digit they produce.
pub const SCAN_DIGITS: [u16; 10] = [
    0x0B, // 0
    0x02, // 1
    0x03, // 2
    0x04, // 3
    0x05, // 4
    0x06, // 5
    0x07, // 6
    0x08, // 7
    0x09, // 8
    0x0A, // 9
];

/// What a scan code means to the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Numeric-row digit
    Digit(char),
    /// Remove the last digit
    Backspace,
    /// Submit the buffer
    Submit,
    /// Anything else
    Other,
}

impl KeyClass {
    /// Classify a scan code.
    pub fn of(scan_code: u16) -> Self {
        match scan_code {
            SCAN_BACKSPACE => Self::Backspace,
            SCAN_ENTER => Self::Submit,
            code => SCAN_DIGITS
                .iter()
                .position(|&digit| digit == code)
                .and_then(|digit| char::from_digit(digit as u32, 10))
                .map_or(Self::Other, Self::Digit),
        }
    }
}

/// Result of feeding one key event to the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorEvent {
    /// Nothing changed
    None,
    /// Buffer contents changed
    Edit,
    /// A complete code is ready in the buffer
    Submit,
}

/// Bounded buffer of passcode digits.
///
/// # Invariants
///
/// - Holds only ASCII digits
/// - Never longer than [`CODE_DIGITS`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeCollector {
    buffer: String,
}

impl CodeCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a key event.
    ///
    /// Key-release events are ignored entirely. Digits past the sixth are
    /// dropped, backspace on an empty buffer does nothing, and Enter only
    /// submits a complete code. None of these are errors.
    pub fn on_key_event(&mut self, scan_code: u16, is_key_down: bool) -> CollectorEvent {
        if !is_key_down {
            return CollectorEvent::None;
        }

        match KeyClass::of(scan_code) {
            KeyClass::Digit(digit) => {
                if self.buffer.len() < CODE_DIGITS {
                    self.buffer.push(digit);
                    CollectorEvent::Edit
                } else {
                    CollectorEvent::None
                }
            },
            KeyClass::Backspace => {
                if self.buffer.pop().is_some() {
                    CollectorEvent::Edit
                } else {
                    CollectorEvent::None
                }
            },
            KeyClass::Submit => {
                if self.is_complete() {
                    CollectorEvent::Submit
                } else {
                    CollectorEvent::None
                }
            },
            KeyClass::Other => CollectorEvent::None,
        }
    }

    /// Digits entered so far.
    pub fn code(&self) -> &str {
        &self.buffer
    }

    /// Whether the buffer holds a full-length code.
    pub fn is_complete(&self) -> bool {
        self.buffer.len() == CODE_DIGITS
    }

    /// Discard all digits.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
