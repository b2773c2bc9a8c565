//! PS/2 scan code set 2 decoding for the three keys the game listens to.

use tracing::trace;

/// Prefix byte: the next data byte is a key release.
pub const BREAK_PREFIX: u8 = 0xF0;
/// Prefix byte: the next data byte belongs to an extended key.
pub const EXTENDED_PREFIX: u8 = 0xE0;

pub const LEFT_ARROW: u8 = 0x6B;
pub const RIGHT_ARROW: u8 = 0x74;
pub const SPACE: u8 = 0x29;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    RotateLeft,
    RotateRight,
    Shoot,
}

impl Key {
    /// The arrows arrive with the extended prefix; their keypad twins (4 and
    /// 6) share the code without it and steer too.
    pub fn from_scan_code(extended: bool, code: u8) -> Option<Self> {
        match (extended, code) {
            (_, LEFT_ARROW) => Some(Key::RotateLeft),
            (_, RIGHT_ARROW) => Some(Key::RotateRight),
            (false, SPACE) => Some(Key::Shoot),
            _ => None,
        }
    }

    /// The bytes a keyboard sends for this key going down (`pressed`) or up.
    pub fn scan_codes(self, pressed: bool) -> Vec<u8> {
        let (extended, code) = match self {
            Key::RotateLeft => (true, LEFT_ARROW),
            Key::RotateRight => (true, RIGHT_ARROW),
            Key::Shoot => (false, SPACE),
        };
        let mut bytes = Vec::with_capacity(3);
        if extended {
            bytes.push(EXTENDED_PREFIX);
        }
        if !pressed {
            bytes.push(BREAK_PREFIX);
        }
        bytes.push(code);
        bytes
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEvent {
    Pressed(Key),
    Released(Key),
}

/// Turns the keyboard's byte stream into key events. The prefix flags carry
/// over between calls, so a sequence may be split across interrupts at any
/// byte.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanCodeDecoder {
    release_pending: bool,
    extended_pending: bool,
}

impl ScanCodeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, byte: u8) -> Option<KeyEvent> {
        match byte {
            BREAK_PREFIX => {
                self.release_pending = true;
                None
            }
            EXTENDED_PREFIX => {
                self.extended_pending = true;
                None
            }
            code => {
                let key = Key::from_scan_code(self.extended_pending, code);
                let event = key.map(|key| {
                    if self.release_pending {
                        KeyEvent::Released(key)
                    } else {
                        KeyEvent::Pressed(key)
                    }
                });
                trace!(
                    code,
                    extended = self.extended_pending,
                    release = self.release_pending,
                    ?event,
                    "scan code"
                );
                self.reset();
                event
            }
        }
    }

    pub fn reset(&mut self) {
        self.release_pending = false;
        self.extended_pending = false;
    }

    pub fn is_mid_sequence(&self) -> bool {
        self.release_pending || self.extended_pending
    }
}
