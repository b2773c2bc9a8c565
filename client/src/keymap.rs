use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use engine::scancode::Key;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Key { key: Key, pressed: bool },
    Quit,
    Ignored,
}

/// What a terminal key event means on the board.
pub fn translate(event: &KeyEvent) -> Input {
    let pressed = match event.kind {
        KeyEventKind::Press | KeyEventKind::Repeat => true,
        KeyEventKind::Release => false,
    };
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return match event.code {
            KeyCode::Char('c') if pressed => Input::Quit,
            _ => Input::Ignored,
        };
    }
    let key = match event.code {
        KeyCode::Left => Key::RotateLeft,
        KeyCode::Right => Key::RotateRight,
        KeyCode::Char(' ') => Key::Shoot,
        KeyCode::Char('q') | KeyCode::Esc if pressed => return Input::Quit,
        _ => return Input::Ignored,
    };
    Input::Key { key, pressed }
}

const KEYS: [Key; 3] = [Key::RotateLeft, Key::RotateRight, Key::Shoot];

/// Tracks held keys on terminals that never report a release. A key counts as
/// held for as long as the terminal keeps repeating it; once it has been quiet
/// for `timeout` it is released.
pub struct HeldKeys {
    timeout: Duration,
    last_seen: [Option<Instant>; 3],
}

impl HeldKeys {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_seen: [None; 3],
        }
    }

    /// Records a press or repeat. Returns whether the key was up before.
    pub fn press(&mut self, key: Key, now: Instant) -> bool {
        self.last_seen[slot(key)].replace(now).is_none()
    }

    /// Keys that have gone quiet, now considered released.
    pub fn expire(&mut self, now: Instant) -> Vec<Key> {
        let mut released = Vec::new();
        for key in KEYS {
            let seen = &mut self.last_seen[slot(key)];
            if seen.is_some_and(|at| now.duration_since(at) >= self.timeout) {
                *seen = None;
                released.push(key);
            }
        }
        released
    }

    pub fn next_expiry(&self, now: Instant) -> Option<Duration> {
        self.last_seen
            .iter()
            .flatten()
            .map(|at| (*at + self.timeout).saturating_duration_since(now))
            .min()
    }
}

fn slot(key: Key) -> usize {
    match key {
        Key::RotateLeft => 0,
        Key::RotateRight => 1,
        Key::Shoot => 2,
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
    use engine::scancode::Key;

    use crate::keymap::{translate, HeldKeys, Input};

    fn event(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn game_keys() {
        let none = KeyModifiers::NONE;
        assert_eq!(
            translate(&event(KeyCode::Left, none, KeyEventKind::Press)),
            Input::Key {
                key: Key::RotateLeft,
                pressed: true
            }
        );
        assert_eq!(
            translate(&event(KeyCode::Right, none, KeyEventKind::Repeat)),
            Input::Key {
                key: Key::RotateRight,
                pressed: true
            }
        );
        assert_eq!(
            translate(&event(KeyCode::Char(' '), none, KeyEventKind::Release)),
            Input::Key {
                key: Key::Shoot,
                pressed: false
            }
        );
        assert_eq!(
            translate(&event(KeyCode::Up, none, KeyEventKind::Press)),
            Input::Ignored
        );
    }

    #[test]
    fn quit_keys() {
        let none = KeyModifiers::NONE;
        for code in [KeyCode::Char('q'), KeyCode::Esc] {
            assert_eq!(translate(&event(code, none, KeyEventKind::Press)), Input::Quit);
            assert_eq!(
                translate(&event(code, none, KeyEventKind::Release)),
                Input::Ignored
            );
        }
        assert_eq!(
            translate(&event(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL,
                KeyEventKind::Press
            )),
            Input::Quit
        );
        assert_eq!(
            translate(&event(
                KeyCode::Left,
                KeyModifiers::CONTROL,
                KeyEventKind::Press
            )),
            Input::Ignored
        );
    }

    #[test]
    fn held_keys_expire_after_going_quiet() {
        let timeout = Duration::from_millis(150);
        let mut held = HeldKeys::new(timeout);
        let start = Instant::now();
        assert!(held.press(Key::RotateLeft, start));
        assert!(!held.press(Key::RotateLeft, start + Duration::from_millis(100)));
        assert!(held.press(Key::Shoot, start + Duration::from_millis(120)));
        assert_eq!(
            held.next_expiry(start + Duration::from_millis(200)),
            Some(Duration::from_millis(50))
        );

        assert!(held.expire(start + Duration::from_millis(200)).is_empty());
        assert_eq!(
            held.expire(start + Duration::from_millis(260)),
            vec![Key::RotateLeft]
        );
        assert_eq!(
            held.expire(start + Duration::from_millis(300)),
            vec![Key::Shoot]
        );
        assert_eq!(held.next_expiry(start), None);
        assert!(held.press(Key::RotateLeft, start + Duration::from_millis(400)));
    }
}
