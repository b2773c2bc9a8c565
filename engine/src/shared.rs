//! The cells the interrupt handler and the main loop both touch.
//!
//! Every cell is one atomic scalar with exactly one writing context, so no
//! update ever needs more than one cell to stay consistent and no lock is
//! needed. A reader may see a value one tick stale; that race is accepted.
//!
//! | cell             | written by                         | read by           |
//! |------------------|------------------------------------|-------------------|
//! | `rotate_left`    | keyboard interrupt                 | fast timer        |
//! | `rotate_right`   | keyboard interrupt                 | fast timer        |
//! | `shoot`          | keyboard interrupt                 | session           |
//! | `power`          | fast timer, turn reset             | session           |
//! | `angle`          | fast timer                         | session           |
//! | `countdown`      | slow timer, turn reset             | session           |
//! | `running`        | session                            | fast timer        |
//! | `paused`         | session                            | slow timer        |
//! | `turn`           | session                            | interrupt handler |
//! | `turn_applied`   | interrupt handler                  | session           |
//!
//! The session never writes a handler-owned counter. To start a fresh turn it
//! bumps `turn`; the handler resets `power` and `countdown` on its next tick
//! and then publishes the same number in `turn_applied`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::constants::POWER_MIN;

/// An `f32` stored as its bit pattern.
#[derive(Debug, Default)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.0.load(order))
    }

    fn store(&self, value: f32, order: Ordering) {
        self.0.store(value.to_bits(), order)
    }
}

#[derive(Debug)]
pub struct SharedState {
    rotate_left: AtomicBool,
    rotate_right: AtomicBool,
    shoot: AtomicBool,
    power: AtomicU32,
    angle: AtomicF32,
    countdown: AtomicU32,
    running: AtomicBool,
    paused: AtomicBool,
    turn: AtomicU32,
    turn_applied: AtomicU32,
}

impl SharedState {
    /// Power starts at its minimum and counting, aim points along +x and the
    /// countdown is full. Turn 0 counts as already applied.
    pub fn new(countdown: u32) -> Self {
        Self {
            rotate_left: AtomicBool::new(false),
            rotate_right: AtomicBool::new(false),
            shoot: AtomicBool::new(false),
            power: AtomicU32::new(POWER_MIN),
            angle: AtomicF32::new(0.0),
            countdown: AtomicU32::new(countdown),
            running: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            turn: AtomicU32::new(0),
            turn_applied: AtomicU32::new(0),
        }
    }

    pub fn rotate_left(&self) -> bool {
        self.rotate_left.load(Ordering::Relaxed)
    }

    pub fn rotate_right(&self) -> bool {
        self.rotate_right.load(Ordering::Relaxed)
    }

    pub fn shoot(&self) -> bool {
        self.shoot.load(Ordering::Relaxed)
    }

    pub fn power(&self) -> u32 {
        self.power.load(Ordering::Relaxed)
    }

    pub fn angle(&self) -> f32 {
        self.angle.load(Ordering::Relaxed)
    }

    pub fn countdown(&self) -> u32 {
        self.countdown.load(Ordering::Relaxed)
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn turn(&self) -> u32 {
        self.turn.load(Ordering::Relaxed)
    }

    /// Pairs with the release in [`SharedState::set_turn_applied`]: once this
    /// returns the session's turn, the reset `power` and `countdown` are
    /// visible too.
    pub fn turn_applied(&self) -> u32 {
        self.turn_applied.load(Ordering::Acquire)
    }

    // keyboard interrupt.

    pub(crate) fn set_rotate_left(&self, held: bool) {
        self.rotate_left.store(held, Ordering::Relaxed)
    }

    pub(crate) fn set_rotate_right(&self, held: bool) {
        self.rotate_right.store(held, Ordering::Relaxed)
    }

    pub(crate) fn set_shoot(&self, held: bool) {
        self.shoot.store(held, Ordering::Relaxed)
    }

    // timer interrupts.

    pub(crate) fn set_power(&self, power: u32) {
        self.power.store(power, Ordering::Relaxed)
    }

    pub(crate) fn set_angle(&self, angle: f32) {
        self.angle.store(angle, Ordering::Relaxed)
    }

    pub(crate) fn set_countdown(&self, countdown: u32) {
        self.countdown.store(countdown, Ordering::Relaxed)
    }

    pub(crate) fn set_turn_applied(&self, turn: u32) {
        self.turn_applied.store(turn, Ordering::Release)
    }

    // session.

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed)
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed)
    }

    pub(crate) fn set_turn(&self, turn: u32) {
        self.turn.store(turn, Ordering::Release)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use crate::shared::SharedState;

    #[test]
    fn initial_values() {
        let shared = SharedState::new(10);
        assert_eq!(shared.power(), 1);
        assert_eq!(shared.angle(), 0.0);
        assert_eq!(shared.countdown(), 10);
        assert!(shared.running());
        assert!(!shared.paused());
        assert!(!shared.shoot() && !shared.rotate_left() && !shared.rotate_right());
        assert_eq!(shared.turn(), shared.turn_applied());
    }

    #[test]
    fn angle_round_trips_through_bits() {
        let shared = SharedState::new(10);
        for angle in [0.05, 3.0, 6.2331853, -0.0] {
            shared.set_angle(angle);
            assert_eq!(shared.angle().to_bits(), angle.to_bits());
        }
    }

    #[test]
    fn single_writer_cells_are_readable_from_another_thread() {
        let shared = Arc::new(SharedState::new(10));
        let writer = Arc::clone(&shared);
        thread::spawn(move || {
            for power in 1..=100 {
                writer.set_power(power);
            }
            writer.set_countdown(3);
            writer.set_turn_applied(7);
        })
        .join()
        .unwrap();
        assert_eq!(shared.turn_applied(), 7);
        assert_eq!(shared.power(), 100);
        assert_eq!(shared.countdown(), 3);
    }
}
