use std::{f32::consts::TAU, sync::Arc};

use tracing::{debug, trace};

use crate::{
    constants::{ANGLE_STEP, POWER_MAX, POWER_MIN},
    device::{IntervalTimer, Leds, Ps2Port, StatusOutputs},
    scancode::{Key, KeyEvent, ScanCodeDecoder},
    shared::SharedState,
};

/// The power counter's successor: climbs by one and wraps from the top back
/// to the minimum.
pub fn next_power(power: u32) -> u32 {
    if power >= POWER_MAX {
        POWER_MIN
    } else {
        power + 1
    }
}

/// `angle` brought back into `[0, 2π)`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Everything that runs when the board raises an interrupt.
///
/// The board calls exactly one of the `on_*` methods per interrupt, with
/// interrupts masked for the duration, so none of them ever overlaps another.
/// State the main loop needs is published through [`SharedState`]; the scan
/// code decoder and the last applied turn are private to the handler.
pub struct InterruptHandler {
    shared: Arc<SharedState>,
    decoder: ScanCodeDecoder,
    countdown_start: u32,
    applied_turn: u32,
}

impl InterruptHandler {
    pub fn new(shared: Arc<SharedState>, countdown_start: u32) -> Self {
        let applied_turn = shared.turn_applied();
        Self {
            shared,
            decoder: ScanCodeDecoder::new(),
            countdown_start,
            applied_turn,
        }
    }

    /// The fast timer: counts power up while the counter is running and turns
    /// the aim while a rotate key is held.
    pub fn on_fast_timer<T, O>(&mut self, timer: &mut T, outputs: &mut O)
    where
        T: IntervalTimer + ?Sized,
        O: StatusOutputs + ?Sized,
    {
        self.apply_turn(outputs);
        if self.shared.running() {
            let power = next_power(self.shared.power());
            self.shared.set_power(power);
            outputs.display_number(power);
        }
        let steer = self.shared.rotate_right() as i32 - self.shared.rotate_left() as i32;
        if steer != 0 {
            let angle = wrap_angle(self.shared.angle() + steer as f32 * ANGLE_STEP);
            self.shared.set_angle(angle);
        }
        timer.acknowledge();
    }

    /// The slow timer: one second off the countdown unless the session has
    /// paused it. The countdown stops at zero.
    pub fn on_slow_timer<T, O>(&mut self, timer: &mut T, outputs: &mut O)
    where
        T: IntervalTimer + ?Sized,
        O: StatusOutputs + ?Sized,
    {
        self.apply_turn(outputs);
        if !self.shared.paused() {
            let countdown = self.shared.countdown();
            if countdown > 0 {
                self.shared.set_countdown(countdown - 1);
            }
        }
        timer.acknowledge();
    }

    /// The keyboard: drains every byte the port holds through the decoder,
    /// then refreshes the LEDs.
    pub fn on_keyboard<P, O>(&mut self, port: &mut P, outputs: &mut O)
    where
        P: Ps2Port + ?Sized,
        O: StatusOutputs + ?Sized,
    {
        while let Some(byte) = port.read_data() {
            if let Some(event) = self.decoder.feed(byte) {
                self.apply_key(event);
            }
        }
        outputs.display_leds(Leds {
            rotate_left: self.shared.rotate_left(),
            rotate_right: self.shared.rotate_right(),
        });
    }

    /// Drops a half-received scan code sequence, for when the board throws
    /// away the bytes that would have completed it.
    pub fn reset_decoder(&mut self) {
        if self.decoder.is_mid_sequence() {
            debug!("discarding partial scan code sequence");
        }
        self.decoder.reset();
    }

    fn apply_key(&mut self, event: KeyEvent) {
        trace!(?event, "key");
        let (key, held) = match event {
            KeyEvent::Pressed(key) => (key, true),
            KeyEvent::Released(key) => (key, false),
        };
        match key {
            Key::RotateLeft => self.shared.set_rotate_left(held),
            Key::RotateRight => self.shared.set_rotate_right(held),
            Key::Shoot => self.shared.set_shoot(held),
        }
    }

    /// Resets the counters when the session has asked for a new turn, then
    /// acknowledges it.
    fn apply_turn<O: StatusOutputs + ?Sized>(&mut self, outputs: &mut O) {
        let turn = self.shared.turn();
        if turn == self.applied_turn {
            return;
        }
        debug!(turn, "resetting counters for new turn");
        self.shared.set_power(POWER_MIN);
        self.shared.set_countdown(self.countdown_start);
        outputs.display_number(POWER_MIN);
        self.applied_turn = turn;
        self.shared.set_turn_applied(turn);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        f32::consts::TAU,
        sync::Arc,
    };

    use crate::{
        device::{IntervalTimer, Leds, Ps2Port, StatusOutputs, TimerConfig},
        interrupt::{next_power, wrap_angle, InterruptHandler},
        scancode::Key,
        shared::SharedState,
    };

    #[derive(Default)]
    struct FakeTimer {
        acks: u32,
    }

    impl IntervalTimer for FakeTimer {
        fn configure(&mut self, _config: TimerConfig) {}

        fn acknowledge(&mut self) {
            self.acks += 1;
        }
    }

    #[derive(Default)]
    struct FakeOutputs {
        numbers: Vec<u32>,
        leds: Vec<Leds>,
    }

    impl StatusOutputs for FakeOutputs {
        fn display_number(&mut self, value: u32) {
            self.numbers.push(value);
        }

        fn display_leds(&mut self, leds: Leds) {
            self.leds.push(leds);
        }
    }

    struct FakePort(VecDeque<u8>);

    impl Ps2Port for FakePort {
        fn read_data(&mut self) -> Option<u8> {
            self.0.pop_front()
        }
    }

    fn handler() -> (Arc<SharedState>, InterruptHandler) {
        let shared = Arc::new(SharedState::new(10));
        let handler = InterruptHandler::new(Arc::clone(&shared), 10);
        (shared, handler)
    }

    fn press(handler: &mut InterruptHandler, key: Key, pressed: bool) -> FakeOutputs {
        let mut outputs = FakeOutputs::default();
        let mut port = FakePort(key.scan_codes(pressed).into());
        handler.on_keyboard(&mut port, &mut outputs);
        outputs
    }

    #[test]
    fn power_wraps_from_top_to_one() {
        assert_eq!(next_power(1), 2);
        assert_eq!(next_power(99), 100);
        assert_eq!(next_power(100), 1);
    }

    #[test]
    fn angle_wraps_both_ways() {
        assert_eq!(wrap_angle(0.5), 0.5);
        assert!((wrap_angle(-0.05) - (TAU - 0.05)).abs() < 1e-5);
        assert!((wrap_angle(TAU + 0.05) - 0.05).abs() < 1e-5);
        assert_eq!(wrap_angle(TAU), 0.0);
        assert!(wrap_angle(-1e-9) < TAU);
    }

    #[test]
    fn fast_timer_counts_power_and_shows_it() {
        let (shared, mut handler) = handler();
        let mut timer = FakeTimer::default();
        let mut outputs = FakeOutputs::default();
        for _ in 0..99 {
            handler.on_fast_timer(&mut timer, &mut outputs);
        }
        assert_eq!(shared.power(), 100);
        handler.on_fast_timer(&mut timer, &mut outputs);
        assert_eq!(shared.power(), 1);
        assert_eq!(timer.acks, 100);
        assert_eq!(outputs.numbers.len(), 100);
        assert_eq!(outputs.numbers[..3], [2, 3, 4]);
        assert_eq!(outputs.numbers.last(), Some(&1));
    }

    #[test]
    fn fast_timer_freezes_power_when_not_running() {
        let (shared, mut handler) = handler();
        shared.set_running(false);
        let mut timer = FakeTimer::default();
        let mut outputs = FakeOutputs::default();
        handler.on_fast_timer(&mut timer, &mut outputs);
        assert_eq!(shared.power(), 1);
        assert!(outputs.numbers.is_empty());
        assert_eq!(timer.acks, 1);
    }

    #[test]
    fn held_rotate_keys_steer_the_aim() {
        let (shared, mut handler) = handler();
        let mut timer = FakeTimer::default();
        let mut outputs = FakeOutputs::default();
        press(&mut handler, Key::RotateLeft, true);
        handler.on_fast_timer(&mut timer, &mut outputs);
        assert!((shared.angle() - (TAU - 0.05)).abs() < 1e-5);
        press(&mut handler, Key::RotateRight, true);
        // both held: no net turn.
        handler.on_fast_timer(&mut timer, &mut outputs);
        assert!((shared.angle() - (TAU - 0.05)).abs() < 1e-5);
        press(&mut handler, Key::RotateLeft, false);
        handler.on_fast_timer(&mut timer, &mut outputs);
        handler.on_fast_timer(&mut timer, &mut outputs);
        assert!((shared.angle() - 0.05).abs() < 1e-5);
    }

    #[test]
    fn keyboard_updates_flags_and_leds() {
        let (shared, mut handler) = handler();
        let outputs = press(&mut handler, Key::RotateRight, true);
        assert!(shared.rotate_right());
        assert_eq!(
            outputs.leds,
            vec![Leds {
                rotate_left: false,
                rotate_right: true
            }]
        );
        press(&mut handler, Key::Shoot, true);
        assert!(shared.shoot());
        press(&mut handler, Key::Shoot, false);
        assert!(!shared.shoot());
        let outputs = press(&mut handler, Key::RotateRight, false);
        assert!(!shared.rotate_right());
        assert_eq!(outputs.leds, vec![Leds::default()]);
    }

    #[test]
    fn release_before_press_leaves_key_up() {
        let (shared, mut handler) = handler();
        for key in [Key::RotateLeft, Key::RotateRight, Key::Shoot] {
            press(&mut handler, key, false);
            press(&mut handler, key, false);
        }
        assert!(!shared.rotate_left());
        assert!(!shared.rotate_right());
        assert!(!shared.shoot());
        // a later press still registers.
        press(&mut handler, Key::RotateLeft, true);
        assert!(shared.rotate_left());
    }

    #[test]
    fn sequences_split_across_interrupts() {
        let (shared, mut handler) = handler();
        let mut outputs = FakeOutputs::default();
        handler.on_keyboard(&mut FakePort(VecDeque::from([0xE0])), &mut outputs);
        handler.on_keyboard(&mut FakePort(VecDeque::from([0x6B, 0xE0, 0xF0])), &mut outputs);
        assert!(shared.rotate_left());
        handler.on_keyboard(&mut FakePort(VecDeque::from([0x6B])), &mut outputs);
        assert!(!shared.rotate_left());
    }

    #[test]
    fn reset_decoder_drops_partial_sequence() {
        let (shared, mut handler) = handler();
        let mut outputs = FakeOutputs::default();
        handler.on_keyboard(&mut FakePort(VecDeque::from([0xF0])), &mut outputs);
        handler.reset_decoder();
        handler.on_keyboard(&mut FakePort(VecDeque::from([0x29])), &mut outputs);
        assert!(shared.shoot());
    }

    #[test]
    fn slow_timer_counts_down_to_zero_unless_paused() {
        let (shared, mut handler) = handler();
        let mut timer = FakeTimer::default();
        let mut outputs = FakeOutputs::default();
        handler.on_slow_timer(&mut timer, &mut outputs);
        assert_eq!(shared.countdown(), 9);
        shared.set_paused(true);
        for _ in 0..5 {
            handler.on_slow_timer(&mut timer, &mut outputs);
        }
        assert_eq!(shared.countdown(), 9);
        shared.set_paused(false);
        for _ in 0..20 {
            handler.on_slow_timer(&mut timer, &mut outputs);
        }
        assert_eq!(shared.countdown(), 0);
        assert_eq!(timer.acks, 26);
    }

    #[test]
    fn new_turn_resets_counters_once() {
        let (shared, mut handler) = handler();
        let mut timer = FakeTimer::default();
        let mut outputs = FakeOutputs::default();
        for _ in 0..30 {
            handler.on_fast_timer(&mut timer, &mut outputs);
        }
        for _ in 0..4 {
            handler.on_slow_timer(&mut timer, &mut outputs);
        }
        assert_eq!((shared.power(), shared.countdown()), (31, 6));

        shared.set_running(false);
        shared.set_paused(true);
        shared.set_turn(1);
        assert_eq!(shared.turn_applied(), 0);
        outputs.numbers.clear();
        handler.on_slow_timer(&mut timer, &mut outputs);
        assert_eq!(shared.turn_applied(), 1);
        assert_eq!((shared.power(), shared.countdown()), (1, 10));
        assert_eq!(outputs.numbers, vec![1]);

        // a second tick in the same turn leaves the counters alone.
        shared.set_running(true);
        handler.on_fast_timer(&mut timer, &mut outputs);
        assert_eq!(shared.power(), 2);
        assert_eq!(outputs.numbers, vec![1, 2]);
    }
}
