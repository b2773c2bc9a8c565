//! The emulated board: the peripherals the interrupt handler owns, guarded by
//! a lock that plays the part of the interrupt mask.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{sleep, Builder, JoinHandle},
    time::Duration,
};

use engine::{
    device::{IntervalTimer, Ps2Port, StaleInput, StatusOutputs, TimerConfig},
    InterruptHandler,
};
use tracing::{debug, warn};

/// The PS/2 controller's receive fifo holds this many bytes; anything beyond
/// it is lost.
const KEYBOARD_FIFO_SIZE: usize = 256;

pub struct KeyboardFifo(VecDeque<u8>);

impl KeyboardFifo {
    fn new() -> Self {
        Self(VecDeque::with_capacity(KEYBOARD_FIFO_SIZE))
    }

    fn receive(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.0.len() == KEYBOARD_FIFO_SIZE {
                warn!(byte, "keyboard fifo full, byte dropped");
                continue;
            }
            self.0.push_back(byte);
        }
    }
}

impl Ps2Port for KeyboardFifo {
    fn read_data(&mut self) -> Option<u8> {
        self.0.pop_front()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerId {
    Fast,
    Slow,
}

/// An interval timer whose expiries are driven by a thread.
pub struct ThreadTimer {
    id: TimerId,
    config: Option<TimerConfig>,
    timed_out: bool,
}

impl ThreadTimer {
    fn new(id: TimerId) -> Self {
        Self {
            id,
            config: None,
            timed_out: false,
        }
    }

    /// Sets the timeout bit. Returns whether an interrupt should be raised.
    fn expire(&mut self) -> bool {
        let Some(config) = self.config else {
            return false;
        };
        if !config.start {
            return false;
        }
        if self.timed_out {
            warn!(timer = ?self.id, "previous timeout never acknowledged");
        }
        self.timed_out = true;
        config.interrupt_enabled
    }
}

impl IntervalTimer for ThreadTimer {
    fn configure(&mut self, config: TimerConfig) {
        debug!(timer = ?self.id, ?config, "timer configured");
        self.config = Some(config);
        self.timed_out = false;
    }

    fn acknowledge(&mut self) {
        self.timed_out = false;
    }
}

/// Everything only an interrupt may touch.
pub struct Irq<O> {
    handler: InterruptHandler,
    fast_timer: ThreadTimer,
    slow_timer: ThreadTimer,
    keyboard: KeyboardFifo,
    outputs: O,
}

pub struct Board<O> {
    irq: Mutex<Irq<O>>,
}

impl<O: StatusOutputs> Board<O> {
    pub fn new(
        handler: InterruptHandler,
        outputs: O,
        fast_period: Duration,
        slow_period: Duration,
    ) -> Self {
        let mut fast_timer = ThreadTimer::new(TimerId::Fast);
        fast_timer.configure(TimerConfig::periodic(fast_period));
        let mut slow_timer = ThreadTimer::new(TimerId::Slow);
        slow_timer.configure(TimerConfig::periodic(slow_period));
        Self {
            irq: Mutex::new(Irq {
                handler,
                fast_timer,
                slow_timer,
                keyboard: KeyboardFifo::new(),
                outputs,
            }),
        }
    }

    /// Masks interrupts until the guard is dropped. A panicked handler leaves
    /// the board as it was, so a poisoned lock is taken over as is.
    fn mask(&self) -> MutexGuard<'_, Irq<O>> {
        self.irq.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn interval(&self, id: TimerId) -> Option<Duration> {
        let irq = self.mask();
        let timer = match id {
            TimerId::Fast => &irq.fast_timer,
            TimerId::Slow => &irq.slow_timer,
        };
        timer
            .config
            .filter(|config| config.continuous)
            .map(|config| config.interval)
    }

    /// One expiry of timer `id`, running the handler if it interrupts.
    pub fn timer_tick(&self, id: TimerId) {
        let mut irq = self.mask();
        let Irq {
            handler,
            fast_timer,
            slow_timer,
            outputs,
            ..
        } = &mut *irq;
        match id {
            TimerId::Fast => {
                if fast_timer.expire() {
                    handler.on_fast_timer(fast_timer, outputs);
                }
            }
            TimerId::Slow => {
                if slow_timer.expire() {
                    handler.on_slow_timer(slow_timer, outputs);
                }
            }
        }
    }

    /// Bytes arriving from the keyboard, followed by the keyboard interrupt.
    pub fn keyboard_bytes(&self, bytes: &[u8]) {
        let mut irq = self.mask();
        let Irq {
            handler,
            keyboard,
            outputs,
            ..
        } = &mut *irq;
        keyboard.receive(bytes);
        handler.on_keyboard(keyboard, outputs);
    }
}

impl<O: StatusOutputs> StaleInput for &Board<O> {
    fn flush_stale(&mut self) {
        let mut irq = self.mask();
        if irq.keyboard.0.is_empty() {
            return;
        }
        debug!(bytes = irq.keyboard.0.len(), "flushing stale keyboard bytes");
        irq.keyboard.0.clear();
        irq.handler.reset_decoder();
    }
}

/// Drives timer `id` from its own thread for as long as the timer is
/// configured to reload.
pub fn spawn_timer<O>(board: &Arc<Board<O>>, id: TimerId) -> std::io::Result<JoinHandle<()>>
where
    O: StatusOutputs + Send + 'static,
{
    let board = Arc::clone(board);
    let name = match id {
        TimerId::Fast => "fast_timer",
        TimerId::Slow => "slow_timer",
    };
    Builder::new().name(name.to_owned()).spawn(move || {
        while let Some(interval) = board.interval(id) {
            sleep(interval);
            board.timer_tick(id);
        }
        debug!(timer = ?id, "timer stopped");
    })
}
