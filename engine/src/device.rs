//! The peripherals the engine talks to, reduced to the handful of operations
//! it actually needs. A board crate implements these over real registers (or,
//! as in `client`, over a terminal and a few threads).

use std::time::Duration;

use crate::framebuffer::Surface;

pub trait PixelController {
    /// Latches `surface` as the buffer to scan out from the next vertical
    /// blank onwards, and raises the swap-pending status bit.
    fn request_swap(&mut self, surface: &Surface);

    /// The status bit: stays set until the vertical blank has happened.
    fn swap_pending(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerConfig {
    pub interval: Duration,
    pub continuous: bool,
    pub interrupt_enabled: bool,
    pub start: bool,
}

impl TimerConfig {
    /// A started, reloading timer that interrupts on every expiry.
    pub fn periodic(interval: Duration) -> Self {
        Self {
            interval,
            continuous: true,
            interrupt_enabled: true,
            start: true,
        }
    }
}

pub trait IntervalTimer {
    fn configure(&mut self, config: TimerConfig);

    /// Clears the timeout bit. Until this is called the timer keeps its
    /// interrupt pending.
    fn acknowledge(&mut self);
}

pub trait Ps2Port {
    /// The next byte from the port's fifo, or `None` when the data-available
    /// bit is clear.
    fn read_data(&mut self) -> Option<u8>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Leds {
    pub rotate_left: bool,
    pub rotate_right: bool,
}

impl Leds {
    /// LED0 mirrors rotate-left, LED1 mirrors rotate-right.
    pub fn bits(self) -> u32 {
        self.rotate_left as u32 | (self.rotate_right as u32) << 1
    }
}

/// Write-only indicators: the seven-segment display and the LED bank.
pub trait StatusOutputs {
    fn display_number(&mut self, value: u32);
    fn display_leds(&mut self, leds: Leds);
}

/// Discards input that queued up while the main loop was blocked on vsync.
pub trait StaleInput {
    fn flush_stale(&mut self);
}

#[cfg(test)]
mod tests {
    use crate::device::Leds;

    #[test]
    fn led_bits() {
        assert_eq!(Leds::default().bits(), 0);
        assert_eq!(
            Leds {
                rotate_left: true,
                rotate_right: false
            }
            .bits(),
            0b01
        );
        assert_eq!(
            Leds {
                rotate_left: true,
                rotate_right: true
            }
            .bits(),
            0b11
        );
    }
}
