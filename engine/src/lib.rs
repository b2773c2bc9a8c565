//! A mini-golf game built the way a small FPGA board runs it: a main loop that
//! simulates and draws one frame per vertical blank, and an interrupt handler
//! that owns the timers and the keyboard. The two only meet through
//! [`SharedState`].

pub mod config;
pub mod constants;
pub mod course;
pub mod device;
pub mod error;
pub mod framebuffer;
pub mod interrupt;
pub mod physics;
pub mod raster;
pub mod scancode;
pub mod session;
pub mod shared;

pub use config::GameConfig;
pub use error::GameError;
pub use framebuffer::{Canvas, Color, FrameBuffer, Surface};
pub use interrupt::InterruptHandler;
pub use session::{Outcome, Phase, Session};
pub use shared::SharedState;
