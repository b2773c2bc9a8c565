use std::time::Duration;

use crate::framebuffer::Color;

pub const SCREEN_WIDTH: usize = 320;
pub const SCREEN_HEIGHT: usize = 240;

pub const BALL_RADIUS: i32 = 3;
/// Sub-pixels per tick of a shot fired with zero power.
pub const BASE_SPEED: f32 = 1.0;
/// Extra sub-pixels per tick for every unit of power.
pub const SPEED_PER_POWER: f32 = 0.05;
/// Multiplier applied to a velocity component on every bounce.
pub const RESTITUTION: f32 = 0.8;
/// Extra reach added to the ball radius when testing wall proximity.
pub const WALL_MARGIN: i32 = 1;
/// A ball coming to rest this close to the hole is sunk.
pub const GOAL_RADIUS: i32 = 5;
pub const HOLE_RADIUS: i32 = 4;

pub const POWER_MIN: u32 = 1;
pub const POWER_MAX: u32 = 100;
/// Radians the aim moves per fast timer tick while a rotate key is held.
pub const ANGLE_STEP: f32 = 0.05;

pub const ARROW_LENGTH: i32 = 80;
pub const ARROW_HEAD_LENGTH: i32 = 10;
/// Angle (radians) between the shaft and each head stroke, roughly 143 degrees.
pub const ARROW_HEAD_SPREAD: f32 = 2.5;

/// Status pips along the top edge: radius, spacing and inset from the edge.
pub const PIP_RADIUS: i32 = 2;
pub const PIP_SPACING: i32 = 8;
pub const PIP_INSET: i32 = 6;

/// 5_000_000 cycles of the 100 MHz board clock.
pub const FAST_TIMER_PERIOD: Duration = Duration::from_millis(50);
pub const SLOW_TIMER_PERIOD: Duration = Duration::from_secs(1);

pub const DEFAULT_ATTEMPTS: u32 = 5;
pub const DEFAULT_COUNTDOWN: u32 = 10;

pub const BACKGROUND_COLOR: Color = Color(0x0320);
pub const WALL_COLOR: Color = Color(0xFFFF);
pub const BALL_COLOR: Color = Color(0x6666);
pub const ARROW_COLOR: Color = Color(0xF800);
pub const HOLE_COLOR: Color = Color(0x0000);
pub const COUNTDOWN_COLOR: Color = Color(0xFFE0);
