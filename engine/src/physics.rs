use tracing::{debug, trace};

use crate::{
    constants::{BASE_SPEED, RESTITUTION, SPEED_PER_POWER, WALL_MARGIN},
    course::{Course, Point, Wall},
    framebuffer::Color,
};

/// What a single [`Ball::step`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The ball was already at rest.
    Idle,
    /// The ball travelled one tick.
    Moved,
    /// Momentum ran out this tick: the ball is at rest on a new tee.
    Stopped,
}

/// Velocity a shot of `power` starts with, in sub-pixels per tick.
pub fn launch_speed(power: u32) -> f32 {
    BASE_SPEED + SPEED_PER_POWER * power as f32
}

/// A golf ball. Position and velocity are kept as floats so sub-pixel
/// velocities accumulate; [`Ball::position`] truncates to whole pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Ball {
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
    momentum: u32,
    radius: i32,
    color: Color,
    active: bool,
    tee: Point,
}

impl Ball {
    pub fn new(tee: Point, radius: i32, color: Color) -> Self {
        Self {
            x: tee.x as f32,
            y: tee.y as f32,
            dx: 0.0,
            dy: 0.0,
            momentum: 0,
            radius,
            color,
            active: false,
            tee,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x as i32, self.y as i32)
    }

    pub fn velocity(&self) -> (f32, f32) {
        (self.dx, self.dy)
    }

    pub fn momentum(&self) -> u32 {
        self.momentum
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn tee(&self) -> Point {
        self.tee
    }

    /// Launches the ball from its tee along `angle` (radians, +x is 0, +y is
    /// a quarter turn). Only half of `power` turns into travel time. A shot
    /// while the ball is still rolling is ignored.
    pub fn shoot(&mut self, power: u32, angle: f32) {
        if self.active {
            debug!(power, angle, "shot ignored, ball already in flight");
            return;
        }
        let speed = launch_speed(power);
        self.x = self.tee.x as f32;
        self.y = self.tee.y as f32;
        self.dx = angle.cos() * speed;
        self.dy = angle.sin() * speed;
        self.momentum = power / 2;
        self.active = true;
    }

    /// Advances the ball by one tick inside a `width` x `height` screen.
    pub fn step(&mut self, course: &Course, width: i32, height: i32) -> Step {
        if !self.active {
            return Step::Idle;
        }
        if self.momentum == 0 {
            self.dx = 0.0;
            self.dy = 0.0;
            self.active = false;
            self.tee = self.position();
            debug!(x = self.tee.x, y = self.tee.y, "ball came to rest");
            return Step::Stopped;
        }
        self.momentum -= 1;
        self.x += self.dx;
        self.y += self.dy;
        let radius = self.radius as f32;
        bounce_off_bounds(&mut self.x, &mut self.dx, radius, (width - self.radius) as f32);
        bounce_off_bounds(&mut self.y, &mut self.dy, radius, (height - self.radius) as f32);
        for wall in &course.walls {
            self.collide(wall);
        }
        Step::Moved
    }

    fn collide(&mut self, wall: &Wall) {
        let reach = (self.radius + WALL_MARGIN) as f32;
        let (low, high) = wall.span();
        match *wall {
            Wall::Vertical { x, .. } => {
                let x = x as f32;
                if (self.x - x).abs() <= reach && self.y >= low as f32 && self.y <= high as f32 {
                    trace!(?wall, "ball hit wall");
                    self.x = x + push_side(self.dx, self.x - x) * (reach + 1.0);
                    self.dx = -self.dx * RESTITUTION;
                }
            }
            Wall::Horizontal { y, .. } => {
                let y = y as f32;
                if (self.y - y).abs() <= reach && self.x >= low as f32 && self.x <= high as f32 {
                    trace!(?wall, "ball hit wall");
                    self.y = y + push_side(self.dy, self.y - y) * (reach + 1.0);
                    self.dy = -self.dy * RESTITUTION;
                }
            }
        }
    }
}

/// The side of a wall to put the ball back on: against its velocity, or on
/// the side its centre already is when it is not moving along that axis.
fn push_side(velocity: f32, offset: f32) -> f32 {
    if velocity > 0.0 {
        -1.0
    } else if velocity < 0.0 {
        1.0
    } else if offset < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Clamps `pos` into `[low, high]` when it is outside and still heading
/// outwards, reflecting and damping the velocity.
fn bounce_off_bounds(pos: &mut f32, velocity: &mut f32, low: f32, high: f32) {
    if *pos < low && *velocity < 0.0 {
        trace!(pos, low, "ball hit screen edge");
        *pos = low;
        *velocity = -*velocity * RESTITUTION;
    } else if *pos > high && *velocity > 0.0 {
        trace!(pos, high, "ball hit screen edge");
        *pos = high;
        *velocity = -*velocity * RESTITUTION;
    }
}
