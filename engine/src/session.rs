use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    config::GameConfig,
    constants::{
        ARROW_COLOR, ARROW_HEAD_LENGTH, ARROW_HEAD_SPREAD, ARROW_LENGTH, BALL_COLOR, BALL_RADIUS,
        COUNTDOWN_COLOR, GOAL_RADIUS, HOLE_COLOR, HOLE_RADIUS, PIP_INSET, PIP_RADIUS, PIP_SPACING,
        WALL_COLOR,
    },
    course::Course,
    device::{PixelController, StaleInput},
    error::GameError,
    framebuffer::{Canvas, Color, FrameBuffer},
    physics::{Ball, Step},
    raster::{draw_direction_arrow, draw_filled_circle, draw_line},
    shared::SharedState,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Sunk { strokes: u32 },
    OutOfStrokes { strokes: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Aiming,
    InFlight,
    Finished(Outcome),
}

/// The main loop's half of the game: everything that happens once per frame.
pub struct Session {
    shared: Arc<SharedState>,
    course: Course,
    ball: Ball,
    phase: Phase,
    attempts: u32,
    strokes: u32,
    turn: u32,
    shoot_locked: bool,
    width: i32,
    height: i32,
}

impl Session {
    pub fn new(config: &GameConfig, shared: Arc<SharedState>) -> Result<Self, GameError> {
        config.validate()?;
        let course = Course::generate(config.course_id, config.width, config.height)?;
        Self::with_course(config, course, shared)
    }

    /// A session on a ready-made course instead of a generated one.
    pub fn with_course(
        config: &GameConfig,
        course: Course,
        shared: Arc<SharedState>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let ball = Ball::new(course.tee, BALL_RADIUS, BALL_COLOR);
        let turn = shared.turn();
        info!(
            course_id = course.id,
            attempts = config.attempts,
            "session started"
        );
        Ok(Self {
            shared,
            course,
            ball,
            phase: Phase::Aiming,
            attempts: config.attempts,
            strokes: 0,
            turn,
            shoot_locked: false,
            width: config.width as i32,
            height: config.height as i32,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts
    }

    pub fn strokes(&self) -> u32 {
        self.strokes
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    /// One whole frame: simulate, draw, wait for vsync and swap, then throw
    /// away input that piled up during the wait.
    pub fn run_frame<D, I>(&mut self, fb: &mut FrameBuffer, display: &mut D, input: &mut I)
    where
        D: PixelController + ?Sized,
        I: StaleInput + ?Sized,
    {
        self.update();
        self.render(fb);
        fb.present(display);
        input.flush_stale();
    }

    pub fn update(&mut self) {
        let shoot = self.shared.shoot();
        match self.phase {
            Phase::Aiming => {
                // only a release seen while aiming re-arms the trigger, so a
                // press made during flight stays spent.
                if !shoot {
                    self.shoot_locked = false;
                }
                // power and countdown still belong to the last turn until the
                // handler has reset them.
                if self.shared.turn_applied() != self.turn {
                    return;
                }
                if (shoot && !self.shoot_locked) || self.shared.countdown() == 0 {
                    self.take_shot();
                }
            }
            Phase::InFlight => {
                if self.ball.step(&self.course, self.width, self.height) == Step::Stopped {
                    self.ball_stopped();
                }
            }
            Phase::Finished(_) => {}
        }
    }

    fn take_shot(&mut self) {
        self.shared.set_running(false);
        let power = self.shared.power();
        let angle = self.shared.angle();
        self.ball.shoot(power, angle);
        self.shoot_locked = true;
        self.attempts -= 1;
        self.strokes += 1;
        self.turn = self.turn.wrapping_add(1);
        self.shared.set_turn(self.turn);
        self.shared.set_paused(true);
        self.phase = Phase::InFlight;
        info!(
            power,
            angle,
            stroke = self.strokes,
            attempts_left = self.attempts,
            "shot"
        );
    }

    fn ball_stopped(&mut self) {
        let rest = self.ball.position();
        let goal = self.course.goal;
        let in_hole = rest.distance_sq(goal) <= (GOAL_RADIUS as i64).pow(2);
        let outcome = if in_hole {
            Some(Outcome::Sunk {
                strokes: self.strokes,
            })
        } else if self.attempts == 0 {
            Some(Outcome::OutOfStrokes {
                strokes: self.strokes,
            })
        } else {
            None
        };
        match outcome {
            Some(outcome) => {
                info!(?outcome, x = rest.x, y = rest.y, "game over");
                self.phase = Phase::Finished(outcome);
            }
            None => {
                debug!(x = rest.x, y = rest.y, "next turn");
                self.shared.set_paused(false);
                self.shared.set_running(true);
                self.phase = Phase::Aiming;
            }
        }
    }

    pub fn render(&self, fb: &mut FrameBuffer) {
        fb.clear();
        for wall in &self.course.walls {
            let (a, b) = wall.endpoints();
            draw_line(fb, a.x, a.y, b.x, b.y, WALL_COLOR);
        }
        let goal = self.course.goal;
        draw_filled_circle(fb, goal.x, goal.y, HOLE_RADIUS, HOLE_COLOR);

        match self.phase {
            Phase::Aiming => {
                let tee = self.ball.tee();
                let angle = self.shared.angle();
                draw_direction_arrow(
                    fb,
                    tee.x,
                    tee.y,
                    angle.cos(),
                    angle.sin(),
                    ARROW_LENGTH,
                    ARROW_HEAD_LENGTH,
                    ARROW_HEAD_SPREAD,
                    ARROW_COLOR,
                );
            }
            Phase::InFlight | Phase::Finished(_) => {
                let at = self.ball.position();
                draw_filled_circle(fb, at.x, at.y, self.ball.radius(), self.ball.color());
            }
        }

        draw_pips(fb, self.shared.countdown(), PIP_INSET, PIP_SPACING, COUNTDOWN_COLOR);
        let right = self.width - 1 - PIP_INSET;
        draw_pips(fb, self.attempts, right, -PIP_SPACING, BALL_COLOR);
    }
}

/// `count` dots in a row along the top edge, starting at `x` and `step`
/// pixels apart.
fn draw_pips<C: Canvas + ?Sized>(canvas: &mut C, count: u32, x: i32, step: i32, color: Color) {
    for i in 0..count.min(canvas.width() as u32) as i32 {
        draw_filled_circle(canvas, x + i * step, PIP_INSET, PIP_RADIUS, color);
    }
}
