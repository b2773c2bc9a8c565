use tracing::debug;

use crate::error::GameError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Point) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

/// An axis-aligned wall segment. Endpoints are inclusive and may be given in
/// either order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wall {
    Horizontal { y: i32, x0: i32, x1: i32 },
    Vertical { x: i32, y0: i32, y1: i32 },
}

impl Wall {
    pub fn endpoints(self) -> (Point, Point) {
        match self {
            Wall::Horizontal { y, x0, x1 } => (Point::new(x0, y), Point::new(x1, y)),
            Wall::Vertical { x, y0, y1 } => (Point::new(x, y0), Point::new(x, y1)),
        }
    }

    /// The covered range along the wall's own axis, lowest first.
    pub fn span(self) -> (i32, i32) {
        let (a, b) = match self {
            Wall::Horizontal { x0, x1, .. } => (x0, x1),
            Wall::Vertical { y0, y1, .. } => (y0, y1),
        };
        (a.min(b), a.max(b))
    }
}

/// A hole: the walls in collision order, where the ball starts and where it
/// has to end up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Course {
    pub id: u8,
    pub walls: Vec<Wall>,
    pub tee: Point,
    pub goal: Point,
}

/// Course 1 laid out for this screen size; everything else scales from it.
const REFERENCE_WIDTH: i32 = 320;
const REFERENCE_HEIGHT: i32 = 240;

impl Course {
    /// Lays out course `course_id` on a `width` x `height` screen. Only the
    /// first course has a layout.
    pub fn generate(course_id: u8, width: usize, height: usize) -> Result<Self, GameError> {
        let sx = |x: i32| x * width as i32 / REFERENCE_WIDTH;
        let sy = |y: i32| y * height as i32 / REFERENCE_HEIGHT;
        let course = match course_id {
            1 => Course {
                id: 1,
                walls: vec![
                    Wall::Vertical {
                        x: sx(100),
                        y0: sy(0),
                        y1: sy(150),
                    },
                    Wall::Horizontal {
                        y: sy(150),
                        x0: sx(60),
                        x1: sx(100),
                    },
                    Wall::Vertical {
                        x: sx(200),
                        y0: sy(90),
                        y1: sy(239),
                    },
                    Wall::Horizontal {
                        y: sy(90),
                        x0: sx(200),
                        x1: sx(250),
                    },
                ],
                tee: Point::new(sx(30), sy(120)),
                goal: Point::new(sx(285), sy(120)),
            },
            course_id => return Err(GameError::CourseUnimplemented { course_id }),
        };
        debug!(
            course_id,
            walls = course.walls.len(),
            "generated course"
        );
        Ok(course)
    }

    /// A course with no walls at all, used for open-field play and tests.
    pub fn empty(tee: Point, goal: Point) -> Self {
        Self {
            id: 0,
            walls: Vec::new(),
            tee,
            goal,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        course::{Course, Point, Wall},
        error::GameError,
    };

    #[test]
    fn first_course_fits_the_screen() {
        let course = Course::generate(1, 320, 240).unwrap();
        assert_eq!(course.id, 1);
        assert!(!course.walls.is_empty());
        for wall in &course.walls {
            let (a, b) = wall.endpoints();
            for p in [a, b] {
                assert!((0..320).contains(&p.x) && (0..240).contains(&p.y), "{wall:?}");
            }
        }
        assert_ne!(course.tee, course.goal);
    }

    #[test]
    fn course_scales_with_the_screen() {
        let small = Course::generate(1, 160, 120).unwrap();
        let full = Course::generate(1, 320, 240).unwrap();
        assert_eq!(small.tee, Point::new(full.tee.x / 2, full.tee.y / 2));
        assert_eq!(small.walls.len(), full.walls.len());
    }

    #[test]
    fn other_courses_are_unimplemented() {
        for course_id in [0, 2, 3, u8::MAX] {
            assert_eq!(
                Course::generate(course_id, 320, 240),
                Err(GameError::CourseUnimplemented { course_id })
            );
        }
    }

    #[test]
    fn span_is_ordered() {
        let wall = Wall::Vertical { x: 4, y0: 30, y1: 10 };
        assert_eq!(wall.span(), (10, 30));
        let wall = Wall::Horizontal { y: 4, x0: 1, x1: 9 };
        assert_eq!(wall.span(), (1, 9));
        assert_eq!(
            wall.endpoints(),
            (Point::new(1, 4), Point::new(9, 4))
        );
    }

    #[test]
    fn distance() {
        assert_eq!(Point::new(0, 0).distance_sq(Point::new(3, 4)), 25);
    }
}
