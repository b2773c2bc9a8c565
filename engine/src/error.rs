use thiserror::Error;

/// Everything that can go wrong while setting a game up. Once a session is
/// running there is no error path: anomalies are clipped, ignored or logged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("course {course_id} has no layout")]
    CourseUnimplemented { course_id: u8 },

    #[error("screen must be at least {min}x{min} pixels, got {width}x{height}")]
    ScreenTooSmall {
        width: usize,
        height: usize,
        min: usize,
    },

    #[error("a game needs at least one attempt")]
    NoAttempts,
}
