use crate::{
    constants::{DEFAULT_ATTEMPTS, DEFAULT_COUNTDOWN, SCREEN_HEIGHT, SCREEN_WIDTH},
    error::GameError,
};

/// Smallest screen the built-in course can be laid out on.
pub const MIN_SCREEN_SIZE: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub course_id: u8,
    pub attempts: u32,
    /// Seconds a player gets to aim before the shot fires on its own.
    pub countdown: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            course_id: 1,
            attempts: DEFAULT_ATTEMPTS,
            countdown: DEFAULT_COUNTDOWN,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.width < MIN_SCREEN_SIZE || self.height < MIN_SCREEN_SIZE {
            return Err(GameError::ScreenTooSmall {
                width: self.width,
                height: self.height,
                min: MIN_SCREEN_SIZE,
            });
        }
        if self.attempts == 0 {
            return Err(GameError::NoAttempts);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{config::GameConfig, error::GameError};

    #[test]
    fn default_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_tiny_screens_and_zero_attempts() {
        let config = GameConfig {
            width: 10,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(GameError::ScreenTooSmall {
                width: 10,
                height: 240,
                min: 64
            })
        );
        let config = GameConfig {
            attempts: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(GameError::NoAttempts));
        assert_eq!(
            GameError::NoAttempts.to_string(),
            "a game needs at least one attempt"
        );
    }
}
