use tracing::Level;

/// Browser console method an event is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Error,
    Warn,
    Log,
}

impl ConsoleLevel {
    #[must_use]
    pub fn for_level(level: &Level) -> Self {
        if *level == Level::ERROR {
            Self::Error
        } else if *level == Level::WARN {
            Self::Warn
        } else {
            Self::Log
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_event_level_only() {
        assert_eq!(ConsoleLevel::for_level(&Level::ERROR), ConsoleLevel::Error);
        assert_eq!(ConsoleLevel::for_level(&Level::WARN), ConsoleLevel::Warn);
        for level in [Level::INFO, Level::DEBUG, Level::TRACE] {
            assert_eq!(ConsoleLevel::for_level(&level), ConsoleLevel::Log);
        }
    }
}
