use derive_more::Display;
use tracing::{level_filters::LevelFilter, Level};

/// Logging context owned by a single strategy or service instance.
///
/// Records are prefixed with the component and implementation names and dropped if they are
/// more verbose than the level the instance was configured with.
#[derive(Clone, Copy, Display, Debug)]
#[display("{component}/{implementation}")]
pub struct ComponentLogger {
    component: &'static str,
    implementation: &'static str,
    level: LevelFilter,
}

impl ComponentLogger {
    #[must_use]
    pub const fn new(
        component: &'static str,
        implementation: &'static str,
        level: LevelFilter,
    ) -> Self {
        Self {
            component,
            implementation,
            level,
        }
    }

    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }
}

#[macro_export]
macro_rules! info_with_context {
    ($logger:expr, $($arg:tt)*) => {
        if $logger.enabled(::tracing::Level::INFO) {
            ::tracing::info!("[{}] {}", $logger, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! debug_with_context {
    ($logger:expr, $($arg:tt)*) => {
        if $logger.enabled(::tracing::Level::DEBUG) {
            ::tracing::debug!("[{}] {}", $logger, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! warn_with_context {
    ($logger:expr, $($arg:tt)*) => {
        if $logger.enabled(::tracing::Level::WARN) {
            ::tracing::warn!("[{}] {}", $logger, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! error_with_context {
    ($logger:expr, $($arg:tt)*) => {
        if $logger.enabled(::tracing::Level::ERROR) {
            ::tracing::error!("[{}] {}", $logger, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! trace_with_context {
    ($logger:expr, $($arg:tt)*) => {
        if $logger.enabled(::tracing::Level::TRACE) {
            ::tracing::trace!("[{}] {}", $logger, format_args!($($arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_more_verbose_than_configured_are_disabled() {
        let logger = ComponentLogger::new("beacon_block_proposal", "best", LevelFilter::INFO);

        assert!(logger.enabled(Level::ERROR));
        assert!(logger.enabled(Level::WARN));
        assert!(logger.enabled(Level::INFO));
        assert!(!logger.enabled(Level::DEBUG));
        assert!(!logger.enabled(Level::TRACE));
    }

    #[test]
    fn off_disables_everything() {
        let logger = ComponentLogger::new("beacon_committee_subscriber", "standard", LevelFilter::OFF);

        assert!(!logger.enabled(Level::ERROR));
    }

    #[test]
    fn display_names_component_and_implementation() {
        let logger = ComponentLogger::new("beacon_committee_subscriber", "standard", LevelFilter::TRACE);

        assert_eq!(logger.to_string(), "beacon_committee_subscriber/standard");
    }
}
