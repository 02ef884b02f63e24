use std::str::FromStr;
use tracing::Level;

/// Parse a configured log level, falling back to WARN
pub fn parse_level(level: &str) -> Level {
    Level::from_str(level.trim()).unwrap_or(Level::WARN)
}

/// Install the global fmt subscriber.
///
/// Logs go to stderr; stdout belongs to the race board.
pub fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
