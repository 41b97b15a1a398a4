use tracing::{Dispatch, Level};
use tracing_subscriber::EnvFilter;

/// Env var holding an `EnvFilter` directive that overrides `-v`.
pub const LOG_ENV: &str = "MAINLINE_LOG";

pub fn level_for(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Builds the handle every command logs through. Nothing is installed globally.
pub fn logger(level: Level) -> Dispatch {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    Dispatch::new(subscriber)
}
