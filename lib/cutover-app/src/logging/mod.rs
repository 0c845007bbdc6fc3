//! Logging.

use cutover_error::{generic_error, GenericError};
use tracing_subscriber::{
    fmt::Layer, layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer as _, Registry,
};

mod config;
pub use self::config::LoggingConfiguration;

/// Initializes the logging subsystem for `tracing`.
///
/// Events are filtered according to `log_level`, which accepts anything an `EnvFilter` directive does (`info`,
/// `cutover_reporter=debug,warn`, and so on), and are written to standard error. When `log_format_json` is set, each
/// event is written as a single JSON object.
///
/// # Errors
///
/// If the logging subsystem was already initialized, an error will be returned.
pub fn initialize_logging(config: &LoggingConfiguration) -> Result<(), GenericError> {
    let format_layer: Box<dyn tracing_subscriber::Layer<Registry> + Send + Sync> = if config.log_format_json {
        Layer::new()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        Layer::new().with_target(true).with_writer(std::io::stderr).boxed()
    };

    tracing_subscriber::registry()
        .with(format_layer.with_filter(config.log_level.as_env_filter()))
        .try_init()
        .map_err(|e| generic_error!("Failed to initialize logging: {}", e))
}
