use cutover_config::GenericConfiguration;
use cutover_error::{generic_error, ErrorContext as _, GenericError};
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

fn default_log_level() -> LogLevel {
    LevelFilter::INFO.into()
}

/// Logging configuration.
#[serde_as]
#[derive(Deserialize)]
pub struct LoggingConfiguration {
    /// Log level filtering directives.
    ///
    /// Defaults to `info`.
    #[serde(default = "default_log_level")]
    pub(crate) log_level: LogLevel,

    /// Whether to format log events as JSON.
    ///
    /// Accepts either a boolean or a string form of one, as environment variables are always strings.
    ///
    /// Defaults to `false`.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub(crate) log_format_json: bool,
}

impl LoggingConfiguration {
    /// Creates a new `LoggingConfiguration` from the given configuration.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be deserialized as `LoggingConfiguration`, an error is returned.
    pub fn from_configuration(config: &GenericConfiguration) -> Result<Self, GenericError> {
        Ok(config.as_typed()?)
    }

    /// Creates a new `LoggingConfiguration` with default values.
    pub fn with_defaults() -> Self {
        Self {
            log_level: default_log_level(),
            log_format_json: false,
        }
    }
}

#[derive(Deserialize)]
#[serde(try_from = "String")]
pub(crate) struct LogLevel(EnvFilter);

impl LogLevel {
    pub fn as_env_filter(&self) -> EnvFilter {
        // `EnvFilter` isn't `Clone`, so rebuild it from its rendered directives.
        EnvFilter::builder().parse_lossy(self.0.to_string())
    }
}

impl From<LevelFilter> for LogLevel {
    fn from(level: LevelFilter) -> Self {
        Self(EnvFilter::default().add_directive(level.into()))
    }
}

impl TryFrom<String> for LogLevel {
    type Error = GenericError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(generic_error!("Log level cannot be empty."));
        }

        EnvFilter::builder()
            .parse(value)
            .map(Self)
            .error_context("Failed to parse valid log level.")
    }
}

#[cfg(test)]
mod tests {
    use cutover_config::ConfigurationLoader;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<LoggingConfiguration, GenericError> {
        let values = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<std::collections::BTreeMap<_, _>>();
        let config = ConfigurationLoader::default().add_static_values(values).into_generic();
        LoggingConfiguration::from_configuration(&config)
    }

    #[test]
    fn defaults() {
        let config = load(&[]).expect("should not fail with no values");
        assert!(!config.log_format_json);
        assert_eq!(config.log_level.as_env_filter().to_string(), "info");
    }

    #[test]
    fn directives_and_json() {
        let config = load(&[("log_level", "cutover_reporter=debug,warn"), ("log_format_json", "true")])
            .expect("should not fail to parse");
        assert!(config.log_format_json);

        let rendered = config.log_level.as_env_filter().to_string();
        assert!(rendered.contains("cutover_reporter=debug"));
        assert!(rendered.contains("warn"));
    }

    #[test]
    fn empty_level_is_rejected() {
        assert!(load(&[("log_level", "")]).is_err());
    }

    #[test]
    fn invalid_level_is_rejected() {
        assert!(load(&[("log_level", "cutover_reporter=loud")]).is_err());
    }
}
