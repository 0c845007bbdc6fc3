use std::{fmt, sync::Arc, time::Duration};

use cutover_config::GenericConfiguration;
use cutover_error::{generic_error, GenericError};
use cutover_metrics::MetricsBuilder;
use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds, PickFirst};

use crate::{Clock, SystemClock};

const fn default_max_skew() -> Duration {
    Duration::from_secs(10)
}

const fn default_report_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

fn default_metrics_builder() -> MetricsBuilder {
    MetricsBuilder::default().add_default_tag(("component", "reporter"))
}

/// Reporter configuration.
#[serde_as]
#[derive(Clone, Deserialize)]
pub struct ReporterConfiguration {
    /// Maximum amount the local clock may run behind the clock of the rule authoring service.
    ///
    /// Rules are matched against a window that extends this far into the future from the current time.
    ///
    /// Defaults to 10 seconds.
    #[serde_as(as = "PickFirst<(DurationMilliSeconds<u64>, DurationMilliSeconds<String>)>")]
    #[serde(rename = "reporter_max_positive_skew_ms", default = "default_max_skew")]
    max_positive_skew: Duration,

    /// Maximum amount the local clock may run ahead of the clock of the rule authoring service.
    ///
    /// Rules are matched against a window that extends this far into the past from the current time.
    ///
    /// Defaults to 10 seconds.
    #[serde_as(as = "PickFirst<(DurationMilliSeconds<u64>, DurationMilliSeconds<String>)>")]
    #[serde(rename = "reporter_max_negative_skew_ms", default = "default_max_skew")]
    max_negative_skew: Duration,

    /// How often to emit the number of in-flight reports.
    ///
    /// Defaults to 1 second.
    #[serde_as(as = "PickFirst<(DurationMilliSeconds<u64>, DurationMilliSeconds<String>)>")]
    #[serde(rename = "reporter_report_interval_ms", default = "default_report_interval")]
    report_interval: Duration,

    #[serde(skip, default = "default_clock")]
    clock: Arc<dyn Clock>,

    #[serde(skip, default = "default_metrics_builder")]
    metrics_builder: MetricsBuilder,
}

impl ReporterConfiguration {
    /// Creates a new `ReporterConfiguration` from the given configuration.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be deserialized as `ReporterConfiguration`, or is invalid, an error is returned.
    pub fn from_configuration(config: &GenericConfiguration) -> Result<Self, GenericError> {
        let config: Self = config.as_typed()?;
        config.validate()?;
        Ok(config)
    }

    /// Creates a new `ReporterConfiguration` with default values.
    pub fn with_defaults() -> Self {
        Self {
            max_positive_skew: default_max_skew(),
            max_negative_skew: default_max_skew(),
            report_interval: default_report_interval(),
            clock: default_clock(),
            metrics_builder: default_metrics_builder(),
        }
    }

    /// Sets the maximum positive clock skew.
    pub fn with_max_positive_skew(mut self, skew: Duration) -> Self {
        self.max_positive_skew = skew;
        self
    }

    /// Sets the maximum negative clock skew.
    pub fn with_max_negative_skew(mut self, skew: Duration) -> Self {
        self.max_negative_skew = skew;
        self
    }

    /// Sets the interval at which the number of in-flight reports is emitted.
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Sets the clock used to determine the current time when matching rules.
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Sets the instrumentation scope used to register the reporter's internal metrics.
    ///
    /// By default, metrics are tagged with `component:reporter`.
    pub fn with_metrics_builder(mut self, builder: MetricsBuilder) -> Self {
        self.metrics_builder = builder;
        self
    }

    /// Returns the maximum positive clock skew.
    pub fn max_positive_skew(&self) -> Duration {
        self.max_positive_skew
    }

    /// Returns the maximum negative clock skew.
    pub fn max_negative_skew(&self) -> Duration {
        self.max_negative_skew
    }

    /// Returns the interval at which the number of in-flight reports is emitted.
    pub fn report_interval(&self) -> Duration {
        self.report_interval
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub(crate) fn metrics_builder(&self) -> &MetricsBuilder {
        &self.metrics_builder
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// If the report interval is zero, an error is returned.
    pub fn validate(&self) -> Result<(), GenericError> {
        if self.report_interval.is_zero() {
            return Err(generic_error!("Report interval must be greater than zero."));
        }

        Ok(())
    }
}

impl fmt::Debug for ReporterConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterConfiguration")
            .field("max_positive_skew", &self.max_positive_skew)
            .field("max_negative_skew", &self.max_negative_skew)
            .field("report_interval", &self.report_interval)
            .field("metrics_builder", &self.metrics_builder)
            .finish_non_exhaustive()
    }
}
