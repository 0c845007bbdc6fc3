use metrics::{gauge, Gauge, Label, SharedString};

mod private {
    use metrics::SharedString;

    pub trait Sealed {}

    impl Sealed for &'static str {}
    impl Sealed for String {}
    impl<T> Sealed for (&'static str, T) where T: Into<SharedString> {}
}

/// A metric tag.
///
/// Marker trait for types which can be used as a metric tag.
///
/// This trait is sealed and cannot be implemented outside of this crate.
pub trait MetricTag: private::Sealed {
    /// Consumes `self` and converts it to a tag.
    ///
    /// The [`metrics`][metrics] crate calls tags "labels", which is where the return type naming comes from.
    ///
    /// [metrics]: https://docs.rs/metrics
    fn into_label(self) -> Label;
}

impl MetricTag for &'static str {
    fn into_label(self) -> Label {
        match self.split_once(':') {
            Some((key, value)) => Label::from_static_parts(key, value),
            None => Label::from_static_parts(self, ""),
        }
    }
}

impl MetricTag for String {
    fn into_label(self) -> Label {
        match self.split_once(':') {
            Some((key, value)) => Label::new(key.to_string(), value.to_string()),
            None => Label::new(self, ""),
        }
    }
}

impl<T> MetricTag for (&'static str, T)
where
    T: Into<SharedString>,
{
    fn into_label(self) -> Label {
        Label::new(SharedString::const_str(self.0), self.1.into())
    }
}

/// Builder for constructing metrics.
///
/// A `MetricsBuilder` acts as an instrumentation scope: it carries a set of default tags which are attached to every
/// metric registered through it, so that all metrics emitted by a component are consistently tagged with, for
/// example, the component's identity.
#[derive(Clone, Debug, Default)]
pub struct MetricsBuilder {
    default_tags: Vec<Label>,
}

impl MetricsBuilder {
    /// Adds an additional default tag to use when constructing metrics.
    ///
    /// These tags will be included along with any existing default tags configured in the builder.
    ///
    /// Tags can be provided in numerous forms:
    /// - individual tags (`"tag_name"` or `"tag_name:tag_value"`, either as `&'static str` or `String`)
    /// - key/value tuples (`("tag_name", "tag_value")`, with the name as `&'static str` and the value as either
    ///   `&'static str` or `String`)
    pub fn add_default_tag<T>(mut self, tag: T) -> Self
    where
        T: MetricTag,
    {
        self.default_tags.push(tag.into_label());
        self
    }

    /// Returns the default tags configured for this builder.
    pub fn default_tags(&self) -> &[Label] {
        &self.default_tags
    }

    /// Registers a gauge with additional tags.
    ///
    /// The gauge will include the configured default tags for this builder, followed by the additional tags provided.
    ///
    /// See [`add_default_tag`](MetricsBuilder::add_default_tag) for information on the supported tag formats.
    pub fn register_gauge_with_tags<I, T>(&self, metric_name: &'static str, additional_tags: I) -> Gauge
    where
        I: IntoIterator<Item = T>,
        T: MetricTag,
    {
        let mut tags = self.default_tags.clone();
        tags.extend(additional_tags.into_iter().map(MetricTag::into_label));

        gauge!(metric_name, tags)
    }
}

#[cfg(test)]
mod tests {
    use metrics::Key;

    use super::*;
    use crate::test::TestRecorder;

    #[test]
    fn tag_forms() {
        assert_eq!("component:reporter".into_label(), Label::new("component", "reporter"));
        assert_eq!("bare".into_label(), Label::new("bare", ""));
        assert_eq!(
            String::from("host:web-01").into_label(),
            Label::new("host", "web-01")
        );
        assert_eq!(("host", String::from("web-02")).into_label(), Label::new("host", "web-02"));
    }

    #[test]
    fn gauge_carries_default_and_additional_tags() {
        let recorder = TestRecorder::default();
        let builder = MetricsBuilder::default().add_default_tag(("component", "reporter"));

        let gauge = metrics::with_local_recorder(&recorder, || {
            builder.register_gauge_with_tags("report_pending", [("host", "web-01")])
        });
        gauge.set(3.0);

        let key = Key::from_parts(
            "report_pending",
            vec![Label::new("component", "reporter"), Label::new("host", "web-01")],
        );
        assert_eq!(recorder.gauge(key), Some(3.0));
        assert_eq!(recorder.gauge("report_pending"), None);
    }
}
