use std::fmt;

/// An aggregation function applied to a metric.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum AggregationType {
    /// Last value seen.
    Last = 1,
    /// Minimum value.
    Min,
    /// Maximum value.
    Max,
    /// Arithmetic mean.
    Mean,
    /// Median value.
    Median,
    /// Number of values.
    Count,
    /// Sum of values.
    Sum,
    /// Sum of squared values.
    SumSq,
    /// Standard deviation.
    Stdev,
    /// 10th percentile.
    P10,
    /// 20th percentile.
    P20,
    /// 30th percentile.
    P30,
    /// 40th percentile.
    P40,
    /// 50th percentile.
    P50,
    /// 60th percentile.
    P60,
    /// 70th percentile.
    P70,
    /// 75th percentile.
    P75,
    /// 80th percentile.
    P80,
    /// 90th percentile.
    P90,
    /// 95th percentile.
    P95,
    /// 99th percentile.
    P99,
    /// 99.9th percentile.
    P999,
    /// 99.99th percentile.
    P9999,
}

impl AggregationType {
    /// All aggregation types, in identifier order.
    pub const ALL: [AggregationType; 23] = [
        Self::Last,
        Self::Min,
        Self::Max,
        Self::Mean,
        Self::Median,
        Self::Count,
        Self::Sum,
        Self::SumSq,
        Self::Stdev,
        Self::P10,
        Self::P20,
        Self::P30,
        Self::P40,
        Self::P50,
        Self::P60,
        Self::P70,
        Self::P75,
        Self::P80,
        Self::P90,
        Self::P95,
        Self::P99,
        Self::P999,
        Self::P9999,
    ];

    const fn bit(self) -> u64 {
        1 << (self as u8)
    }
}

/// A compressed set of aggregation types.
///
/// The default ID is the empty set, which means the aggregation types are chosen by the aggregation tier based on the
/// metric type.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct AggregationId(u64);

impl AggregationId {
    /// The default aggregation ID.
    pub const DEFAULT: AggregationId = AggregationId(0);

    /// Compresses the given aggregation types into an aggregation ID.
    ///
    /// Duplicate types are ignored.
    pub fn compress(types: &[AggregationType]) -> Self {
        Self(types.iter().fold(0, |bits, ty| bits | ty.bit()))
    }

    /// Returns `true` if this is the default aggregation ID.
    pub const fn is_default(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the given aggregation type is part of this ID.
    pub const fn contains(&self, ty: AggregationType) -> bool {
        self.0 & ty.bit() != 0
    }

    /// Returns an iterator over the aggregation types in this ID, in identifier order.
    pub fn types(&self) -> impl Iterator<Item = AggregationType> + '_ {
        AggregationType::ALL.into_iter().filter(|ty| self.contains(*ty))
    }
}

impl fmt::Debug for AggregationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            return f.write_str("AggregationId(default)");
        }

        f.debug_tuple("AggregationId")
            .field(&self.types().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(AggregationId::DEFAULT.is_default());
        assert_eq!(AggregationId::compress(&[]), AggregationId::DEFAULT);
        assert_eq!(AggregationId::DEFAULT.types().count(), 0);
    }

    #[test]
    fn compress_is_order_and_duplicate_insensitive() {
        let a = AggregationId::compress(&[AggregationType::Max, AggregationType::P9999]);
        let b = AggregationId::compress(&[AggregationType::P9999, AggregationType::Max, AggregationType::Max]);

        assert_eq!(a, b);
        assert!(a.contains(AggregationType::Max));
        assert!(a.contains(AggregationType::P9999));
        assert!(!a.contains(AggregationType::Min));
        assert_eq!(
            a.types().collect::<Vec<_>>(),
            vec![AggregationType::Max, AggregationType::P9999]
        );
    }
}
