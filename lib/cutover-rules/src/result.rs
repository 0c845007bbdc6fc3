use bytes::Bytes;

use crate::{active_staged_metadatas_at, StagedMetadata, StagedMetadatas};

/// A metric identifier along with its staged metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct IdWithMetadatas {
    /// Metric identifier.
    pub id: Bytes,

    /// Staged metadata for the identifier, sorted in ascending order of cutover time.
    pub metadatas: StagedMetadatas,
}

/// A borrowed view of a rollup identifier and the stages of its metadata relevant at a given time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RollupIdWithMetadatas<'a> {
    /// Rollup metric identifier.
    pub id: &'a Bytes,

    /// Relevant stages of the rollup's staged metadata.
    pub metadatas: &'a [StagedMetadata],
}

/// The result of matching a metric identifier against the active rule set.
///
/// A match result carries the staged metadata for the queried identifier itself, as well as for every rollup
/// identifier the rules expand the queried identifier into. Each rollup is a distinct series which receives the same
/// raw values as the queried identifier, but is aggregated according to its own metadata.
///
/// Match results are valid until `expire_at_nanos`, after which the rule set may have changed and the identifier needs
/// to be matched again.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    version: i64,
    expire_at_nanos: i64,
    for_existing_id: StagedMetadatas,
    for_new_rollup_ids: Vec<IdWithMetadatas>,
}

impl MatchResult {
    /// Creates a new `MatchResult`.
    pub fn new(
        version: i64, expire_at_nanos: i64, for_existing_id: StagedMetadatas, for_new_rollup_ids: Vec<IdWithMetadatas>,
    ) -> Self {
        Self {
            version,
            expire_at_nanos,
            for_existing_id,
            for_new_rollup_ids,
        }
    }

    /// Returns the version of the rule set this result was produced from.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns the time at which this result expires, in nanoseconds since the Unix epoch.
    pub fn expire_at_nanos(&self) -> i64 {
        self.expire_at_nanos
    }

    /// Returns `true` if this result has expired as of `time_nanos`.
    pub fn has_expired(&self, time_nanos: i64) -> bool {
        self.expire_at_nanos <= time_nanos
    }

    /// Returns the number of rollup identifiers in this result, including dropped ones.
    pub fn num_new_rollup_ids(&self) -> usize {
        self.for_new_rollup_ids.len()
    }

    /// Returns the stages of the queried identifier's metadata relevant at `time_nanos`.
    pub fn for_existing_id_at(&self, time_nanos: i64) -> &[StagedMetadata] {
        active_staged_metadatas_at(&self.for_existing_id, time_nanos)
    }

    /// Returns the rollup identifiers live at `time_nanos`, along with their relevant metadata stages.
    ///
    /// Rollups are yielded in the order they appear in the result. A rollup whose active stage at `time_nanos` is
    /// tombstoned has been dropped, and is skipped.
    pub fn for_new_rollup_ids_at(&self, time_nanos: i64) -> impl Iterator<Item = RollupIdWithMetadatas<'_>> {
        self.for_new_rollup_ids.iter().filter_map(move |rollup| {
            let metadatas = active_staged_metadatas_at(&rollup.metadatas, time_nanos);
            let dropped = metadatas
                .first()
                .is_some_and(|stage| stage.tombstoned && stage.cutover_nanos <= time_nanos);

            (!dropped).then_some(RollupIdWithMetadatas {
                id: &rollup.id,
                metadatas,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{default_staged_metadatas, Metadata};

    fn stage(cutover_nanos: i64, tombstoned: bool) -> StagedMetadata {
        StagedMetadata {
            cutover_nanos,
            tombstoned,
            metadata: Metadata::default(),
        }
    }

    fn rollup(id: &'static str, metadatas: StagedMetadatas) -> IdWithMetadatas {
        IdWithMetadatas {
            id: Bytes::from_static(id.as_bytes()),
            metadatas,
        }
    }

    #[test]
    fn expiry() {
        let result = MatchResult::new(3, 1_000, default_staged_metadatas(), Vec::new());
        assert_eq!(result.version(), 3);
        assert_eq!(result.expire_at_nanos(), 1_000);
        assert!(!result.has_expired(999));
        assert!(result.has_expired(1_000));
    }

    #[test]
    fn existing_id_stages() {
        let existing = vec![stage(0, false), stage(500, false), stage(i64::MAX, false)];
        let result = MatchResult::new(0, i64::MAX, existing.clone(), Vec::new());

        assert_eq!(result.for_existing_id_at(100), &existing[..]);
        assert_eq!(result.for_existing_id_at(600), &existing[1..]);
    }

    #[test]
    fn tombstoned_rollups_are_skipped() {
        let result = MatchResult::new(
            0,
            i64::MAX,
            default_staged_metadatas(),
            vec![
                rollup("foo", default_staged_metadatas()),
                rollup("bar", vec![stage(100, false), stage(200, true)]),
                rollup("baz", vec![stage(100, false), stage(5_000, true)]),
            ],
        );
        assert_eq!(result.num_new_rollup_ids(), 3);

        // At 150, "bar" is still live.
        let live = result.for_new_rollup_ids_at(150).map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(live, vec!["foo", "bar", "baz"]);

        // At 1000, "bar" has been tombstoned, while "baz" is only scheduled to be.
        let live = result.for_new_rollup_ids_at(1_000).collect::<Vec<_>>();
        assert_eq!(live.len(), 2);
        assert_eq!(live[0].id, "foo");
        assert_eq!(live[1].id, "baz");
        assert_eq!(live[1].metadatas, &[stage(100, false), stage(5_000, true)][..]);
    }

    #[test]
    fn tombstone_scheduled_in_future_only() {
        // A rollup whose only stage is a future tombstone hasn't been dropped yet.
        let result = MatchResult::new(
            0,
            i64::MAX,
            default_staged_metadatas(),
            vec![rollup("qux", vec![stage(10_000, true)])],
        );

        assert_eq!(result.for_new_rollup_ids_at(100).count(), 1);
        assert_eq!(result.for_new_rollup_ids_at(10_000).count(), 0);
    }
}
