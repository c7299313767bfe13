use tracing::warn;

use crate::domain::ReleaseRecord;

/// Outcome of comparing one source's batch against its watermark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Records newer than the previous watermark, in feed order
    pub fresh: Vec<ReleaseRecord>,
    pub watermark: i64,
}

/// Select records published after `watermark` and compute the next watermark.
///
/// The next watermark is the maximum over every record in the batch, not just
/// the fresh ones, and never lower than the current one. Feeds do not promise
/// chronological order.
pub fn detect(source_key: &str, records: Vec<ReleaseRecord>, watermark: i64) -> Detection {
    if records.is_empty() {
        warn!(source = source_key, "source returned no releases");
        return Detection {
            fresh: Vec::new(),
            watermark,
        };
    }

    let next = records
        .iter()
        .map(|r| r.published_at)
        .fold(watermark, i64::max);

    let fresh: Vec<ReleaseRecord> = records
        .into_iter()
        .filter(|r| r.published_at > watermark)
        .collect();

    Detection {
        fresh,
        watermark: next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(timestamps: &[i64]) -> Vec<ReleaseRecord> {
        timestamps
            .iter()
            .map(|ts| ReleaseRecord::new("stable", format!("RouterOS {}", ts), *ts))
            .collect()
    }

    fn titles(records: &[ReleaseRecord]) -> Vec<String> {
        records.iter().map(|r| r.title.clone()).collect()
    }

    #[test]
    fn test_selects_strictly_newer() {
        let detection = detect("stable", batch(&[300, 200, 100]), 200);

        assert_eq!(titles(&detection.fresh), vec!["RouterOS 300"]);
        assert_eq!(detection.watermark, 300);
    }

    #[test]
    fn test_equal_to_watermark_is_not_fresh() {
        let detection = detect("stable", batch(&[200]), 200);

        assert!(detection.fresh.is_empty());
        assert_eq!(detection.watermark, 200);
    }

    #[test]
    fn test_empty_batch_keeps_watermark() {
        let detection = detect("stable", Vec::new(), 500);

        assert!(detection.fresh.is_empty());
        assert_eq!(detection.watermark, 500);
    }

    #[test]
    fn test_stale_batch_never_lowers_watermark() {
        let detection = detect("stable", batch(&[100, 50, 10]), 500);

        assert!(detection.fresh.is_empty());
        assert_eq!(detection.watermark, 500);
    }

    #[test]
    fn test_out_of_order_batch_takes_max() {
        let detection = detect("stable", batch(&[150, 400, 90, 250]), 100);

        // Feed order is preserved for the fresh records
        assert_eq!(
            titles(&detection.fresh),
            vec!["RouterOS 150", "RouterOS 400", "RouterOS 250"]
        );
        assert_eq!(detection.watermark, 400);
    }

    #[test]
    fn test_watermark_monotonic_over_many_batches() {
        let batches: [&[i64]; 5] = [&[10, 30], &[20], &[], &[5, 25, 30], &[31]];
        let mut watermark = 0;

        for b in batches {
            let next = detect("stable", batch(b), watermark).watermark;
            assert!(next >= watermark);
            watermark = next;
        }

        assert_eq!(watermark, 31);
    }

    #[test]
    fn test_first_run_selects_everything() {
        let detection = detect("stable", batch(&[3, 2, 1]), 0);
        assert_eq!(detection.fresh.len(), 3);
        assert_eq!(detection.watermark, 3);
    }
}
