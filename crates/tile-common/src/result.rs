//! Result shapes returned by the spatial store.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One encoded vector tile.
///
/// A zero-length blob is a valid result: nothing intersects the tile under
/// the requested filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileBlob(Bytes);

impl TileBlob {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Vec<u8>> for TileBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

/// Aggregate over the filtered footprint set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsResult {
    pub count: u64,
    /// Absent when no rows matched.
    pub average_height: Option<f64>,
}

impl StatsResult {
    /// Build a result, dropping the average when there are no rows.
    ///
    /// An average is also dropped if it is not finite, which is what an
    /// aggregate over rows whose heights are all null would produce.
    pub fn new(count: u64, average_height: Option<f64>) -> Self {
        let average_height = if count == 0 {
            None
        } else {
            average_height.filter(|h| h.is_finite())
        };
        Self {
            count,
            average_height,
        }
    }

    pub fn empty() -> Self {
        Self {
            count: 0,
            average_height: None,
        }
    }

    /// Average height rounded to `places` decimal places.
    ///
    /// Rounds the exact binary value to nearest, ties to even, so `2.675`
    /// (stored just below the tie) gives `2.67` and `10.125` gives `10.12`.
    pub fn rounded_average(&self, places: u32) -> Option<f64> {
        self.average_height.and_then(|h| {
            format!("{:.*}", places as usize, h).parse().ok()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_blob() {
        let blob = TileBlob::empty();
        assert!(blob.is_empty());
        assert_eq!(blob.len(), 0);
        assert_eq!(blob, TileBlob::from(Vec::new()));
    }

    #[test]
    fn test_blob_bytes() {
        let blob = TileBlob::new(vec![0x1a, 0x02, 0x78]);
        assert_eq!(blob.len(), 3);
        assert_eq!(blob.as_bytes(), &[0x1a, 0x02, 0x78]);
        assert_eq!(blob.into_bytes(), Bytes::from_static(&[0x1a, 0x02, 0x78]));
    }

    #[test]
    fn test_zero_count_has_no_average() {
        let stats = StatsResult::new(0, Some(12.5));
        assert_eq!(stats, StatsResult::empty());
        assert_eq!(stats.rounded_average(2), None);
    }

    #[test]
    fn test_rounded_average() {
        let stats = StatsResult::new(3, Some(12.34567));
        assert_eq!(stats.rounded_average(2), Some(12.35));
        assert_eq!(stats.rounded_average(0), Some(12.0));

        let stats = StatsResult::new(2, Some(20.0));
        assert_eq!(stats.rounded_average(2), Some(20.0));

        for (average, rounded) in [(10.125, 10.12), (0.125, 0.12), (2.675, 2.67), (0.375, 0.38)] {
            let stats = StatsResult::new(2, Some(average));
            assert_eq!(stats.rounded_average(2), Some(rounded), "{average}");
        }
        assert_eq!(StatsResult::new(1, Some(-2.675)).rounded_average(2), Some(-2.67));
    }

    #[test]
    fn test_null_heights_keep_count() {
        let stats = StatsResult::new(4, None);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.average_height, None);

        let stats = StatsResult::new(4, Some(f64::NAN));
        assert_eq!(stats.average_height, None);
    }
}
