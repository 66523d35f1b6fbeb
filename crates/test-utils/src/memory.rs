//! In-memory [`SpatialEngine`] for exercising handlers without a database.
//!
//! Evaluates the typed predicates of a built query against a fixed set of
//! footprints. The "encoded tile" is the big-endian ids of the matching
//! footprints, which is deterministic and empty exactly when nothing matches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use storage::{BuiltQuery, Predicate, QueryKind, SpatialEngine};
use tile_common::{EngineError, StatsResult, TileBlob};

use crate::fixtures::Footprint;

/// Test engine over a fixed footprint list.
pub struct MemoryEngine {
    features: Vec<Footprint>,
    failure: Option<EngineError>,
    delay: Option<Duration>,
    active: Arc<AtomicUsize>,
    peak_active: Arc<AtomicUsize>,
    executed: AtomicUsize,
    last_query: Mutex<Option<BuiltQuery>>,
}

impl MemoryEngine {
    pub fn new(features: Vec<Footprint>) -> Self {
        Self {
            features,
            failure: None,
            delay: None,
            active: Arc::new(AtomicUsize::new(0)),
            peak_active: Arc::new(AtomicUsize::new(0)),
            executed: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    /// An engine whose every query fails with `error`.
    pub fn failing(error: EngineError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(Vec::new())
        }
    }

    /// Hold each execution context open for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Execution contexts currently checked out.
    pub fn active_contexts(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously checked-out contexts seen.
    pub fn peak_contexts(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    /// Queries that reached the engine.
    pub fn executed_queries(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    /// The most recent query the engine was asked to run.
    pub fn last_query(&self) -> Option<BuiltQuery> {
        self.last_query.lock().ok().and_then(|q| q.clone())
    }

    fn checkout(&self, query: &BuiltQuery) -> ContextGuard {
        self.executed.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_query.lock() {
            *last = Some(query.clone());
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
        ContextGuard {
            active: Arc::clone(&self.active),
        }
    }

    async fn run<T>(
        &self,
        query: &BuiltQuery,
        expected: QueryKind,
        answer: impl FnOnce(Vec<&Footprint>) -> T,
    ) -> Result<T, EngineError> {
        let _context = self.checkout(query);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if query.kind() != expected {
            return Err(EngineError::Execution(format!(
                "expected a {:?} query, got {:?}",
                expected,
                query.kind()
            )));
        }

        Ok(answer(self.matching(query.predicates())))
    }

    fn matching(&self, predicates: &[Predicate]) -> Vec<&Footprint> {
        self.features
            .iter()
            .filter(|f| predicates.iter().all(|p| footprint_matches(f, p)))
            .collect()
    }
}

fn footprint_matches(footprint: &Footprint, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::TileEnvelope(address) => address
            .latlon_bounds()
            .map(|bounds| footprint.bbox.intersects(&bounds))
            .unwrap_or(false),
        Predicate::CategoryEquals(value) => footprint.category == *value,
        Predicate::SubcategoryEquals(value) => footprint.subcategory == *value,
    }
}

/// Releases its execution context on drop, whatever the exit path.
struct ContextGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SpatialEngine for MemoryEngine {
    async fn execute_tile(&self, query: &BuiltQuery) -> Result<TileBlob, EngineError> {
        self.run(query, QueryKind::Tile, |features| {
            let bytes: Vec<u8> = features.iter().flat_map(|f| f.id.to_be_bytes()).collect();
            TileBlob::from(bytes)
        })
        .await
    }

    async fn execute_stats(&self, query: &BuiltQuery) -> Result<StatsResult, EngineError> {
        self.run(query, QueryKind::Stats, |features| {
            let heights: Vec<f64> = features.iter().filter_map(|f| f.height).collect();
            let average = if heights.is_empty() {
                None
            } else {
                Some(heights.iter().sum::<f64>() / heights.len() as f64)
            };
            StatsResult::new(features.len() as u64, average)
        })
        .await
    }

    async fn ping(&self) -> Result<(), EngineError> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Ids encoded in a tile produced by [`MemoryEngine`].
pub fn decode_ids(tile: &[u8]) -> Vec<u32> {
    tile.chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
