//! Request metrics recorded through the `metrics` facade.
//!
//! The Prometheus recorder is installed by the binary; without it these
//! calls are no-ops.

use std::time::Duration;

use metrics::{counter, histogram};

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// Tile request that produced a zero-length tile.
    Empty,
    Malformed,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Empty => "empty",
            Outcome::Malformed => "malformed",
            Outcome::Error => "error",
        }
    }
}

pub fn record_tile_request(outcome: Outcome, bytes: usize, elapsed: Duration) {
    counter!("tile_requests_total", "outcome" => outcome.as_str()).increment(1);
    counter!("tile_bytes_total").increment(bytes as u64);
    histogram!("tile_duration_ms").record(elapsed.as_secs_f64() * 1000.0);
}

pub fn record_stats_request(outcome: Outcome, elapsed: Duration) {
    counter!("stats_requests_total", "outcome" => outcome.as_str()).increment(1);
    histogram!("stats_duration_ms").record(elapsed.as_secs_f64() * 1000.0);
}
