//! Per-request quote trace instrumentation. Trackers record pipeline stage
//! offsets and report one structured record to the observability sink;
//! nothing here is allowed to break the quoting path.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

pub const STAGE_START: &str = "start";
pub const STAGE_POOLS_READY: &str = "pools_ready";
pub const STAGE_POOL_SUCCESS: &str = "pool_success";
pub const STAGE_POOL_ERROR: &str = "pool_error";
pub const STAGE_SUCCESS: &str = "success";
pub const STAGE_FAIL: &str = "fail";

/// Static request metadata carried on every emitted record.
#[derive(Debug, Clone, Serialize)]
pub struct TraceMeta {
    pub currency_in: String,
    pub currency_out: String,
    pub amount: String,
    pub chain_id: u64,
    pub account: Option<String>,
}

/// The finalized record handed to the sink.
#[derive(Debug, Clone, Serialize)]
pub struct TraceReport {
    pub request_hash: String,
    pub route_key: String,
    pub duration_ms: u64,
    pub outcome: &'static str,
    pub stages: HashMap<String, u64>,
    pub meta: TraceMeta,
    pub reported_at: String,
}

/// Tracks one (request, route) pair through the pipeline. Two trackers are
/// the same trace iff both the request hash and the route key match; repeated
/// identical requests therefore share a trace identity.
#[derive(Debug)]
pub struct QuoteTracker {
    request_hash: String,
    route_key: String,
    started: Instant,
    stages: Mutex<HashMap<String, u64>>,
    meta: TraceMeta,
    reported: AtomicBool,
}

impl QuoteTracker {
    pub fn new(request_hash: impl Into<String>, route_key: impl Into<String>, meta: TraceMeta) -> Self {
        let tracker = Self {
            request_hash: request_hash.into(),
            route_key: route_key.into(),
            started: Instant::now(),
            stages: Mutex::new(HashMap::new()),
            meta,
            reported: AtomicBool::new(false),
        };
        tracker.track_at(STAGE_START, Duration::ZERO);
        tracker
    }

    pub fn request_hash(&self) -> &str {
        &self.request_hash
    }

    pub fn route_key(&self) -> &str {
        &self.route_key
    }

    /// Record `stage` at the current elapsed time. Stage names are free-form
    /// and unordered; recording the same stage again overwrites (last write
    /// wins).
    pub fn track(&self, stage: &str) {
        self.track_at(stage, self.started.elapsed());
    }

    /// Record `stage` at an explicit offset from the trace start. `track`
    /// delegates here; it also gives tests and replay tooling a
    /// deterministic clock.
    pub fn track_at(&self, stage: &str, offset: Duration) {
        let millis = offset.as_millis().min(u64::MAX as u128) as u64;
        self.stages.lock().unwrap().insert(stage.to_string(), millis);
    }

    /// Finalize the trace: compute the duration from the `success` stage, or
    /// the `fail` stage when no success was recorded, relative to `start`
    /// (missing stages read as 0). Emits exactly one structured record over
    /// the lifetime of the tracker; later calls are no-ops returning `None`.
    pub fn report(&self) -> Option<TraceReport> {
        if self.reported.swap(true, Ordering::SeqCst) {
            return None;
        }

        let stages = self.stages.lock().unwrap().clone();
        let start = stages.get(STAGE_START).copied().unwrap_or(0);
        let (terminal, outcome) = match stages.get(STAGE_SUCCESS) {
            Some(ts) => (*ts, "success"),
            None => (stages.get(STAGE_FAIL).copied().unwrap_or(start), "fail"),
        };
        let duration_ms = terminal.saturating_sub(start);

        let report = TraceReport {
            request_hash: self.request_hash.clone(),
            route_key: self.route_key.clone(),
            duration_ms,
            outcome,
            stages,
            meta: self.meta.clone(),
            reported_at: chrono::Utc::now().to_rfc3339(),
        };

        // Fire-and-forget structured sink; serialization problems must not
        // reach the quoting path.
        let payload = serde_json::to_string(&report).unwrap_or_else(|_| "{}".to_string());
        info!(
            target: "quote_tracker",
            event = "quote_trace",
            request_hash = %report.request_hash,
            route_key = %report.route_key,
            duration_ms = report.duration_ms,
            outcome = report.outcome,
            payload = %payload,
        );
        Some(report)
    }
}

impl PartialEq for QuoteTracker {
    fn eq(&self, other: &Self) -> bool {
        self.request_hash == other.request_hash && self.route_key == other.route_key
    }
}

impl Eq for QuoteTracker {}

impl Hash for QuoteTracker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.request_hash.hash(state);
        self.route_key.hash(state);
    }
}
