/// Scan configuration.
///
/// Every field has a sensible default, so `ScanOptions::default()` is a
/// complete configuration. Host applications can also deserialize it from
/// their own settings document; missing fields take their defaults.
use crate::hasher::{DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Hashing worker count. 0 means one per logical CPU.
    pub concurrency: usize,

    /// Wall-clock budget for the whole scan, in milliseconds. When it runs
    /// out the scan stops and returns a partial report.
    pub timeout_ms: Option<u64>,

    /// Only hash files whose size is shared with another file. Turning this
    /// off hashes everything and yields the same groups, slower.
    pub size_gate: bool,

    /// Sniff file headers when the extension does not identify the type.
    pub probe_media_types: bool,

    /// Bytes read per hashing chunk. Values below 4 KiB are raised to 4 KiB.
    pub chunk_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            concurrency: 0,
            timeout_ms: None,
            size_gate: true,
            probe_media_types: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ScanOptions {
    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    pub fn with_size_gate(mut self, enabled: bool) -> Self {
        self.size_gate = enabled;
        self
    }

    pub fn with_media_probe(mut self, enabled: bool) -> Self {
        self.probe_media_types = enabled;
        self
    }

    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Worker count after resolving the "0 = all CPUs" default.
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency == 0 {
            num_cpus::get().max(1)
        } else {
            self.concurrency
        }
    }

    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(MIN_CHUNK_SIZE)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Deadline for a scan starting at `start`.
    pub fn deadline_from(&self, start: Instant) -> Option<Instant> {
        self.timeout().and_then(|t| start.checked_add(t))
    }
}
