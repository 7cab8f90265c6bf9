//! Progress reporting for transfers (bytes done, ETA, rate).
//!
//! Consumers can compute rate = bytes_done / elapsed_secs and
//! ETA = (total_bytes - bytes_done) / rate when the total is known.

/// Snapshot of one file transfer.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    pub file_name: String,
    /// Bytes written so far.
    pub bytes_done: u64,
    /// Declared `Content-Length`; `None` when the server did not send one.
    pub total_bytes: Option<u64>,
    /// Elapsed time since the transfer started (seconds).
    pub elapsed_secs: f64,
}

impl TransferProgress {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes_done: 0,
            total_bytes: None,
            elapsed_secs: 0.0,
        }
    }

    /// Download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if the total is unknown or the rate is 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let total = self.total_bytes?;
        let remaining = total.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0], if the total is known.
    pub fn fraction(&self) -> Option<f64> {
        let total = self.total_bytes?;
        if total == 0 {
            return Some(1.0);
        }
        Some((self.bytes_done as f64 / total as f64).min(1.0))
    }
}

/// Receives progress events from the transfer engine. All methods default to no-ops.
pub trait ProgressObserver {
    /// A transfer's response headers arrived.
    fn on_start(&mut self, _progress: &TransferProgress) {}

    /// A chunk was written.
    fn on_progress(&mut self, _progress: &TransferProgress) {}

    /// The transfer ended, successfully or not.
    fn on_finish(&mut self, _progress: &TransferProgress, _ok: bool) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}
