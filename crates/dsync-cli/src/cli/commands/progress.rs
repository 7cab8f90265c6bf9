//! Throttled per-file progress lines on stdout.

use dsync_core::transfer::{ProgressObserver, TransferProgress};
use std::time::Instant;

const PROGRESS_INTERVAL_MS: u64 = 500;

pub struct ProgressPrinter {
    last_print: Instant,
}

impl ProgressPrinter {
    pub fn new() -> Self {
        Self {
            last_print: Instant::now(),
        }
    }

    fn print(&self, p: &TransferProgress) {
        println!("{}", progress_line(p));
    }
}

/// One progress line for `p`, without a trailing newline.
fn progress_line(p: &TransferProgress) -> String {
    let done_mib = p.bytes_done as f64 / 1_048_576.0;
    let rate_mib = p.bytes_per_sec() / 1_048_576.0;
    let eta = p
        .eta_secs()
        .map(|s| format!("{:.0}s", s))
        .unwrap_or_else(|| "?".to_string());
    match (p.total_bytes, p.fraction()) {
        (Some(total), Some(fraction)) => format!(
            "  {}  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}",
            p.file_name,
            done_mib,
            total as f64 / 1_048_576.0,
            fraction * 100.0,
            rate_mib,
            eta
        ),
        _ => format!("  {}  {:.1} MiB  {:.2} MiB/s", p.file_name, done_mib, rate_mib),
    }
}

impl ProgressObserver for ProgressPrinter {
    fn on_start(&mut self, p: &TransferProgress) {
        self.last_print = Instant::now();
        println!("Downloading {}", p.file_name);
    }

    fn on_progress(&mut self, p: &TransferProgress) {
        let now = Instant::now();
        if now.duration_since(self.last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS {
            self.print(p);
            self.last_print = now;
        }
    }

    fn on_finish(&mut self, p: &TransferProgress, ok: bool) {
        if ok {
            self.print(p);
        } else {
            println!("  {}  failed", p.file_name);
        }
    }
}
