use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::error;

pub struct DegradedWriteMonitor {
    threshold: u64,
    consecutive: AtomicU64,
    total: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DegradedWriteStats {
    pub consecutive: u64,
    pub total: u64,
}

impl DegradedWriteMonitor {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            consecutive: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Returns true when this write tripped the alert.
    pub fn record_degraded(&self, cause: &str) -> bool {
        let total = self.total.fetch_add(1, Ordering::Relaxed) + 1;
        let consecutive = self.consecutive.fetch_add(1, Ordering::Relaxed) + 1;

        let alert = self.threshold > 0 && consecutive % self.threshold == 0;
        if alert {
            error!(
                alert = "degraded_booking_writes",
                consecutive,
                total,
                cause,
                "Bookings are being confirmed without being stored"
            );
        }
        alert
    }

    pub fn record_durable(&self) {
        self.consecutive.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> DegradedWriteStats {
        DegradedWriteStats {
            consecutive: self.consecutive.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
        }
    }
}
