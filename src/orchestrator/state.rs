//! Scan lifecycle state.
//!
//! [`ScanState`] lives behind the orchestrator's mutex. Every mutation that
//! comes from a running sweep carries the sweep's [`ScanId`] and is dropped
//! unless that sweep is still the current, running one.

use crate::types::{HostResult, ScanId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where the orchestrator is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Stopped,
    Failed,
}

impl ScanStatus {
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What a worker reports back for one address.
pub(crate) type HostOutcome = Result<HostResult, String>;

/// Mutable state of the current (or last) sweep.
#[derive(Debug, Default)]
pub struct ScanState {
    pub status: ScanStatus,
    pub scan_id: Option<ScanId>,
    pub total_hosts: usize,
    pub completed: usize,
    pub progress: f64,
    pub results: Vec<HostResult>,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub port_scan: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl ScanState {
    /// True while `id` is the running sweep.
    pub fn is_current(&self, id: ScanId) -> bool {
        self.status.is_running() && self.scan_id == Some(id)
    }

    /// Reset everything and enter `Running` for a new sweep.
    pub(crate) fn begin(
        &mut self,
        id: ScanId,
        total_hosts: usize,
        port_scan: bool,
        cancel: Arc<AtomicBool>,
    ) {
        *self = Self {
            status: ScanStatus::Running,
            scan_id: Some(id),
            total_hosts,
            message: format!("Scanning {} hosts...", total_hosts),
            started_at: Some(Utc::now()),
            port_scan,
            cancel: Some(cancel),
            ..Self::default()
        };
    }

    /// Apply one worker outcome. Returns false once `id` is no longer the
    /// running sweep, in which case nothing changes.
    pub(crate) fn record(&mut self, id: ScanId, outcome: HostOutcome) -> bool {
        if !self.is_current(id) {
            return false;
        }

        self.completed = (self.completed + 1).min(self.total_hosts);
        self.progress = if self.total_hosts == 0 {
            100.0
        } else {
            self.completed as f64 / self.total_hosts as f64 * 100.0
        };

        if let Ok(result) = outcome {
            if result.is_active {
                self.results.push(result);
            }
        }
        true
    }

    /// Cancel the running sweep. No-op unless `Running`.
    pub(crate) fn stop(&mut self) -> bool {
        if !self.status.is_running() {
            return false;
        }
        if let Some(cancel) = &self.cancel {
            cancel.store(true, Ordering::SeqCst);
        }
        self.status = ScanStatus::Stopped;
        self.message = "Scan stopped by user".to_string();
        self.finished_at = Some(Utc::now());
        true
    }

    /// Move `id` from `Running` to a terminal status.
    pub(crate) fn finish(&mut self, id: ScanId, status: ScanStatus, message: String) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.status = status;
        self.message = message;
        self.finished_at = Some(Utc::now());
        true
    }

    pub fn active_hosts(&self) -> usize {
        self.results.len()
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            scan_id: self.scan_id,
            status: self.status,
            total_hosts: self.total_hosts,
            completed: self.completed,
            progress: self.progress,
            active_hosts: self.active_hosts(),
            message: self.message.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            port_scan: self.port_scan,
        }
    }
}

/// Point-in-time view of the scan, as returned by `status()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub scan_id: Option<ScanId>,
    pub status: ScanStatus,
    pub total_hosts: usize,
    pub completed: usize,
    pub progress: f64,
    pub active_hosts: usize,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub port_scan: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DetectionMethod;
    use std::net::Ipv4Addr;

    fn running(total: usize) -> (ScanState, ScanId, Arc<AtomicBool>) {
        let mut state = ScanState::default();
        let id = ScanId::new();
        let cancel = Arc::new(AtomicBool::new(false));
        state.begin(id, total, false, cancel.clone());
        (state, id, cancel)
    }

    fn active(last: u8) -> HostOutcome {
        Ok(HostResult::active(
            Ipv4Addr::new(10, 0, 0, last),
            DetectionMethod::Icmp,
        ))
    }

    #[test]
    fn test_begin_resets_state() {
        let (mut state, id, _) = running(4);
        state.record(id, active(1));

        let next = ScanId::new();
        state.begin(next, 2, true, Arc::new(AtomicBool::new(false)));

        assert_eq!(state.status, ScanStatus::Running);
        assert_eq!(state.completed, 0);
        assert!(state.results.is_empty());
        assert_eq!(state.message, "Scanning 2 hosts...");
        assert!(state.port_scan);
    }

    #[test]
    fn test_record_tracks_progress() {
        let (mut state, id, _) = running(4);

        assert!(state.record(id, active(1)));
        assert!(state.record(id, Ok(HostResult::inactive(Ipv4Addr::new(10, 0, 0, 2)))));
        assert!(state.record(id, Err("probe panicked".into())));

        assert_eq!(state.completed, 3);
        assert_eq!(state.progress, 75.0);
        assert_eq!(state.active_hosts(), 1);
    }

    #[test]
    fn test_stale_outcomes_are_ignored() {
        let (mut state, _, _) = running(4);
        assert!(!state.record(ScanId::new(), active(1)));
        assert_eq!(state.completed, 0);
    }

    #[test]
    fn test_stop_sets_flag_and_freezes_counters() {
        let (mut state, id, cancel) = running(4);
        state.record(id, active(1));

        assert!(state.stop());
        assert!(cancel.load(Ordering::SeqCst));
        assert_eq!(state.status, ScanStatus::Stopped);
        assert_eq!(state.message, "Scan stopped by user");

        assert!(!state.record(id, active(2)));
        assert!(!state.stop());
        assert_eq!(state.completed, 1);
    }

    #[test]
    fn test_finish_only_applies_to_running_scan() {
        let (mut state, id, _) = running(1);
        state.stop();
        assert!(!state.finish(id, ScanStatus::Completed, "done".into()));
        assert_eq!(state.status, ScanStatus::Stopped);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ScanStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
