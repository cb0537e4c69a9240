//! Scan orchestration.
//!
//! [`ScanOrchestrator`] owns the lifecycle of one sweep at a time:
//!
//! ```text
//! Idle ──start_scan──► Running ──┬──► Completed
//!                                ├──► Stopped   (stop_scan)
//!                                └──► Failed    (sweep task panicked)
//! ```
//!
//! A sweep runs as one background task. It captures the ARP cache, spawns a
//! dispatcher that hands addresses to per-host tasks under a semaphore, and
//! then aggregates the completions that come back over a channel. Only the
//! aggregator touches counters and results, always under the state mutex and
//! always checked against the sweep's [`ScanId`].

mod state;

pub use state::{ScanSnapshot, ScanState, ScanStatus};

use crate::error::{ExportResult, StartError};
use crate::output::report::{self, ReportLayout};
use crate::scanner::{ArpTable, HostProber, ProbeSet, RateLimiter};
use crate::types::{enumerate, HostResult, Port, ScanId, ScanRequest};
use chrono::Local;
use futures::FutureExt;
use state::HostOutcome;
use std::any::Any;
use std::net::Ipv4Addr;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::time::timeout;
use tracing::{debug, error, warn};

/// Tunables shared by every sweep an orchestrator runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    pub ping_timeout: Duration,
    pub port_timeout: Duration,
    pub resolve_timeout: Duration,
    pub arp_timeout: Duration,
    /// Consult the ARP cache when a host ignores ICMP.
    pub use_arp_table: bool,
    /// Upper bound applied to every request's worker limit.
    pub max_workers: usize,
    /// Hosts dispatched per second; 0 disables pacing.
    pub rate_limit: u32,
}

impl ScanSettings {
    /// Hard ceiling on concurrent host probes, whatever `max_workers` says.
    pub const WORKER_CAP: usize = 1024;
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            ping_timeout: Duration::from_secs(2),
            port_timeout: Duration::from_secs(1),
            resolve_timeout: Duration::from_secs(2),
            arp_timeout: Duration::from_secs(10),
            use_arp_table: true,
            max_workers: 256,
            rate_limit: 0,
        }
    }
}

struct Inner {
    settings: ScanSettings,
    probes: ProbeSet,
    state: Mutex<ScanState>,
    status_tx: watch::Sender<ScanStatus>,
}

/// Everything a sweep task needs, fixed at start.
struct Sweep {
    id: ScanId,
    addresses: Vec<Ipv4Addr>,
    ports: Option<Vec<Port>>,
    workers: usize,
    cancel: Arc<AtomicBool>,
}

/// Handle to the scan engine. Clones share the same state.
#[derive(Clone)]
pub struct ScanOrchestrator {
    inner: Arc<Inner>,
}

impl ScanOrchestrator {
    /// An orchestrator backed by the system probes.
    pub fn new(settings: ScanSettings) -> Self {
        let probes = ProbeSet::system(&settings);
        Self::with_probes(settings, probes)
    }

    pub fn with_probes(settings: ScanSettings, probes: ProbeSet) -> Self {
        let (status_tx, _) = watch::channel(ScanStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                settings,
                probes,
                state: Mutex::new(ScanState::default()),
                status_tx,
            }),
        }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.inner.settings
    }

    fn state(&self) -> MutexGuard<'_, ScanState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &ScanState) {
        self.inner.status_tx.send_replace(state.status);
    }

    /// Validate `request` and launch a sweep in the background.
    ///
    /// Must be called from inside a tokio runtime. A rejected request leaves
    /// status, counters and results alone and only records the reason in the
    /// message.
    pub fn start_scan(&self, request: ScanRequest) -> Result<ScanId, StartError> {
        let mut state = self.state();
        if state.status.is_running() {
            return Err(StartError::ScanInProgress);
        }

        let addresses = match validate(&request) {
            Ok(addresses) => addresses,
            Err(e) => {
                warn!(subnet = %request.subnet, error = %e, "scan request rejected");
                state.message = e.to_string();
                return Err(e);
            }
        };

        let id = ScanId::new();
        let cancel = Arc::new(AtomicBool::new(false));
        let ports = request.port_plan().map(<[Port]>::to_vec);
        state.begin(id, addresses.len(), ports.is_some(), cancel.clone());
        self.publish(&state);
        drop(state);

        let workers = request
            .worker_limit
            .min(self.inner.settings.max_workers)
            .min(ScanSettings::WORKER_CAP)
            .min(Semaphore::MAX_PERMITS)
            .max(1);
        debug!(
            scan_id = %id.short(),
            subnet = %request.subnet,
            hosts = addresses.len(),
            workers,
            port_scan = ports.is_some(),
            "scan started"
        );

        let sweep = Sweep {
            id,
            addresses,
            ports,
            workers,
            cancel,
        };
        tokio::spawn(self.clone().supervise(sweep));
        Ok(id)
    }

    /// Cancel the running sweep. Idempotent; a no-op unless running.
    pub fn stop_scan(&self) {
        let mut state = self.state();
        if state.stop() {
            self.publish(&state);
            if let Some(id) = state.scan_id {
                debug!(scan_id = %id.short(), completed = state.completed, "scan stopped");
            }
        }
    }

    pub fn status(&self) -> ScanSnapshot {
        self.state().snapshot()
    }

    /// Active hosts found so far, in completion order.
    pub fn results(&self) -> Vec<HostResult> {
        self.state().results.clone()
    }

    /// Active hosts found so far, in address order.
    pub fn results_sorted(&self) -> Vec<HostResult> {
        let mut results = self.results();
        results.sort_by_key(|r| r.address);
        results
    }

    /// Render the current results as the text report.
    pub fn export_report(&self) -> ExportResult<String> {
        let (mut results, layout) = {
            let state = self.state();
            let layout = if state.port_scan {
                ReportLayout::Ports
            } else {
                ReportLayout::DetectionMethod
            };
            (state.results.clone(), layout)
        };
        results.sort_by_key(|r| r.address);
        report::render(&results, layout, Local::now().naive_local())
    }

    /// Resolve once no sweep is running.
    pub async fn wait(&self) -> ScanSnapshot {
        let mut rx = self.inner.status_tx.subscribe();
        // The sender lives in `inner`, so the channel cannot close under us.
        let _ = rx.wait_for(|status| !status.is_running()).await;
        self.status()
    }

    async fn supervise(self, sweep: Sweep) {
        let id = sweep.id;
        let outcome = AssertUnwindSafe(self.run(sweep)).catch_unwind().await;
        if let Err(payload) = outcome {
            let reason = panic_message(payload.as_ref());
            error!(scan_id = %id.short(), %reason, "scan task panicked");
            let mut state = self.state();
            if state.finish(id, ScanStatus::Failed, format!("Scan failed: {}", reason)) {
                self.publish(&state);
            }
        }
    }

    async fn run(&self, sweep: Sweep) {
        let Sweep {
            id,
            addresses,
            ports,
            workers,
            cancel,
        } = sweep;

        let arp = Arc::new(self.capture_arp().await);
        let prober = HostProber::new(&self.inner.probes, &self.inner.settings);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let dispatcher = Dispatcher {
            prober,
            arp,
            ports: ports.map(Arc::from),
            semaphore: Arc::new(Semaphore::new(workers)),
            limiter: RateLimiter::per_second(self.inner.settings.rate_limit),
            cancel: cancel.clone(),
        };
        tokio::spawn(dispatcher.run(addresses, tx));

        while let Some(outcome) = rx.recv().await {
            let mut state = self.state();
            if !state.record(id, outcome) {
                debug!(scan_id = %id.short(), "scan no longer current; aggregator exiting");
                return;
            }
        }

        if cancel.load(Ordering::SeqCst) {
            return;
        }

        let mut state = self.state();
        let found = state.active_hosts();
        let message = format!("Scan completed. Found {} active hosts.", found);
        if state.finish(id, ScanStatus::Completed, message) {
            self.publish(&state);
            debug!(scan_id = %id.short(), active = found, "scan completed");
        }
    }

    async fn capture_arp(&self) -> ArpTable {
        let settings = &self.inner.settings;
        if !settings.use_arp_table {
            return ArpTable::new();
        }

        match timeout(settings.arp_timeout, self.inner.probes.arp.capture()).await {
            Ok(Ok(table)) => {
                debug!(entries = table.len(), "captured ARP table");
                table
            }
            Ok(Err(e)) => {
                warn!(error = %e, "ARP table unavailable; continuing with ICMP only");
                ArpTable::new()
            }
            Err(_) => {
                warn!("ARP table capture timed out; continuing with ICMP only");
                ArpTable::new()
            }
        }
    }
}

/// Hands addresses to per-host tasks, at most `semaphore` permits at a time.
struct Dispatcher {
    prober: HostProber,
    arp: Arc<ArpTable>,
    ports: Option<Arc<[Port]>>,
    semaphore: Arc<Semaphore>,
    limiter: Option<RateLimiter>,
    cancel: Arc<AtomicBool>,
}

impl Dispatcher {
    async fn run(self, addresses: Vec<Ipv4Addr>, tx: mpsc::UnboundedSender<HostOutcome>) {
        for addr in addresses {
            let Ok(permit) = self.semaphore.clone().acquire_owned().await else {
                break;
            };
            if let Some(limiter) = &self.limiter {
                limiter.wait().await;
            }
            if self.cancel.load(Ordering::SeqCst) {
                debug!(%addr, "dispatch cancelled");
                break;
            }

            let prober = self.prober.clone();
            let arp = Arc::clone(&self.arp);
            let ports = self.ports.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let outcome = AssertUnwindSafe(prober.probe(addr, &arp, ports.as_deref()))
                    .catch_unwind()
                    .await
                    .map_err(|payload| {
                        let reason = panic_message(payload.as_ref());
                        error!(%addr, %reason, "host probe panicked");
                        reason
                    });
                // The aggregator may already be gone after a stop.
                let _ = tx.send(outcome);
            });
        }
    }
}

fn validate(request: &ScanRequest) -> Result<Vec<Ipv4Addr>, StartError> {
    let addresses = enumerate(&request.subnet)?;
    if request.worker_limit == 0 {
        return Err(StartError::InvalidWorkerLimit);
    }
    Ok(addresses)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExportError, ScanError, ScanResult};
    use crate::scanner::{ArpSource, NameLookup, Pinger, PortProber};
    use crate::types::{DetectionMethod, OpenPort, PortSpec, UNKNOWN_HOSTNAME};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;

    /// Replies instantly for `up`, hangs for `slow`, fails for the rest.
    #[derive(Default)]
    struct FakePinger {
        up: HashSet<Ipv4Addr>,
        slow: HashSet<Ipv4Addr>,
        panic_on: Option<Ipv4Addr>,
    }

    #[async_trait]
    impl Pinger for FakePinger {
        async fn ping(&self, addr: Ipv4Addr, _timeout: Duration) -> ScanResult<bool> {
            if self.panic_on == Some(addr) {
                panic!("pinger exploded");
            }
            if self.slow.contains(&addr) {
                std::future::pending::<()>().await;
            }
            if self.up.contains(&addr) {
                Ok(true)
            } else {
                Err(ScanError::Timeout(0))
            }
        }
    }

    struct FakeArp {
        table: ArpTable,
        panics: bool,
    }

    #[async_trait]
    impl ArpSource for FakeArp {
        async fn capture(&self) -> ScanResult<ArpTable> {
            if self.panics {
                panic!("arp exploded");
            }
            Ok(self.table.clone())
        }
    }

    struct OpenPorts(Vec<u16>);

    #[async_trait]
    impl PortProber for OpenPorts {
        async fn probe_port(&self, _addr: Ipv4Addr, port: u16, _timeout: Duration) -> bool {
            self.0.contains(&port)
        }
    }

    #[derive(Default)]
    struct FailingNames(AtomicUsize);

    #[async_trait]
    impl NameLookup for FailingNames {
        async fn reverse_lookup(&self, _addr: Ipv4Addr) -> ScanResult<Option<String>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(ScanError::DnsResolution("no PTR".into()))
        }
        async fn fqdn_lookup(&self, _addr: Ipv4Addr) -> ScanResult<Option<String>> {
            Err(ScanError::DnsResolution("no PTR".into()))
        }
        async fn name_query(&self, _addr: Ipv4Addr) -> ScanResult<Option<String>> {
            Ok(None)
        }
    }

    /// Never replies, and records how many pings overlap.
    #[derive(Default)]
    struct CountingPinger {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Pinger for CountingPinger {
        async fn ping(&self, _addr: Ipv4Addr, _timeout: Duration) -> ScanResult<bool> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(false)
        }
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn ip(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(192, 168, 1, last)
    }

    fn settings() -> ScanSettings {
        ScanSettings {
            ping_timeout: Duration::from_secs(5),
            port_timeout: Duration::from_millis(50),
            resolve_timeout: Duration::from_millis(50),
            arp_timeout: Duration::from_millis(200),
            ..ScanSettings::default()
        }
    }

    fn orchestrator(pinger: FakePinger, arp: ArpTable, open: Vec<u16>) -> ScanOrchestrator {
        ScanOrchestrator::with_probes(
            settings(),
            ProbeSet {
                pinger: Arc::new(pinger),
                arp: Arc::new(FakeArp {
                    table: arp,
                    panics: false,
                }),
                ports: Arc::new(OpenPorts(open)),
                names: Arc::new(FailingNames::default()),
            },
        )
    }

    fn pinger_up(hosts: &[u8]) -> FakePinger {
        FakePinger {
            up: hosts.iter().copied().map(ip).collect(),
            ..FakePinger::default()
        }
    }

    async fn wait_for_completed(scanner: &ScanOrchestrator, n: usize) {
        for _ in 0..200 {
            if scanner.status().completed >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("scan never reached {} completions", n);
    }

    #[tokio::test]
    async fn test_all_probes_failing_completes_empty() {
        let scanner = orchestrator(FakePinger::default(), ArpTable::new(), vec![]);
        scanner.start_scan(ScanRequest::new("192.168.1.0/30")).unwrap();

        let status = scanner.wait().await;
        assert_eq!(status.status, ScanStatus::Completed);
        assert_eq!(status.total_hosts, 2);
        assert_eq!(status.completed, 2);
        assert_eq!(status.progress, 100.0);
        assert_eq!(status.message, "Scan completed. Found 0 active hosts.");
        assert!(scanner.results().is_empty());
    }

    #[tokio::test]
    async fn test_icmp_host_with_http_port() {
        let scanner = orchestrator(pinger_up(&[1]), ArpTable::new(), vec![80]);
        let ports: PortSpec = "22,80,443".parse().unwrap();
        scanner
            .start_scan(ScanRequest::new("192.168.1.0/30").with_ports(ports))
            .unwrap();
        scanner.wait().await;

        let results = scanner.results();
        assert_eq!(results.len(), 1);
        let host = &results[0];
        assert_eq!(host.address, ip(1));
        assert_eq!(host.detection_method, DetectionMethod::Icmp);
        assert_eq!(host.open_ports, vec![OpenPort::new(80, "HTTP")]);
        assert_eq!(host.hostname, UNKNOWN_HOSTNAME);
        assert!(scanner.status().port_scan);
    }

    #[tokio::test]
    async fn test_arp_fallback_and_disabled_arp() {
        let mut table = ArpTable::new();
        table.insert(ip(2), "00:11:22:33:44:55");

        let scanner = orchestrator(FakePinger::default(), table.clone(), vec![]);
        scanner.start_scan(ScanRequest::new("192.168.1.0/30")).unwrap();
        scanner.wait().await;
        let results = scanner.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].detection_method, DetectionMethod::ArpTable);

        let no_arp = ScanOrchestrator::with_probes(
            ScanSettings {
                use_arp_table: false,
                ..settings()
            },
            ProbeSet {
                pinger: Arc::new(FakePinger::default()),
                arp: Arc::new(FakeArp {
                    table,
                    panics: false,
                }),
                ports: Arc::new(OpenPorts(vec![])),
                names: Arc::new(FailingNames::default()),
            },
        );
        no_arp.start_scan(ScanRequest::new("192.168.1.0/30")).unwrap();
        no_arp.wait().await;
        assert!(no_arp.results().is_empty());
    }

    #[tokio::test]
    async fn test_every_result_is_active() {
        let scanner = orchestrator(pinger_up(&[1, 5, 9]), ArpTable::new(), vec![]);
        scanner.start_scan(ScanRequest::new("192.168.1.0/28")).unwrap();
        let status = scanner.wait().await;

        assert_eq!(status.completed, 14);
        assert_eq!(status.active_hosts, 3);
        assert!(scanner.results().iter().all(|r| r.is_active));

        let sorted: Vec<_> = scanner.results_sorted().iter().map(|r| r.address).collect();
        assert_eq!(sorted, vec![ip(1), ip(5), ip(9)]);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let scanner = orchestrator(pinger_up(&[3]), ArpTable::new(), vec![]);
        scanner
            .start_scan(ScanRequest::new("192.168.1.0/27").with_workers(3))
            .unwrap();

        let mut last = 0.0;
        loop {
            let status = scanner.status();
            assert!(status.completed <= status.total_hosts);
            let expected = status.completed as f64 / status.total_hosts as f64 * 100.0;
            assert!((status.progress - expected).abs() < f64::EPSILON);
            assert!(status.progress >= last);
            last = status.progress;
            if !status.status.is_running() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(last, 100.0);
    }

    #[tokio::test]
    async fn test_public_subnet_rejected() {
        let scanner = orchestrator(FakePinger::default(), ArpTable::new(), vec![]);
        let err = scanner.start_scan(ScanRequest::new("8.8.8.0/24")).unwrap_err();

        assert_eq!(err.kind(), "policy_rejected");
        let status = scanner.status();
        assert_eq!(status.status, ScanStatus::Idle);
        assert_eq!(status.message, err.to_string());
        assert!(status.scan_id.is_none());
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let scanner = orchestrator(FakePinger::default(), ArpTable::new(), vec![]);

        let err = scanner.start_scan(ScanRequest::new("not-a-subnet")).unwrap_err();
        assert!(matches!(err, StartError::InvalidSubnet(_)));

        let err = scanner
            .start_scan(ScanRequest::new("10.0.0.0/30").with_workers(0))
            .unwrap_err();
        assert_eq!(err, StartError::InvalidWorkerLimit);
        assert_eq!(scanner.status().status, ScanStatus::Idle);
    }

    #[tokio::test]
    async fn test_start_while_running_leaves_state_alone() {
        let pinger = FakePinger {
            slow: (1..=2).map(ip).collect(),
            ..FakePinger::default()
        };
        let scanner = orchestrator(pinger, ArpTable::new(), vec![]);
        let id = scanner.start_scan(ScanRequest::new("192.168.1.0/30")).unwrap();
        let before = scanner.status();

        let err = scanner.start_scan(ScanRequest::new("10.0.0.0/24")).unwrap_err();
        assert_eq!(err, StartError::ScanInProgress);

        let after = scanner.status();
        assert_eq!(after, before);
        assert_eq!(after.scan_id, Some(id));
        assert_eq!(after.message, "Scanning 2 hosts...");

        scanner.stop_scan();
    }

    #[tokio::test]
    async fn test_stop_mid_scan() {
        let pinger = FakePinger {
            up: [ip(1), ip(2)].into_iter().collect(),
            slow: (3..=14).map(ip).collect(),
            ..FakePinger::default()
        };
        let scanner = orchestrator(pinger, ArpTable::new(), vec![]);
        scanner
            .start_scan(ScanRequest::new("192.168.1.0/28").with_workers(2))
            .unwrap();

        wait_for_completed(&scanner, 2).await;
        scanner.stop_scan();

        let stopped = scanner.wait().await;
        assert_eq!(stopped.status, ScanStatus::Stopped);
        assert_eq!(stopped.message, "Scan stopped by user");
        assert!(stopped.completed < stopped.total_hosts);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(scanner.status().completed, stopped.completed);

        // Stopping again changes nothing.
        scanner.stop_scan();
        assert_eq!(scanner.status(), stopped);
    }

    #[tokio::test]
    async fn test_new_scan_after_stop() {
        let pinger = FakePinger {
            slow: (1..=2).map(ip).collect(),
            up: [Ipv4Addr::new(10, 0, 0, 1)].into_iter().collect(),
            ..FakePinger::default()
        };
        let scanner = orchestrator(pinger, ArpTable::new(), vec![]);
        let first = scanner.start_scan(ScanRequest::new("192.168.1.0/30")).unwrap();
        scanner.stop_scan();

        let second = scanner.start_scan(ScanRequest::new("10.0.0.0/30")).unwrap();
        assert_ne!(first, second);

        let status = scanner.wait().await;
        assert_eq!(status.scan_id, Some(second));
        assert_eq!(status.status, ScanStatus::Completed);
        assert_eq!(status.completed, 2);
        assert_eq!(status.active_hosts, 1);
    }

    #[tokio::test]
    async fn test_panicking_probe_still_counts() {
        let pinger = FakePinger {
            up: [ip(1)].into_iter().collect(),
            panic_on: Some(ip(2)),
            ..FakePinger::default()
        };
        let scanner = orchestrator(pinger, ArpTable::new(), vec![]);
        scanner.start_scan(ScanRequest::new("192.168.1.0/30")).unwrap();

        let status = scanner.wait().await;
        assert_eq!(status.status, ScanStatus::Completed);
        assert_eq!(status.completed, 2);
        assert_eq!(status.active_hosts, 1);
    }

    #[tokio::test]
    async fn test_sweep_panic_marks_failed() {
        let scanner = ScanOrchestrator::with_probes(
            settings(),
            ProbeSet {
                pinger: Arc::new(FakePinger::default()),
                arp: Arc::new(FakeArp {
                    table: ArpTable::new(),
                    panics: true,
                }),
                ports: Arc::new(OpenPorts(vec![])),
                names: Arc::new(FailingNames::default()),
            },
        );
        scanner.start_scan(ScanRequest::new("192.168.1.0/30")).unwrap();

        let status = scanner.wait().await;
        assert_eq!(status.status, ScanStatus::Failed);
        assert!(status.message.contains("arp exploded"));
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let scanner = orchestrator(FakePinger::default(), ArpTable::new(), vec![]);
        scanner.stop_scan();
        assert_eq!(scanner.status().status, ScanStatus::Idle);
    }

    #[tokio::test]
    async fn test_export_report_layouts() {
        let scanner = orchestrator(pinger_up(&[1]), ArpTable::new(), vec![]);
        assert!(matches!(
            scanner.export_report(),
            Err(ExportError::NothingToExport)
        ));

        scanner.start_scan(ScanRequest::new("192.168.1.0/30")).unwrap();
        scanner.wait().await;
        let text = scanner.export_report().unwrap();
        assert!(text.starts_with("Network Scan Results - "));
        assert!(text.contains("ICMP Ping"));
    }

    fn with_pinger(settings: ScanSettings, pinger: Arc<dyn Pinger>) -> ScanOrchestrator {
        ScanOrchestrator::with_probes(
            settings,
            ProbeSet {
                pinger,
                arp: Arc::new(FakeArp {
                    table: ArpTable::new(),
                    panics: false,
                }),
                ports: Arc::new(OpenPorts(vec![])),
                names: Arc::new(FailingNames::default()),
            },
        )
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_max_workers() {
        let pinger = Arc::new(CountingPinger::default());
        let scanner = with_pinger(
            ScanSettings {
                max_workers: 3,
                ..settings()
            },
            pinger.clone(),
        );
        scanner
            .start_scan(ScanRequest::new("192.168.1.0/27").with_workers(10))
            .unwrap();

        let status = scanner.wait().await;
        assert_eq!(status.status, ScanStatus::Completed);
        assert_eq!(status.completed, 30);
        assert_eq!(pinger.peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_request() {
        let pinger = Arc::new(CountingPinger::default());
        let scanner = with_pinger(settings(), pinger.clone());
        scanner
            .start_scan(ScanRequest::new("192.168.1.0/28").with_workers(2))
            .unwrap();

        scanner.wait().await;
        assert!(pinger.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_oversized_worker_limits_are_capped() {
        let scanner = with_pinger(
            ScanSettings {
                max_workers: usize::MAX,
                ..settings()
            },
            Arc::new(FakePinger::default()),
        );
        scanner
            .start_scan(ScanRequest::new("10.0.0.0/30").with_workers(usize::MAX))
            .unwrap();

        let status = scanner.wait().await;
        assert_eq!(status.status, ScanStatus::Completed);
        assert_eq!(status.completed, 2);
    }

    #[tokio::test]
    async fn test_rate_limit_paces_dispatch() {
        let scanner = with_pinger(
            ScanSettings {
                rate_limit: 20,
                ..settings()
            },
            Arc::new(FakePinger::default()),
        );
        let started = std::time::Instant::now();
        scanner.start_scan(ScanRequest::new("192.168.1.0/28")).unwrap();

        let status = scanner.wait().await;
        assert_eq!(status.status, ScanStatus::Completed);
        assert_eq!(status.completed, 14);
        // 13 dispatches after the first, 50ms apart.
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_lifecycle_logs_only_when_verbose() {
        use crate::logging::Verbosity;
        use tracing_subscriber::EnvFilter;

        let cases = [(Verbosity::Normal, false), (Verbosity::Verbose, true)];
        for (verbosity, expect_lifecycle) in cases {
            let log = CapturedLog::default();
            let writer = log.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new(verbosity.directives()))
                .with_writer(move || writer.clone())
                .with_ansi(false)
                .finish();
            let _guard = tracing::subscriber::set_default(subscriber);

            let scanner = orchestrator(pinger_up(&[1]), ArpTable::new(), vec![]);
            scanner.start_scan(ScanRequest::new("192.168.1.0/30")).unwrap();
            scanner.wait().await;

            let contents = log.contents();
            assert_eq!(contents.contains("scan started"), expect_lifecycle);
            assert_eq!(contents.contains("scan completed"), expect_lifecycle);
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = ScanSettings::default();
        assert_eq!(settings.ping_timeout, Duration::from_secs(2));
        assert_eq!(settings.max_workers, 256);
        assert!(settings.max_workers <= ScanSettings::WORKER_CAP);
        assert_eq!(settings.rate_limit, 0);
        assert!(settings.use_arp_table);
    }
}
