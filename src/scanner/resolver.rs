//! Hostname resolution for discovered hosts.
//!
//! Reverse DNS on home and office LANs is frequently stale or missing, so
//! names are looked up through a chain of increasingly expensive sources:
//!
//! 1. the system resolver (hosts file, mDNS, DNS via `getnameinfo`)
//! 2. DNS PTR records, keeping only fully-qualified names
//! 3. the `nslookup` utility
//!
//! The first acceptable answer wins. Every step runs under its own timeout;
//! nothing here can fail, the worst case is [`UNKNOWN_HOSTNAME`].

use super::traits::NameLookup;
use crate::error::{ScanError, ScanResult};
use crate::types::UNKNOWN_HOSTNAME;
use async_trait::async_trait;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::{debug, trace};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Walks the lookup chain for one address at a time.
#[derive(Clone)]
pub struct HostnameResolver {
    lookup: Arc<dyn NameLookup>,
    timeout: Duration,
}

impl HostnameResolver {
    pub fn new(lookup: Arc<dyn NameLookup>, timeout: Duration) -> Self {
        Self { lookup, timeout }
    }

    /// Resolve `addr` to a display name, or `"Unknown"`.
    pub async fn resolve(&self, addr: Ipv4Addr) -> String {
        let literal = addr.to_string();

        if let Some(name) = self.step("reverse", addr, self.lookup.reverse_lookup(addr)).await {
            if is_useful_name(&name, &literal) {
                return name;
            }
            trace!(%addr, name = %name, "rejected reverse lookup result");
        }

        if let Some(name) = self.step("fqdn", addr, self.lookup.fqdn_lookup(addr)).await {
            if name.contains('.') && is_useful_name(&name, &literal) {
                return name;
            }
            trace!(%addr, name = %name, "rejected fqdn result");
        }

        if let Some(name) = self.step("name-query", addr, self.lookup.name_query(addr)).await {
            if !name.is_empty() && !looks_like_mac(&name) {
                return name;
            }
            trace!(%addr, name = %name, "rejected name query result");
        }

        UNKNOWN_HOSTNAME.to_string()
    }

    async fn step<F>(&self, label: &'static str, addr: Ipv4Addr, lookup: F) -> Option<String>
    where
        F: Future<Output = ScanResult<Option<String>>>,
    {
        match timeout(self.timeout, lookup).await {
            Ok(Ok(name)) => name.map(|n| n.trim().to_string()),
            Ok(Err(e)) => {
                debug!(%addr, step = label, error = %e, "name lookup failed");
                None
            }
            Err(_) => {
                debug!(%addr, step = label, "name lookup timed out");
                None
            }
        }
    }
}

/// Rejects empty names, the address itself, MAC-shaped labels and
/// underscore-prefixed service placeholders.
fn is_useful_name(name: &str, literal: &str) -> bool {
    !name.is_empty() && name != literal && !looks_like_mac(name) && !name.starts_with('_')
}

/// True for `xx:xx:xx:xx:xx:xx` or `xx-xx-xx-xx-xx-xx`.
pub fn looks_like_mac(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() != 17 {
        return false;
    }
    let sep = bytes[2];
    if sep != b':' && sep != b'-' {
        return false;
    }
    bytes.chunks(3).all(|chunk| {
        chunk[0].is_ascii_hexdigit()
            && chunk[1].is_ascii_hexdigit()
            && chunk.get(2).map_or(true, |&c| c == sep)
    })
}

/// Extract the first `name = host.` record from `nslookup` output.
pub fn parse_nslookup_output(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.split_once("name =").map(|(_, name)| name))
        .map(|name| name.trim().trim_end_matches('.').to_string())
        .filter(|name| !name.is_empty())
}

/// Size of the host buffer handed to `getnameinfo` (NI_MAXHOST).
#[cfg(unix)]
const HOST_BUF_LEN: usize = 1025;

#[cfg(unix)]
fn system_reverse_lookup(addr: Ipv4Addr) -> Option<String> {
    use std::ffi::CStr;
    use std::mem;

    // SAFETY: sockaddr_in is plain old data; all-zero is a valid value.
    let mut sockaddr: libc::sockaddr_in = unsafe { mem::zeroed() };
    sockaddr.sin_family = libc::AF_INET as libc::sa_family_t;
    sockaddr.sin_addr = libc::in_addr {
        s_addr: u32::from(addr).to_be(),
    };
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd"
    ))]
    {
        sockaddr.sin_len = mem::size_of::<libc::sockaddr_in>() as u8;
    }

    let mut host = [0 as libc::c_char; HOST_BUF_LEN];
    // SAFETY: the sockaddr and host buffer outlive the call and their sizes
    // are passed alongside; no service buffer is requested.
    let rc = unsafe {
        libc::getnameinfo(
            &sockaddr as *const libc::sockaddr_in as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            host.as_mut_ptr(),
            HOST_BUF_LEN as _,
            std::ptr::null_mut(),
            0,
            libc::NI_NAMEREQD,
        )
    };
    if rc != 0 {
        return None;
    }

    // SAFETY: getnameinfo NUL-terminates the buffer on success.
    let name = unsafe { CStr::from_ptr(host.as_ptr()) };
    Some(name.to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn system_reverse_lookup(_addr: Ipv4Addr) -> Option<String> {
    None
}

/// Lookups backed by the operating system and the configured DNS servers.
pub struct SystemNameLookup {
    timeout: Duration,
    dns: OnceCell<Option<TokioAsyncResolver>>,
}

impl SystemNameLookup {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            dns: OnceCell::new(),
        }
    }

    /// DNS client built from the system configuration on first use.
    async fn dns(&self) -> Option<&TokioAsyncResolver> {
        self.dns
            .get_or_init(|| async {
                match trust_dns_resolver::system_conf::read_system_conf() {
                    Ok((config, opts)) => Some(self.build_resolver(config, opts)),
                    Err(e) => {
                        debug!(error = %e, "no system DNS configuration, PTR lookups disabled");
                        None
                    }
                }
            })
            .await
            .as_ref()
    }

    fn build_resolver(&self, config: ResolverConfig, mut opts: ResolverOpts) -> TokioAsyncResolver {
        opts.timeout = self.timeout;
        opts.attempts = 1;
        TokioAsyncResolver::tokio(config, opts)
    }
}

#[async_trait]
impl NameLookup for SystemNameLookup {
    async fn reverse_lookup(&self, addr: Ipv4Addr) -> ScanResult<Option<String>> {
        tokio::task::spawn_blocking(move || system_reverse_lookup(addr))
            .await
            .map_err(|e| ScanError::TaskFailed(e.to_string()))
    }

    async fn fqdn_lookup(&self, addr: Ipv4Addr) -> ScanResult<Option<String>> {
        let Some(dns) = self.dns().await else {
            return Ok(None);
        };

        let lookup = dns
            .reverse_lookup(IpAddr::V4(addr))
            .await
            .map_err(|e| ScanError::DnsResolution(e.to_string()))?;

        Ok(lookup
            .iter()
            .map(|name| name.to_string().trim_end_matches('.').to_string())
            .find(|name| name.contains('.')))
    }

    async fn name_query(&self, addr: Ipv4Addr) -> ScanResult<Option<String>> {
        let mut command = Command::new("nslookup");
        command
            .arg(addr.to_string())
            .stdin(Stdio::null())
            .stderr(Stdio::null());

        let output = timeout(self.timeout, command.output())
            .await
            .map_err(|_| ScanError::Timeout(self.timeout.as_millis() as u64))??;

        if !output.status.success() {
            return Ok(None);
        }
        Ok(parse_nslookup_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted answers for each step of the chain.
    #[derive(Default)]
    struct ScriptedLookup {
        reverse: Option<String>,
        fqdn: Option<String>,
        query: Option<String>,
        fail_all: bool,
    }

    impl ScriptedLookup {
        fn answer(&self, value: &Option<String>) -> ScanResult<Option<String>> {
            if self.fail_all {
                Err(ScanError::DnsResolution("NXDOMAIN".into()))
            } else {
                Ok(value.clone())
            }
        }
    }

    #[async_trait]
    impl NameLookup for ScriptedLookup {
        async fn reverse_lookup(&self, _addr: Ipv4Addr) -> ScanResult<Option<String>> {
            self.answer(&self.reverse)
        }
        async fn fqdn_lookup(&self, _addr: Ipv4Addr) -> ScanResult<Option<String>> {
            self.answer(&self.fqdn)
        }
        async fn name_query(&self, _addr: Ipv4Addr) -> ScanResult<Option<String>> {
            self.answer(&self.query)
        }
    }

    struct SlowLookup;

    #[async_trait]
    impl NameLookup for SlowLookup {
        async fn reverse_lookup(&self, _addr: Ipv4Addr) -> ScanResult<Option<String>> {
            std::future::pending().await
        }
        async fn fqdn_lookup(&self, _addr: Ipv4Addr) -> ScanResult<Option<String>> {
            std::future::pending().await
        }
        async fn name_query(&self, _addr: Ipv4Addr) -> ScanResult<Option<String>> {
            Ok(Some("printer.lan".into()))
        }
    }

    const ADDR: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 30);

    fn resolve(lookup: impl NameLookup + 'static) -> String {
        let resolver = HostnameResolver::new(Arc::new(lookup), Duration::from_millis(50));
        tokio_test::block_on(resolver.resolve(ADDR))
    }

    #[test]
    fn test_reverse_lookup_wins() {
        let name = resolve(ScriptedLookup {
            reverse: Some("nas".into()),
            fqdn: Some("nas.home.arpa".into()),
            ..Default::default()
        });
        assert_eq!(name, "nas");
    }

    #[test]
    fn test_unhelpful_reverse_falls_through_to_fqdn() {
        for bad in ["192.168.1.30", "_gateway", "a4:91:b1:0c:22:9f", ""] {
            let name = resolve(ScriptedLookup {
                reverse: Some(bad.into()),
                fqdn: Some("nas.home.arpa".into()),
                ..Default::default()
            });
            assert_eq!(name, "nas.home.arpa", "{:?}", bad);
        }
    }

    #[test]
    fn test_fqdn_requires_domain_separator() {
        let name = resolve(ScriptedLookup {
            fqdn: Some("nas".into()),
            query: Some("nas.lan".into()),
            ..Default::default()
        });
        assert_eq!(name, "nas.lan");
    }

    #[test]
    fn test_name_query_rejects_mac_names() {
        let name = resolve(ScriptedLookup {
            query: Some("a4-91-b1-0c-22-9f".into()),
            ..Default::default()
        });
        assert_eq!(name, UNKNOWN_HOSTNAME);
    }

    #[test]
    fn test_all_failures_yield_unknown() {
        let name = resolve(ScriptedLookup {
            reverse: Some("ignored".into()),
            fail_all: true,
            ..Default::default()
        });
        assert_eq!(name, UNKNOWN_HOSTNAME);
        assert_eq!(resolve(ScriptedLookup::default()), UNKNOWN_HOSTNAME);
    }

    #[tokio::test]
    async fn test_slow_steps_time_out_and_chain_continues() {
        let resolver = HostnameResolver::new(Arc::new(SlowLookup), Duration::from_millis(20));
        assert_eq!(resolver.resolve(ADDR).await, "printer.lan");
    }

    #[test]
    fn test_looks_like_mac() {
        assert!(looks_like_mac("a4:91:b1:0c:22:9f"));
        assert!(looks_like_mac("A4-91-B1-0C-22-9F"));
        assert!(!looks_like_mac("a4:91-b1:0c:22:9f"));
        assert!(!looks_like_mac("router.lan"));
        assert!(!looks_like_mac("a4:91:b1:0c:22:9"));
    }

    #[test]
    fn test_parse_nslookup_output() {
        let output = "\
Server:\t\t192.168.1.1
Address:\t192.168.1.1#53

30.1.168.192.in-addr.arpa\tname = printer.home.arpa.
30.1.168.192.in-addr.arpa\tname = second.home.arpa.
";
        assert_eq!(
            parse_nslookup_output(output).as_deref(),
            Some("printer.home.arpa")
        );
        assert_eq!(parse_nslookup_output("** server can't find 30.1.168.192"), None);
        assert_eq!(parse_nslookup_output("x\tname = ."), None);
    }
}
