//! Service names for well-known TCP ports.
//!
//! Names are display labels ("HTTP", "PostgreSQL") as they appear in the
//! exported report, not IANA service identifiers.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Ports probed when the user asks for "common".
pub const COMMON_PORTS: [u16; 16] = [
    21, 22, 23, 25, 53, 80, 110, 143, 443, 993, 995, 1433, 3306, 3389, 5432, 27017,
];

static PORT_SERVICES: LazyLock<HashMap<u16, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (20, "FTP-Data"),
        (21, "FTP"),
        (22, "SSH"),
        (23, "Telnet"),
        (25, "SMTP"),
        (53, "DNS"),
        (67, "DHCP"),
        (69, "TFTP"),
        (80, "HTTP"),
        (88, "Kerberos"),
        (110, "POP3"),
        (111, "RPCbind"),
        (123, "NTP"),
        (135, "MSRPC"),
        (139, "NetBIOS"),
        (143, "IMAP"),
        (161, "SNMP"),
        (389, "LDAP"),
        (443, "HTTPS"),
        (445, "SMB"),
        (465, "SMTPS"),
        (515, "LPD"),
        (548, "AFP"),
        (554, "RTSP"),
        (587, "Submission"),
        (631, "IPP"),
        (636, "LDAPS"),
        (873, "rsync"),
        (993, "IMAPS"),
        (995, "POP3S"),
        (1433, "MSSQL"),
        (1521, "Oracle"),
        (1883, "MQTT"),
        (2049, "NFS"),
        (3000, "HTTP-Dev"),
        (3306, "MySQL"),
        (3389, "RDP"),
        (5000, "UPnP"),
        (5353, "mDNS"),
        (5432, "PostgreSQL"),
        (5900, "VNC"),
        (6379, "Redis"),
        (8000, "HTTP-Alt"),
        (8080, "HTTP-Proxy"),
        (8443, "HTTPS-Alt"),
        (8888, "HTTP-Alt"),
        (9100, "JetDirect"),
        (9200, "Elasticsearch"),
        (11211, "Memcached"),
        (27017, "MongoDB"),
    ])
});

/// Look up the service name for a port, if it is well known.
pub fn get_service_name(port: u16) -> Option<&'static str> {
    PORT_SERVICES.get(&port).copied()
}

/// Service label for a port, falling back to `"Port <n>"`.
pub fn service_label(port: u16) -> String {
    match get_service_name(port) {
        Some(name) => name.to_string(),
        None => format!("Port {}", port),
    }
}
