//! Leaf hostname matching.
//!
//! SAN entries win: the subject CN is only consulted when the certificate
//! carries no SAN entry of the relevant kind at all. Matching is ASCII
//! case-insensitive and ignores one trailing dot. A wildcard is accepted
//! only as the whole left-most label and covers exactly one label.

use std::net::IpAddr;

use crate::cert::CertificateInfo;

/// Whether `expected` names the certificate described by `info`.
#[must_use]
pub fn matches(info: &CertificateInfo, expected: &str) -> bool {
    let expected = normalize(expected);
    if expected.is_empty() {
        return false;
    }

    if let Ok(ip) = expected.parse::<IpAddr>() {
        if !info.ip_addresses.is_empty() {
            return info.ip_addresses.contains(&ip);
        }
        // Devices provisioned by IP get certificates with the literal in CN.
        return info.dns_names.is_empty()
            && info
                .common_name
                .as_deref()
                .and_then(|cn| normalize(cn).parse::<IpAddr>().ok())
                .is_some_and(|cn_ip| cn_ip == ip);
    }

    if !info.dns_names.is_empty() {
        return info.dns_names.iter().any(|name| dns_matches(name, &expected));
    }

    info.common_name
        .as_deref()
        .is_some_and(|cn| dns_matches(cn, &expected))
}

fn normalize(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn dns_matches(pattern: &str, host: &str) -> bool {
    let pattern = normalize(pattern);
    if pattern == host {
        return true;
    }

    let Some(suffix) = pattern.strip_prefix("*.") else {
        return false;
    };
    // `*.com` style patterns are too broad to honour.
    if !suffix.contains('.') || suffix.contains('*') {
        return false;
    }

    match host.split_once('.') {
        Some((label, rest)) => !label.is_empty() && rest == suffix,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn info(cn: Option<&str>, dns: &[&str], ips: &[&str]) -> CertificateInfo {
        let now = Utc::now();
        CertificateInfo {
            subject: String::new(),
            issuer: String::new(),
            serial: "01".into(),
            not_before: now,
            not_after: now,
            fingerprint: String::new(),
            common_name: cn.map(str::to_string),
            dns_names: dns.iter().map(|s| (*s).to_string()).collect(),
            ip_addresses: ips.iter().map(|s| s.parse().unwrap()).collect(),
            self_issued: false,
        }
    }

    #[test]
    fn san_dns_exact_match() {
        let cert = info(Some("ignored"), &["device.local"], &[]);
        assert!(matches(&cert, "device.local"));
        assert!(matches(&cert, "DEVICE.local."));
        assert!(!matches(&cert, "other.local"));
    }

    #[test]
    fn cn_ignored_when_san_present() {
        let cert = info(Some("localhost"), &["device.local"], &[]);
        assert!(!matches(&cert, "localhost"));
    }

    #[test]
    fn cn_fallback_without_san() {
        let cert = info(Some("localhost"), &[], &[]);
        assert!(matches(&cert, "localhost"));
        assert!(!matches(&cert, "127.0.0.1"));
    }

    #[test]
    fn wildcard_covers_one_label() {
        let cert = info(None, &["*.lab.local"], &[]);
        assert!(matches(&cert, "reader1.lab.local"));
        assert!(!matches(&cert, "lab.local"));
        assert!(!matches(&cert, "a.b.lab.local"));
    }

    #[test]
    fn overly_broad_wildcard_rejected() {
        let cert = info(None, &["*.local"], &[]);
        assert!(!matches(&cert, "device.local"));
    }

    #[test]
    fn ip_literal_uses_san_ip() {
        let cert = info(None, &["device.local"], &["192.168.1.20"]);
        assert!(matches(&cert, "192.168.1.20"));
        assert!(!matches(&cert, "192.168.1.21"));
    }

    #[test]
    fn ip_literal_in_cn_without_san() {
        let cert = info(Some("10.0.0.5"), &[], &[]);
        assert!(matches(&cert, "10.0.0.5"));
    }

    #[test]
    fn empty_hostname_never_matches() {
        let cert = info(Some("localhost"), &[], &[]);
        assert!(!matches(&cert, ""));
        assert!(!matches(&cert, "."));
    }
}
