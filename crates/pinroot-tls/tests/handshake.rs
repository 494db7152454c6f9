//! Full client/server handshakes over in-memory buffers.

use pinroot_core::fixtures::{self, ymd, Issued};
use pinroot_core::{CertRole, ExpiryGuard, FixedClock, GuardConfig, RootCertificate, SystemClock, Verdict};
use pinroot_tls::{anchor_verdict, client_config, PinnedServerVerifier, VerdictLog};
use rustls::crypto::ring;
use rustls::pki_types::{PrivateKeyDer, ServerName};
use rustls::{CertificateError, ClientConfig, ClientConnection, ServerConfig, ServerConnection};
use std::sync::Arc;

const HOST: &str = "device.local";

fn long_lived_root() -> Issued {
    fixtures::root("Handshake Root", ymd(2020, 1, 1), ymd(2099, 1, 1))
}

fn server_config(chain: &[&Issued], key_of: &Issued) -> Arc<ServerConfig> {
    let certs = chain.iter().map(|issued| issued.cert.der().clone()).collect();
    let key = PrivateKeyDer::Pkcs8(key_of.key.serialize_der().into());
    let config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .unwrap();
    Arc::new(config)
}

fn verifier(root: &Issued, clock: Arc<dyn pinroot_core::Clock>) -> (Arc<PinnedServerVerifier>, Arc<VerdictLog>) {
    let anchor = Arc::new(RootCertificate::from_der(root.der()).unwrap());
    let guard = Arc::new(ExpiryGuard::with_clock(anchor, GuardConfig::default(), clock));
    let log = Arc::new(VerdictLog::new());
    let verifier = PinnedServerVerifier::new(guard).with_observer(log.clone());
    (Arc::new(verifier), log)
}

/// Pump records between the two sides until both finish or one fails.
fn handshake(client: &mut ClientConnection, server: &mut ServerConnection) -> Result<(), rustls::Error> {
    let mut buf = Vec::new();
    for _ in 0..32 {
        if !client.is_handshaking() && !server.is_handshaking() {
            return Ok(());
        }

        buf.clear();
        while client.wants_write() {
            client.write_tls(&mut buf).unwrap();
        }
        let mut rd = buf.as_slice();
        while !rd.is_empty() {
            server.read_tls(&mut rd).unwrap();
            server.process_new_packets()?;
        }

        buf.clear();
        while server.wants_write() {
            server.write_tls(&mut buf).unwrap();
        }
        let mut rd = buf.as_slice();
        while !rd.is_empty() {
            client.read_tls(&mut rd).unwrap();
            client.process_new_packets()?;
        }
    }
    panic!("handshake did not converge");
}

fn connect(config: ClientConfig, server: Arc<ServerConfig>, name: &str) -> Result<(), rustls::Error> {
    let name = ServerName::try_from(name.to_string()).unwrap();
    let mut client = ClientConnection::new(Arc::new(config), name).unwrap();
    let mut server = ServerConnection::new(server).unwrap();
    handshake(&mut client, &mut server)
}

#[test]
fn pinned_chain_completes_handshake() {
    let root = long_lived_root();
    let leaf = fixtures::leaf(&[HOST], &root, ymd(2020, 1, 1), ymd(2098, 1, 1));
    let (verifier, log) = verifier(&root, Arc::new(SystemClock));

    let config = client_config(verifier).unwrap();
    connect(config, server_config(&[&leaf], &leaf), HOST).unwrap();

    assert_eq!(log.last().unwrap().verdict, Verdict::Trusted);
}

#[test]
fn tls12_handshake_completes() {
    let root = long_lived_root();
    let leaf = fixtures::leaf(&[HOST], &root, ymd(2020, 1, 1), ymd(2098, 1, 1));
    let (verifier, _) = verifier(&root, Arc::new(SystemClock));

    let config = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_protocol_versions(&[&rustls::version::TLS12])
        .unwrap()
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    connect(config, server_config(&[&leaf], &leaf), HOST).unwrap();
}

#[test]
fn chain_with_intermediate_completes_handshake() {
    let root = long_lived_root();
    let inter = fixtures::intermediate("Handshake Intermediate", &root, ymd(2020, 1, 1), ymd(2098, 1, 1));
    let leaf = fixtures::leaf(&[HOST], &inter, ymd(2020, 1, 1), ymd(2097, 1, 1));
    let (verifier, log) = verifier(&root, Arc::new(SystemClock));

    let config = client_config(verifier).unwrap();
    connect(config, server_config(&[&leaf, &inter], &leaf), HOST).unwrap();
    assert_eq!(log.last().unwrap().chain_len, 2);
}

#[test]
fn self_signed_server_matching_the_anchor_is_trusted() {
    let server = fixtures::self_signed_server("localhost", ymd(2020, 1, 1), ymd(2099, 1, 1));
    let (verifier, log) = verifier(&server, Arc::new(SystemClock));

    let config = client_config(verifier).unwrap();
    connect(config, server_config(&[&server], &server), "localhost").unwrap();
    assert_eq!(log.last().unwrap().verdict, Verdict::Trusted);
}

#[test]
fn foreign_root_is_unknown_issuer() {
    let root = long_lived_root();
    let other = fixtures::root("Other Root", ymd(2020, 1, 1), ymd(2099, 1, 1));
    let leaf = fixtures::leaf(&[HOST], &other, ymd(2020, 1, 1), ymd(2098, 1, 1));
    let (verifier, log) = verifier(&root, Arc::new(SystemClock));

    let err = connect(client_config(verifier).unwrap(), server_config(&[&leaf], &leaf), HOST).unwrap_err();
    assert_eq!(err, rustls::Error::InvalidCertificate(CertificateError::UnknownIssuer));
    assert_eq!(log.last().unwrap().verdict, Verdict::UntrustedIssuer);
}

#[test]
fn wrong_name_is_rejected() {
    let root = long_lived_root();
    let leaf = fixtures::leaf(&["other.local"], &root, ymd(2020, 1, 1), ymd(2098, 1, 1));
    let (verifier, _) = verifier(&root, Arc::new(SystemClock));

    let err = connect(client_config(verifier).unwrap(), server_config(&[&leaf], &leaf), HOST).unwrap_err();
    assert_eq!(err, rustls::Error::InvalidCertificate(CertificateError::NotValidForName));
}

#[test]
fn expired_leaf_is_rejected() {
    let root = long_lived_root();
    let leaf = fixtures::leaf(&[HOST], &root, ymd(2020, 1, 1), ymd(2021, 1, 1));
    let (verifier, _) = verifier(&root, Arc::new(SystemClock));

    let err = connect(client_config(verifier).unwrap(), server_config(&[&leaf], &leaf), HOST).unwrap_err();
    assert_eq!(err, rustls::Error::InvalidCertificate(CertificateError::Expired));
    assert_eq!(anchor_verdict(&err), None);
}

#[test]
fn expired_anchor_refuses_before_validation() {
    let root = long_lived_root();
    let leaf = fixtures::leaf(&[HOST], &root, ymd(2020, 1, 1), ymd(2098, 1, 1));
    let (verifier, log) = verifier(&root, Arc::new(FixedClock(fixtures::utc(2099, 6, 1))));

    let err = connect(client_config(verifier).unwrap(), server_config(&[&leaf], &leaf), HOST).unwrap_err();
    assert_eq!(anchor_verdict(&err), Some(Verdict::Expired(CertRole::Anchor)));
    assert_eq!(log.records().len(), 1);
}
