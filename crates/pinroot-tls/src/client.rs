//! Client configuration wired to the pinned verifier.

use rustls::crypto::ring;
use rustls::ClientConfig;
use std::sync::Arc;

use crate::binding::PinnedServerVerifier;

/// Build a `ClientConfig` that trusts only the pinned anchor.
///
/// Uses the `ring` provider with its safe default protocol versions and no
/// client authentication.
pub fn client_config(verifier: Arc<PinnedServerVerifier>) -> Result<ClientConfig, rustls::Error> {
    let config = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    Ok(config)
}
