//! Process-wide TLS setup.
//!
//! Both the HTTP clients and the gateway WebSockets run on rustls. rustls
//! needs a crypto provider installed before the first handshake; this crate
//! uses `ring` for all of them.

use std::sync::Once;

use tracing::debug;

static INSTALL: Once = Once::new();

/// Installs `ring` as the process default crypto provider.
///
/// Safe to call repeatedly; only the first call has an effect, and an
/// already-installed provider is left in place.
pub fn install_crypto_provider() {
    INSTALL.call_once(|| {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            debug!("A rustls crypto provider was already installed");
        }
    });
}
