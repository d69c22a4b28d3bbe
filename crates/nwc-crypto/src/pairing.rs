//! Pairing templates and client-side credential substitution.
//!
//! The server hands out a template that names the provider and relay and
//! contains exactly one [`SECRET_PLACEHOLDER`]. The client substitutes its own
//! secret locally, so the secret-bearing string never crosses the network.

use crate::error::{CryptoError, CryptoResult};
use crate::keypair::PublicKey;

/// URI scheme of wallet-connect pairing credentials.
pub const PAIRING_SCHEME: &str = "nostr+walletconnect://";

/// Token the client replaces with its secret.
pub const SECRET_PLACEHOLDER: &str = "{{SECRET}}";

/// Relay setting value that refers to the co-hosted relay endpoint.
const LOCAL_RELAY: &str = "nostrclient";

/// Scheme and host of the request that asked for a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    /// `http` or `https`.
    pub scheme: String,
    /// Host and optional port.
    pub host: String,
}

impl RequestOrigin {
    /// Create an origin.
    #[must_use]
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }
}

/// Pick the relay URL to advertise.
///
/// A non-empty alias wins. Otherwise the configured relay is used, with the
/// local relay keyword expanded against the request origin.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidPairingTemplate`] if no relay is configured,
/// or the local relay is selected without an origin to expand it against.
pub fn resolve_relay(
    relay: &str,
    relay_alias: &str,
    origin: Option<&RequestOrigin>,
) -> CryptoResult<String> {
    if !relay_alias.trim().is_empty() {
        return Ok(relay_alias.trim().to_string());
    }
    let relay = relay.trim();
    if relay.is_empty() {
        return Err(CryptoError::InvalidPairingTemplate(
            "relay is not configured".to_string(),
        ));
    }
    if relay != LOCAL_RELAY {
        return Ok(relay.to_string());
    }
    let origin = origin.ok_or_else(|| {
        CryptoError::InvalidPairingTemplate("local relay needs the request origin".to_string())
    })?;
    let scheme = if origin.scheme == "http" { "ws" } else { "wss" };
    Ok(format!("{scheme}://{}/nostrclient/api/v1/relay", origin.host))
}

/// A pairing template with a single secret placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingTemplate(String);

impl PairingTemplate {
    /// Build the template for a provider key and relay URL.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPairingTemplate`] if the relay is empty.
    pub fn new(provider: &PublicKey, relay: &str) -> CryptoResult<Self> {
        if relay.trim().is_empty() {
            return Err(CryptoError::InvalidPairingTemplate(
                "relay is empty".to_string(),
            ));
        }
        let relay: String = url::form_urlencoded::byte_serialize(relay.as_bytes()).collect();
        Ok(Self(format!(
            "{}{}?relay={}&secret={}",
            PAIRING_SCHEME, provider, relay, SECRET_PLACEHOLDER
        )))
    }

    /// The template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the template text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PairingTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Substitute a locally held secret into a pairing template.
///
/// Pure string work, meant to run on the side that owns the secret.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidPairingTemplate`] unless the template uses
/// the pairing scheme and holds exactly one placeholder, and
/// [`CryptoError::InvalidSecret`] unless the secret is 64 hex characters.
pub fn build_pairing_credential(template: &str, secret: &str) -> CryptoResult<String> {
    if !template.starts_with(PAIRING_SCHEME) {
        return Err(CryptoError::InvalidPairingTemplate(
            "unexpected scheme".to_string(),
        ));
    }
    let placeholders = template.matches(SECRET_PLACEHOLDER).count();
    if placeholders != 1 {
        return Err(CryptoError::InvalidPairingTemplate(format!(
            "expected one placeholder, found {placeholders}"
        )));
    }
    if secret.len() != 64 || !secret.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CryptoError::InvalidSecret(
            "expected 64 hex characters".to_string(),
        ));
    }
    Ok(template.replacen(SECRET_PLACEHOLDER, secret, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::KeyPair;

    fn provider() -> PublicKey {
        KeyPair::from_secret_bytes(&[1u8; 32]).unwrap().public_key()
    }

    #[test]
    fn test_template_shape() {
        let pk = provider();
        let template = PairingTemplate::new(&pk, "wss://relay.example.com").unwrap();
        assert_eq!(
            template.as_str(),
            format!(
                "nostr+walletconnect://{}?relay=wss%3A%2F%2Frelay.example.com&secret={{{{SECRET}}}}",
                pk.to_hex()
            )
        );
        assert!(PairingTemplate::new(&pk, "  ").is_err());
    }

    #[test]
    fn test_credential_substitution() {
        let template = PairingTemplate::new(&provider(), "wss://relay.example.com").unwrap();
        let secret = "ab".repeat(32);
        let credential = build_pairing_credential(template.as_str(), &secret).unwrap();
        assert!(credential.ends_with(&format!("&secret={secret}")));
        assert!(!credential.contains(SECRET_PLACEHOLDER));
    }

    #[test]
    fn test_credential_rejects_bad_template() {
        let secret = "ab".repeat(32);
        assert!(build_pairing_credential("https://x?secret={{SECRET}}", &secret).is_err());
        assert!(build_pairing_credential("nostr+walletconnect://x", &secret).is_err());
        assert!(
            build_pairing_credential(
                "nostr+walletconnect://x?a={{SECRET}}&b={{SECRET}}",
                &secret
            )
            .is_err()
        );
    }

    #[test]
    fn test_credential_rejects_bad_secret() {
        let template = PairingTemplate::new(&provider(), "wss://r").unwrap();
        assert!(matches!(
            build_pairing_credential(template.as_str(), "short"),
            Err(CryptoError::InvalidSecret(_))
        ));
        assert!(matches!(
            build_pairing_credential(template.as_str(), &"zz".repeat(32)),
            Err(CryptoError::InvalidSecret(_))
        ));
    }

    #[test]
    fn test_resolve_relay() {
        let origin = RequestOrigin::new("https", "wallet.example.com:5000");
        assert_eq!(
            resolve_relay("wss://r", "wss://alias", None).unwrap(),
            "wss://alias"
        );
        assert_eq!(resolve_relay("wss://r", "", None).unwrap(), "wss://r");
        assert_eq!(
            resolve_relay("nostrclient", "", Some(&origin)).unwrap(),
            "wss://wallet.example.com:5000/nostrclient/api/v1/relay"
        );
        let plain = RequestOrigin::new("http", "localhost");
        assert_eq!(
            resolve_relay("nostrclient", "", Some(&plain)).unwrap(),
            "ws://localhost/nostrclient/api/v1/relay"
        );
        assert!(resolve_relay("nostrclient", "", None).is_err());
        assert!(resolve_relay("", "", None).is_err());
    }
}
