//! Identity generation gated on an explicit readiness signal.
//!
//! The entropy source is probed once, off the async executor, the first time
//! anyone awaits [`IdentityProvider::ready`]. Callers never poll: they await
//! the same once-cell, and a failed probe leaves it empty so a later call can
//! retry.

use std::sync::Arc;

use rand::RngCore;
use rand::rngs::OsRng;
use tokio::sync::OnceCell;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::keypair::KeyPair;

/// Draws attempted before giving up on an entropy source.
const MAX_DRAWS: usize = 4;

/// A source of secret key material.
pub trait EntropySource: Send + Sync + std::fmt::Debug + 'static {
    /// Fill `dest` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure if no randomness is available.
    fn fill(&self, dest: &mut [u8]) -> Result<(), String>;
}

/// The operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), String> {
        OsRng.try_fill_bytes(dest).map_err(|e| e.to_string())
    }
}

/// Generates client and provider identities once randomness is ready.
#[derive(Debug)]
pub struct IdentityProvider {
    source: Arc<dyn EntropySource>,
    ready: OnceCell<()>,
}

impl IdentityProvider {
    /// Provider backed by the OS CSPRNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(Arc::new(OsEntropy))
    }

    /// Provider backed by a custom entropy source.
    #[must_use]
    pub fn with_source(source: Arc<dyn EntropySource>) -> Self {
        Self {
            source,
            ready: OnceCell::new(),
        }
    }

    /// Resolve once the entropy source has produced a probe successfully.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::IdentityGenerationUnavailable`] if the probe
    /// fails. The readiness cell stays empty, so the next call probes again.
    pub async fn ready(&self) -> CryptoResult<()> {
        self.ready
            .get_or_try_init(|| async {
                let source = Arc::clone(&self.source);
                let probe = tokio::task::spawn_blocking(move || {
                    let mut buf = Zeroizing::new([0u8; 32]);
                    source.fill(&mut buf[..])
                })
                .await
                .map_err(|e| CryptoError::IdentityGenerationUnavailable(e.to_string()))?;
                probe.map_err(CryptoError::IdentityGenerationUnavailable)?;
                tracing::debug!("entropy source ready");
                Ok::<(), CryptoError>(())
            })
            .await
            .copied()
    }

    /// Whether readiness has already been established.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// Generate a fresh key pair.
    ///
    /// The secret belongs to whoever asked for it; nothing here stores it.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::IdentityGenerationUnavailable`] if the entropy
    /// source is not ready or fails while drawing the key.
    pub async fn generate_identity(&self) -> CryptoResult<KeyPair> {
        self.ready().await?;
        let mut secret = Zeroizing::new([0u8; 32]);
        for _ in 0..MAX_DRAWS {
            self.source
                .fill(&mut secret[..])
                .map_err(CryptoError::IdentityGenerationUnavailable)?;
            // Zero or at least the curve order: draw again.
            if let Ok(pair) = KeyPair::from_secret_bytes(&secret) {
                return Ok(pair);
            }
        }
        Err(CryptoError::IdentityGenerationUnavailable(
            "entropy source keeps producing invalid secp256k1 scalars".to_string(),
        ))
    }
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}
