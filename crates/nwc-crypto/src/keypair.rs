//! secp256k1 key pairs and the x-only public keys that identify connections.
//!
//! Keys follow BIP340: the public key is the 32-byte x coordinate of the
//! point, which is what wallet-connect clients derive from their secret.

use k256::schnorr::signature::{Signer, Verifier};
use k256::schnorr::{Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};

/// A secp256k1 key pair. The signing key zeroizes itself on drop.
///
/// Key pairs are produced by
/// [`IdentityProvider::generate_identity`](crate::IdentityProvider::generate_identity)
/// or restored from a stored secret.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Build a key pair from 32 bytes of secret material.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSecret`] if the bytes are zero or not
    /// below the curve order.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> CryptoResult<Self> {
        let signing_key = SigningKey::from_bytes(secret)
            .map_err(|_| CryptoError::InvalidSecret("not a valid secp256k1 scalar".to_string()))?;
        Ok(Self { signing_key })
    }

    /// Restore a key pair from a hex-encoded secret.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidHexEncoding`],
    /// [`CryptoError::InvalidKeyLength`] or [`CryptoError::InvalidSecret`]
    /// for malformed input.
    pub fn from_secret_hex(secret: &str) -> CryptoResult<Self> {
        let bytes =
            Zeroizing::new(hex::decode(secret).map_err(|_| CryptoError::InvalidHexEncoding)?);
        let secret: Zeroizing<[u8; 32]> =
            Zeroizing::new(bytes.as_slice().try_into().map_err(|_| {
                CryptoError::InvalidKeyLength {
                    expected: 32,
                    actual: bytes.len(),
                }
            })?);
        Self::from_secret_bytes(&secret)
    }

    /// The x-only public half.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes().into())
    }

    /// Hex-encoded secret. Only ever shown to the client that owns it.
    #[must_use]
    pub fn secret_hex(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(<[u8; 32]>::from(self.signing_key.to_bytes()));
        Zeroizing::new(hex::encode(&bytes[..]))
    }

    /// Sign a message with a BIP340 Schnorr signature over its SHA-256 digest.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        let signature: Signature = self.signing_key.sign(message);
        signature.to_bytes()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_id", &self.public_key().key_id_hex())
            .finish_non_exhaustive()
    }
}

/// A connection's public key: 32 opaque bytes, hex-encoded externally.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Create from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Decode from a hex string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid hex or not 32 bytes.
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidHexEncoding)?;
        let actual = bytes.len();
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual,
            })?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encode as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short identifier (first 8 bytes, hex) for logs.
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        hex::encode(&self.0[..8])
    }

    /// Verify a signature made by the matching secret key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSignatureLength`] for anything but 64
    /// bytes, and [`CryptoError::SignatureVerificationFailed`] if the key is
    /// not an x coordinate on the curve or the signature does not match.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> CryptoResult<()> {
        if signature.len() != Signature::BYTE_SIZE {
            return Err(CryptoError::InvalidSignatureLength(signature.len()));
        }
        let signature = Signature::try_from(signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)?;
        VerifyingKey::from_bytes(&self.0)
            .map_err(|_| CryptoError::SignatureVerificationFailed)?
            .verify(message, &signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.key_id_hex())
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl From<[u8; 32]> for PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_pair() -> KeyPair {
        KeyPair::from_secret_bytes(&[7u8; 32]).unwrap()
    }

    // BIP340 test vector 0.
    const BIP340_SECRET: &str =
        "0000000000000000000000000000000000000000000000000000000000000003";
    const BIP340_PUBKEY: &str =
        "f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9";

    #[test]
    fn test_secret_hex_roundtrip() {
        let original = fixed_pair();
        let restored = KeyPair::from_secret_hex(&original.secret_hex()).unwrap();
        assert_eq!(original.public_key(), restored.public_key());
    }

    #[test]
    fn test_from_secret_hex_rejects_bad_input() {
        assert!(matches!(
            KeyPair::from_secret_hex("zz"),
            Err(CryptoError::InvalidHexEncoding)
        ));
        assert!(matches!(
            KeyPair::from_secret_hex(&"ab".repeat(31)),
            Err(CryptoError::InvalidKeyLength { actual: 31, .. })
        ));
    }

    #[test]
    fn test_public_key_is_bip340_x_only() {
        let pair = KeyPair::from_secret_hex(BIP340_SECRET).unwrap();
        assert_eq!(pair.public_key().to_hex(), BIP340_PUBKEY);
    }

    #[test]
    fn test_public_key_matches_schnorr_derivation() {
        let secret = [0x5au8; 32];
        let pair = KeyPair::from_secret_bytes(&secret).unwrap();
        let derived = SigningKey::from_bytes(&secret).unwrap();
        assert_eq!(
            pair.public_key().as_bytes()[..],
            derived.verifying_key().to_bytes()[..]
        );
    }

    #[test]
    fn test_rejects_out_of_range_secret() {
        assert!(matches!(
            KeyPair::from_secret_bytes(&[0u8; 32]),
            Err(CryptoError::InvalidSecret(_))
        ));
        assert!(matches!(
            KeyPair::from_secret_bytes(&[0xffu8; 32]),
            Err(CryptoError::InvalidSecret(_))
        ));
    }

    #[test]
    fn test_sign_verify() {
        let pair = fixed_pair();
        let sig = pair.sign(b"pay_invoice");
        let pk = pair.public_key();
        assert!(pk.verify(b"pay_invoice", &sig).is_ok());
        assert!(matches!(
            pk.verify(b"get_balance", &sig),
            Err(CryptoError::SignatureVerificationFailed)
        ));
        assert!(matches!(
            pk.verify(b"pay_invoice", &sig[..10]),
            Err(CryptoError::InvalidSignatureLength(10))
        ));
    }

    #[test]
    fn test_public_key_hex_and_serde() {
        let pk = fixed_pair().public_key();
        let hex = pk.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(PublicKey::from_hex(&hex).unwrap(), pk);
        assert_eq!(hex.parse::<PublicKey>().unwrap(), pk);

        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{hex}\""));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);
    }

    #[test]
    fn test_debug_hides_secret() {
        let pair = fixed_pair();
        let debug = format!("{pair:?}");
        assert!(!debug.contains(pair.secret_hex().as_str()));
        assert!(debug.contains(&pair.public_key().key_id_hex()));
    }
}
