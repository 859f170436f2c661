//! Account keys and signing.
//!
//! # Security
//! - Seeds are parsed once and held only as an ed25519 signing key
//! - `Debug` prints the public address, never the seed

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use stellar_strkey::ed25519::{PrivateKey, PublicKey};

use crate::ledger::types::{LedgerError, LedgerResult};

/// An ed25519 keypair addressed by strkey (`G…` address, `S…` seed).
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Decode a secret seed.
    pub fn from_seed(seed: &str) -> LedgerResult<Self> {
        let key = PrivateKey::from_string(seed).map_err(|_| LedgerError::InvalidSeed)?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&key.0),
        })
    }

    /// Generate a fresh keypair from the OS RNG.
    pub fn random() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Public account id.
    pub fn address(&self) -> String {
        PublicKey(self.signing_key.verifying_key().to_bytes()).to_string()
    }

    /// Secret seed.
    pub fn seed(&self) -> String {
        PrivateKey(self.signing_key.to_bytes()).to_string()
    }

    /// Raw secret bytes, used as HMAC key material.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Last four bytes of the public key, identifying the signer.
    pub fn hint(&self) -> [u8; 4] {
        let public = self.signing_key.verifying_key().to_bytes();
        [public[28], public[29], public[30], public[31]]
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish()
    }
}

/// Whether `seed` decodes as a secret seed.
pub fn is_valid_seed(seed: &str) -> bool {
    PrivateKey::from_string(seed).is_ok()
}

/// Whether `account_id` decodes as a public account id.
pub fn is_valid_account_id(account_id: &str) -> bool {
    PublicKey::from_string(account_id).is_ok()
}

/// Verify `signature` over `message` by `account_id`.
pub fn verify(account_id: &str, message: &[u8], signature: &[u8]) -> LedgerResult<bool> {
    let public = PublicKey::from_string(account_id)
        .map_err(|_| LedgerError::InvalidAccountId(account_id.to_string()))?;
    let key = VerifyingKey::from_bytes(&public.0)
        .map_err(|_| LedgerError::InvalidAccountId(account_id.to_string()))?;
    let signature = match Signature::from_slice(signature) {
        Ok(signature) => signature,
        Err(_) => return Ok(false),
    };
    Ok(key.verify(message, &signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_round_trip() {
        let keypair = Keypair::random();
        let seed = keypair.seed();
        assert!(seed.starts_with('S'));
        assert_eq!(seed.len(), 56);

        let restored = Keypair::from_seed(&seed).unwrap();
        assert_eq!(restored.address(), keypair.address());
        assert!(keypair.address().starts_with('G'));
    }

    #[test]
    fn test_invalid_seed() {
        assert!(matches!(
            Keypair::from_seed("invalid_seed"),
            Err(LedgerError::InvalidSeed)
        ));
        // An account id is not a seed.
        let address = Keypair::random().address();
        assert!(Keypair::from_seed(&address).is_err());
        assert!(!is_valid_seed(&address));
        assert!(is_valid_account_id(&address));
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = Keypair::random();
        let signature = keypair.sign(b"hello");
        assert!(verify(&keypair.address(), b"hello", &signature.to_bytes()).unwrap());
        assert!(!verify(&keypair.address(), b"other", &signature.to_bytes()).unwrap());
    }

    #[test]
    fn test_debug_hides_seed() {
        let keypair = Keypair::random();
        let printed = format!("{keypair:?}");
        assert!(printed.contains(&keypair.address()));
        assert!(!printed.contains(&keypair.seed()));
    }
}
