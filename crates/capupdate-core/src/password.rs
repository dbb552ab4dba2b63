//! Salted password credentials for the edit gate.
//!
//! Each record stores an Argon2id hash of its password as a PHC string
//! (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`), so the salt and cost
//! parameters travel with the hash. The plaintext is only ever held for the
//! duration of a request.

use argon2::Argon2;
use argon2::password_hash::{self, PasswordHasher, PasswordVerifier, SaltString};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

const SALT_LEN: usize = 16;

/// A stored password credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash {
    phc: String,
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHash").finish_non_exhaustive()
    }
}

impl PasswordHash {
    /// Hash a new password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns [`password_hash::Error`] if the hasher rejects the input.
    pub fn new(password: &str) -> Result<Self, password_hash::Error> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt)?;
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string();
        Ok(Self { phc })
    }

    /// Check a candidate password against this credential.
    ///
    /// A credential that is not a valid PHC string never verifies.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        let Ok(parsed) = password_hash::PasswordHash::new(&self.phc) else {
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn verifies_matching_password() {
        let cred = PasswordHash::new("abcd").unwrap();
        assert!(cred.verify("abcd"));
    }

    #[test]
    fn rejects_wrong_password() {
        let cred = PasswordHash::new("abcd").unwrap();
        assert!(!cred.verify("abce"));
        assert!(!cred.verify(""));
        assert!(!cred.verify("abcd "));
    }

    #[test]
    fn stored_as_argon2id_phc_string() {
        let cred = PasswordHash::new("abcd").unwrap();
        let json = serde_json::to_string(&cred).unwrap();
        assert!(json.starts_with("\"$argon2id$"), "unexpected encoding: {json}");
    }

    #[test]
    fn same_password_gets_different_salt() {
        let a = PasswordHash::new("abcd").unwrap();
        let b = PasswordHash::new("abcd").unwrap();
        assert_ne!(a, b);
        assert!(a.verify("abcd") && b.verify("abcd"));
    }

    #[test]
    fn hash_does_not_contain_plaintext() {
        let cred = PasswordHash::new("hunter22").unwrap();
        let json = serde_json::to_string(&cred).unwrap();
        assert!(!json.contains("hunter22"));
        assert!(!format!("{cred:?}").contains("hunter22"));
    }

    #[test]
    fn malformed_credential_never_verifies() {
        let cred: PasswordHash = serde_json::from_str("\"not-a-phc-string\"").unwrap();
        assert!(!cred.verify("anything"));
    }
}
