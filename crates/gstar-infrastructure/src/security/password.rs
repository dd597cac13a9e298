use gstar_core::auth::PasswordHasher;
use gstar_core::{GstarError, Result};

/// bcrypt only looks at the first 72 bytes of its input.
const BCRYPT_MAX_INPUT: usize = 72;

/// bcrypt-based [`PasswordHasher`].
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Custom work factor. Low costs are only meant for tests.
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

fn truncated(password: &str) -> &[u8] {
    let bytes = password.as_bytes();
    &bytes[..bytes.len().min(BCRYPT_MAX_INPUT)]
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(truncated(password), self.cost)
            .map_err(|e| GstarError::internal(format!("Password hashing failed: {e}")))
    }

    fn verify(&self, password: &str, password_hash: &str) -> bool {
        bcrypt::verify(truncated(password), password_hash).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = BcryptPasswordHasher::with_cost(4);
        let hash = hasher.hash("hunter22").unwrap();
        assert_ne!(hash, "hunter22");
        assert!(hasher.verify("hunter22", &hash));
        assert!(!hasher.verify("hunter23", &hash));
    }

    #[test]
    fn test_long_passwords_compare_on_prefix() {
        let hasher = BcryptPasswordHasher::with_cost(4);
        let base = "a".repeat(72);
        let hash = hasher.hash(&format!("{base}first")).unwrap();
        assert!(hasher.verify(&format!("{base}second"), &hash));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let hasher = BcryptPasswordHasher::with_cost(4);
        assert!(!hasher.verify("anything", "not-a-bcrypt-hash"));
    }
}
