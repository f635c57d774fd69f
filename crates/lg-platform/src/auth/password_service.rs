//! Password Service
//!
//! Argon2id hashing and verification for the embedded credential store,
//! plus temporary-password generation for admin-triggered resets.

use argon2::{
    password_hash::{
        rand_core::OsRng,
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2, Algorithm, Params, Version,
};
use rand::Rng;
use tracing::warn;

use crate::shared::error::{PortalError, Result};

/// Password policy
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_letter: bool,
    pub require_digit: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 10,
            max_length: 128,
            require_letter: true,
            require_digit: true,
        }
    }
}

impl PasswordPolicy {
    pub fn validate(&self, password: &str) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if password.len() < self.min_length {
            errors.push(format!("Password must be at least {} characters", self.min_length));
        }
        if password.len() > self.max_length {
            errors.push(format!("Password must be at most {} characters", self.max_length));
        }
        if self.require_letter && !password.chars().any(|c| c.is_ascii_alphabetic()) {
            errors.push("Password must contain at least one letter".to_string());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("Password must contain at least one digit".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Relaxed policy for development/testing.
    pub fn lenient() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_letter: false,
            require_digit: false,
        }
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone)]
pub struct Argon2Config {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    pub parallelism: u32,
    pub output_len: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
            output_len: 32,
        }
    }
}

impl Argon2Config {
    /// Low-cost config so test suites stay fast.
    pub fn testing() -> Self {
        Self {
            memory_cost: 4096,
            time_cost: 1,
            parallelism: 1,
            output_len: 32,
        }
    }

    fn to_params(&self) -> Params {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.output_len),
        )
        .expect("Invalid Argon2 params")
    }
}

pub struct PasswordService {
    argon2: Argon2<'static>,
    policy: PasswordPolicy,
}

impl PasswordService {
    pub fn new(config: Argon2Config, policy: PasswordPolicy) -> Self {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, config.to_params());
        Self { argon2, policy }
    }

    /// Hash a password, validating it against the policy first.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        if let Err(errors) = self.policy.validate(password) {
            return Err(PortalError::Validation {
                message: errors.join("; "),
            });
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PortalError::Internal {
                message: format!("Failed to hash password: {}", e),
            })?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored PHC hash.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| PortalError::Internal {
            message: format!("Invalid password hash format: {}", e),
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                warn!("password verification failed");
                Ok(false)
            }
            Err(e) => Err(PortalError::Internal {
                message: format!("Password verification error: {}", e),
            }),
        }
    }

    pub fn validate_password(&self, password: &str) -> Result<()> {
        self.policy.validate(password).map_err(|errors| PortalError::Validation {
            message: errors.join("; "),
        })
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(Argon2Config::default(), PasswordPolicy::default())
    }
}

/// Generate a temporary password for an admin-triggered reset. Satisfies the
/// default policy (letters + digits, 16 chars).
pub fn generate_temp_password() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKMNPQRSTVWXYZabcdefghjkmnpqrstvwxyz23456789";
    let mut rng = rand::thread_rng();
    let mut password: String = (0..14)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    // Guarantee at least one letter and one digit regardless of draw.
    password.push('a');
    password.push(char::from(b'2' + rng.gen_range(0..8) as u8));
    password
}

#[cfg(test)]
mod tests {
    use super::*;

    fn testing_service() -> PasswordService {
        PasswordService::new(Argon2Config::testing(), PasswordPolicy::lenient())
    }

    #[test]
    fn test_policy_default() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("longenough123").is_ok());
        assert!(policy.validate("short1").is_err());
        assert!(policy.validate("nodigitshere!!").is_err());
        assert!(policy.validate("1234567890123").is_err());
    }

    #[test]
    fn test_hash_and_verify() {
        let service = testing_service();
        let hash = service.hash_password("testpassword123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify_password("testpassword123", &hash).unwrap());
        assert!(!service.verify_password("wrongpassword", &hash).unwrap());
    }

    #[test]
    fn test_hash_uses_random_salt() {
        let service = testing_service();
        let h1 = service.hash_password("testpassword123").unwrap();
        let h2 = service.hash_password("testpassword123").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_temp_password_satisfies_default_policy() {
        let policy = PasswordPolicy::default();
        for _ in 0..20 {
            let pw = generate_temp_password();
            assert!(policy.validate(&pw).is_ok(), "generated {:?}", pw);
        }
    }
}
