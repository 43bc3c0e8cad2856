/// Argon2id password hashing
///
/// Hashes are PHC strings (`$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`),
/// so verification takes its parameters from the stored value and older
/// hashes keep working if the cost constants below change.
///
/// ```
/// use taskchat_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse battery")?;
/// assert!(verify_password("correct horse battery", &hash)?);
/// assert!(!verify_password("tr0ub4dor", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Memory cost in KiB (64 MiB)
pub const MEMORY_COST_KIB: u32 = 64 * 1024;
pub const TIME_COST: u32 = 3;
pub const PARALLELISM: u32 = 4;
pub const HASH_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(password_hash::Error),

    #[error("Failed to verify password: {0}")]
    VerifyError(password_hash::Error),

    /// Stored value is not a PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(password_hash::Error),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, Some(HASH_LEN))
        .map_err(|e| PasswordError::HashError(e.into()))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes `password` under a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError::HashError)
}

/// Checks `password` against a stored hash in constant time
///
/// A wrong password is `Ok(false)`; `Err` is reserved for unusable hashes.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let stored = PasswordHash::new(hash).map_err(PasswordError::InvalidHash)?;
    if stored.salt.is_none() || stored.hash.is_none() {
        return Err(PasswordError::InvalidHash(password_hash::Error::PhcStringField));
    }

    match Argon2::default().verify_password(password.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e)),
    }
}
