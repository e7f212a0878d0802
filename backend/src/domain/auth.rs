//! Login credentials and password hashing.
//!
//! Handlers build credentials before talking to the login port so blank
//! input is rejected without touching storage. Stored passwords are Argon2id
//! PHC strings produced by [`CredentialHasher`].

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::Error;

/// Raised when login payload values are unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated email/password pair.
///
/// The email is trimmed and lower-cased; the password is kept verbatim and
/// zeroed on drop.
///
/// # Examples
/// ```
/// use homeservices::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Asha@Example.com ", "pw").expect("valid");
/// assert_eq!(creds.email(), "asha@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email: email.to_lowercase(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Hashes and checks account passwords with Argon2id.
///
/// Verification reads the cost parameters from the stored hash, so hashes
/// written under different settings keep working.
#[derive(Debug, Clone, Default)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    /// Minimum Argon2 costs. Only suitable for seeded demo accounts and tests.
    pub fn low_cost() -> Self {
        let params = Params::new(
            Params::MIN_M_COST,
            Params::MIN_T_COST,
            Params::MIN_P_COST,
            None,
        )
        .unwrap_or_default();
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `password` under a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, Error> {
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
            .map_err(|err| Error::internal(format!("password salt: {err}")))?;
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| Error::internal(format!("password hashing failed: {err}")))
    }

    /// `false` for a wrong password and for an unparseable hash.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        PasswordHash::new(stored).is_ok_and(|parsed| {
            self.argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }
}
