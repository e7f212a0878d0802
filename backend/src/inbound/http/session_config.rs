//! Session cookie settings read from the environment.
//!
//! Debug builds fall back to safe defaults with a warning. Release builds
//! refuse to start on any missing or malformed toggle.
//!
//! | Variable                  | Values                     | Debug default |
//! |---------------------------|----------------------------|---------------|
//! | `SESSION_KEY_FILE`        | path                       | generated key |
//! | `SESSION_COOKIE_SECURE`   | `1 0 true false yes no y n`| `true`        |
//! | `SESSION_SAMESITE`        | `Strict Lax None`          | `Lax`         |
//! | `SESSION_ALLOW_EPHEMERAL` | boolean, must be off in release | `false`  |

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroizing;

pub const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
pub const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
pub const SAMESITE_ENV: &str = "SESSION_SAMESITE";
pub const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";

const DEFAULT_KEY_PATH: &str = "/var/run/secrets/session_key";
/// Minimum key material accepted in release builds.
pub const MIN_KEY_LEN: usize = 64;
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// How strictly toggles are validated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// Mode of the running binary.
    ///
    /// ```rust
    /// use homeservices::inbound::http::session_config::BuildMode;
    ///
    /// let expected = if cfg!(debug_assertions) { BuildMode::Debug } else { BuildMode::Release };
    /// assert_eq!(BuildMode::from_debug_assertions(), expected);
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Validated cookie settings.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Read and validate every session toggle.
///
/// ```rust
/// use homeservices::inbound::http::session_config::{BuildMode, session_settings_from_env};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|_| None);
/// let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
/// assert!(settings.cookie_secure);
/// ```
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let reader = ToggleReader { env, mode };
    let cookie_secure = reader.toggle(COOKIE_SECURE_ENV, BOOL_EXPECTED, parse_bool, true)?;
    let same_site = reader.toggle(SAMESITE_ENV, SAMESITE_EXPECTED, parse_same_site, SameSite::Lax)?;
    if same_site == SameSite::None && !cookie_secure {
        match mode {
            BuildMode::Release => return Err(SessionConfigError::InsecureSameSiteNone),
            BuildMode::Debug => {
                warn!("SESSION_SAMESITE=None without a secure cookie; browsers may drop it");
            }
        }
    }
    let allow_ephemeral = reader.toggle(ALLOW_EPHEMERAL_ENV, BOOL_EXPECTED, parse_bool, false)?;
    if allow_ephemeral && mode == BuildMode::Release {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let key = reader.key(allow_ephemeral)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

struct ToggleReader<'a, E> {
    env: &'a E,
    mode: BuildMode,
}

impl<E: Env> ToggleReader<'_, E> {
    /// Parse `name`, substituting `fallback` in debug builds only.
    fn toggle<T: Copy>(
        &self,
        name: &'static str,
        expected: &'static str,
        parse: fn(&str) -> Option<T>,
        fallback: T,
    ) -> Result<T, SessionConfigError> {
        let Some(value) = self.env.string(name) else {
            return match self.mode {
                BuildMode::Debug => {
                    warn!(variable = name, "session toggle not set; using default");
                    Ok(fallback)
                }
                BuildMode::Release => Err(SessionConfigError::MissingEnv { name }),
            };
        };
        match (parse(&value), self.mode) {
            (Some(parsed), _) => Ok(parsed),
            (None, BuildMode::Debug) => {
                warn!(variable = name, value = %value, "invalid session toggle; using default");
                Ok(fallback)
            }
            (None, BuildMode::Release) => Err(SessionConfigError::InvalidEnv {
                name,
                value,
                expected,
            }),
        }
    }

    fn key(&self, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
        let path = PathBuf::from(
            self.env
                .string(KEY_FILE_ENV)
                .unwrap_or_else(|| DEFAULT_KEY_PATH.to_owned()),
        );
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(source) if self.mode == BuildMode::Debug || allow_ephemeral => {
                warn!(path = %path.display(), error = %source, "using a temporary session key");
                return Ok(Key::generate());
            }
            Err(source) => return Err(SessionConfigError::KeyRead { path, source }),
        };
        if self.mode == BuildMode::Release && bytes.len() < MIN_KEY_LEN {
            return Err(SessionConfigError::KeyTooShort {
                path,
                length: bytes.len(),
                min_len: MIN_KEY_LEN,
            });
        }
        Ok(Key::derive_from(&bytes))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_same_site(value: &str) -> Option<SameSite> {
    match value.to_ascii_lowercase().as_str() {
        "lax" => Some(SameSite::Lax),
        "strict" => Some(SameSite::Strict),
        "none" => Some(SameSite::None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use mockable::MockEnv;
    use rstest::rstest;
    use tempfile::NamedTempFile;

    use super::*;

    fn env_with(vars: &[(&'static str, String)]) -> MockEnv {
        let vars: HashMap<&'static str, String> = vars.iter().cloned().collect();
        let mut env = MockEnv::new();
        env.expect_string()
            .returning(move |name| vars.get(name).cloned());
        env
    }

    fn key_file(len: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp key file");
        file.write_all(&vec![b'k'; len]).expect("write key");
        file
    }

    fn release_vars(file: &NamedTempFile) -> Vec<(&'static str, String)> {
        vec![
            (KEY_FILE_ENV, file.path().display().to_string()),
            (COOKIE_SECURE_ENV, "1".to_owned()),
            (SAMESITE_ENV, "Strict".to_owned()),
            (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
        ]
    }

    #[rstest]
    #[case("yes", Some(true))]
    #[case("N", Some(false))]
    #[case("maybe", None)]
    fn booleans_accept_common_spellings(#[case] raw: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_bool(raw), expected);
    }

    #[test]
    fn debug_defaults_when_unset() {
        let env = env_with(&[(KEY_FILE_ENV, "/nonexistent/session_key".to_owned())]);
        let settings = session_settings_from_env(&env, BuildMode::Debug).expect("defaults");
        assert!(settings.cookie_secure);
        assert_eq!(settings.same_site, SameSite::Lax);
    }

    #[test]
    fn release_accepts_complete_configuration() {
        let file = key_file(MIN_KEY_LEN);
        let env = env_with(&release_vars(&file));
        let settings = session_settings_from_env(&env, BuildMode::Release).expect("valid");
        assert!(settings.cookie_secure);
        assert_eq!(settings.same_site, SameSite::Strict);
    }

    #[rstest]
    #[case(COOKIE_SECURE_ENV)]
    #[case(SAMESITE_ENV)]
    #[case(ALLOW_EPHEMERAL_ENV)]
    fn release_requires_every_toggle(#[case] missing: &'static str) {
        let file = key_file(MIN_KEY_LEN);
        let vars: Vec<_> = release_vars(&file)
            .into_iter()
            .filter(|(name, _)| *name != missing)
            .collect();
        let err = session_settings_from_env(&env_with(&vars), BuildMode::Release)
            .err()
            .expect("missing toggle");
        assert!(matches!(err, SessionConfigError::MissingEnv { name } if name == missing));
    }

    #[test]
    fn release_rejects_short_key() {
        let file = key_file(16);
        let err = session_settings_from_env(&env_with(&release_vars(&file)), BuildMode::Release)
            .err()
            .expect("short key");
        assert!(matches!(err, SessionConfigError::KeyTooShort { length: 16, .. }));
    }

    #[test]
    fn release_rejects_insecure_same_site_none() {
        let file = key_file(MIN_KEY_LEN);
        let mut vars = release_vars(&file);
        vars.retain(|(name, _)| *name != COOKIE_SECURE_ENV && *name != SAMESITE_ENV);
        vars.push((COOKIE_SECURE_ENV, "0".to_owned()));
        vars.push((SAMESITE_ENV, "None".to_owned()));
        let err = session_settings_from_env(&env_with(&vars), BuildMode::Release)
            .err()
            .expect("insecure");
        assert!(matches!(err, SessionConfigError::InsecureSameSiteNone));
    }

    #[test]
    fn release_rejects_ephemeral_keys() {
        let file = key_file(MIN_KEY_LEN);
        let mut vars = release_vars(&file);
        vars.retain(|(name, _)| *name != ALLOW_EPHEMERAL_ENV);
        vars.push((ALLOW_EPHEMERAL_ENV, "1".to_owned()));
        let err = session_settings_from_env(&env_with(&vars), BuildMode::Release)
            .err()
            .expect("ephemeral");
        assert!(matches!(err, SessionConfigError::EphemeralNotAllowed));
    }

    #[test]
    fn release_reports_invalid_values() {
        let file = key_file(MIN_KEY_LEN);
        let mut vars = release_vars(&file);
        vars.retain(|(name, _)| *name != SAMESITE_ENV);
        vars.push((SAMESITE_ENV, "sometimes".to_owned()));
        let err = session_settings_from_env(&env_with(&vars), BuildMode::Release)
            .err()
            .expect("invalid");
        assert!(matches!(
            err,
            SessionConfigError::InvalidEnv { name: SAMESITE_ENV, .. }
        ));
    }

    #[test]
    fn release_requires_readable_key() {
        let file = key_file(MIN_KEY_LEN);
        let mut vars = release_vars(&file);
        vars.retain(|(name, _)| *name != KEY_FILE_ENV);
        vars.push((KEY_FILE_ENV, "/nonexistent/session_key".to_owned()));
        let err = session_settings_from_env(&env_with(&vars), BuildMode::Release)
            .err()
            .expect("unreadable");
        assert!(matches!(err, SessionConfigError::KeyRead { .. }));
    }
}
