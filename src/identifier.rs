//! Short public identifiers for accounts, categories and orders.
//!
//! An identifier is a fixed namespace prefix followed by a random body drawn
//! from a 32-symbol alphabet without `0`, `1`, `O` or `I`. Identifiers are the
//! only handle exposed outside the persistence layer; internal row ids never
//! leave it.
//!
//! # Uniqueness
//!
//! The allocator asks a caller-supplied existence check whether a candidate is
//! taken and retries on collision. Two concurrent allocations can both see a
//! candidate as free, so the store must also enforce a unique constraint and
//! callers should allocate again when that constraint fires.
//!
//! Codes of deleted records may be handed out again: the existence check only
//! sees live records.

use crate::error::{QrisError, Result};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Symbols an identifier body is drawn from.
pub const ALPHABET: &[u8; 32] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Environment variable overriding [`AllocatorConfig::max_attempts`].
pub const MAX_ATTEMPTS_ENV: &str = "QRIS_ID_MAX_ATTEMPTS";

/// Environment variable overriding [`AllocatorConfig::body_len`].
pub const BODY_LEN_ENV: &str = "QRIS_ID_BODY_LEN";

/// Entity kind an identifier belongs to. Codes are unique per namespace only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Account,
    Category,
    Order,
}

impl Namespace {
    /// Fixed prefix of every identifier in this namespace.
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Account => "A",
            Namespace::Category => "CT",
            Namespace::Order => "OR",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Account => f.write_str("account"),
            Namespace::Category => f.write_str("category"),
            Namespace::Order => f.write_str("order"),
        }
    }
}

impl FromStr for Namespace {
    type Err = QrisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "account" => Ok(Namespace::Account),
            "category" => Ok(Namespace::Category),
            "order" => Ok(Namespace::Order),
            other => Err(QrisError::InvalidConfig(format!(
                "unknown identifier namespace {:?}",
                other
            ))),
        }
    }
}

/// A public identifier such as `OR7KQ2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Validates an externally supplied identifier against its namespace.
    ///
    /// Input is trimmed and uppercased, so `or7kq2` parses as `OR7KQ2`.
    pub fn parse(namespace: Namespace, input: &str) -> Result<Self> {
        let normalized = input.trim().to_ascii_uppercase();
        let body = normalized
            .strip_prefix(namespace.prefix())
            .filter(|body| !body.is_empty() && body.bytes().all(|b| ALPHABET.contains(&b)));

        match body {
            Some(_) => Ok(Identifier(normalized)),
            None => Err(QrisError::InvalidIdentifier {
                namespace,
                value: input.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Allocation policy. Both values must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAllocatorConfig")]
pub struct AllocatorConfig {
    /// Candidates drawn before giving up.
    pub max_attempts: u32,
    /// Random characters after the prefix.
    pub body_len: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        AllocatorConfig {
            max_attempts: 8,
            body_len: 4,
        }
    }
}

/// Unchecked form of [`AllocatorConfig`] as it arrives from a config source.
#[derive(Deserialize)]
#[serde(default)]
struct RawAllocatorConfig {
    max_attempts: u32,
    body_len: usize,
}

impl Default for RawAllocatorConfig {
    fn default() -> Self {
        let defaults = AllocatorConfig::default();
        RawAllocatorConfig {
            max_attempts: defaults.max_attempts,
            body_len: defaults.body_len,
        }
    }
}

impl TryFrom<RawAllocatorConfig> for AllocatorConfig {
    type Error = QrisError;

    fn try_from(raw: RawAllocatorConfig) -> Result<Self> {
        let config = AllocatorConfig {
            max_attempts: raw.max_attempts,
            body_len: raw.body_len,
        };
        config.validate()?;
        Ok(config)
    }
}

impl AllocatorConfig {
    /// Rejects a zero attempt bound or a zero-length body.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(QrisError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.body_len == 0 {
            return Err(QrisError::InvalidConfig(
                "body_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads the defaults, overridden by `QRIS_ID_MAX_ATTEMPTS` and
    /// `QRIS_ID_BODY_LEN` when set.
    pub fn from_env() -> Result<Self> {
        let mut config = AllocatorConfig::default();
        if let Some(attempts) = read_positive(MAX_ATTEMPTS_ENV)? {
            config.max_attempts = attempts;
        }
        if let Some(len) = read_positive::<usize>(BODY_LEN_ENV)? {
            config.body_len = len;
        }
        config.validate()?;
        Ok(config)
    }
}

fn read_positive<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr + PartialEq + Default,
{
    let raw = match env::var(key) {
        Ok(raw) => raw,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(e) => return Err(QrisError::InvalidConfig(format!("{}: {}", key, e))),
    };

    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(Some(value)),
        _ => Err(QrisError::InvalidConfig(format!(
            "{} must be a positive integer, got {:?}",
            key, raw
        ))),
    }
}

/// Mints identifiers that are free according to a caller-supplied check.
///
/// Holds only its configuration, so one allocator can be shared freely
/// between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierAllocator {
    config: AllocatorConfig,
}

impl IdentifierAllocator {
    /// Creates an allocator with the default policy (8 attempts, 4-character body).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator with a custom policy, rejecting zero values.
    pub fn with_config(config: AllocatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(IdentifierAllocator { config })
    }

    /// Allocates an identifier using the thread-local random generator.
    ///
    /// `exists` must return `true` if a live record already holds the candidate.
    pub fn allocate<F>(&self, namespace: Namespace, exists: F) -> Result<Identifier>
    where
        F: FnMut(&str) -> bool,
    {
        self.allocate_with_rng(&mut rand::thread_rng(), namespace, exists)
    }

    /// Allocates an identifier drawing randomness from `rng`.
    pub fn allocate_with_rng<R, F>(
        &self,
        rng: &mut R,
        namespace: Namespace,
        mut exists: F,
    ) -> Result<Identifier>
    where
        R: Rng,
        F: FnMut(&str) -> bool,
    {
        for attempt in 1..=self.config.max_attempts {
            let candidate = self.candidate(rng, namespace);
            if !exists(&candidate) {
                debug!(
                    "Allocated {} identifier {} on attempt {}",
                    namespace, candidate, attempt
                );
                return Ok(Identifier(candidate));
            }
            debug!("Identifier {} already taken", candidate);
        }

        warn!(
            "No free {} identifier after {} attempts; check the existence lookup",
            namespace, self.config.max_attempts
        );
        Err(QrisError::IdentifierSpaceExhausted {
            namespace,
            attempts: self.config.max_attempts,
        })
    }

    fn candidate<R: Rng>(&self, rng: &mut R, namespace: Namespace) -> String {
        let prefix = namespace.prefix();
        let mut code = String::with_capacity(prefix.len() + self.config.body_len);
        code.push_str(prefix);
        for _ in 0..self.config.body_len {
            code.push(char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]));
        }
        code
    }
}
