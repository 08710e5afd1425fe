//! Thread id validation.
//!
//! Valid thread ids:
//! - Must be non-empty
//! - Must not contain whitespace, control characters, `~`, `^`, `:`, `?`,
//!   `*`, `[`, `\`
//! - Must not contain `..` or `//`
//! - Must not start or end with `.` or `/`
//!
//! Slashes group related threads (`draft/form-1`), much like git branches.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Characters that are forbidden anywhere in a thread id.
const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

/// Validate a thread id, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use refcache_store::names::validate_thread_id;
///
/// assert!(validate_thread_id("main").is_ok());
/// assert!(validate_thread_id("draft/form-1").is_ok());
/// assert!(validate_thread_id("").is_err());
/// assert!(validate_thread_id("a..b").is_err());
/// ```
pub fn validate_thread_id(id: &str) -> StoreResult<()> {
    let reject = |reason: String| StoreError::InvalidThreadId {
        id: id.to_string(),
        reason,
    };

    if id.is_empty() {
        return Err(reject("thread id must not be empty".into()));
    }
    if let Some(ch) = id.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(reject(format!("contains whitespace or control character: {ch:?}")));
    }
    if let Some(ch) = FORBIDDEN_CHARS.iter().find(|c| id.contains(**c)) {
        return Err(reject(format!("contains forbidden character: {ch:?}")));
    }
    if id.contains("..") {
        return Err(reject("must not contain '..'".into()));
    }
    if id.contains("//") {
        return Err(reject("must not contain consecutive slashes '//'".into()));
    }
    if id.starts_with('.') || id.ends_with('.') {
        return Err(reject("must not start or end with '.'".into()));
    }
    if id.starts_with('/') || id.ends_with('/') {
        return Err(reject("must not start or end with '/'".into()));
    }
    Ok(())
}

/// The name of a history thread.
///
/// Always holds a valid id; construct it with [`ThreadId::new`] or
/// [`str::parse`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadId(String);

impl ThreadId {
    /// The id of the thread every cache starts with.
    pub const MAIN: &'static str = "main";

    /// Validate and wrap `id`.
    pub fn new(id: impl Into<String>) -> StoreResult<Self> {
        let id = id.into();
        validate_thread_id(&id)?;
        Ok(Self(id))
    }

    /// The `main` thread.
    pub fn main() -> Self {
        Self(Self::MAIN.to_string())
    }

    /// Whether this is the `main` thread.
    pub fn is_main(&self) -> bool {
        self.0 == Self::MAIN
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::main()
    }
}

impl fmt::Debug for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ThreadId({})", self.0)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ThreadId {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ThreadId {
    type Error = StoreError;

    fn try_from(s: String) -> StoreResult<Self> {
        Self::new(s)
    }
}

impl From<ThreadId> for String {
    fn from(id: ThreadId) -> Self {
        id.0
    }
}
