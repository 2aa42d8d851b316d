//! Verb x cardinality handler keys.
//!
//! A handler set is keyed by the operation verb and by whether the request
//! addresses a whole collection or one member of it. The string forms
//! (`get`, `getOne`, `put`, `putOne`, ...) are kept for logging and for the
//! wire, but dispatch never concatenates strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operation verb, one per HTTP-style method the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

impl Verb {
    /// All verbs in declaration order.
    pub const ALL: [Verb; 5] = [Verb::Get, Verb::Put, Verb::Post, Verb::Patch, Verb::Delete];

    /// Lowercase method token, as used in handler keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Put => "put",
            Verb::Post => "post",
            Verb::Patch => "patch",
            Verb::Delete => "delete",
        }
    }

    /// Parses an HTTP method name, ignoring case. Methods outside the five
    /// supported verbs (HEAD, OPTIONS, ...) yield `None`.
    #[must_use]
    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(method))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a request addresses a collection or a single member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// No trailing id: the whole collection.
    Collection,
    /// Trailing id bound: one member.
    Member,
}

impl Cardinality {
    #[must_use]
    pub fn is_collection(self) -> bool {
        self == Cardinality::Collection
    }
}

/// Key into a handler set: verb plus cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerKey {
    pub verb: Verb,
    pub cardinality: Cardinality,
}

impl HandlerKey {
    #[must_use]
    pub const fn new(verb: Verb, cardinality: Cardinality) -> Self {
        Self { verb, cardinality }
    }

    #[must_use]
    pub const fn collection(verb: Verb) -> Self {
        Self::new(verb, Cardinality::Collection)
    }

    #[must_use]
    pub const fn member(verb: Verb) -> Self {
        Self::new(verb, Cardinality::Member)
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cardinality {
            Cardinality::Collection => write!(f, "{}", self.verb),
            Cardinality::Member => write!(f, "{}One", self.verb),
        }
    }
}

/// Error returned when a string is not a known handler key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown handler key: {0}")]
pub struct ParseHandlerKeyError(pub String);

impl FromStr for HandlerKey {
    type Err = ParseHandlerKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (method, cardinality) = match s.strip_suffix("One") {
            Some(method) => (method, Cardinality::Member),
            None => (s, Cardinality::Collection),
        };

        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str() == method)
            .map(|verb| HandlerKey::new(verb, cardinality))
            .ok_or_else(|| ParseHandlerKeyError(s.to_string()))
    }
}
