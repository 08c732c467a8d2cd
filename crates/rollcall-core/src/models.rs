use std::fmt;

use indexmap::IndexSet;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::classifier::{clean, is_plausible_name};

/// A cleaned participant display name.
///
/// Only constructible through [`ParticipantName::new`], which cleans the input
/// and refuses empty strings, letterless strings, interface chrome and
/// meeting codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ParticipantName(String);

impl ParticipantName {
    pub fn new(raw: &str) -> Option<Self> {
        let name = clean(raw);
        is_plausible_name(&name).then_some(Self(name))
    }

    /// Guard a name that has already been through [`clean`].
    pub(crate) fn from_cleaned(name: String) -> Option<Self> {
        is_plausible_name(&name).then_some(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ParticipantName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Names seen during one extraction pass, deduplicated by exact string
/// equality and kept in first-seen order.
///
/// Case and punctuation variants ("Ann O'Neil" vs "Ann O\u{2019}Neil") are
/// distinct entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantSet {
    names: IndexSet<ParticipantName>,
}

impl ParticipantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name. Returns true if it was not already present.
    pub fn insert(&mut self, name: ParticipantName) -> bool {
        self.names.insert(name)
    }

    /// Clean, guard and add raw text. Returns true if a new name was added.
    pub fn insert_raw(&mut self, raw: &str) -> bool {
        ParticipantName::new(raw).is_some_and(|name| self.insert(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.names.into_iter().map(ParticipantName::into_string).collect()
    }
}

/// Compute a SHA-256 hash of a string, returned as 64-char hex.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
