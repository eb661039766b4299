//! Keyword registry for intent lookup.
//!
//! Front ends push `(name, key)` pairs at runtime; an utterance that contains
//! a registered name (case-insensitive) resolves to that entry's key. Each
//! entry states whether its key needs temporal parsing.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::intent::{IntentClassifier, IntentSpec, Prediction};

/// Label reported when no registered name occurs in the text.
pub const NOT_FOUND_LABEL: &str = "NOT_FOUND";
/// Confidence reported for a registry hit.
pub const MATCH_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    /// Phrase looked for in the utterance.
    pub name: String,
    /// Intent label returned on a match.
    pub key: String,
    #[serde(default)]
    pub needs_temporal_parsing: bool,
}

/// Shared, insertion-ordered list of [`KeyEntry`] values.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    entries: Arc<RwLock<Vec<KeyEntry>>>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry whose key does not need temporal parsing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingField`] if `name` or `key` is blank.
    pub fn push(&self, name: &str, key: &str) -> Result<(), EngineError> {
        self.insert(name, key, false)
    }

    /// Append an entry whose key is resolved together with a time expression.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingField`] if `name` or `key` is blank.
    pub fn push_temporal(&self, name: &str, key: &str) -> Result<(), EngineError> {
        self.insert(name, key, true)
    }

    fn insert(&self, name: &str, key: &str, needs_temporal_parsing: bool) -> Result<(), EngineError> {
        let name = name.trim();
        let key = key.trim();
        if name.is_empty() {
            return Err(EngineError::MissingField("name".to_string()));
        }
        if key.is_empty() {
            return Err(EngineError::MissingField("key".to_string()));
        }
        self.entries.write().push(KeyEntry {
            name: name.to_string(),
            key: key.to_string(),
            needs_temporal_parsing,
        });
        Ok(())
    }

    pub fn entries(&self) -> Vec<KeyEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// First entry, in insertion order, whose name occurs in `text`.
    pub fn lookup(&self, text: &str) -> Option<KeyEntry> {
        let text = text.to_lowercase();
        self.entries
            .read()
            .iter()
            .find(|e| text.contains(&e.name.to_lowercase()))
            .cloned()
    }

    /// Declared behaviour of `key`, from the first entry that maps to it.
    pub fn spec_for(&self, key: &str) -> Option<IntentSpec> {
        self.entries
            .read()
            .iter()
            .find(|e| e.key == key)
            .map(|e| IntentSpec {
                label: e.key.clone(),
                needs_temporal_parsing: e.needs_temporal_parsing,
                bypass_confidence_gate: false,
            })
    }
}

/// [`IntentClassifier`] backed by a [`KeyRegistry`].
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    registry: KeyRegistry,
}

impl KeywordClassifier {
    pub fn new(registry: KeyRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }
}

impl IntentClassifier for KeywordClassifier {
    fn predict(&self, text: &str) -> Prediction {
        match self.registry.lookup(text) {
            Some(entry) => Prediction::new(entry.key, MATCH_CONFIDENCE),
            None => Prediction::new(NOT_FOUND_LABEL, 0.0),
        }
    }

    fn declared_spec(&self, label: &str) -> Option<IntentSpec> {
        self.registry.spec_for(label)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
