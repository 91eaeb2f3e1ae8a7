#![warn(missing_docs)]
//! `buffer-core-lang` - data-driven language configuration helpers for `buffer-core`.
//!
//! This crate intentionally stays lightweight and does **not** depend on any
//! parsing/highlighting systems. It provides small structs that hosts can use to configure
//! the buffer kernel's structural queries in a language-aware way.

use std::collections::HashMap;

/// A configured two-token delimiter set (e.g. `{` and `}`).
///
/// Most pairs are single characters, but multi-character tokens (e.g. `begin`/`end`) are
/// allowed; the scanner treats tokens as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketPair {
    /// Opening token (e.g. `{`).
    pub open: String,
    /// Closing token (e.g. `}`).
    pub close: String,
}

impl BracketPair {
    /// Create a bracket pair from its opening and closing tokens.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// An ordered set of bracket pairs for one language.
///
/// The set is configuration: the buffer kernel never hard-codes which tokens count as
/// brackets. Duplicate tokens are rejected at construction so a character always maps to
/// exactly one pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BracketPairs {
    pairs: Vec<BracketPair>,
}

impl BracketPairs {
    /// Create an empty pair set (no token is a bracket).
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Create a pair set from a list, skipping pairs whose tokens are already taken.
    pub fn from_pairs(pairs: impl IntoIterator<Item = BracketPair>) -> Self {
        let mut set = Self::new();
        for pair in pairs {
            set.add(pair);
        }
        set
    }

    /// The common `{}`, `[]`, `()` set used by most curly-brace languages.
    pub fn curly_family() -> Self {
        Self::from_pairs([
            BracketPair::new("{", "}"),
            BracketPair::new("[", "]"),
            BracketPair::new("(", ")"),
        ])
    }

    /// Add a pair. Returns `false` (and leaves the set unchanged) if either token is
    /// empty or already present as an open or close token.
    pub fn add(&mut self, pair: BracketPair) -> bool {
        if pair.open.is_empty() || pair.close.is_empty() || pair.open == pair.close {
            return false;
        }
        let taken = self
            .pairs
            .iter()
            .any(|p| [&p.open, &p.close].into_iter().any(|t| *t == pair.open || *t == pair.close));
        if taken {
            return false;
        }
        self.pairs.push(pair);
        true
    }

    /// All configured pairs, in insertion order.
    pub fn pairs(&self) -> &[BracketPair] {
        &self.pairs
    }

    /// All configured tokens (opens and closes), in insertion order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.pairs
            .iter()
            .flat_map(|p| [p.open.as_str(), p.close.as_str()])
    }

    /// Returns `true` if `token` is a configured opening token.
    pub fn is_open(&self, token: &str) -> bool {
        self.pairs.iter().any(|p| p.open == token)
    }

    /// Returns `true` if `token` is a configured closing token.
    pub fn is_close(&self, token: &str) -> bool {
        self.pairs.iter().any(|p| p.close == token)
    }

    /// The matching counterpart of `token`, if it is a configured bracket token.
    pub fn matching(&self, token: &str) -> Option<&str> {
        self.pairs.iter().find_map(|p| {
            if p.open == token {
                Some(p.close.as_str())
            } else if p.close == token {
                Some(p.open.as_str())
            } else {
                None
            }
        })
    }

    /// Returns `true` if no pairs are configured.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Per-language configuration consumed by the buffer kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfiguration {
    /// Language identifier (e.g. `"rust"`, `"json"`).
    pub id: String,
    /// Bracket pairs for structural matching.
    pub brackets: BracketPairs,
}

impl LanguageConfiguration {
    /// Create a configuration for a language id.
    pub fn new(id: impl Into<String>, brackets: BracketPairs) -> Self {
        Self {
            id: id.into(),
            brackets,
        }
    }
}

/// An explicit registry of language configurations.
///
/// Passed by reference to consumers; lifetime is managed by the host (create at startup,
/// drop at teardown). There is deliberately no process-wide static instance.
#[derive(Debug, Default)]
pub struct LanguageRegistry {
    languages: HashMap<String, LanguageConfiguration>,
}

impl LanguageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a language configuration. Returns the previous entry, if any.
    pub fn register(&mut self, config: LanguageConfiguration) -> Option<LanguageConfiguration> {
        self.languages.insert(config.id.clone(), config)
    }

    /// Look up a language configuration by id.
    pub fn get(&self, id: &str) -> Option<&LanguageConfiguration> {
        self.languages.get(id)
    }

    /// Remove a language configuration by id.
    pub fn remove(&mut self, id: &str) -> Option<LanguageConfiguration> {
        self.languages.remove(id)
    }

    /// Number of registered languages.
    pub fn len(&self) -> usize {
        self.languages.len()
    }

    /// Returns `true` if no languages are registered.
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}
