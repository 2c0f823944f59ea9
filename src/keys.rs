//! # Candidate Keys
//!
//! A candidate-key set is a set of attribute-name sets. Keys are held in
//! canonical form: attributes sorted alphabetically within each key, keys
//! sorted by cardinality then lexicographically, duplicates removed. Two
//! relations are key-equivalent exactly when their canonical key sets are
//! equal, so `PartialEq` on [`CandidateKeys`] is key-equivalence.
//!
//! A relation with no user-supplied keys gets a single default key equal
//! to its full heading. The nullary relations *dee* and *dum* carry an
//! empty key set.

use crate::error::{RelError, RelResult};
use crate::heading::Heading;
use std::fmt;

/// Canonicalized set of candidate keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateKeys {
    // Invariant: each inner Vec sorted + deduped, outer Vec sorted by
    // (len, lex) + deduped.
    keys: Vec<Vec<String>>,
}

impl CandidateKeys {
    /// Build a canonicalized key set from attribute-name groups.
    pub fn new<K, A>(keys: K) -> CandidateKeys
    where
        K: IntoIterator<Item = A>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let mut keys: Vec<Vec<String>> = keys
            .into_iter()
            .map(|key| {
                let mut attrs: Vec<String> = key.into_iter().map(Into::into).collect();
                attrs.sort();
                attrs.dedup();
                attrs
            })
            .collect();
        keys.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        keys.dedup();
        CandidateKeys { keys }
    }

    /// The empty key set (*dee*/*dum*, or an unkeyed intersection).
    pub fn none() -> CandidateKeys {
        CandidateKeys { keys: Vec::new() }
    }

    /// The default key set for a heading: the full heading as a single
    /// key, or no keys at all for a nullary heading.
    pub fn default_for(heading: &Heading) -> CandidateKeys {
        if heading.is_empty() {
            CandidateKeys::none()
        } else {
            CandidateKeys::new([heading.names()])
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Keys in canonical order, each a sorted slice of attribute names
    pub fn iter(&self) -> impl Iterator<Item = &[String]> {
        self.keys.iter().map(Vec::as_slice)
    }

    /// Check every key against a heading.
    ///
    /// A key with no attributes is only legal on a nullary heading; every
    /// key attribute must name an attribute of the heading.
    pub fn validate(&self, heading: &Heading) -> RelResult<()> {
        for key in &self.keys {
            if key.is_empty() && !heading.is_empty() {
                return Err(RelError::EmptyCandidateKey);
            }
            for attr in key {
                if heading.index_of(attr).is_none() {
                    return Err(RelError::UnknownKeyAttribute {
                        attribute: attr.clone(),
                        heading: heading.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// The keys that survive restriction of the heading to `target`:
    /// exactly those whose attributes all remain.
    pub fn survivors(&self, target: &Heading) -> CandidateKeys {
        CandidateKeys {
            keys: self
                .keys
                .iter()
                .filter(|key| key.iter().all(|a| target.index_of(a).is_some()))
                .cloned()
                .collect(),
        }
    }

    /// Whether any key is a subset of the attribute names of `target`.
    pub fn any_within(&self, target: &Heading) -> bool {
        !self.survivors(target).is_empty()
    }

    /// Rewrite key attribute names through a positional rename
    /// `from` -> `to` (same degree, same types at each position).
    pub fn renamed(&self, from: &Heading, to: &Heading) -> CandidateKeys {
        let rename_one = |name: &String| -> String {
            match from.index_of(name) {
                Some(pos) => to.attributes()[pos].name.clone(),
                None => name.clone(),
            }
        };
        CandidateKeys::new(
            self.keys
                .iter()
                .map(|key| key.iter().map(rename_one).collect::<Vec<_>>()),
        )
    }

    /// Keys present in both sets (canonical identity). Union's key rule.
    pub fn intersection(&self, other: &CandidateKeys) -> CandidateKeys {
        CandidateKeys {
            keys: self
                .keys
                .iter()
                .filter(|key| other.keys.contains(key))
                .cloned()
                .collect(),
        }
    }

    /// The union of two key sets, re-canonicalized.
    pub fn merged(&self, other: &CandidateKeys) -> CandidateKeys {
        CandidateKeys::new(self.keys.iter().chain(other.keys.iter()).cloned())
    }

    /// Pairwise key unions: one key K₁ ∪ K₂ for every K₁ here and K₂
    /// there. Join's key rule: a pair of joined rows is fixed by fixing
    /// a key on each side, so every pairwise union is injective on the
    /// result even when neither side's key alone is. Falls back to the
    /// populated side when one side is nullary.
    pub fn cross_union(&self, other: &CandidateKeys) -> CandidateKeys {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        CandidateKeys::new(self.keys.iter().flat_map(|k1| {
            other
                .keys
                .iter()
                .map(move |k2| k1.iter().chain(k2.iter()).cloned().collect::<Vec<_>>())
        }))
    }
}

impl fmt::Display for CandidateKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{{{}}}", key.join(", "))?;
        }
        write!(f, "]")
    }
}
