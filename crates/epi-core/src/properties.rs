//! Open string-keyed categorical property bags.
//!
//! Individuals (and nodes) carry socio-demographic tags like
//! `"Accessibility" → "Easy"` used for property-restricted transmission
//! pools, campaign targeting, and intervention disqualification.  The set of
//! keys is defined by the input data, not the code, so the bag is an open
//! map rather than typed fields.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A categorical key→value attribute map.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyBag {
    values: FxHashMap<String, String>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) one property.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// The value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if every `(key, value)` restriction is satisfied by this bag.
    ///
    /// An empty restriction list matches everything.  A restriction on a key
    /// this bag does not carry fails the match.
    pub fn matches<'a, I>(&self, restrictions: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        restrictions
            .into_iter()
            .all(|(k, v)| self.get(k) == Some(v))
    }

    /// Iterate all `(key, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for PropertyBag {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}
