//! The symbol cache: fragments indexed by the value they evaluate to.


use std::collections::BTreeMap;
use std::fmt;

use crate::diagnostic::Violation;
use crate::eval::{number_to_string, Evaluator, TypeTag, Value};
use crate::fragment::Fragment;
use crate::optimize::best_of;

/// Canonical cache key: a value's type tag plus, for primitives, its
/// literal content. Objects are keyed by their text form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolKey {
    pub tag: TypeTag,
    pub content: String,
}

impl SymbolKey {
    pub fn of(value: &Value) -> Self {
        let content = match value {
            Value::String(s) => format!("'{}'", s),
            Value::Number(n) => number_to_string(*n),
            other => other.to_js_string(),
        };
        SymbolKey {
            tag: value.type_tag(),
            content,
        }
    }

    /// The literal text of a `String` key.
    pub fn text(&self) -> Option<&str> {
        if self.tag != TypeTag::String {
            return None;
        }
        self.content
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
    }
}

impl From<&Value> for SymbolKey {
    fn from(value: &Value) -> Self {
        SymbolKey::of(value)
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}/{}>", self.tag, self.content)
    }
}

/// Every registered fragment, grouped by key in registration order.
///
/// Grows only through [`SymbolTable::register`]; nothing is ever evicted.
#[derive(Default)]
pub struct SymbolTable {
    entries: BTreeMap<SymbolKey, Vec<Fragment>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `fragment` and file it under the resulting key.
    ///
    /// Registering a node that is already filed under its key is a no-op.
    pub fn register(
        &mut self,
        fragment: Fragment,
        evaluator: &dyn Evaluator,
    ) -> Result<SymbolKey, Violation> {
        let value = fragment.evaluate(evaluator)?;
        let key = SymbolKey::of(&value);
        let bucket = self.entries.entry(key.clone()).or_default();
        if bucket.iter().any(|f| f.ptr_eq(&fragment)) {
            return Ok(key);
        }
        let len = fragment.len();
        bucket.push(fragment);
        tracing::debug!(%key, len, candidates = bucket.len(), "registered symbol");
        Ok(key)
    }

    /// Shortest registered fragment for `value`.
    pub fn lookup(&self, value: &Value) -> Result<Fragment, Violation> {
        self.lookup_key(&SymbolKey::of(value))
    }

    pub fn lookup_key(&self, key: &SymbolKey) -> Result<Fragment, Violation> {
        match self.entries.get(key) {
            Some(bucket) => best_of(bucket.iter().cloned()),
            None => Err(Violation::cache_miss(key)),
        }
    }

    /// All fragments registered under `key`, oldest first.
    pub fn candidates(&self, key: &SymbolKey) -> &[Fragment] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.entries.contains_key(&SymbolKey::of(value))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SymbolKey, &[Fragment])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.len())),
            )
            .finish()
    }
}
