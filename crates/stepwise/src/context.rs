//! Ambient values available to steps and injected callbacks.
//!
//! A [`Context`] maps string keys to [`Value`]s in insertion order and keeps a
//! second index from type to entry positions. Keyed lookups go straight to the
//! map; type-directed lookups take the earliest entry of the requested type.
//! Overwriting a key keeps its original position.

use std::any::{Any, TypeId};
use std::collections::BTreeSet;
use std::fmt;

use hashbrown::HashMap;
use indexmap::IndexMap;
use thiserror::Error;

use crate::value::{TypeTag, Value};

/// Failure to resolve a callback parameter from the context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InjectionError {
    /// The key is absent, or its value has a different type.
    #[error("{key}: invalid context injection key")]
    Key {
        /// Requested key.
        key: String,
    },
    /// No entry has the requested type.
    #[error("{ty}: invalid context injection type")]
    Type {
        /// Requested type name.
        ty: &'static str,
    },
}

/// Ordered key/value store with a type index.
///
/// # Examples
///
/// ```
/// use stepwise::Context;
///
/// let mut context = Context::new();
/// context.set("hero", String::from("Batman"));
/// context.set("sidekick", String::from("Robin"));
/// context.set("logins", 2_u8);
///
/// assert_eq!(context.get_as::<u8>("logins"), Some(2));
/// assert_eq!(context.first::<String>().as_deref(), Some("Batman"));
/// assert_eq!(context.keys().collect::<Vec<_>>(), ["hero", "sidekick", "logins"]);
/// ```
#[derive(Clone, Default)]
pub struct Context {
    entries: IndexMap<String, Value>,
    by_type: HashMap<TypeId, BTreeSet<usize>>,
}

impl Context {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` has an entry.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// The value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// The value stored under `key`, cloned out as `T`.
    ///
    /// Returns `None` when the key is absent or holds another type.
    #[must_use]
    pub fn get_as<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.get(key)?.get::<T>()
    }

    /// The earliest entry of type `T`, cloned out.
    #[must_use]
    pub fn first<T: Any + Clone>(&self) -> Option<T> {
        self.first_of(TypeId::of::<T>())?.get::<T>()
    }

    /// Store `value` under `key`, returning the value it replaces.
    pub fn set<T: Any>(&mut self, key: impl Into<String>, value: T) -> Option<Value> {
        self.insert_value(key, Value::new(value))
    }

    /// Store an already erased value under `key`, returning the value it
    /// replaces.
    pub fn insert_value(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let new_type = value.type_id();
        let (index, previous) = self.entries.insert_full(key.into(), value);
        if let Some(old) = &previous {
            if old.type_id() == new_type {
                return previous;
            }
            if let Some(positions) = self.by_type.get_mut(&old.type_id()) {
                positions.remove(&index);
                if positions.is_empty() {
                    self.by_type.remove(&old.type_id());
                }
            }
        }
        self.by_type.entry(new_type).or_default().insert(index);
        previous
    }

    /// Swap in `other` wholesale, returning the previous contents.
    pub fn replace(&mut self, other: Self) -> Self {
        std::mem::replace(self, other)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_type.clear();
    }

    /// Resolve a parameter of type `tag`, by `key` when one is given.
    ///
    /// A non-empty key must name an entry of exactly the requested type. An
    /// absent or empty key selects the earliest entry of that type.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError::Key`] for a keyed lookup that finds no entry
    /// of the right type, and [`InjectionError::Type`] when no entry has the
    /// requested type at all.
    pub fn resolve(&self, tag: &TypeTag, key: Option<&str>) -> Result<Value, InjectionError> {
        let Some(key) = key.filter(|key| !key.is_empty()) else {
            return self
                .first_of(tag.id())
                .cloned()
                .ok_or(InjectionError::Type { ty: tag.name() });
        };
        self.entries
            .get(key)
            .filter(|value| value.tag() == *tag)
            .cloned()
            .ok_or_else(|| InjectionError::Key {
                key: key.to_string(),
            })
    }

    fn first_of(&self, id: TypeId) -> Option<&Value> {
        let index = *self.by_type.get(&id)?.first()?;
        self.entries.get_index(index).map(|(_, value)| value)
    }
}

impl<K: Into<String>> Extend<(K, Value)> for Context {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert_value(key, value);
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut context = Self::new();
        context.extend(iter);
        context
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(key, value)| (key, value.type_name())))
            .finish()
    }
}
