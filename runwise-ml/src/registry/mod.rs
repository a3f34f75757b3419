//! Ordered, uniquely-keyed registries of named items.
//!
//! A [`Registry`] is what the rest of the crate consumes: metric sets, status
//! maps and terminal output all iterate it in insertion order. Registries are
//! produced from a user-facing [`RegistrySpec`] by [`normalize`], which derives
//! keys and resolves name collisions deterministically.

mod normalizer;

pub use normalizer::{FnNaming, GenericNaming, NamingPolicy, normalize, normalize_with, to_dict};

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Index;

/// An ordered mapping from unique string keys to items.
///
/// The key set is fixed once the registry has been built. Values can still be
/// updated in place, which is how metrics accumulate between evaluations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Registry<T> {
    entries: IndexMap<String, T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub(crate) fn from_entries(entries: IndexMap<String, T>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    /// Entry at a position in insertion order.
    pub fn get_index(&self, index: usize) -> Option<(&str, &T)> {
        self.entries.get_index(index).map(|(k, v)| (k.as_str(), v))
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.get_index_of(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.values_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a registry with the same keys and transformed values.
    pub fn map_values<U>(&self, mut f: impl FnMut(&str, &T) -> U) -> Registry<U> {
        Registry {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), f(k, v)))
                .collect(),
        }
    }

    pub fn into_inner(self) -> IndexMap<String, T> {
        self.entries
    }
}

impl<T> Index<&str> for Registry<T> {
    type Output = T;

    fn index(&self, key: &str) -> &T {
        &self.entries[key]
    }
}

impl<T> IntoIterator for Registry<T> {
    type Item = (String, T);
    type IntoIter = indexmap::map::IntoIter<String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Registry<T> {
    type Item = (&'a String, &'a T);
    type IntoIter = indexmap::map::Iter<'a, String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// An input item, optionally carrying an explicit name.
#[derive(Debug, Clone, PartialEq)]
pub struct Named<T> {
    pub name: Option<String>,
    pub value: T,
}

impl<T> Named<T> {
    /// An item whose key will come from the naming policy.
    pub fn new(value: T) -> Self {
        Self { name: None, value }
    }

    pub fn with_name(name: impl Into<String>, value: T) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

impl<T> From<(String, T)> for Named<T> {
    fn from((name, value): (String, T)) -> Self {
        Self::with_name(name, value)
    }
}

impl<T> From<(&str, T)> for Named<T> {
    fn from((name, value): (&str, T)) -> Self {
        Self::with_name(name, value)
    }
}

/// User-facing description of a registry before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrySpec<T> {
    /// Nothing configured; normalizes to an empty registry.
    Empty,
    /// A single item, treated as a one-element sequence.
    Single(Named<T>),
    /// Items in order, each optionally named.
    Sequence(Vec<Named<T>>),
    /// An already-keyed, order-preserving mapping. Passed through unchanged.
    Ordered(IndexMap<String, T>),
    /// An already-keyed mapping without a defined iteration order.
    Unordered(HashMap<String, T>),
}

impl<T> Default for RegistrySpec<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T> RegistrySpec<T> {
    pub fn single(value: T) -> Self {
        Self::Single(Named::new(value))
    }

    /// Unnamed items in order.
    pub fn items(values: impl IntoIterator<Item = T>) -> Self {
        Self::Sequence(values.into_iter().map(Named::new).collect())
    }

    /// Explicitly named items in order.
    pub fn pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, T)>) -> Self {
        Self::Sequence(
            pairs
                .into_iter()
                .map(|(name, value)| Named::with_name(name, value))
                .collect(),
        )
    }

    /// Number of items the spec describes.
    pub fn item_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Sequence(items) => items.len(),
            Self::Ordered(map) => map.len(),
            Self::Unordered(map) => map.len(),
        }
    }

    /// Transform every value, keeping names and shape. Stops at the first error.
    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<RegistrySpec<U>, E> {
        let mut named = |item: Named<T>| -> Result<Named<U>, E> {
            Ok(Named {
                name: item.name,
                value: f(item.value)?,
            })
        };
        Ok(match self {
            Self::Empty => RegistrySpec::Empty,
            Self::Single(item) => RegistrySpec::Single(named(item)?),
            Self::Sequence(items) => {
                RegistrySpec::Sequence(items.into_iter().map(named).collect::<Result<_, _>>()?)
            }
            Self::Ordered(map) => RegistrySpec::Ordered(
                map.into_iter()
                    .map(|(k, v)| f(v).map(|v| (k, v)))
                    .collect::<Result<_, E>>()?,
            ),
            Self::Unordered(map) => RegistrySpec::Unordered(
                map.into_iter()
                    .map(|(k, v)| f(v).map(|v| (k, v)))
                    .collect::<Result<_, E>>()?,
            ),
        })
    }
}

impl<T> From<Vec<Named<T>>> for RegistrySpec<T> {
    fn from(items: Vec<Named<T>>) -> Self {
        Self::Sequence(items)
    }
}

impl<T> From<IndexMap<String, T>> for RegistrySpec<T> {
    fn from(map: IndexMap<String, T>) -> Self {
        Self::Ordered(map)
    }
}

impl<T> From<HashMap<String, T>> for RegistrySpec<T> {
    fn from(map: HashMap<String, T>) -> Self {
        Self::Unordered(map)
    }
}

/// Either one item or a list of them.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// Flatten an optional item-or-list into a list.
pub fn to_list<T>(xs: Option<OneOrMany<T>>) -> Vec<T> {
    match xs {
        None => Vec::new(),
        Some(OneOrMany::One(x)) => vec![x],
        Some(OneOrMany::Many(xs)) => xs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_list() {
        assert_eq!(to_list::<u32>(None), Vec::<u32>::new());
        assert_eq!(to_list(Some(OneOrMany::One(3))), vec![3]);
        assert_eq!(to_list(Some(OneOrMany::Many(vec![1, 2]))), vec![1, 2]);
    }

    #[test]
    fn test_item_count() {
        assert_eq!(RegistrySpec::<u8>::Empty.item_count(), 0);
        assert_eq!(RegistrySpec::single(1u8).item_count(), 1);
        assert_eq!(RegistrySpec::items([1u8, 2, 3]).item_count(), 3);
    }

    #[test]
    fn test_try_map_keeps_names() {
        let spec = RegistrySpec::Sequence(vec![Named::with_name("a", 1), Named::new(2)]);
        let mapped: RegistrySpec<String> = spec
            .try_map(|v| Ok::<_, ()>(v.to_string()))
            .unwrap();
        assert_eq!(
            mapped,
            RegistrySpec::Sequence(vec![
                Named::with_name("a", "1".to_string()),
                Named::new("2".to_string()),
            ])
        );
    }

    #[test]
    fn test_try_map_stops_on_error() {
        let spec = RegistrySpec::items([1, 2, 3]);
        let mut seen = Vec::new();
        let result = spec.try_map(|v| {
            seen.push(v);
            if v == 2 { Err("bad") } else { Ok(v) }
        });
        assert_eq!(result.unwrap_err(), "bad");
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_registry_accessors() {
        let mut map = IndexMap::new();
        map.insert("b".to_string(), 2);
        map.insert("a".to_string(), 1);
        let registry = Registry::from_entries(map);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry["a"], 1);
        assert_eq!(registry.position("b"), Some(0));
        assert_eq!(registry.get_index(1), Some(("a", &1)));
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["b", "a"]);

        let doubled = registry.map_values(|_, v| v * 2);
        assert_eq!(doubled.values().copied().collect::<Vec<_>>(), vec![4, 2]);
    }

    #[test]
    fn test_registry_serializes_in_order() {
        let mut map = IndexMap::new();
        map.insert("z".to_string(), 1);
        map.insert("a".to_string(), 2);
        let registry = Registry::from_entries(map);
        assert_eq!(serde_json::to_string(&registry).unwrap(), r#"{"z":1,"a":2}"#);
    }
}
