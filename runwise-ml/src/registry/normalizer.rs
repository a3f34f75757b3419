//! Turning a [`RegistrySpec`] into a [`Registry`].

use super::{Named, Registry, RegistrySpec};
use crate::error::MlError;
use indexmap::IndexMap;
use indexmap::map::Entry;
use std::collections::HashMap;

/// How keys are derived for unnamed items and how clashing names are split.
pub trait NamingPolicy<T: ?Sized> {
    /// Name for an item that was given without one.
    fn default_name(&self, index: usize, item: &T) -> String;

    /// Replacement key for the `count`-th (1-based) item sharing `name`.
    fn unambiguous_name(&self, name: &str, item: &T, count: usize) -> String;
}

/// Positional or fixed default names, clashes suffixed with `.{count}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericNaming {
    pub default_name: Option<String>,
}

impl GenericNaming {
    pub fn new(default_name: Option<&str>) -> Self {
        Self {
            default_name: default_name.map(str::to_string),
        }
    }
}

impl<T: ?Sized> NamingPolicy<T> for GenericNaming {
    fn default_name(&self, index: usize, _item: &T) -> String {
        match &self.default_name {
            Some(name) => name.clone(),
            None => index.to_string(),
        }
    }

    fn unambiguous_name(&self, name: &str, _item: &T, count: usize) -> String {
        format!("{name}.{count}")
    }
}

/// A naming policy assembled from two closures.
pub struct FnNaming<D, U> {
    default_name: D,
    unambiguous_name: U,
}

impl<D, U> FnNaming<D, U> {
    pub fn new(default_name: D, unambiguous_name: U) -> Self {
        Self {
            default_name,
            unambiguous_name,
        }
    }
}

impl<T, D, U> NamingPolicy<T> for FnNaming<D, U>
where
    T: ?Sized,
    D: Fn(usize, &T) -> String,
    U: Fn(&str, &T, usize) -> String,
{
    fn default_name(&self, index: usize, item: &T) -> String {
        (self.default_name)(index, item)
    }

    fn unambiguous_name(&self, name: &str, item: &T, count: usize) -> String {
        (self.unambiguous_name)(name, item, count)
    }
}

/// Normalize a spec into a registry with collision-free keys.
///
/// Keyed inputs are passed through: an [`RegistrySpec::Ordered`] map keeps its
/// order, an [`RegistrySpec::Unordered`] one is sorted by key so the result is
/// reproducible. Sequences are walked once. The first repeat of a name moves
/// the earlier item to `unambiguous_name(name, prev, 1)` (re-inserted at the
/// end) and stores the repeat under `unambiguous_name(name, item, 2)`; later
/// repeats get the next count without touching the already-renamed items.
///
/// A generated key that is already taken is a configuration error; nothing is
/// overwritten.
pub fn normalize<T, P>(spec: RegistrySpec<T>, policy: &P) -> Result<Registry<T>, MlError>
where
    P: NamingPolicy<T> + ?Sized,
{
    let items = match spec {
        RegistrySpec::Empty => return Ok(Registry::new()),
        RegistrySpec::Ordered(map) => return Ok(Registry::from_entries(map)),
        RegistrySpec::Unordered(map) => {
            let mut entries: Vec<(String, T)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            return Ok(Registry::from_entries(entries.into_iter().collect()));
        }
        RegistrySpec::Single(item) => vec![item],
        RegistrySpec::Sequence(items) => items,
    };

    let mut entries: IndexMap<String, T> = IndexMap::with_capacity(items.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (index, Named { name, value }) in items.into_iter().enumerate() {
        let name = match name {
            Some(name) => name,
            None => policy.default_name(index, &value),
        };
        let count = seen.get(&name).copied().unwrap_or(0);

        if count == 0 {
            insert_unique(&mut entries, name.clone(), value)?;
        } else {
            if count == 1 {
                let prev = entries.shift_remove(&name).ok_or_else(|| {
                    MlError::config(format!("entry '{name}' disappeared before it could be renamed"))
                })?;
                let renamed = policy.unambiguous_name(&name, &prev, 1);
                tracing::debug!(name = %name, renamed = %renamed, "Renamed clashing registry entry");
                insert_unique(&mut entries, renamed, prev)?;
            }
            let key = policy.unambiguous_name(&name, &value, count + 1);
            insert_unique(&mut entries, key, value)?;
        }

        *seen.entry(name).or_insert(0) += 1;
    }

    Ok(Registry::from_entries(entries))
}

fn insert_unique<T>(entries: &mut IndexMap<String, T>, key: String, value: T) -> Result<(), MlError> {
    match entries.entry(key) {
        Entry::Occupied(slot) => Err(MlError::config(format!(
            "registry key '{}' is produced by more than one item",
            slot.key()
        ))),
        Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(())
        }
    }
}

/// [`normalize`] with the two naming functions passed directly.
pub fn normalize_with<T, U, D>(
    spec: RegistrySpec<T>,
    unambiguous_name: U,
    default_name: D,
) -> Result<Registry<T>, MlError>
where
    U: Fn(&str, &T, usize) -> String,
    D: Fn(usize, &T) -> String,
{
    normalize(spec, &FnNaming::new(default_name, unambiguous_name))
}

/// Normalize with [`GenericNaming`].
pub fn to_dict<T>(spec: RegistrySpec<T>, default_name: Option<&str>) -> Result<Registry<T>, MlError> {
    normalize(spec, &GenericNaming::new(default_name))
}
