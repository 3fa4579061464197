use crate::core::{ResourceKey, Result, TxError};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub type SharedResource = Arc<dyn Any + Send + Sync>;

/// Resources attached to one coordinator transaction context.
///
/// Owned by the transaction object and dropped with it, so entries never
/// outlive the transaction.
#[derive(Default)]
pub struct EnlistmentRegistry {
    entries: Mutex<HashMap<ResourceKey, SharedResource>>,
}

impl EnlistmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_resource(&self, key: ResourceKey, value: SharedResource) -> Result<()> {
        self.entries.lock()?.insert(key, value);
        Ok(())
    }

    pub fn get_resource(&self, key: &ResourceKey) -> Result<Option<SharedResource>> {
        Ok(self.entries.lock()?.get(key).cloned())
    }

    /// Typed lookup; an entry of another type is [`TxError::IllegalState`]
    pub fn get<T: Any + Send + Sync + Clone>(&self, key: &ResourceKey) -> Result<Option<T>> {
        let entries = self.entries.lock()?;
        entries.get(key).map(|value| downcast(key, value)).transpose()
    }

    /// Return the entry under `key`, or create it with `init` and store it.
    ///
    /// The check and the insert happen under one lock, so concurrent first
    /// use within a context runs `init` once. The flag is true when `init`
    /// ran. A failing `init` leaves no entry.
    pub fn get_or_try_insert_with<T, F>(&self, key: ResourceKey, init: F) -> Result<(T, bool)>
    where
        T: Any + Send + Sync + Clone,
        F: FnOnce() -> Result<T>,
    {
        let mut entries = self.entries.lock()?;
        if let Some(existing) = entries.get(&key) {
            return Ok((downcast(&key, existing)?, false));
        }

        let value = init()?;
        entries.insert(key, Arc::new(value.clone()));
        Ok((value, true))
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    /// Profiles with an enlisted session proxy, sorted
    pub fn profiles(&self) -> Result<Vec<String>> {
        let entries = self.entries.lock()?;
        let mut profiles: Vec<String> = entries
            .keys()
            .filter_map(|key| key.profile().map(str::to_string))
            .collect();
        profiles.sort();
        Ok(profiles)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry; for coordinators reusing a context object
    pub fn clear(&self) -> Result<()> {
        self.entries.lock()?.clear();
        Ok(())
    }
}

fn downcast<T: Any + Clone>(key: &ResourceKey, value: &SharedResource) -> Result<T> {
    value.downcast_ref::<T>().cloned().ok_or_else(|| {
        TxError::IllegalState(format!(
            "resource '{}' holds a value of another type than {}",
            key,
            std::any::type_name::<T>()
        ))
    })
}
