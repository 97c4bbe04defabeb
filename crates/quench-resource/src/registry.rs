//! The build-phase resource registry.
//!
//! [`ResourceRegistry`] owns the storage of every shared resource and
//! hands out typed, non-owning handles. It must outlive the task tree;
//! the orchestrator guarantees this by owning both and finishing the
//! tree before the registry is dropped.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use quench_core::{Access, ResourceKey};
use tracing::debug;

use crate::error::RegistryError;
use crate::handle::{Accumulator, Owner, Reader};
use crate::slot::Slot;

struct Entry {
    slot: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    attachments: Vec<Access>,
}

/// Storage for every shared resource in a run, in registration order.
#[derive(Default)]
pub struct ResourceRegistry {
    entries: IndexMap<ResourceKey, Entry>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource and return its unique [`Owner`] handle.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateKey`] if `key` is already taken.
    pub fn register<T: Send + Sync + 'static>(
        &mut self,
        key: impl Into<ResourceKey>,
        initial: T,
    ) -> Result<Owner<T>, RegistryError> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(RegistryError::DuplicateKey { key });
        }
        let slot = Arc::new(Slot::new(key.clone(), initial));
        let weak = Arc::downgrade(&slot);
        debug!(resource = %key, ty = type_name::<T>(), "registered shared resource");
        self.entries.insert(
            key.clone(),
            Entry {
                slot,
                type_name: type_name::<T>(),
                attachments: vec![Access::Own],
            },
        );
        Ok(Owner::new(key, weak))
    }

    /// Attach an observe-only [`Reader`].
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownKey`] or [`RegistryError::TypeMismatch`].
    pub fn reader<T: Send + Sync + 'static>(
        &mut self,
        key: impl Into<ResourceKey>,
    ) -> Result<Reader<T>, RegistryError> {
        let key = key.into();
        let slot = self.attach::<T>(&key, Access::Read)?;
        Ok(Reader::new(key, Arc::downgrade(&slot)))
    }

    /// Attach an accumulate-only [`Accumulator`].
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownKey`] or [`RegistryError::TypeMismatch`].
    pub fn accumulator<T: Send + Sync + 'static>(
        &mut self,
        key: impl Into<ResourceKey>,
    ) -> Result<Accumulator<T>, RegistryError> {
        let key = key.into();
        let slot = self.attach::<T>(&key, Access::Accumulate)?;
        Ok(Accumulator::new(key, Arc::downgrade(&slot)))
    }

    fn attach<T: Send + Sync + 'static>(
        &mut self,
        key: &ResourceKey,
        access: Access,
    ) -> Result<Arc<Slot<T>>, RegistryError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| RegistryError::UnknownKey { key: key.clone() })?;
        let slot = Arc::clone(&entry.slot)
            .downcast::<Slot<T>>()
            .map_err(|_| RegistryError::TypeMismatch {
                key: key.clone(),
                expected: type_name::<T>(),
                actual: entry.type_name,
            })?;
        entry.attachments.push(access);
        debug!(resource = %key, %access, "attached shared resource");
        Ok(slot)
    }

    /// Whether a resource is registered under `key`.
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &ResourceKey> {
        self.entries.keys()
    }

    /// Handles issued for `key`, in issue order. The first is always
    /// [`Access::Own`].
    pub fn attachments(&self, key: &ResourceKey) -> Option<&[Access]> {
        self.entries.get(key).map(|e| e.attachments.as_slice())
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no resources are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, e)| (k, e.type_name)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quench_core::{EventIndex, ResourceError};

    #[derive(Debug, Default, PartialEq)]
    struct Medium {
        temperature: f64,
    }

    #[test]
    fn register_returns_owner_with_key() {
        let mut reg = ResourceRegistry::new();
        let owner = reg.register("medium", Medium::default()).unwrap();
        assert_eq!(owner.key().as_str(), "medium");
        assert_eq!(owner.usage().access, Access::Own);
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(&ResourceKey::from("medium")));
    }

    #[test]
    fn duplicate_key_rejected() {
        let mut reg = ResourceRegistry::new();
        let _owner = reg.register("medium", Medium::default()).unwrap();
        match reg.register("medium", Medium::default()) {
            Err(RegistryError::DuplicateKey { key }) => assert_eq!(key.as_str(), "medium"),
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn unknown_key_rejected() {
        let mut reg = ResourceRegistry::new();
        assert!(matches!(
            reg.reader::<Medium>("nope"),
            Err(RegistryError::UnknownKey { .. })
        ));
    }

    #[test]
    fn type_mismatch_rejected() {
        let mut reg = ResourceRegistry::new();
        let _owner = reg.register("medium", Medium::default()).unwrap();
        match reg.accumulator::<Vec<f64>>("medium") {
            Err(RegistryError::TypeMismatch { actual, .. }) => {
                assert!(actual.contains("Medium"));
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn reader_sees_only_published_state() {
        let mut reg = ResourceRegistry::new();
        let owner = reg.register("medium", Medium::default()).unwrap();
        let reader = reg.reader::<Medium>("medium").unwrap();

        assert!(matches!(
            reader.read(|m| m.temperature),
            Err(ResourceError::NotPublished { .. })
        ));

        owner
            .publish(EventIndex(0), |m| m.temperature = 0.3)
            .unwrap();
        assert_eq!(reader.read(|m| m.temperature).unwrap(), 0.3);
        assert_eq!(reader.stamp().unwrap(), Some(EventIndex(0)));
    }

    #[test]
    fn update_does_not_restamp() {
        let mut reg = ResourceRegistry::new();
        let owner = reg.register("medium", Medium::default()).unwrap();
        owner.publish(EventIndex(4), |m| m.temperature = 1.0).unwrap();
        owner.update(|m| m.temperature = 2.0).unwrap();
        assert_eq!(owner.stamp().unwrap(), Some(EventIndex(4)));
        assert_eq!(owner.read(|m| m.temperature).unwrap(), 2.0);
    }

    #[test]
    fn accumulators_contribute_to_owner() {
        let mut reg = ResourceRegistry::new();
        let owner = reg.register("liquefier", Vec::<f64>::new()).unwrap();
        let a = reg.accumulator::<Vec<f64>>("liquefier").unwrap();
        let b = a.clone();
        a.accumulate(|v| v.push(1.0)).unwrap();
        b.accumulate(|v| v.push(2.0)).unwrap();
        let drained = owner.update(std::mem::take).unwrap();
        assert_eq!(drained, vec![1.0, 2.0]);
        assert!(owner.read(Vec::is_empty).unwrap());
    }

    #[test]
    fn attachments_recorded_in_order() {
        let mut reg = ResourceRegistry::new();
        let _owner = reg.register("liquefier", Vec::<f64>::new()).unwrap();
        let _acc = reg.accumulator::<Vec<f64>>("liquefier").unwrap();
        let _read = reg.reader::<Vec<f64>>("liquefier").unwrap();
        assert_eq!(
            reg.attachments(&ResourceKey::from("liquefier")).unwrap(),
            &[Access::Own, Access::Accumulate, Access::Read]
        );
    }

    #[test]
    fn handles_report_released_after_registry_drop() {
        let mut reg = ResourceRegistry::new();
        let owner = reg.register("medium", Medium::default()).unwrap();
        let reader = reg.reader::<Medium>("medium").unwrap();
        assert!(reader.is_attached());
        drop(reg);
        assert!(!reader.is_attached());
        assert!(matches!(
            owner.publish(EventIndex(0), |_| ()),
            Err(ResourceError::Released { .. })
        ));
        assert!(matches!(
            reader.stamp(),
            Err(ResourceError::Released { .. })
        ));
    }
}
