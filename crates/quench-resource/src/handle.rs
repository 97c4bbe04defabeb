//! Typed handles onto a registered resource.
//!
//! | Handle | Count | May mutate | Ordering within an event |
//! |--------|-------|------------|--------------------------|
//! | [`Owner`] | exactly one | yes, publishes snapshots | after accumulators, before readers |
//! | [`Reader`] | any | no | after the owner |
//! | [`Accumulator`] | any | contributions only | before the owner |
//!
//! All handles are weak. Once the registry is dropped every access
//! returns [`ResourceError::Released`].

use std::fmt;
use std::sync::{Arc, Weak};

use quench_core::{Access, EventIndex, ResourceError, ResourceKey, ResourceUse};

use crate::slot::Slot;

fn upgrade<T>(slot: &Weak<Slot<T>>, key: &ResourceKey) -> Result<Arc<Slot<T>>, ResourceError> {
    slot.upgrade()
        .ok_or_else(|| ResourceError::Released { key: key.clone() })
}

// ── Owner ──────────────────────────────────────────────────────────

/// The unique producing handle for a resource.
///
/// Not `Clone`: the registry issues exactly one `Owner` per resource,
/// so ownership is enforced by construction.
pub struct Owner<T> {
    key: ResourceKey,
    slot: Weak<Slot<T>>,
}

impl<T> Owner<T> {
    pub(crate) fn new(key: ResourceKey, slot: Weak<Slot<T>>) -> Self {
        Self { key, slot }
    }

    /// The resource key.
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Usage declaration for ordering validation.
    pub fn usage(&self) -> ResourceUse {
        ResourceUse::new(self.key.clone(), Access::Own)
    }

    /// Mutate the resource and stamp it as produced by `event`.
    ///
    /// The write lock is held for the whole closure, so readers see
    /// either the previous snapshot or the complete new one.
    pub fn publish<R>(
        &self,
        event: EventIndex,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, ResourceError> {
        let slot = upgrade(&self.slot, &self.key)?;
        let mut guard = slot.write()?;
        let out = f(&mut guard.value);
        guard.stamp = Some(event);
        Ok(out)
    }

    /// Mutate the resource without changing its stamp.
    ///
    /// Used by owners that consume accumulated contributions (draining
    /// a liquefier) before publishing.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, ResourceError> {
        let slot = upgrade(&self.slot, &self.key)?;
        let mut guard = slot.write()?;
        Ok(f(&mut guard.value))
    }

    /// Read the current contents, published or not.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, ResourceError> {
        let slot = upgrade(&self.slot, &self.key)?;
        let guard = slot.read()?;
        Ok(f(&guard.value))
    }

    /// Event at which the current snapshot was published.
    pub fn stamp(&self) -> Result<Option<EventIndex>, ResourceError> {
        let slot = upgrade(&self.slot, &self.key)?;
        let guard = slot.read()?;
        Ok(guard.stamp)
    }
}

impl<T> fmt::Debug for Owner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner").field("key", &self.key).finish()
    }
}

// ── Reader ─────────────────────────────────────────────────────────

/// An observe-only attachment.
pub struct Reader<T> {
    key: ResourceKey,
    slot: Weak<Slot<T>>,
}

impl<T> Reader<T> {
    pub(crate) fn new(key: ResourceKey, slot: Weak<Slot<T>>) -> Self {
        Self { key, slot }
    }

    /// The resource key.
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Usage declaration for ordering validation.
    pub fn usage(&self) -> ResourceUse {
        ResourceUse::new(self.key.clone(), Access::Read)
    }

    /// Read the most recently published snapshot.
    ///
    /// Returns [`ResourceError::NotPublished`] if the owner has never
    /// published.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, ResourceError> {
        let slot = upgrade(&self.slot, &self.key)?;
        let guard = slot.read()?;
        if guard.stamp.is_none() {
            return Err(ResourceError::NotPublished {
                key: self.key.clone(),
            });
        }
        Ok(f(&guard.value))
    }

    /// Event at which the current snapshot was published.
    pub fn stamp(&self) -> Result<Option<EventIndex>, ResourceError> {
        let slot = upgrade(&self.slot, &self.key)?;
        let guard = slot.read()?;
        Ok(guard.stamp)
    }

    /// Whether the registry still holds the resource.
    pub fn is_attached(&self) -> bool {
        self.slot.strong_count() > 0
    }
}

impl<T> Clone for Reader<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            slot: self.slot.clone(),
        }
    }
}

impl<T> fmt::Debug for Reader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader").field("key", &self.key).finish()
    }
}

// ── Accumulator ────────────────────────────────────────────────────

/// An accumulate-only attachment.
///
/// The one sanctioned way for a non-owner to mutate a resource. Writers
/// add contributions during their Exec; the owner consumes them when it
/// runs later in the same event.
pub struct Accumulator<T> {
    key: ResourceKey,
    slot: Weak<Slot<T>>,
}

impl<T> Accumulator<T> {
    pub(crate) fn new(key: ResourceKey, slot: Weak<Slot<T>>) -> Self {
        Self { key, slot }
    }

    /// The resource key.
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Usage declaration for ordering validation.
    pub fn usage(&self) -> ResourceUse {
        ResourceUse::new(self.key.clone(), Access::Accumulate)
    }

    /// Add a contribution. Does not change the publish stamp.
    pub fn accumulate<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, ResourceError> {
        let slot = upgrade(&self.slot, &self.key)?;
        let mut guard = slot.write()?;
        Ok(f(&mut guard.value))
    }
}

impl<T> Clone for Accumulator<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            slot: self.slot.clone(),
        }
    }
}

impl<T> fmt::Debug for Accumulator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("key", &self.key)
            .finish()
    }
}
