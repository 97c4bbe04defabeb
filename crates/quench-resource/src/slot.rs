//! Backing storage for one resource.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use quench_core::{EventIndex, ResourceError, ResourceKey};

/// The value plus the event at which its owner last published it.
pub(crate) struct Stamped<T> {
    pub(crate) value: T,
    pub(crate) stamp: Option<EventIndex>,
}

/// Storage owned by the registry. Handles hold `Weak<Slot<T>>`.
pub(crate) struct Slot<T> {
    key: ResourceKey,
    cell: RwLock<Stamped<T>>,
}

impl<T> Slot<T> {
    pub(crate) fn new(key: ResourceKey, value: T) -> Self {
        Self {
            key,
            cell: RwLock::new(Stamped { value, stamp: None }),
        }
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Stamped<T>>, ResourceError> {
        self.cell.read().map_err(|_| ResourceError::Poisoned {
            key: self.key.clone(),
        })
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Stamped<T>>, ResourceError> {
        self.cell.write().map_err(|_| ResourceError::Poisoned {
            key: self.key.clone(),
        })
    }
}
