//! Shared resource registry and non-owning handles for Quench tasks.
//!
//! A resource is created once in the build phase through
//! [`ResourceRegistry::register`], which hands back the unique
//! [`Owner`] handle. Consumers attach through
//! [`ResourceRegistry::reader`] or [`ResourceRegistry::accumulator`].
//! The registry keeps the storage alive; every handle is a weak
//! reference and never extends the resource's lifetime.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod handle;
pub mod registry;
mod slot;

pub use error::RegistryError;
pub use handle::{Accumulator, Owner, Reader};
pub use registry::ResourceRegistry;
