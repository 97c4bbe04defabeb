//! Test utilities for Quench development.
//!
//! Provides a shared [`CallLog`] journal and recording task fixtures
//! that make lifecycle ordering observable from tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{Call, CallLog, FailAt, Op, RecordingTask};
