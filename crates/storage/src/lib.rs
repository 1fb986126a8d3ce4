//! Storage backends for Amphora
//!
//! This crate provides the embedded `KvStore` implementation:
//! - `MemoryStore`: ordered in-memory backend (`BTreeMap` + `RwLock`) with
//!   atomic multi-key batch and lexicographic prefix scans
//!
//! A production deployment swaps in a networked backend behind the same
//! `KvStore` trait from `amphora-core`; everything above the trait is
//! backend-agnostic.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;

pub use memory::MemoryStore;
