//! masterytrack-store — In-memory store implementations.
//!
//! Backs the engine's `StructureReader` with an indexed view over parsed
//! curricula, and its `ProgressStore` with `RwLock`-guarded maps that can
//! round-trip through progress snapshots.

pub mod memory;

pub use memory::{InMemoryProgressStore, InMemoryStructure};
