//! State management for the portal's order collection.
//!
//! Orders arrive as full snapshots, single-order upserts, or partial patches.
//! The reducer applies them to the display-ordered collection without ever
//! mutating the collection it was given.

pub mod order;

pub use order::{apply, merge_patch};
