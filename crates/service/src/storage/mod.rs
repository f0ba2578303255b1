//! Storage helpers for file-backed providers.
//!
//! Contains the generic JSON map store the durable provider persists through.

pub mod json_map_store;
