//! Ordered collection aliases.
//!
//! The observation table guarantees deterministic, insertion-ordered
//! iteration over its regions, so every set or map that backs it must
//! preserve insertion order. We alias the `indexmap` types here so the rest
//! of the workspace does not have to care about the backing implementation.

/// A set with deterministic iteration in insertion order.
pub type OrderedSet<T> = indexmap::IndexSet<T>;

/// A map with deterministic iteration in insertion order of the keys.
pub type OrderedMap<K, V> = indexmap::IndexMap<K, V>;
