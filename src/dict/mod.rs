//! Word lists for the native engine.

pub mod manager;
