//! Integration layer: capability traits injected into the framework.

pub mod cache;
pub mod capability;
