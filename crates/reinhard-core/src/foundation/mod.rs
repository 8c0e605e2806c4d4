//! Foundation layer: platform-neutral data types.

pub mod entity;
pub mod event;
pub mod message;
