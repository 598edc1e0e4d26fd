//! Domain model: the publisher configuration and its value objects.

pub mod entities;
pub mod value_objects;
