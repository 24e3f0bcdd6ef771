//! Domain object module
//!
//! # Overview
//!
//! Records decode into classes picked through an [`ObjectMap`]. A class is
//! usable when it implements [`SObject`] (identity) and [`FromRecord`]
//! (record → object factory). Unknown type names fall back to
//! [`GenericObject`].

mod generic;
mod registry;
mod types;

pub use generic::GenericObject;
pub use registry::{ObjectMap, SObjectFactory, GENERIC_CLASS};
pub use types::{Field, FromRecord, ObjectClone, Record, SObject, ATTRIBUTES_FIELD, ID_FIELD};
