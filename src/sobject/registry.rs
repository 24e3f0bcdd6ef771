//! Type-name to class registry
//!
//! Maps remote type names to class names, and class names to the factories
//! that build objects from records.

use super::generic::GenericObject;
use super::types::{FromRecord, Record, SObject};
use crate::error::{Result, UsageError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Class name of the generic fallback object
pub const GENERIC_CLASS: &str = "SObject";

/// Record to object factory registered for a class
pub type SObjectFactory = Arc<dyn Fn(Record) -> Result<Box<dyn SObject>> + Send + Sync>;

/// Remote type name → class name mapping plus class factories
///
/// [`GenericObject`] is always registered as [`GENERIC_CLASS`] and used for
/// any type name the map does not know.
#[derive(Clone)]
pub struct ObjectMap {
    types: HashMap<String, String>,
    classes: HashMap<String, SObjectFactory>,
}

impl ObjectMap {
    /// Create a map with only the generic class registered
    pub fn new() -> Self {
        let mut map = Self {
            types: HashMap::new(),
            classes: HashMap::new(),
        };
        map.classes
            .insert(GENERIC_CLASS.to_string(), factory_for::<GenericObject>());
        map
    }

    /// Create a map from a type name → class name table
    pub fn with_types(types: HashMap<String, String>) -> Self {
        let mut map = Self::new();
        map.types = types;
        map
    }

    /// Register a class by its [`FromRecord`] implementation
    #[must_use]
    pub fn register<T: FromRecord>(mut self, class_name: impl Into<String>) -> Self {
        self.classes.insert(class_name.into(), factory_for::<T>());
        self
    }

    /// Register a class with an explicit factory
    #[must_use]
    pub fn register_factory<F>(mut self, class_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Record) -> Result<Box<dyn SObject>> + Send + Sync + 'static,
    {
        self.classes.insert(class_name.into(), Arc::new(factory));
        self
    }

    /// Map a remote type name to a class name
    #[must_use]
    pub fn map_type(mut self, type_name: impl Into<String>, class_name: impl Into<String>) -> Self {
        self.types.insert(type_name.into(), class_name.into());
        self
    }

    /// Register a class and map a type name to it in one step
    #[must_use]
    pub fn bind<T: FromRecord>(self, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        self.register::<T>(type_name.clone()).map_type(type_name.clone(), type_name)
    }

    /// Class name for a remote type name, falling back to the generic class
    pub fn class_for(&self, type_name: Option<&str>) -> &str {
        type_name
            .and_then(|t| self.types.get(t))
            .map_or(GENERIC_CLASS, String::as_str)
    }

    /// Check if a class name has a factory
    pub fn is_registered(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }

    /// Factory of a registered class
    pub fn factory(&self, class_name: &str) -> std::result::Result<SObjectFactory, UsageError> {
        self.classes
            .get(class_name)
            .cloned()
            .ok_or_else(|| UsageError::bad_class_name(class_name))
    }

    /// Resolve a remote type name to its class name and factory
    pub fn resolve(
        &self,
        type_name: Option<&str>,
    ) -> std::result::Result<(String, SObjectFactory), UsageError> {
        let class_name = self.class_for(type_name);
        trace!(?type_name, class_name, "Resolving object class");
        let factory = self.factory(class_name)?;
        Ok((class_name.to_string(), factory))
    }
}

impl Default for ObjectMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<_> = self.classes.keys().collect();
        classes.sort();
        f.debug_struct("ObjectMap")
            .field("types", &self.types)
            .field("classes", &classes)
            .finish()
    }
}

fn factory_for<T: FromRecord>() -> SObjectFactory {
    Arc::new(|record: Record| -> Result<Box<dyn SObject>> {
        Ok(Box::new(T::from_record(record)?))
    })
}
