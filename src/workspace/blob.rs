//! Blob - a named, type-erased storage cell.

use std::any::{Any, type_name};
use std::fmt;

use crate::errors::{NetError, Result};

/// A named cell holding one value of any type.
///
/// Operators only ever store [`Tensor`](super::Tensor)s, but the cell itself
/// does not care: typed access is checked at runtime.
pub struct Blob {
    name: String,
    value: Option<Box<dyn Any>>,
    type_name: &'static str,
}

impl Blob {
    /// Creates an empty blob.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            type_name: "nothing",
        }
    }

    /// Returns the blob's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the blob holds no value.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Returns true if the blob holds a value of type `T`.
    pub fn is_type<T: Any>(&self) -> bool {
        self.value.as_ref().is_some_and(|value| value.is::<T>())
    }

    /// Returns the type name of the held value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the held value, failing if the blob is empty or holds another type.
    pub fn get<T: Any>(&self) -> Result<&T> {
        self.value
            .as_ref()
            .and_then(|value| value.downcast_ref::<T>())
            .ok_or_else(|| NetError::BlobTypeMismatch {
                name: self.name.clone(),
                requested: type_name::<T>(),
                actual: self.type_name,
            })
    }

    /// Returns the held value mutably, replacing the contents with
    /// `T::default()` if the blob is empty or holds another type.
    pub fn get_mutable<T: Any + Default>(&mut self) -> &mut T {
        if !self.is_type::<T>() {
            if !self.is_empty() {
                log::debug!(
                    "Blob {} changes type from {} to {}",
                    self.name,
                    self.type_name,
                    type_name::<T>()
                );
            }
            self.value = Some(Box::new(T::default()));
            self.type_name = type_name::<T>();
        }
        self.value
            .as_mut()
            .and_then(|value| value.downcast_mut::<T>())
            .expect("blob holds the requested type")
    }

    /// Replaces the contents with `value`.
    pub fn reset<T: Any>(&mut self, value: T) -> &mut T {
        self.type_name = type_name::<T>();
        self.value
            .insert(Box::new(value))
            .downcast_mut::<T>()
            .expect("blob holds the value just stored")
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("name", &self.name)
            .field("type", &self.type_name)
            .finish()
    }
}
