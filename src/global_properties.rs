//! Typed, validated configuration values stored in the `Context`.
//!
//! A global property is declared with `define_global_property!`, which names the value type and,
//! optionally, a validator. Values are checked when they are set, so a run can never start with a
//! configuration its validator rejects.
use std::any::{Any, TypeId};
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::error::EpiError;
use crate::{define_data_plugin, HashMap};

/// Defines a global property with the following parameters:
/// * `$global_property`: Name for the identifier type of the global property
/// * `$value`: The type of the property's value
/// * `$validate`: A function (or closure) that checks the validity of the property (optional)
#[macro_export]
macro_rules! define_global_property {
    ($global_property:ident, $value:ty, $validate: expr) => {
        #[derive(Copy, Clone)]
        pub struct $global_property;

        impl $crate::global_properties::GlobalProperty for $global_property {
            type Value = $value;

            fn validate(val: &$value) -> Result<(), $crate::error::EpiError> {
                $validate(val)
            }
        }
    };

    ($global_property: ident, $value: ty) => {
        $crate::define_global_property!($global_property, $value, |_| { Ok(()) });
    };
}
pub use define_global_property;

pub trait GlobalProperty: Any {
    type Value: Any + PartialEq;

    fn validate(value: &Self::Value) -> Result<(), EpiError>;
}

define_data_plugin!(
    GlobalPropertiesPlugin,
    HashMap<TypeId, Box<dyn Any>>,
    HashMap::default()
);

pub trait ContextGlobalPropertiesExt {
    /// Set the value of a global property of type T.
    ///
    /// # Errors
    /// Returns an error if the validator rejects the value, or if the property already holds a
    /// different value.
    fn set_global_property_value<T: GlobalProperty>(
        &mut self,
        property: T,
        value: T::Value,
    ) -> Result<(), EpiError>;

    /// Return the value of global property T, if it has been set.
    fn get_global_property_value<T: GlobalProperty>(&self, property: T) -> Option<&T::Value>;

    /// Given a file path for a valid json file, deserialize parameter values for a given struct T
    ///
    /// # Errors
    /// Returns an `EpiError` if the file cannot be read or does not deserialize to `T`.
    fn load_parameters_from_json<T: DeserializeOwned>(
        &self,
        file_path: &Path,
    ) -> Result<T, EpiError>;
}

impl ContextGlobalPropertiesExt for Context {
    fn set_global_property_value<T: GlobalProperty>(
        &mut self,
        _property: T,
        value: T::Value,
    ) -> Result<(), EpiError> {
        T::validate(&value)?;
        let properties = self.get_data_container_mut(GlobalPropertiesPlugin);
        if let Some(existing) = properties.get(&TypeId::of::<T>()) {
            // Will never fail as the value was stored under `T`'s type id
            let existing = existing.downcast_ref::<T::Value>();
            return if existing == Some(&value) {
                Ok(())
            } else {
                Err(EpiError::IllegalGlobalPropertyValue(
                    "global property is already set to a different value".to_string(),
                ))
            };
        }
        properties.insert(TypeId::of::<T>(), Box::new(value));
        Ok(())
    }

    fn get_global_property_value<T: GlobalProperty>(&self, _property: T) -> Option<&T::Value> {
        self.get_data_container(GlobalPropertiesPlugin)?
            .get(&TypeId::of::<T>())?
            .downcast_ref::<T::Value>()
    }

    fn load_parameters_from_json<T: DeserializeOwned>(
        &self,
        file_path: &Path,
    ) -> Result<T, EpiError> {
        let config_file = fs::read_to_string(file_path)?;
        let config = serde_json::from_str(&config_file)?;
        Ok(config)
    }
}
