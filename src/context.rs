//! The `Context` holds all of the state of a simulation run.
//!
//! Modules store their data in the `Context` as data plugins: a unit type
//! declared with `define_data_plugin!` names a container type and the
//! expression used to build it. Containers are created lazily the first
//! time they are requested mutably.
use std::any::{Any, TypeId};

use crate::HashMap;

/// A trait for objects that can provide data containers to be held by `Context`
pub trait DataPlugin: Any {
    type DataContainer;

    fn create_data_container() -> Self::DataContainer;
}

/// Defines a new type for storing data in Context.
#[macro_export]
macro_rules! define_data_plugin {
    ($data_plugin:ident, $data_container:ty, $default: expr) => {
        #[derive(Copy, Clone)]
        struct $data_plugin;

        impl $crate::context::DataPlugin for $data_plugin {
            type DataContainer = $data_container;

            fn create_data_container() -> Self::DataContainer {
                $default
            }
        }
    };
}
pub use define_data_plugin;

pub struct Context {
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
    current_day: u32,
}

impl Context {
    #[must_use]
    pub fn new() -> Context {
        Context {
            data_plugins: HashMap::default(),
            current_day: 0,
        }
    }

    /// Returns a mutable reference to the data container for `T`, creating it if it
    /// doesn't exist yet.
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn get_data_container_mut<T: DataPlugin>(&mut self, _plugin: T) -> &mut T::DataContainer {
        self.data_plugins
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::create_data_container()))
            .downcast_mut::<T::DataContainer>()
            .unwrap() // Will never panic as data container has the matching type
    }

    /// Returns a reference to the data container for `T` if it exists.
    #[must_use]
    pub fn get_data_container<T: DataPlugin>(&self, _plugin: T) -> Option<&T::DataContainer> {
        self.data_plugins
            .get(&TypeId::of::<T>())
            .and_then(|data| data.downcast_ref::<T::DataContainer>())
    }

    /// The number of simulated days that have been completed.
    #[must_use]
    pub fn get_current_day(&self) -> u32 {
        self.current_day
    }

    pub(crate) fn advance_day(&mut self) -> u32 {
        self.current_day += 1;
        self.current_day
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
