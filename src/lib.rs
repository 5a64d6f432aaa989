//! A day-stepped simulation of disease spread over a contact network
//!
//! Epinet models a population as a fixed contact graph whose members move
//! through a small epidemic state machine: susceptible, exposed, infectious
//! and then, at the end of the active disease period, either recovered or
//! deceased. Each simulated day is one complete, ordered sweep over the
//! population.
//!
//! The central object is the `Context`, which holds every piece of
//! simulation state as a typed data plugin. Each concern extends the
//! `Context` through a trait:
//! * `ContextGlobalPropertiesExt` stores validated configuration such as
//!   the `DiseaseParams`.
//! * `ContextRandomExt` hands out independent, seeded random streams.
//! * `ContextNetworkExt` holds the contact graph.
//! * `ContextPopulationExt` is the authoritative per-individual store.
//! * `ContextEpidemicExt` seeds infections and advances the population one
//!   day at a time, producing `DailyCounts`.
//! * `ContextReportExt` optionally writes those counts to a CSV file.
//!
//! A typical run:
//!
//! ```
//! use epinet::prelude::*;
//!
//! let mut context = Context::new();
//! // Stores the parameters and seeds the random streams from their `seed`.
//! context.init_epidemic(DiseaseParameters::default()).unwrap();
//! let people = context.add_individuals(3);
//! context.add_contact(people[0], people[1]).unwrap();
//! context.add_contact(people[1], people[2]).unwrap();
//! context.seed_individuals(&[people[0]]).unwrap();
//!
//! let series = context.run_days(30).unwrap();
//! assert_eq!(series.len(), 30);
//! ```
pub mod context;
pub mod epidemic;
pub mod error;
pub mod global_properties;
pub mod log;
pub mod network;
pub mod parameters;
pub mod population;
pub mod random;
pub mod report;

// Re-exported for use in macros
pub use csv;
pub use paste;
pub use rand;

pub use context::{Context, DataPlugin};
pub use error::EpiError;
pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub mod prelude {
    pub use crate::context::Context;
    pub use crate::epidemic::{ContextEpidemicExt, DailyCounts};
    pub use crate::error::EpiError;
    pub use crate::global_properties::ContextGlobalPropertiesExt;
    pub use crate::network::ContextNetworkExt;
    pub use crate::parameters::{DiseaseParameters, DiseaseParams};
    pub use crate::population::{ContextPopulationExt, HealthStatus, IndividualId};
    pub use crate::random::ContextRandomExt;
    pub use crate::report::ContextReportExt;
    pub use crate::{define_data_plugin, define_global_property, define_report, define_rng};
}
