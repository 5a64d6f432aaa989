use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_global_property;
use crate::error::EpiError;
use crate::global_properties::ContextGlobalPropertiesExt;
use crate::random::ContextRandomExt;

/// Disease and run configuration consumed by the epidemic stepper.
///
/// Periods are measured in whole days since exposure. An exposed individual becomes infectious
/// once its days since exposure exceeds `incubation_period`, and reaches its terminal outcome
/// (recovery or death) once that count exceeds `active_disease_period`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DiseaseParameters {
    pub incubation_period: u32,
    pub active_disease_period: u32,
    /// Chance that an individual dies, rather than recovers, at terminal resolution.
    pub fatality_probability: f64,
    /// Per-contact, per-day transmission probability while exposed but not yet infectious.
    pub exposed_transmission_probability: f64,
    /// Per-contact, per-day transmission probability once infectious.
    pub infectious_transmission_probability: f64,
    /// Chance that two contacts interact on a given day.
    pub interaction_probability: f64,
    /// Share of the population seeded as exposed by `seed_infections`.
    pub initial_infection_ratio: f64,
    pub seed: u64,
}

impl Default for DiseaseParameters {
    fn default() -> Self {
        DiseaseParameters {
            incubation_period: 5,
            active_disease_period: 15,
            fatality_probability: 0.02,
            exposed_transmission_probability: 0.02,
            infectious_transmission_probability: 0.05,
            interaction_probability: 1.0,
            initial_infection_ratio: 0.2,
            seed: 42,
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), EpiError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EpiError::IllegalGlobalPropertyValue(format!(
            "{name} must be a probability in [0, 1], got {value}"
        )))
    }
}

impl DiseaseParameters {
    /// Checks the configuration before any simulated day runs.
    ///
    /// # Errors
    /// Returns `EpiError::IllegalGlobalPropertyValue` describing the first violated constraint.
    pub fn validate(&self) -> Result<(), EpiError> {
        if self.active_disease_period <= self.incubation_period {
            return Err(EpiError::IllegalGlobalPropertyValue(format!(
                "active_disease_period ({}) must exceed incubation_period ({})",
                self.active_disease_period, self.incubation_period
            )));
        }
        check_probability("fatality_probability", self.fatality_probability)?;
        check_probability(
            "exposed_transmission_probability",
            self.exposed_transmission_probability,
        )?;
        check_probability(
            "infectious_transmission_probability",
            self.infectious_transmission_probability,
        )?;
        check_probability("interaction_probability", self.interaction_probability)?;
        check_probability("initial_infection_ratio", self.initial_infection_ratio)?;
        if self.exposed_transmission_probability > self.infectious_transmission_probability {
            return Err(EpiError::IllegalGlobalPropertyValue(format!(
                "exposed_transmission_probability ({}) must not exceed \
                 infectious_transmission_probability ({})",
                self.exposed_transmission_probability, self.infectious_transmission_probability
            )));
        }
        Ok(())
    }
}

define_global_property!(DiseaseParams, DiseaseParameters, DiseaseParameters::validate);

/// Returns the configured disease parameters, or an error if `DiseaseParams` has not been set.
pub(crate) fn disease_parameters(context: &Context) -> Result<DiseaseParameters, EpiError> {
    context
        .get_global_property_value(DiseaseParams)
        .copied()
        .ok_or_else(|| EpiError::from("DiseaseParams must be set before the simulation runs"))
}

/// Stores `parameters` as `DiseaseParams` and seeds the random streams from `parameters.seed`.
/// Storing the same parameters a second time leaves running streams where they are.
pub(crate) fn set_disease_parameters(
    context: &mut Context,
    parameters: DiseaseParameters,
) -> Result<(), EpiError> {
    let already_set = context.get_global_property_value(DiseaseParams).is_some();
    context.set_global_property_value(DiseaseParams, parameters)?;
    if !already_set || !context.is_random_initialized() {
        context.init_random(parameters.seed);
    }
    Ok(())
}

/// Loads `DiseaseParameters` from a json file, validates them, stores them in the context and
/// seeds the random streams from their `seed`.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or the parameters are invalid.
pub fn init_parameters(context: &mut Context, file_path: &Path) -> Result<(), EpiError> {
    let parameters = context.load_parameters_from_json::<DiseaseParameters>(file_path)?;
    set_disease_parameters(context, parameters)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        DiseaseParameters::default().validate().unwrap();
    }

    #[test]
    fn active_period_must_exceed_incubation() {
        let parameters = DiseaseParameters {
            incubation_period: 5,
            active_disease_period: 5,
            ..Default::default()
        };
        assert!(matches!(
            parameters.validate(),
            Err(EpiError::IllegalGlobalPropertyValue(_))
        ));
    }

    #[test]
    fn probabilities_must_be_in_unit_interval() {
        for parameters in [
            DiseaseParameters {
                fatality_probability: 1.5,
                ..Default::default()
            },
            DiseaseParameters {
                interaction_probability: -0.1,
                ..Default::default()
            },
            DiseaseParameters {
                infectious_transmission_probability: f64::NAN,
                ..Default::default()
            },
            DiseaseParameters {
                initial_infection_ratio: 2.0,
                ..Default::default()
            },
        ] {
            assert!(parameters.validate().is_err(), "{parameters:?}");
        }
    }

    #[test]
    fn exposed_rate_must_not_exceed_infectious_rate() {
        let parameters = DiseaseParameters {
            exposed_transmission_probability: 0.5,
            infectious_transmission_probability: 0.1,
            ..Default::default()
        };
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn invalid_parameters_are_not_stored() {
        let mut context = Context::new();
        let parameters = DiseaseParameters {
            active_disease_period: 1,
            ..Default::default()
        };
        assert!(context
            .set_global_property_value(DiseaseParams, parameters)
            .is_err());
        assert!(context.get_global_property_value(DiseaseParams).is_none());
    }

    #[test]
    fn init_parameters_from_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"incubation_period": 2, "active_disease_period": 4, "fatality_probability": 0.5}}"#
        )
        .unwrap();
        let mut context = Context::new();
        init_parameters(&mut context, file.path()).unwrap();

        let parameters = disease_parameters(&context).unwrap();
        assert!(context.is_random_initialized());
        assert_eq!(parameters.incubation_period, 2);
        assert_eq!(parameters.active_disease_period, 4);
        assert_eq!(parameters.fatality_probability, 0.5);
        // Unspecified fields keep their defaults.
        assert_eq!(parameters.interaction_probability, 1.0);
    }

    #[test]
    fn missing_parameters_are_an_error() {
        let context = Context::new();
        assert!(matches!(
            disease_parameters(&context),
            Err(EpiError::EpiError(_))
        ));
    }

    #[test]
    fn init_parameters_rejects_unknown_fields() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"incubation": 2}}"#).unwrap();
        let mut context = Context::new();
        assert!(matches!(
            init_parameters(&mut context, file.path()),
            Err(EpiError::JsonError(_))
        ));
    }

    #[test]
    fn init_parameters_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"incubation_period": 10, "active_disease_period": 4}}"#
        )
        .unwrap();
        let mut context = Context::new();
        assert!(matches!(
            init_parameters(&mut context, file.path()),
            Err(EpiError::IllegalGlobalPropertyValue(_))
        ));
        assert!(!context.is_random_initialized());
    }

    #[test]
    fn storing_equal_parameters_keeps_seed() {
        let mut context = Context::new();
        context.init_random(7);
        context
            .set_global_property_value(DiseaseParams, DiseaseParameters::default())
            .unwrap();
        // Already running streams are not reseeded from `seed`.
        set_disease_parameters(&mut context, DiseaseParameters::default()).unwrap();
        assert!(context.is_random_initialized());
        assert!(set_disease_parameters(
            &mut context,
            DiseaseParameters {
                seed: 8,
                ..Default::default()
            }
        )
        .is_err());
    }
}
