//! The authoritative per-individual health state.
//!
//! Every individual is one node of the contact network, addressed by its `IndividualId`. The
//! `Population` data container owns one `Individual` record per node and exposes the transition
//! primitives the epidemic stepper applies each day. Transitions that do not apply to an
//! individual's current state are no-ops, because the daily sweep visits every individual
//! regardless of eligibility. The one exception is `kill`: killing an individual twice is a
//! sequencing defect and panics.
use std::fmt;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_data_plugin;
use crate::define_rng;
use crate::error::EpiError;
use crate::parameters::{disease_parameters, DiseaseParameters};
use crate::random::ContextRandomExt;

/// `days_since_exposure` of a deceased individual. It can never exceed any threshold.
pub const DEATH_SENTINEL: i64 = i64::MIN;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct IndividualId(pub(crate) usize);

impl IndividualId {
    #[must_use]
    pub fn id(self) -> usize {
        self.0
    }
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health states. Exactly one holds for every individual; `Deceased` is the state of every
/// individual whose `alive` flag has been cleared.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Susceptible,
    Exposed,
    Infectious,
    Recovered,
    Deceased,
}

impl HealthStatus {
    /// Exposed or infectious: the days-since-exposure clock is running.
    #[must_use]
    pub fn is_infected(self) -> bool {
        matches!(self, HealthStatus::Exposed | HealthStatus::Infectious)
    }

    /// Recovered and deceased are absorbing.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, HealthStatus::Recovered | HealthStatus::Deceased)
    }
}

/// How an individual left the active disease period.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TerminalOutcome {
    Recovered,
    Died,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Individual {
    status: HealthStatus,
    days_since_exposure: i64,
    transmission_probability: f64,
}

impl Default for Individual {
    fn default() -> Self {
        Individual {
            status: HealthStatus::Susceptible,
            days_since_exposure: 0,
            transmission_probability: 0.0,
        }
    }
}

impl Individual {
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        self.status
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status != HealthStatus::Deceased
    }

    #[must_use]
    pub fn days_since_exposure(&self) -> i64 {
        self.days_since_exposure
    }

    #[must_use]
    pub fn transmission_probability(&self) -> f64 {
        self.transmission_probability
    }
}

/// The exposure transition as a pure function of the individual's current state.
///
/// Only a susceptible individual can be exposed. It is exposed unconditionally when `forced`,
/// otherwise when `draw < probability`. On exposure the individual caches `exposed_rate` as its
/// transmission probability and starts its clock at -1, so that the first daily increment brings
/// it to 0. Returns the new state and whether exposure occurred.
#[must_use]
pub fn expose_transition(
    individual: Individual,
    probability: f64,
    forced: bool,
    draw: f64,
    exposed_rate: f64,
) -> (Individual, bool) {
    if individual.status != HealthStatus::Susceptible {
        return (individual, false);
    }
    if !forced && draw >= probability {
        return (individual, false);
    }
    let exposed = Individual {
        status: HealthStatus::Exposed,
        days_since_exposure: -1,
        transmission_probability: exposed_rate,
    };
    (exposed, true)
}

pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    fn new() -> Self {
        Population {
            individuals: Vec::new(),
        }
    }

    fn add_individuals(&mut self, count: usize) -> Vec<IndividualId> {
        let first = self.individuals.len();
        self.individuals
            .resize_with(first + count, Individual::default);
        (first..first + count).map(IndividualId).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// # Panics
    /// Panics if `id` does not belong to this population.
    #[must_use]
    pub fn get(&self, id: IndividualId) -> &Individual {
        self.individuals
            .get(id.0)
            .unwrap_or_else(|| panic!("individual {id} does not exist"))
    }

    fn get_mut(&mut self, id: IndividualId) -> &mut Individual {
        self.individuals
            .get_mut(id.0)
            .unwrap_or_else(|| panic!("individual {id} does not exist"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndividualId, &Individual)> {
        self.individuals
            .iter()
            .enumerate()
            .map(|(index, individual)| (IndividualId(index), individual))
    }

    /// Applies `expose_transition` to the stored individual.
    pub fn expose(
        &mut self,
        id: IndividualId,
        probability: f64,
        forced: bool,
        draw: f64,
        exposed_rate: f64,
    ) -> bool {
        let individual = self.get_mut(id);
        let (next, exposed) =
            expose_transition(*individual, probability, forced, draw, exposed_rate);
        *individual = next;
        if exposed {
            trace!("individual {id} exposed (forced={forced})");
        }
        exposed
    }

    /// Advances the days-since-exposure clock of an exposed or infectious individual.
    pub fn increment_days_since_exposure(&mut self, id: IndividualId) {
        let individual = self.get_mut(id);
        if individual.status.is_infected() {
            individual.days_since_exposure += 1;
        }
    }

    /// Promotes an exposed individual to infectious once its clock exceeds the incubation period,
    /// raising its transmission probability to the infectious rate. Returns whether it was
    /// promoted.
    pub fn activate_infectious(
        &mut self,
        id: IndividualId,
        parameters: &DiseaseParameters,
    ) -> bool {
        let individual = self.get_mut(id);
        if individual.status != HealthStatus::Exposed
            || individual.days_since_exposure <= i64::from(parameters.incubation_period)
        {
            return false;
        }
        individual.status = HealthStatus::Infectious;
        individual.transmission_probability = parameters.infectious_transmission_probability;
        trace!("individual {id} became infectious");
        true
    }

    /// Resolves an individual whose clock exceeds the active disease period. `draw` is called
    /// exactly once when the threshold has been reached, and never otherwise: a draw below
    /// the fatality probability kills the individual, any other draw recovers it.
    pub fn resolve_terminal(
        &mut self,
        id: IndividualId,
        parameters: &DiseaseParameters,
        draw: impl FnOnce() -> f64,
    ) -> Option<TerminalOutcome> {
        if !self.is_due_for_resolution(id, parameters) {
            return None;
        }
        if draw() < parameters.fatality_probability {
            self.kill(id);
            Some(TerminalOutcome::Died)
        } else {
            self.recover(id);
            Some(TerminalOutcome::Recovered)
        }
    }

    /// Whether `resolve_terminal` would draw an outcome for this individual today.
    #[must_use]
    pub fn is_due_for_resolution(&self, id: IndividualId, parameters: &DiseaseParameters) -> bool {
        let individual = self.get(id);
        !individual.status.is_terminal()
            && individual.days_since_exposure > i64::from(parameters.active_disease_period)
    }

    /// Moves a living individual to the absorbing recovered state. Deceased individuals are left
    /// untouched.
    pub fn recover(&mut self, id: IndividualId) {
        let individual = self.get_mut(id);
        if !individual.is_alive() {
            return;
        }
        individual.status = HealthStatus::Recovered;
        individual.transmission_probability = 0.0;
        trace!("individual {id} recovered");
    }

    /// Kills a living individual and freezes its clock at `DEATH_SENTINEL`.
    ///
    /// # Panics
    /// Panics if the individual is already deceased.
    pub fn kill(&mut self, id: IndividualId) {
        let individual = self.get_mut(id);
        assert!(
            individual.is_alive(),
            "individual {id} is already deceased and cannot be killed again"
        );
        individual.status = HealthStatus::Deceased;
        individual.transmission_probability = 0.0;
        individual.days_since_exposure = DEATH_SENTINEL;
        trace!("individual {id} died");
    }

    /// Places a susceptible individual directly in the infectious state, as though its
    /// incubation ended today. Returns whether the individual was changed.
    pub fn make_infectious(&mut self, id: IndividualId, parameters: &DiseaseParameters) -> bool {
        let individual = self.get_mut(id);
        if individual.status != HealthStatus::Susceptible {
            return false;
        }
        individual.status = HealthStatus::Infectious;
        individual.days_since_exposure = i64::from(parameters.incubation_period);
        individual.transmission_probability = parameters.infectious_transmission_probability;
        true
    }
}

define_data_plugin!(PopulationPlugin, Population, Population::new());

define_rng!(ExposureRng);

pub trait ContextPopulationExt {
    /// Adds `count` susceptible individuals and returns their ids in ascending order.
    fn add_individuals(&mut self, count: usize) -> Vec<IndividualId>;

    fn population_size(&self) -> usize;

    /// # Panics
    /// Panics if `id` does not exist.
    fn get_individual(&self, id: IndividualId) -> Individual;

    fn get_population(&self) -> Option<&Population>;

    /// Exposes `id` with the given probability, or unconditionally when `forced`. Draws from the
    /// exposure stream only when a draw can change the outcome.
    ///
    /// # Errors
    /// Returns an error if `DiseaseParams` has not been set, or a draw is needed before
    /// `init_random`.
    fn expose_individual(
        &mut self,
        id: IndividualId,
        probability: f64,
        forced: bool,
    ) -> Result<bool, EpiError>;

    /// # Panics
    /// Panics if the individual is already deceased.
    fn kill_individual(&mut self, id: IndividualId);

    fn recover_individual(&mut self, id: IndividualId);
}

impl ContextPopulationExt for Context {
    fn add_individuals(&mut self, count: usize) -> Vec<IndividualId> {
        self.get_data_container_mut(PopulationPlugin)
            .add_individuals(count)
    }

    fn population_size(&self) -> usize {
        self.get_population().map_or(0, Population::len)
    }

    fn get_individual(&self, id: IndividualId) -> Individual {
        match self.get_population() {
            Some(population) => *population.get(id),
            None => panic!("individual {id} does not exist"),
        }
    }

    fn get_population(&self) -> Option<&Population> {
        self.get_data_container(PopulationPlugin)
    }

    fn expose_individual(
        &mut self,
        id: IndividualId,
        probability: f64,
        forced: bool,
    ) -> Result<bool, EpiError> {
        let exposed_rate = disease_parameters(self)?.exposed_transmission_probability;
        let eligible = self.get_individual(id).status == HealthStatus::Susceptible;
        let draw = if eligible && !forced {
            if !self.is_random_initialized() {
                return Err(EpiError::from(
                    "random streams must be initialized before drawing exposures",
                ));
            }
            self.sample_uniform(ExposureRng)
        } else {
            0.0
        };
        Ok(self
            .get_data_container_mut(PopulationPlugin)
            .expose(id, probability, forced, draw, exposed_rate))
    }

    fn kill_individual(&mut self, id: IndividualId) {
        self.get_data_container_mut(PopulationPlugin).kill(id);
    }

    fn recover_individual(&mut self, id: IndividualId) {
        self.get_data_container_mut(PopulationPlugin).recover(id);
    }
}

pub(crate) fn population_mut(context: &mut Context) -> &mut Population {
    context.get_data_container_mut(PopulationPlugin)
}
