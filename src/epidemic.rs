//! The epidemic stepper: seeding and the daily sweep.
//!
//! One simulated day is one pass over the population in ascending `IndividualId` order. Each
//! individual is advanced completely before it transmits:
//!
//! 1. an exposed or infectious individual's clock advances by one day;
//! 2. an exposed individual past the incubation period becomes infectious;
//! 3. an individual past the active disease period recovers or dies;
//! 4. an infectious individual tries to expose each living contact.
//!
//! Because transmission comes last, an individual promoted in step 2 transmits on the day of its
//! promotion at the infectious rate. Contacts exposed earlier in the sweep than their own visit
//! start their clock on the same day; contacts visited earlier start it the following day.
use log::{info, trace};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::EpiError;
use crate::network::ContextNetworkExt;
use crate::parameters::{disease_parameters, set_disease_parameters, DiseaseParameters};
use crate::population::{
    population_mut, ContextPopulationExt, HealthStatus, IndividualId, Population,
};
use crate::random::ContextRandomExt;
use crate::report::ContextReportExt;
use crate::{define_data_plugin, define_report, define_rng};

define_rng!(InteractionRng);
define_rng!(OutcomeRng);
define_rng!(SeedingRng);

/// Aggregate counts of the population at the end of a day. Every living individual is in
/// exactly one of the susceptible, exposed, infectious or recovered buckets.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailyCounts {
    pub day: u32,
    pub alive: usize,
    pub susceptible: usize,
    pub exposed: usize,
    pub infectious: usize,
    pub recovered: usize,
    pub deceased: usize,
}

define_report!(DailyCounts);

impl DailyCounts {
    /// Tallies `population`. This is a read-only projection and never feeds back into the
    /// transition logic.
    #[must_use]
    pub fn tally(day: u32, population: &Population) -> Self {
        let mut counts = DailyCounts {
            day,
            ..Default::default()
        };
        for (_, individual) in population.iter() {
            match individual.status() {
                HealthStatus::Susceptible => counts.susceptible += 1,
                HealthStatus::Exposed => counts.exposed += 1,
                HealthStatus::Infectious => counts.infectious += 1,
                HealthStatus::Recovered => counts.recovered += 1,
                HealthStatus::Deceased => counts.deceased += 1,
            }
        }
        counts.alive = population.len() - counts.deceased;
        counts
    }
}

define_data_plugin!(TimeSeriesPlugin, Vec<DailyCounts>, Vec::new());

/// Advances one individual through steps 1-4 of the daily procedure.
fn step_individual(
    context: &mut Context,
    id: IndividualId,
    parameters: &DiseaseParameters,
    day: u32,
) -> Result<(), EpiError> {
    let population = population_mut(context);
    population.increment_days_since_exposure(id);
    population.activate_infectious(id, parameters);

    if population.is_due_for_resolution(id, parameters) {
        let draw = context.sample_uniform(OutcomeRng);
        let outcome = population_mut(context).resolve_terminal(id, parameters, || draw);
        trace!("individual {id} reached terminal outcome {outcome:?} on day {day}");
    }

    let infector = context.get_individual(id);
    if infector.status() != HealthStatus::Infectious {
        return Ok(());
    }

    // The network is frozen while stepping, so the contact list cannot change under us.
    let contacts = context.get_contacts(id).to_vec();
    for contact in contacts {
        if !context.get_individual(contact).is_alive() {
            continue;
        }
        if !context.sample_bool(InteractionRng, parameters.interaction_probability) {
            continue;
        }
        if context.expose_individual(contact, infector.transmission_probability(), false)? {
            trace!("individual {id} exposed individual {contact} on day {day}");
        }
    }
    Ok(())
}

pub trait ContextEpidemicExt {
    /// Stores the parameters and initializes the random streams from `parameters.seed`. Calling
    /// it again with equal parameters is a no-op and does not rewind the streams.
    ///
    /// # Errors
    /// Returns an error if the parameters are invalid or differ from ones already set.
    fn init_epidemic(&mut self, parameters: DiseaseParameters) -> Result<(), EpiError>;

    /// Force-exposes `floor(ratio * population)` individuals chosen without replacement. A
    /// nonzero ratio always seeds at least one individual: if the count rounds to zero,
    /// individual 0 is seeded. Returns the seeded ids in ascending order.
    ///
    /// # Errors
    /// Returns an error if the population is empty, the ratio is not in `[0, 1]`, or the
    /// parameters or random streams have not been set up.
    fn seed_infections(&mut self, ratio: f64) -> Result<Vec<IndividualId>, EpiError>;

    /// `seed_infections` with the configured `initial_infection_ratio`.
    ///
    /// # Errors
    /// Same as `seed_infections`.
    fn seed_initial_infections(&mut self) -> Result<Vec<IndividualId>, EpiError>;

    /// Force-exposes the given individuals.
    ///
    /// # Errors
    /// Returns an error if any id is unknown or the parameters have not been set.
    fn seed_individuals(&mut self, ids: &[IndividualId]) -> Result<(), EpiError>;

    /// Places a susceptible individual directly in the infectious state.
    ///
    /// # Errors
    /// Returns an error if the id is unknown or the parameters have not been set.
    fn seed_infectious(&mut self, id: IndividualId) -> Result<(), EpiError>;

    /// Advances every individual by exactly one day and returns the counts at the end of it.
    /// The first step freezes the contact network.
    ///
    /// # Errors
    /// Returns an error if the parameters or random streams have not been set up, in which case
    /// nobody is advanced, or if the daily report cannot be written.
    fn step_day(&mut self) -> Result<DailyCounts, EpiError>;

    /// Steps `days` days and returns their counts in order.
    ///
    /// # Errors
    /// Returns the first error from `step_day`.
    fn run_days(&mut self, days: u32) -> Result<Vec<DailyCounts>, EpiError>;

    /// Counts the population as it stands now.
    fn count_population(&self) -> DailyCounts;

    /// The counts of every day stepped so far.
    fn get_time_series(&self) -> &[DailyCounts];
}

fn check_individual(context: &Context, id: IndividualId) -> Result<(), EpiError> {
    if id.id() < context.population_size() {
        Ok(())
    } else {
        Err(EpiError::EpiError(format!("individual {id} does not exist")))
    }
}

// Parameters for a step that draws randomness.
fn sampling_parameters(context: &Context) -> Result<DiseaseParameters, EpiError> {
    let parameters = disease_parameters(context)?;
    if !context.is_random_initialized() {
        return Err(EpiError::EpiError(String::from(
            "random streams must be initialized before the simulation runs",
        )));
    }
    Ok(parameters)
}

impl ContextEpidemicExt for Context {
    fn init_epidemic(&mut self, parameters: DiseaseParameters) -> Result<(), EpiError> {
        set_disease_parameters(self, parameters)
    }

    fn seed_infections(&mut self, ratio: f64) -> Result<Vec<IndividualId>, EpiError> {
        sampling_parameters(self)?;
        if !(ratio.is_finite() && (0.0..=1.0).contains(&ratio)) {
            return Err(EpiError::EpiError(format!(
                "initial infection ratio must be in [0, 1], got {ratio}"
            )));
        }
        let population_size = self.population_size();
        if population_size == 0 {
            return Err(EpiError::EpiError(String::from(
                "cannot seed infections in an empty population",
            )));
        }

        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let requested = (ratio * population_size as f64).floor() as usize;
        let seeded: Vec<IndividualId> = if requested == 0 && ratio > 0.0 {
            vec![IndividualId(0)]
        } else {
            self.sample_without_replacement(SeedingRng, population_size, requested)
                .into_iter()
                .map(IndividualId)
                .collect()
        };

        self.seed_individuals(&seeded)?;
        info!("seeded {} of {} individuals", seeded.len(), population_size);
        Ok(seeded)
    }

    fn seed_initial_infections(&mut self) -> Result<Vec<IndividualId>, EpiError> {
        let ratio = sampling_parameters(self)?.initial_infection_ratio;
        self.seed_infections(ratio)
    }

    fn seed_individuals(&mut self, ids: &[IndividualId]) -> Result<(), EpiError> {
        for id in ids {
            check_individual(self, *id)?;
        }
        for id in ids {
            self.expose_individual(*id, 1.0, true)?;
        }
        Ok(())
    }

    fn seed_infectious(&mut self, id: IndividualId) -> Result<(), EpiError> {
        check_individual(self, id)?;
        let parameters = disease_parameters(self)?;
        population_mut(self).make_infectious(id, &parameters);
        Ok(())
    }

    fn step_day(&mut self) -> Result<DailyCounts, EpiError> {
        let parameters = sampling_parameters(self)?;
        self.freeze_network();

        let day = self.get_current_day() + 1;
        for index in 0..self.population_size() {
            step_individual(self, IndividualId(index), &parameters, day)?;
        }
        self.advance_day();

        let counts = self.count_population();
        info!(
            "day {}: alive={} susceptible={} exposed={} infectious={} recovered={} deceased={}",
            counts.day,
            counts.alive,
            counts.susceptible,
            counts.exposed,
            counts.infectious,
            counts.recovered,
            counts.deceased
        );
        self.get_data_container_mut(TimeSeriesPlugin).push(counts);
        if self.has_report::<DailyCounts>() {
            self.send_report(&counts)?;
        }
        Ok(counts)
    }

    fn run_days(&mut self, days: u32) -> Result<Vec<DailyCounts>, EpiError> {
        (0..days).map(|_| self.step_day()).collect()
    }

    fn count_population(&self) -> DailyCounts {
        let day = self.get_current_day();
        match self.get_population() {
            Some(population) => DailyCounts::tally(day, population),
            None => DailyCounts {
                day,
                ..Default::default()
            },
        }
    }

    fn get_time_series(&self) -> &[DailyCounts] {
        match self.get_data_container(TimeSeriesPlugin) {
            Some(series) => series,
            None => &[],
        }
    }
}
