use epinet::population::DEATH_SENTINEL;
use epinet::prelude::*;

const POPULATION: usize = 300;

fn parameters(seed: u64) -> DiseaseParameters {
    DiseaseParameters {
        incubation_period: 3,
        active_disease_period: 9,
        fatality_probability: 0.2,
        exposed_transmission_probability: 0.05,
        infectious_transmission_probability: 0.3,
        interaction_probability: 0.8,
        initial_infection_ratio: 0.05,
        seed,
    }
}

// A ring where everybody also knows the person five places ahead.
fn build_context(seed: u64) -> Context {
    let mut context = Context::new();
    let parameters = parameters(seed);
    context.init_epidemic(parameters).unwrap();
    let people = context.add_individuals(POPULATION);
    for index in 0..POPULATION {
        context
            .add_contact(people[index], people[(index + 1) % POPULATION])
            .unwrap();
        context
            .add_contact(people[index], people[(index + 5) % POPULATION])
            .unwrap();
    }
    context.seed_initial_infections().unwrap();
    context
}

#[test]
fn same_seed_gives_identical_runs() {
    let mut first = build_context(7);
    let mut second = build_context(7);
    assert_eq!(first.run_days(60).unwrap(), second.run_days(60).unwrap());

    let statuses = |context: &Context| -> Vec<HealthStatus> {
        context
            .get_population()
            .unwrap()
            .iter()
            .map(|(_, individual)| individual.status())
            .collect()
    };
    let (first_states, second_states) = (statuses(&first), statuses(&second));
    assert_eq!(first_states, second_states);
}

#[test]
fn counts_are_consistent_and_monotone() {
    let mut context = build_context(11);
    let series = context.run_days(80).unwrap();

    for counts in &series {
        assert_eq!(
            counts.alive,
            counts.susceptible + counts.exposed + counts.infectious + counts.recovered
        );
        assert_eq!(counts.alive + counts.deceased, POPULATION);
    }
    for pair in series.windows(2) {
        let (before, after) = (pair[0], pair[1]);
        assert_eq!(after.day, before.day + 1);
        assert!(after.alive <= before.alive);
        assert!(after.deceased >= before.deceased);
        assert!(after.recovered >= before.recovered);
        assert!(after.susceptible <= before.susceptible);
    }
}

#[test]
fn transmission_probability_stays_in_bounds() {
    let mut context = build_context(3);
    let parameters = parameters(3);
    for _ in 0..40 {
        context.step_day().unwrap();
        for (id, individual) in context.get_population().unwrap().iter() {
            let probability = individual.transmission_probability();
            match individual.status() {
                HealthStatus::Exposed => {
                    assert_eq!(probability, parameters.exposed_transmission_probability, "{id}");
                }
                HealthStatus::Infectious => {
                    assert_eq!(
                        probability,
                        parameters.infectious_transmission_probability,
                        "{id}"
                    );
                }
                _ => assert_eq!(probability, 0.0, "{id}"),
            }
        }
    }
}

#[test]
fn terminal_states_are_absorbing() {
    let mut context = build_context(5);
    let mut previous: Vec<HealthStatus> = vec![HealthStatus::Susceptible; POPULATION];
    for _ in 0..60 {
        context.step_day().unwrap();
        let current: Vec<HealthStatus> = context
            .get_population()
            .unwrap()
            .iter()
            .map(|(_, individual)| individual.status())
            .collect();
        for (before, after) in previous.iter().zip(&current) {
            if before.is_terminal() {
                assert_eq!(before, after);
            }
        }
        previous = current;
    }
}

#[test]
fn clocks_never_run_backwards_and_death_is_final() {
    let mut context = build_context(13);
    let mut previous: Vec<(HealthStatus, i64)> = Vec::new();
    let mut resolved = 0;
    for _ in 0..80 {
        context.step_day().unwrap();
        let current: Vec<(HealthStatus, i64)> = context
            .get_population()
            .unwrap()
            .iter()
            .map(|(_, individual)| (individual.status(), individual.days_since_exposure()))
            .collect();
        for (index, (status, clock)) in current.iter().enumerate() {
            if *status == HealthStatus::Deceased {
                assert_eq!(*clock, DEATH_SENTINEL, "{index}");
            }
            let Some((before_status, before_clock)) = previous.get(index) else {
                continue;
            };
            if before_status.is_infected() && status.is_infected() {
                assert_eq!(*clock, before_clock + 1, "{index}");
            }
            if *before_status == HealthStatus::Deceased {
                assert_eq!(*status, HealthStatus::Deceased, "{index}");
            }
        }
        resolved = current
            .iter()
            .filter(|(status, _)| status.is_terminal())
            .count();
        previous = current;
    }
    // Every seeded case has reached its outcome by now.
    assert!(resolved >= POPULATION / 20);
}

#[test]
fn certain_transmission_reaches_everyone_connected() {
    let mut context = Context::new();
    context
        .init_epidemic(DiseaseParameters {
            fatality_probability: 0.0,
            infectious_transmission_probability: 1.0,
            ..Default::default()
        })
        .unwrap();
    let people = context.add_individuals(10);
    for pair in people.windows(2) {
        context.add_contact(pair[0], pair[1]).unwrap();
    }
    context.seed_individuals(&[people[9]]).unwrap();
    context.run_days(200).unwrap();
    assert_eq!(context.count_population().recovered, 10);
}
