//! The contact network: a fixed, symmetric neighbor relation over the population.
//!
//! The network only records who can transmit to whom. It is built before the first simulated
//! day, either edge by edge with `add_contact` or from a CSV edge list, and is frozen once the
//! epidemic starts stepping.
use std::path::Path;

use serde::Deserialize;

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::EpiError;
use crate::population::{ContextPopulationExt, IndividualId};

struct NetworkData {
    // Neighbor lists indexed by individual id, in insertion order.
    neighbors: Vec<Vec<IndividualId>>,
    contact_count: usize,
    frozen: bool,
}

impl NetworkData {
    fn new() -> Self {
        NetworkData {
            neighbors: Vec::new(),
            contact_count: 0,
            frozen: false,
        }
    }

    fn add_contact(
        &mut self,
        person: IndividualId,
        neighbor: IndividualId,
        population_size: usize,
    ) -> Result<(), EpiError> {
        if self.frozen {
            return Err(EpiError::InvalidContact(String::from(
                "Contact network is frozen once the simulation has started",
            )));
        }

        if person == neighbor {
            return Err(EpiError::InvalidContact(String::from(
                "Cannot make contact to self",
            )));
        }

        for id in [person, neighbor] {
            if id.id() >= population_size {
                return Err(EpiError::InvalidContact(format!(
                    "Individual {id} does not exist"
                )));
            }
        }

        // Make sure we have data for both individuals.
        let needed = person.id().max(neighbor.id()) + 1;
        if needed > self.neighbors.len() {
            self.neighbors.resize_with(needed, Vec::new);
        }

        if self.neighbors[person.id()].contains(&neighbor) {
            return Err(EpiError::InvalidContact(format!(
                "Contact {person}-{neighbor} already exists"
            )));
        }

        self.neighbors[person.id()].push(neighbor);
        self.neighbors[neighbor.id()].push(person);
        self.contact_count += 1;
        Ok(())
    }

    fn get_contacts(&self, person: IndividualId) -> &[IndividualId] {
        match self.neighbors.get(person.id()) {
            Some(neighbors) => neighbors,
            None => &[],
        }
    }
}

define_data_plugin!(NetworkPlugin, NetworkData, NetworkData::new());

#[derive(Deserialize, Debug)]
struct ContactRecord {
    source: usize,
    target: usize,
}

pub trait ContextNetworkExt {
    /// Adds a symmetric contact between two existing individuals.
    ///
    /// # Errors
    /// Returns `EpiError::InvalidContact` for self contacts, duplicate contacts, unknown
    /// individuals, or when the network is frozen.
    fn add_contact(&mut self, person: IndividualId, neighbor: IndividualId) -> Result<(), EpiError>;

    /// Returns the contacts of `person` in the order they were added.
    fn get_contacts(&self, person: IndividualId) -> &[IndividualId];

    /// The number of (undirected) contacts in the network.
    fn contact_count(&self) -> usize;

    /// Reads a prebuilt edge list with `source,target` columns, where each value is an
    /// individual index.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or any contact is invalid.
    fn load_contacts_from_csv(&mut self, file_path: &Path) -> Result<usize, EpiError>;

    /// Prevents any further change to the network.
    fn freeze_network(&mut self);
}

impl ContextNetworkExt for Context {
    fn add_contact(
        &mut self,
        person: IndividualId,
        neighbor: IndividualId,
    ) -> Result<(), EpiError> {
        let population_size = self.population_size();
        self.get_data_container_mut(NetworkPlugin)
            .add_contact(person, neighbor, population_size)
    }

    fn get_contacts(&self, person: IndividualId) -> &[IndividualId] {
        match self.get_data_container(NetworkPlugin) {
            None => &[],
            Some(data_container) => data_container.get_contacts(person),
        }
    }

    fn contact_count(&self) -> usize {
        self.get_data_container(NetworkPlugin)
            .map_or(0, |data_container| data_container.contact_count)
    }

    fn load_contacts_from_csv(&mut self, file_path: &Path) -> Result<usize, EpiError> {
        let mut reader = csv::Reader::from_path(file_path)?;
        let mut loaded = 0;
        for result in reader.deserialize() {
            let record: ContactRecord = result?;
            self.add_contact(IndividualId(record.source), IndividualId(record.target))?;
            loaded += 1;
        }
        Ok(loaded)
    }

    fn freeze_network(&mut self) {
        self.get_data_container_mut(NetworkPlugin).frozen = true;
    }
}


#[cfg(test)]
// Tests for the API.
mod test_api {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use crate::context::Context;
    use crate::error::EpiError;
    use crate::network::ContextNetworkExt;
    use crate::population::{ContextPopulationExt, IndividualId};

    fn setup() -> (Context, Vec<IndividualId>) {
        let mut context = Context::new();
        let people = context.add_individuals(4);
        (context, people)
    }

    #[test]
    fn add_contact() {
        let (mut context, people) = setup();

        context.add_contact(people[0], people[1]).unwrap();
        assert_eq!(context.get_contacts(people[0]), &[people[1]]);
        assert_eq!(context.get_contacts(people[1]), &[people[0]]);
        assert_eq!(context.contact_count(), 1);
    }

    #[test]
    fn empty_network() {
        let (context, people) = setup();
        assert!(context.get_contacts(people[0]).is_empty());
        assert_eq!(context.contact_count(), 0);
    }

    #[test]
    fn contact_requires_existing_individuals() {
        let mut context = Context::new();
        assert!(matches!(
            context.add_contact(IndividualId(0), IndividualId(1)),
            Err(EpiError::InvalidContact(_))
        ));
    }

    #[test]
    fn freeze_network() {
        let (mut context, people) = setup();
        context.add_contact(people[0], people[1]).unwrap();
        context.freeze_network();
        assert!(matches!(
            context.add_contact(people[2], people[3]),
            Err(EpiError::InvalidContact(_))
        ));
        assert_eq!(context.contact_count(), 1);
    }

    #[test]
    fn load_contacts_from_csv() {
        let (mut context, people) = setup();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "source,target\n0,1\n1,2\n2,3\n3,0").unwrap();

        let loaded = context.load_contacts_from_csv(file.path()).unwrap();
        assert_eq!(loaded, 4);
        assert_eq!(context.get_contacts(people[0]), &[people[1], people[3]]);
        assert_eq!(context.get_contacts(people[2]), &[people[1], people[3]]);
    }

    #[test]
    fn load_contacts_with_unknown_individual() {
        let (mut context, _) = setup();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "source,target\n0,1\n1,9").unwrap();

        assert!(matches!(
            context.load_contacts_from_csv(file.path()),
            Err(EpiError::InvalidContact(_))
        ));
    }

    #[test]
    fn load_contacts_with_malformed_row() {
        let (mut context, _) = setup();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "source,target\n0,one").unwrap();

        assert!(matches!(
            context.load_contacts_from_csv(file.path()),
            Err(EpiError::CsvError(_))
        ));
    }
}
