//! CSV output for report rows such as `DailyCounts`.
//!
//! A report type is registered with a file path once; every row sent afterwards is appended to
//! that file and flushed, so a partially completed run still leaves its rows on disk.
use std::any::TypeId;
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::Path;

use csv::Writer;

use crate::context::Context;
use crate::error::EpiError;
use crate::{define_data_plugin, HashMap};

pub trait Report: 'static {
    // Serializes the data with the correct writer
    fn serialize(&self, writer: &mut Writer<File>) -> Result<(), csv::Error>;
}

/// Use this macro to make a `Serialize` type usable as a report row
#[macro_export]
macro_rules! define_report {
    ($name:ident) => {
        impl $crate::report::Report for $name {
            fn serialize(
                &self,
                writer: &mut $crate::csv::Writer<std::fs::File>,
            ) -> Result<(), $crate::csv::Error> {
                writer.serialize(self)
            }
        }
    };
}
pub use define_report;

struct ReportData {
    file_writers: HashMap<TypeId, Writer<File>>,
}

// Maps each report type to the writer of its file.
define_data_plugin!(
    ReportPlugin,
    ReportData,
    ReportData {
        file_writers: HashMap::default(),
    }
);

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist. Returns the file if successful. Called by `add_report`
fn generate_validate_filepath(path: &Path) -> Result<File, EpiError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Ok(file)
        }
        _ => Err(EpiError::ReportError(
            "Report output files must be CSVs".to_string(),
        )),
    }
}

pub trait ContextReportExt {
    /// Registers report type `T` to be written to the CSV file at `file_path`, replacing any
    /// earlier file for the same type.
    ///
    /// # Errors
    /// Returns an `EpiError` if the path is not a `.csv` file or cannot be created.
    fn add_report<T: Report>(&mut self, file_path: &Path) -> Result<(), EpiError>;

    fn has_report<T: Report>(&self) -> bool;

    /// Writes a new row with columns following the fields of the report struct
    /// to the file registered for its type.
    ///
    /// # Errors
    /// Returns an `EpiError` if no file was registered for the type or writing fails.
    fn send_report<T: Report>(&mut self, report: &T) -> Result<(), EpiError>;
}

impl ContextReportExt for Context {
    fn add_report<T: Report>(&mut self, file_path: &Path) -> Result<(), EpiError> {
        let file = generate_validate_filepath(file_path)?;
        let data_container = self.get_data_container_mut(ReportPlugin);
        data_container
            .file_writers
            .insert(TypeId::of::<T>(), Writer::from_writer(file));
        Ok(())
    }

    fn has_report<T: Report>(&self) -> bool {
        self.get_data_container(ReportPlugin).is_some_and(|data_container| {
            data_container
                .file_writers
                .contains_key(&TypeId::of::<T>())
        })
    }

    fn send_report<T: Report>(&mut self, report: &T) -> Result<(), EpiError> {
        let writer = self
            .get_data_container_mut(ReportPlugin)
            .file_writers
            .get_mut(&TypeId::of::<T>())
            .ok_or_else(|| {
                EpiError::ReportError("No writer found for the report type".to_string())
            })?;
        report.serialize(writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Serialize, Deserialize)]
    struct SampleReport {
        id: u32,
        value: String,
    }

    define_report!(SampleReport);

    #[test]
    fn add_and_send_report() {
        let mut context = Context::new();
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("sample_report.csv");
        context.add_report::<SampleReport>(&file_path).unwrap();
        assert!(context.has_report::<SampleReport>());

        let report = SampleReport {
            id: 1,
            value: "Test Value".to_string(),
        };
        context.send_report(&report).unwrap();

        assert!(file_path.exists(), "CSV file should exist");
        let mut reader = csv::Reader::from_path(file_path).unwrap();
        let records: Vec<SampleReport> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].value, "Test Value");
    }

    #[test]
    fn directory_creation_writing_works() {
        let mut context = Context::new();
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test-temp").join("sample_report.csv");
        context.add_report::<SampleReport>(&file_path).unwrap();
        context
            .send_report(&SampleReport {
                id: 1,
                value: "Value,1".to_string(),
            })
            .unwrap();
        context
            .send_report(&SampleReport {
                id: 2,
                value: "Value\n2".to_string(),
            })
            .unwrap();

        let mut reader = csv::Reader::from_path(file_path).unwrap();
        let records: Vec<SampleReport> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value, "Value,1");
        assert_eq!(records[1].value, "Value\n2");
    }

    #[test]
    fn only_csvs_allowed() {
        let temp_dir = tempdir().unwrap();
        let res = generate_validate_filepath(&temp_dir.path().join("sample_report.tsv"));
        assert!(matches!(res, Err(EpiError::ReportError(_))));
    }

    #[test]
    fn send_report_without_adding_report() {
        let mut context = Context::new();
        assert!(!context.has_report::<SampleReport>());
        let result = context.send_report(&SampleReport {
            id: 1,
            value: "Test Value".to_string(),
        });
        assert!(matches!(result, Err(EpiError::ReportError(_))));
    }
}
