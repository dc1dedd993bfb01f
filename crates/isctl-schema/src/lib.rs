//! Product vocabulary and configuration file formats for isctl.
//!
//! This crate defines the schema layer: the closed `Product` and
//! `InstanceStatus` enumerations, the `parameters.isc` key/value parser
//! (`ParameterStore`), the CPF `[Databases]` and journal-directory scanners,
//! and the two-phase in-place rewrite used to toggle `ZSTU` in a CPF file.

pub mod cpf;
pub mod parameters;
pub mod product;
pub mod rewrite;
pub mod status;
pub mod zstu;

pub use cpf::{
    find_journal_directory, load_databases, load_journal_directory, parse_databases,
    JournalDirectory, DATABASES_SECTION,
};
pub use parameters::{ParameterEntry, ParameterStore, PARAMETERS_FILE};
pub use product::{IdentityKeys, Product};
pub use rewrite::Rewrite;
pub use status::InstanceStatus;
pub use zstu::toggle_zstu;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed parameter line: {0}")]
    MalformedParameterLine(String),
    #[error("section {0} not found")]
    SectionNotFound(String),
    #[error("no line matching '{0}' found")]
    PatternNotFound(String),
}
