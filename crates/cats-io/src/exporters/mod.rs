//! CSV writers for the reduced tables.
//!
//! Every output of a run is written into an [`OutputStage`] first and moved
//! into the output directory only once all of them succeeded.

pub mod staging;
pub mod tables;

pub use staging::OutputStage;
pub use tables::{
    write_aggregated_lines, write_buses, write_gens, write_generators, write_lines,
    BUSES_FILE, GENERATORS_FILE, GENS_FILE, LINES_FILE, LOADS_FILE, VARIABILITY_FILE,
};
