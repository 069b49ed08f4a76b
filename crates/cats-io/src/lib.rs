//! # cats-io: table loading and output writing
//!
//! Thin collaborators around the subsetting algorithms:
//!
//! - [`schema`]: CSV tables with lowercased headers and required-column checks
//! - [`tables`]: typed loaders for buses, lines, generators, gencost and loads
//! - [`area`]: GeoJSON service-area boundaries and intersection predicates
//! - [`exporters`]: CSV writers and the all-or-nothing [`OutputStage`]
//!
//! Loaders return `anyhow::Result` with the file named in the context chain;
//! schema violations surface as [`cats_core::CatsError::MissingColumn`].
//!
//! ```rust,no_run
//! use cats_io::{load_buses, load_lines};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let buses = load_buses(Path::new("CATS_buses.csv"))?;
//!     let lines = load_lines(Path::new("CATS_lines.csv"))?;
//!     println!("{} buses, {} lines", buses.len(), lines.len());
//!     Ok(())
//! }
//! ```

pub mod area;
pub mod exporters;
pub mod schema;
pub mod tables;

pub use area::{load_service_area, ServiceArea};
pub use exporters::OutputStage;
pub use schema::CsvTable;
pub use tables::{
    load_buses, load_cats_loads, load_gencost, load_generators, load_lines, load_loads,
    parse_real_part, LoadFormat,
};
