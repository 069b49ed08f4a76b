//! # cats-algo: service-area subsetting of the CATS grid
//!
//! Turns the full CATS network into a small, self-consistent test system for
//! one utility's service area.
//!
//! ## Stages
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Area selection | [`area`] | retained buses `N`, import buses `N_import` |
//! | Line reduction | [`lines`] | mirrored lines, or aggregated corridors |
//! | Generator reduction | [`gens`] | retained units plus one import unit per import bus |
//! | Load reduction | [`loads`] | scoped loads, imports zeroed, representative days |
//! | Capacity factors | [`variability`] | one series per generator |
//! | Renumbering | [`reindex`] | buses `1..=N` across every table |
//!
//! [`pipeline::run_study`] strings the stages together from a
//! [`config::StudyConfig`] and writes the outputs all at once.
//!
//! ## Example
//!
//! ```no_run
//! use cats_algo::{run_study, StudyConfig};
//! use std::path::Path;
//!
//! let config = StudyConfig::load_from(Path::new("study.toml"))?;
//! let summary = run_study(&config)?;
//! println!("{summary}");
//! # Ok::<(), cats_core::CatsError>(())
//! ```

pub mod area;
pub mod config;
pub mod gens;
pub mod lines;
pub mod loads;
pub mod pipeline;
pub mod reindex;
pub mod variability;

pub use area::{area_islands, select_area, AreaSelection, SpatialFilter};
pub use config::{StudyConfig, Variant};
pub use pipeline::{reduce, run_study, InputTables, LineOutput, ReducedSystem, SubsetSummary};
pub use reindex::BusIndexMap;
