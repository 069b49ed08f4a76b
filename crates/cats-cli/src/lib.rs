//! Command-line front end for the CATS service-area subsetting pipeline.

pub mod cli;
pub mod manifest;
