//! Loaders for the CATS network tables.
//!
//! Each loader validates the required columns of its table before reading a
//! single row, then returns typed rows numbered the CATS way (1-based row
//! position when the table carries no explicit id column).

pub mod buses;
pub mod gencost;
pub mod generators;
pub mod lines;
pub mod loads;

pub use buses::load_buses;
pub use gencost::load_gencost;
pub use generators::load_generators;
pub use lines::load_lines;
pub use loads::{load_cats_loads, load_loads, parse_real_part, LoadFormat};
