pub mod algebra;
pub mod bore_section;
pub mod calculator;
pub mod hole;
pub mod mouthpiece;
pub mod playing_range;
pub mod solver;
pub mod termination;
pub mod tube;

pub use algebra::*;
pub use bore_section::*;
pub use calculator::*;
pub use hole::*;
pub use mouthpiece::*;
pub use playing_range::*;
pub use solver::{brent_minimize, brent_root, SolverError};
pub use termination::*;
