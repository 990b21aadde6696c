pub mod cents;
pub mod evaluator;
pub mod stats;
pub mod tuner;

pub use cents::*;
pub use evaluator::*;
pub use stats::*;
pub use tuner::*;
