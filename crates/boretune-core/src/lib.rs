pub mod multistart;
pub mod objective;
pub mod optimize;
pub mod range_processor;
pub mod shape;

pub use multistart::*;
pub use objective::*;
pub use optimize::*;
pub use range_processor::*;
pub use shape::*;
