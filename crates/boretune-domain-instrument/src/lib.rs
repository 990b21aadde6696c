pub mod error;
pub mod layout;
pub mod model;
pub mod physical;
pub mod tuning;

pub use error::*;
pub use layout::*;
pub use model::*;
pub use physical::*;
pub use tuning::*;
