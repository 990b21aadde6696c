pub mod optimizer;
pub mod storage;
pub mod types;

pub use optimizer::*;
pub use storage::*;
pub use types::*;
