pub mod config;
pub mod workbench;

pub use config::*;
pub use workbench::*;
