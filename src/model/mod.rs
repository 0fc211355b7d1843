pub mod board;
pub mod config;
pub mod issue;
pub mod stats;

pub use board::*;
pub use config::*;
pub use issue::*;
pub use stats::*;
