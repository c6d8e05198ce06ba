pub mod config_manager;
pub mod program;
pub mod taxonomy;

pub use config_manager::*;
pub use program::*;
pub use taxonomy::*;
