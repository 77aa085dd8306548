pub mod config;
pub mod config_loader;
pub mod error;
pub mod logging;
pub mod traits;

pub use config::*;
pub use config_loader::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
