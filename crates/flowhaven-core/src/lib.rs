pub mod assets;
pub mod config;
pub mod envfile;
pub mod error;
pub mod template;

pub use config::*;
pub use envfile::*;
pub use error::*;
pub use template::*;
