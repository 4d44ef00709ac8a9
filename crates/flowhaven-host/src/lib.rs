pub mod certbot;
pub mod compose;
pub mod error;
pub mod firewall;
pub mod paths;
pub mod pkg;
pub mod prepare;
pub mod proxy;
pub mod runner;
pub mod stage;
pub mod systemd;

pub use certbot::*;
pub use compose::*;
pub use error::*;
pub use firewall::*;
pub use paths::*;
pub use pkg::*;
pub use prepare::*;
pub use proxy::*;
pub use runner::{CommandOutput, CommandRunner, SystemRunner, format_command};
pub use stage::*;
pub use systemd::*;
