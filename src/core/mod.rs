pub mod config;
mod responses;
pub mod session_auth;
mod telementry;
pub mod utils;

pub use self::config::AppConfig;
pub use responses::*;
pub use telementry::*;
pub use utils::*;
