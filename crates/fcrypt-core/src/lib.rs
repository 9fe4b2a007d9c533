pub mod config;
pub mod error;

pub use config::FcryptConfig;
pub use error::{check_platform, FcryptError, FcryptResult};
