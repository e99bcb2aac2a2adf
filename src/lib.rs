pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod notify;
pub mod recovery;
pub mod storage;

pub use config::Config;
pub use error::{RecoverError, Result};
