pub mod db;
pub mod models;

pub use db::{Database, RecoveryStats, LANGUAGE_KEY};
pub use models::{Account, RecoveryOperation, RecoveryOutcome};
