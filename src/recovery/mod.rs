pub mod runner;

pub use runner::{RecoveryRunner, RecoverySummary};
