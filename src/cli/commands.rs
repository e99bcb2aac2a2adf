use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "account-recover")]
#[command(about = "Batch account recovery: update email addresses and send password reset notifications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Change the email address of each account listed in the csv file and
    /// send a password reset message to the old address.
    ///
    /// The csv file is expected to have one row per account with the
    /// columns: username, email, new_email.
    Run {
        /// Csv file path
        #[arg(long, required = true)]
        csv_file_path: String,
    },

    /// Initialize database and configuration
    Init,

    /// Show statistics for past recovery runs
    Stats {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}
