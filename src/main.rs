use clap::Parser;
use colored::*;
use tracing::{error, info};

use account_recover::{
    auth::ResetTokenIssuer,
    cli::{Cli, Commands},
    config::Config,
    error, input,
    notify::{HttpDispatcher, MessageDispatcher, NullDispatcher},
    recovery::RecoveryRunner,
    storage::Database,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("account_recover=debug,info")
        .init();

    let cli = Cli::parse();

    let config = match Config::load_from(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run { csv_file_path } => {
            info!("Processing recovery file: {}", csv_file_path);
            run_recovery(&config, &csv_file_path).await
        }

        Commands::Init => {
            info!("Initializing...");
            initialize(&config).await
        }

        Commands::Stats { format } => {
            info!("Generating statistics...");
            show_stats(&config, &format).await
        }
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

/// Row failures never make this return an error: the run exits 0 as long
/// as the file could be read and the database opened.
async fn run_recovery(config: &Config, csv_file_path: &str) -> error::Result<()> {
    let rows = input::read_rows(csv_file_path)?;
    println!("{}", format!("Loaded {} recovery rows", rows.len()).cyan());

    let db = Database::new(&config.database.path)?;
    let tokens = ResetTokenIssuer::new(&config.site.token_secret, config.site.token_ttl_hours);

    let dispatcher: Box<dyn MessageDispatcher> = if config.notifier.enabled {
        Box::new(HttpDispatcher::new(&config.notifier)?)
    } else {
        println!("{}", "Notifications disabled in config".yellow());
        Box::new(NullDispatcher)
    };

    let runner = RecoveryRunner::new(&db, dispatcher.as_ref(), tokens, &config.site);
    let summary = runner.process_all(&rows).await;

    summary.print_summary();
    Ok(())
}

async fn initialize(config: &Config) -> error::Result<()> {
    println!("{}", "Initializing account recovery tool...".green());
    let _db = Database::new(&config.database.path)?;
    println!("{}", "✓ Database initialized".green());
    println!("{}", "✓ Configuration loaded".green());
    println!("\n{}", "Configuration:".cyan());
    println!("  Platform:       {}", config.site.platform_name);
    println!("  Site:           {}", config.site.site_name);
    println!("  Database:       {}", config.database.path);
    println!("  Delivery:       {}", config.notifier.endpoint);
    println!("  Notifications:  {}", config.notifier.enabled);
    println!("  Token TTL:      {} hours", config.site.token_ttl_hours);

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!(
        "  {} to process a recovery file",
        "account-recover run --csv-file-path accounts.csv".yellow()
    );
    println!("  {} to view statistics", "account-recover stats".yellow());
    Ok(())
}

async fn show_stats(config: &Config, format: &str) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    let stats = db.get_stats()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "=== Account Recovery Statistics ===".cyan().bold());
    println!("\nAccounts:");
    println!("  Total:      {}", stats.total_accounts);

    println!("\nRecovery Operations:");
    println!("  Total:      {}", stats.total_operations);
    println!("  Succeeded:  {}", stats.succeeded.to_string().green());
    println!("  Failed:     {}", stats.failed.to_string().red());

    let history = db.get_recovery_history(Some(10))?;
    if !history.is_empty() {
        println!("\n{}", "Recent Recovery Operations:".yellow());
        for op in history {
            println!(
                "  {}  {}  {} -> {}  [{}]",
                op.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                op.username,
                op.old_email,
                op.new_email,
                op.outcome
            );
        }
    }

    Ok(())
}
