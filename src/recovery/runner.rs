use chrono::Utc;
use colored::*;
use indicatif::ProgressBar;
use tracing::{error, info};

use crate::{
    auth::{int_to_base36, ResetTokenIssuer},
    config::SiteConfig,
    error::Result,
    input::RecoveryRow,
    notify::{MessageContext, MessageDispatcher, PasswordReset, Recipient},
    storage::{Database, RecoveryOperation, RecoveryOutcome},
};

/// Processes recovery rows one at a time, in file order. A failing row is
/// logged and recorded, never aborts the run.
pub struct RecoveryRunner<'a> {
    db: &'a Database,
    dispatcher: &'a dyn MessageDispatcher,
    tokens: ResetTokenIssuer,
    site: &'a SiteConfig,
}

impl<'a> RecoveryRunner<'a> {
    pub fn new(
        db: &'a Database,
        dispatcher: &'a dyn MessageDispatcher,
        tokens: ResetTokenIssuer,
        site: &'a SiteConfig,
    ) -> Self {
        Self {
            db,
            dispatcher,
            tokens,
            site,
        }
    }

    pub async fn process_all(&self, rows: &[RecoveryRow]) -> RecoverySummary {
        info!("Processing {} recovery rows", rows.len());

        let mut summary = RecoverySummary::default();
        summary.total_rows = rows.len();

        let pb = ProgressBar::new(rows.len() as u64);

        for row in rows {
            match self.process_row(row).await {
                Ok(()) => {
                    summary.successful_updates.push(row.new_email.clone());
                    let _ = self.db.save_recovery_operation(&RecoveryOperation {
                        id: 0,
                        username: row.username.clone(),
                        old_email: row.email.clone(),
                        new_email: row.new_email.clone(),
                        outcome: RecoveryOutcome::Succeeded,
                        detail: None,
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => {
                    error!("Unable to recover account for {}: {}", row.email, e);
                    summary.failed_updates.push(row.email.clone());
                    let _ = self.db.save_recovery_operation(&RecoveryOperation {
                        id: 0,
                        username: row.username.clone(),
                        old_email: row.email.clone(),
                        new_email: row.new_email.clone(),
                        outcome: RecoveryOutcome::Failed,
                        detail: Some(e.to_string()),
                        timestamp: Utc::now(),
                    });
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();

        info!(
            "Successfully updated accounts: {:?}. Failed to update accounts: {:?}",
            summary.successful_updates, summary.failed_updates
        );

        summary
    }

    /// Lookup, mutate, notify for a single row. The email change commits
    /// before the notification is attempted; if the send then fails, the
    /// change is kept and the row still counts as failed.
    async fn process_row(&self, row: &RecoveryRow) -> Result<()> {
        let account = self.db.find_account(&row.username, &row.email)?;

        // Refreshed record so the token binds to the persisted state
        let account = self.db.update_email(&account, &row.new_email)?;

        let token = self.tokens.issue(&account);
        let reset_link = self
            .site
            .password_reset_link(&int_to_base36(account.id.max(0) as u64), &token);

        let language = self
            .db
            .language_preference(account.id)?
            .unwrap_or_else(|| self.site.default_language.clone());

        // The reset message goes to the OLD address on purpose: this tool
        // repairs taken-over accounts, and the old address is the one the
        // legitimate owner is still expected to control.
        let context = MessageContext {
            platform_name: self.site.platform_name.clone(),
            site_name: self.site.site_name.clone(),
            email: row.email.clone(),
            reset_link,
        };
        let message = PasswordReset.personalize(
            Recipient::new(&account.username, &row.email),
            &language,
            &context,
        );

        self.dispatcher.send(message).await?;
        Ok(())
    }
}

/// Outcome lists for one batch run. Discarded after the summary log; the
/// durable trail lives in the recovery_operations table.
#[derive(Debug, Default)]
pub struct RecoverySummary {
    pub total_rows: usize,
    pub successful_updates: Vec<String>,
    pub failed_updates: Vec<String>,
}

impl RecoverySummary {
    /// Print a formatted summary to console
    pub fn print_summary(&self) {
        println!("\n{}", "=== Recovery Batch Summary ===".cyan().bold());
        println!("Total Rows:   {}", self.total_rows);
        println!(
            "Successful:   {} ✓",
            self.successful_updates.len().to_string().green()
        );
        println!(
            "Failed:       {} ✗",
            self.failed_updates.len().to_string().red()
        );
        println!("{}", "==============================".cyan());
    }

    /// Get success rate as percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            (self.successful_updates.len() as f64 / self.total_rows as f64) * 100.0
        }
    }
}
