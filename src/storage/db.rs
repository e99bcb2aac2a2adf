use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::{
    error::{RecoverError, Result},
    storage::models::{Account, RecoveryOperation, RecoveryOutcome},
};

/// Preference key holding an account's preferred language code.
pub const LANGUAGE_KEY: &str = "pref-lang";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS account_preferences (
                account_id INTEGER NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (account_id, key),
                FOREIGN KEY (account_id) REFERENCES accounts(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS recovery_operations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                old_email TEXT NOT NULL,
                new_email TEXT NOT NULL,
                outcome TEXT NOT NULL,
                detail TEXT,
                timestamp TEXT NOT NULL
            )",
            [],
        )?;

        // Lookups match the stored email case-insensitively
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_accounts_email
             ON accounts(email COLLATE NOCASE)",
            [],
        )?;

        Ok(())
    }

    pub fn save_account(&self, account: &Account) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO accounts
             (username, email, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.username,
                account.email,
                account.password_hash,
                account.created_at.to_rfc3339(),
                account.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Resolve exactly one account whose username matches, or whose email
    /// matches case-insensitively. Zero matches and multiple matches are
    /// distinct errors so callers can tell the failure modes apart.
    pub fn find_account(&self, username: &str, email: &str) -> Result<Account> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, email, password_hash, created_at, updated_at
             FROM accounts
             WHERE username = ?1 OR email = ?2 COLLATE NOCASE
             LIMIT 2",
        )?;

        let matches = stmt
            .query_map(params![username, email], account_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if matches.len() > 1 {
            return Err(RecoverError::AmbiguousMatch(format!(
                "{} / {}",
                username, email
            )));
        }

        matches.into_iter().next().ok_or_else(|| {
            RecoverError::AccountNotFound(format!("{} / {}", username, email))
        })
    }

    pub fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, email, password_hash, created_at, updated_at
             FROM accounts
             WHERE username = ?1",
        )?;

        let mut accounts = stmt.query_map([username], account_from_row)?;
        Ok(accounts.next().transpose()?)
    }

    /// Overwrite the account's email and return the refreshed record. The
    /// UPDATE commits before this returns, so the change is durable before
    /// any notification is attempted.
    pub fn update_email(&self, account: &Account, new_email: &str) -> Result<Account> {
        let now = Utc::now();
        self.conn.execute(
            "UPDATE accounts SET email = ?1, updated_at = ?2 WHERE id = ?3",
            params![new_email, now.to_rfc3339(), account.id],
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT id, username, email, password_hash, created_at, updated_at
             FROM accounts
             WHERE id = ?1",
        )?;
        let mut accounts = stmt.query_map([account.id], account_from_row)?;
        accounts
            .next()
            .transpose()?
            .ok_or_else(|| RecoverError::AccountNotFound(account.username.clone()))
    }

    pub fn language_preference(&self, account_id: i64) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT value FROM account_preferences
             WHERE account_id = ?1 AND key = ?2",
        )?;

        let mut values = stmt.query_map(params![account_id, LANGUAGE_KEY], |row| {
            row.get::<_, String>(0)
        })?;
        Ok(values.next().transpose()?)
    }

    pub fn set_preference(&self, account_id: i64, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO account_preferences (account_id, key, value)
             VALUES (?1, ?2, ?3)",
            params![account_id, key, value],
        )?;
        Ok(())
    }

    pub fn save_recovery_operation(&self, operation: &RecoveryOperation) -> Result<()> {
        self.conn.execute(
            "INSERT INTO recovery_operations
             (username, old_email, new_email, outcome, detail, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                operation.username,
                operation.old_email,
                operation.new_email,
                operation.outcome.to_string(),
                operation.detail,
                operation.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_recovery_history(&self, limit: Option<usize>) -> Result<Vec<RecoveryOperation>> {
        let query = if let Some(lim) = limit {
            format!(
                "SELECT id, username, old_email, new_email, outcome, detail, timestamp
                 FROM recovery_operations
                 ORDER BY timestamp DESC
                 LIMIT {}",
                lim
            )
        } else {
            "SELECT id, username, old_email, new_email, outcome, detail, timestamp
             FROM recovery_operations
             ORDER BY timestamp DESC"
                .to_string()
        };

        let mut stmt = self.conn.prepare(&query)?;

        let operations = stmt
            .query_map([], |row| {
                let outcome: String = row.get(4)?;
                Ok(RecoveryOperation {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    old_email: row.get(2)?,
                    new_email: row.get(3)?,
                    outcome: outcome.parse().unwrap_or(RecoveryOutcome::Failed),
                    detail: row.get(5)?,
                    timestamp: parse_ts(6, row.get::<_, String>(6)?)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(operations)
    }

    pub fn get_stats(&self) -> Result<RecoveryStats> {
        let total_accounts: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;

        let total_operations: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM recovery_operations",
            [],
            |row| row.get(0),
        )?;

        let succeeded: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM recovery_operations WHERE outcome = 'Succeeded'",
            [],
            |row| row.get(0),
        )?;

        let failed: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM recovery_operations WHERE outcome = 'Failed'",
            [],
            |row| row.get(0),
        )?;

        Ok(RecoveryStats {
            total_accounts: total_accounts as usize,
            total_operations: total_operations as usize,
            succeeded: succeeded as usize,
            failed: failed as usize,
        })
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: parse_ts(4, row.get::<_, String>(4)?)?,
        updated_at: parse_ts(5, row.get::<_, String>(5)?)?,
    })
}

fn parse_ts(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    value.parse().map_err(|e: chrono::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RecoveryStats {
    pub total_accounts: usize,
    pub total_operations: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::new(":memory:").unwrap()
    }

    fn seed(db: &Database, username: &str, email: &str) -> i64 {
        db.save_account(&Account::new(username, email, "pbkdf2$stub"))
            .unwrap()
    }

    #[test]
    fn test_find_by_username() {
        let db = test_db();
        seed(&db, "alice", "alice@old.com");

        let account = db.find_account("alice", "nomatch@example.com").unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.email, "alice@old.com");
    }

    #[test]
    fn test_find_by_email_is_case_insensitive() {
        let db = test_db();
        seed(&db, "bob", "Bob@Old.Com");

        let account = db.find_account("someone-else", "bob@old.com").unwrap();
        assert_eq!(account.username, "bob");
    }

    #[test]
    fn test_find_zero_matches() {
        let db = test_db();
        seed(&db, "alice", "alice@old.com");

        let err = db.find_account("carol", "carol@old.com").unwrap_err();
        assert!(matches!(err, RecoverError::AccountNotFound(_)));
    }

    #[test]
    fn test_find_multiple_matches() {
        let db = test_db();
        seed(&db, "alice", "alice@old.com");
        seed(&db, "mallory", "shared@old.com");

        // Username hits one account, email hits another
        let err = db.find_account("alice", "shared@old.com").unwrap_err();
        assert!(matches!(err, RecoverError::AmbiguousMatch(_)));
    }

    #[test]
    fn test_update_email_persists() {
        let db = test_db();
        seed(&db, "alice", "alice@old.com");

        let account = db.find_account("alice", "alice@old.com").unwrap();
        let updated = db.update_email(&account, "alice@new.com").unwrap();
        assert_eq!(updated.email, "alice@new.com");
        assert!(updated.updated_at >= account.updated_at);

        let reloaded = db.get_account_by_username("alice").unwrap().unwrap();
        assert_eq!(reloaded.email, "alice@new.com");
    }

    #[test]
    fn test_language_preference() {
        let db = test_db();
        let id = seed(&db, "alice", "alice@old.com");

        assert_eq!(db.language_preference(id).unwrap(), None);

        db.set_preference(id, LANGUAGE_KEY, "es").unwrap();
        assert_eq!(db.language_preference(id).unwrap(), Some("es".to_string()));
    }

    #[test]
    fn test_recovery_operations_roundtrip() {
        let db = test_db();
        seed(&db, "alice", "alice@old.com");

        db.save_recovery_operation(&RecoveryOperation {
            id: 0,
            username: "alice".to_string(),
            old_email: "alice@old.com".to_string(),
            new_email: "alice@new.com".to_string(),
            outcome: RecoveryOutcome::Succeeded,
            detail: None,
            timestamp: Utc::now(),
        })
        .unwrap();

        db.save_recovery_operation(&RecoveryOperation {
            id: 0,
            username: "carol".to_string(),
            old_email: "carol@old.com".to_string(),
            new_email: "carol@new.com".to_string(),
            outcome: RecoveryOutcome::Failed,
            detail: Some("Account not found: carol / carol@old.com".to_string()),
            timestamp: Utc::now(),
        })
        .unwrap();

        let history = db.get_recovery_history(Some(10)).unwrap();
        assert_eq!(history.len(), 2);

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.total_accounts, 1);
        assert_eq!(stats.total_operations, 2);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 1);
    }
}
