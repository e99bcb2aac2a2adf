use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account record as stored by the user-management schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit record for one processed recovery row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryOperation {
    pub id: i64,
    pub username: String,
    pub old_email: String,
    pub new_email: String,
    pub outcome: RecoveryOutcome,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RecoveryOutcome {
    Succeeded,
    Failed,
}

impl std::fmt::Display for RecoveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryOutcome::Succeeded => write!(f, "Succeeded"),
            RecoveryOutcome::Failed => write!(f, "Failed"),
        }
    }
}

impl std::str::FromStr for RecoveryOutcome {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Succeeded" => Ok(RecoveryOutcome::Succeeded),
            _ => Ok(RecoveryOutcome::Failed),
        }
    }
}

impl Account {
    #[allow(dead_code)]
    pub fn new(username: &str, email: &str, password_hash: &str) -> Self {
        Self {
            id: 0,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
