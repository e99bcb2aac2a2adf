use chrono::{DateTime, Duration, Utc};

use crate::storage::models::Account;

/// Key-derivation context for reset-token MACs.
const TOKEN_KEY_CONTEXT: &str = "account-recover reset-token v1";

/// Hex characters of the keyed hash kept in the token.
const TOKEN_MAC_LEN: usize = 20;

/// Encode a non-negative integer in lowercase base36, the compact form
/// used for account ids in reset links.
pub fn int_to_base36(mut n: u64) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if n == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while n > 0 {
        out.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Issues and verifies single-use, time-bounded password-reset tokens.
///
/// The token is `<timestamp_base36>-<mac_prefix>` where the MAC is a keyed
/// blake3 hash over the account's id, email, password hash, and last-update
/// time. Covering mutable account state makes the token single-use in
/// practice: completing a reset, or any later email change, invalidates
/// every previously issued token for the account.
pub struct ResetTokenIssuer {
    key: [u8; 32],
    ttl: Duration,
}

impl ResetTokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            key: blake3::derive_key(TOKEN_KEY_CONTEXT, secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, account: &Account) -> String {
        self.issue_at(account, Utc::now())
    }

    fn issue_at(&self, account: &Account, issued: DateTime<Utc>) -> String {
        let ts = issued.timestamp();
        format!(
            "{}-{}",
            int_to_base36(ts.max(0) as u64),
            self.mac(account, ts)
        )
    }

    /// Verify a token against the account's current state and the TTL.
    pub fn check(&self, account: &Account, token: &str) -> bool {
        let Some((ts_part, mac_part)) = token.split_once('-') else {
            return false;
        };

        let Ok(ts) = i64::from_str_radix(ts_part, 36) else {
            return false;
        };

        let age = Utc::now().timestamp() - ts;
        if age < 0 || age > self.ttl.num_seconds() {
            return false;
        }

        mac_part == self.mac(account, ts)
    }

    fn mac(&self, account: &Account, ts: i64) -> String {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        hasher.update(&account.id.to_le_bytes());
        hasher.update(&[0]);
        hasher.update(account.email.as_bytes());
        hasher.update(&[0]);
        hasher.update(account.password_hash.as_bytes());
        hasher.update(&[0]);
        hasher.update(&account.updated_at.timestamp().to_le_bytes());
        hasher.update(&ts.to_le_bytes());

        hasher.finalize().to_hex().as_str()[..TOKEN_MAC_LEN].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> ResetTokenIssuer {
        ResetTokenIssuer::new("test-secret", 36)
    }

    fn account() -> Account {
        Account {
            id: 100,
            ..Account::new("alice", "alice@old.com", "pbkdf2$stub")
        }
    }

    #[test]
    fn test_int_to_base36() {
        assert_eq!(int_to_base36(0), "0");
        assert_eq!(int_to_base36(35), "z");
        assert_eq!(int_to_base36(36), "10");
        assert_eq!(int_to_base36(1000), "rs");
    }

    #[test]
    fn test_token_verifies_within_ttl() {
        let issuer = issuer();
        let account = account();

        let token = issuer.issue(&account);
        assert!(issuer.check(&account, &token));
    }

    #[test]
    fn test_token_rejected_after_expiry() {
        let issuer = issuer();
        let account = account();

        let token = issuer.issue_at(&account, Utc::now() - Duration::hours(48));
        assert!(!issuer.check(&account, &token));
    }

    #[test]
    fn test_token_invalidated_by_email_change() {
        let issuer = issuer();
        let account = account();

        let token = issuer.issue(&account);

        let mut changed = account.clone();
        changed.email = "alice@new.com".to_string();
        assert!(!issuer.check(&changed, &token));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = issuer();
        let account = account();

        let token = issuer.issue(&account);
        let tampered = format!("{}x", &token[..token.len() - 1]);
        assert!(!issuer.check(&account, &tampered));
        assert!(!issuer.check(&account, "not-even-a-token"));
        assert!(!issuer.check(&account, ""));
    }

    #[test]
    fn test_distinct_secrets_produce_distinct_tokens() {
        let account = account();
        let a = ResetTokenIssuer::new("secret-a", 36).issue_at(&account, Utc::now());
        let b = ResetTokenIssuer::new("secret-b", 36).issue_at(&account, Utc::now());
        assert_ne!(a, b);
    }
}
