use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub site: SiteConfig,
    pub database: DatabaseConfig,
    pub notifier: NotifierConfig,
}

/// Deployment branding and link-building context, resolved once per run.
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    pub platform_name: String,
    pub site_name: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_language")]
    pub default_language: String,
    pub token_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifierConfig {
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_protocol() -> String {
    "https".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_token_ttl_hours() -> i64 {
    36
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_enabled() -> bool {
    true
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from("config/default")
    }

    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("RECOVER")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

impl SiteConfig {
    /// Build the password-reset confirmation link for an encoded account id
    /// and token, e.g. `https://example.org/password/reset/2s/abc123?track=pwreset`.
    pub fn password_reset_link(&self, uidb36: &str, token: &str) -> String {
        format!(
            "{protocol}://{site}/password/reset/{uid}/{token}?track=pwreset",
            protocol = self.protocol,
            site = self.site_name,
            uid = uidb36,
            token = token,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteConfig {
        SiteConfig {
            platform_name: "Example Learning".to_string(),
            site_name: "courses.example.org".to_string(),
            protocol: "https".to_string(),
            default_language: "en".to_string(),
            token_secret: "test-secret".to_string(),
            token_ttl_hours: 36,
        }
    }

    #[test]
    fn test_password_reset_link() {
        let link = site().password_reset_link("2s", "1abc-def0");
        assert_eq!(
            link,
            "https://courses.example.org/password/reset/2s/1abc-def0?track=pwreset"
        );
    }
}
