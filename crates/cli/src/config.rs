//! TOML configuration for the `starwatch` binary.
//!
//! Every optional key has a serde default function so that a minimal file
//! only needs `[github] username` (with the token in `GITHUB_TOKEN`) and a
//! `[mail]` section.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use github::{GithubSettings, DEFAULT_API_URL};
use mailer::{SmtpSecurity, SmtpSettings, DEFAULT_SUBJECT};
use runner::RunSettings;
use tracker::{AccessToken, ByteBudget, TrackerError, UserLogin};

/// Environment variable consulted when `github.token` is absent.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub github: GithubConfig,

    #[serde(default)]
    pub digest: DigestConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub state: StateConfig,

    /// Required unless pages are written to a directory instead.
    #[serde(default)]
    pub mail: Option<MailConfig>,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubConfig {
    pub username: String,

    /// Personal access token. Falls back to `GITHUB_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("username", &self.username)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DigestConfig {
    /// Content bytes per digest page.
    #[serde(default = "default_page_budget_bytes")]
    pub page_budget_bytes: usize,

    #[serde(default = "default_subject")]
    pub subject: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            page_budget_bytes: default_page_budget_bytes(),
            subject: default_subject(),
        }
    }
}

fn default_page_budget_bytes() -> usize {
    1024 * 1024
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

fn default_max_concurrency() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    #[serde(default = "default_cursor_path")]
    pub cursor_path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            cursor_path: default_cursor_path(),
        }
    }
}

fn default_cursor_path() -> PathBuf {
    PathBuf::from(state::DEFAULT_CURSOR_PATH)
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    pub from: String,
    pub to: String,
    pub host: String,
    #[serde(default = "default_mail_port")]
    pub port: u16,
    /// Implicit TLS when `true`, STARTTLS otherwise.
    #[serde(default = "default_mail_ssl")]
    pub ssl: bool,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl", &self.ssl)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn default_mail_port() -> u16 {
    465
}

fn default_mail_ssl() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// OTLP gRPC endpoint; span export is off when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Reads and parses the configuration file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(config)
}

fn invalid(message: impl Into<String>) -> TrackerError {
    TrackerError::Configuration {
        message: message.into(),
    }
}

impl Config {
    /// Checks everything a run needs before any request is made.
    ///
    /// `needs_mail` is `false` when digest pages go to a directory.
    pub fn validate(&self, needs_mail: bool, env_token: Option<&str>) -> Result<(), TrackerError> {
        self.user()?;
        self.token(env_token)?;
        self.page_budget()?;
        self.max_concurrency()?;
        if needs_mail {
            self.smtp_settings()?;
        }
        Ok(())
    }

    pub fn user(&self) -> Result<UserLogin, TrackerError> {
        UserLogin::new(self.github.username.trim())
            .ok_or_else(|| invalid("github.username must not be empty"))
    }

    /// The configured token, or `env_token` when the file has none.
    pub fn token(&self, env_token: Option<&str>) -> Result<AccessToken, TrackerError> {
        let raw = self
            .github
            .token
            .as_deref()
            .or(env_token)
            .ok_or_else(|| invalid(format!("github.token is not set and {TOKEN_ENV} is empty")))?;
        AccessToken::new(raw).ok_or_else(|| invalid("github.token must not be empty"))
    }

    pub fn page_budget(&self) -> Result<ByteBudget, TrackerError> {
        ByteBudget::new(self.digest.page_budget_bytes)
            .ok_or_else(|| invalid("digest.page_budget_bytes must be greater than zero"))
    }

    pub fn max_concurrency(&self) -> Result<NonZeroUsize, TrackerError> {
        NonZeroUsize::new(self.scan.max_concurrency)
            .ok_or_else(|| invalid("scan.max_concurrency must be greater than zero"))
    }

    pub fn run_settings(&self) -> Result<RunSettings, TrackerError> {
        Ok(RunSettings {
            user: self.user()?,
            page_budget: self.page_budget()?,
            max_concurrent_scans: self.max_concurrency()?,
        })
    }

    pub fn github_settings(&self, env_token: Option<&str>) -> Result<GithubSettings, TrackerError> {
        Ok(GithubSettings {
            api_url: self.github.api_url.clone(),
            token: self.token(env_token)?,
        })
    }

    pub fn smtp_settings(&self) -> Result<SmtpSettings, TrackerError> {
        let mail = self
            .mail
            .as_ref()
            .ok_or_else(|| invalid("[mail] section is required unless --output-dir is given"))?;
        for (key, value) in [
            ("mail.from", &mail.from),
            ("mail.to", &mail.to),
            ("mail.host", &mail.host),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(format!("{key} must not be empty")));
            }
        }
        Ok(SmtpSettings {
            host: mail.host.clone(),
            port: mail.port,
            security: if mail.ssl {
                SmtpSecurity::Implicit
            } else {
                SmtpSecurity::StartTls
            },
            username: mail.username.clone(),
            password: mail.password.clone(),
            from: mail.from.clone(),
            to: mail.to.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const FULL: &str = r#"
[github]
username = "octocat"
token = "ghp_file"

[digest]
page_budget_bytes = 2048
subject = "Stars"

[scan]
max_concurrency = 8

[state]
cursor_path = "/var/lib/starwatch/latest.json"

[mail]
from = "bot@example.com"
to = "me@example.com"
host = "smtp.example.com"
port = 587
ssl = false
username = "bot"
password = "secret"

[telemetry]
otlp_endpoint = "http://localhost:4317"
"#;

    fn parse(s: &str) -> Config {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn minimal_config_takes_defaults() {
        let config = parse("[github]\nusername = \"octocat\"\n");

        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.digest.page_budget_bytes, 1_048_576);
        assert_eq!(config.digest.subject, "New GitHub Releases");
        assert_eq!(config.scan.max_concurrency, 4);
        assert_eq!(config.state.cursor_path, PathBuf::from("latest.json"));
        assert!(config.mail.is_none());
        assert!(config.telemetry.otlp_endpoint.is_none());
    }

    #[test]
    fn full_config_is_read() {
        let config = parse(FULL);

        let settings = config.run_settings().unwrap();
        assert_eq!(settings.user.as_str(), "octocat");
        assert_eq!(settings.page_budget.as_usize(), 2048);
        assert_eq!(settings.max_concurrent_scans.get(), 8);

        let smtp = config.smtp_settings().unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.security, SmtpSecurity::StartTls);
        assert_eq!(
            config.telemetry.otlp_endpoint.as_deref(),
            Some("http://localhost:4317")
        );
    }

    #[test]
    fn file_token_wins_over_environment() {
        let config = parse(FULL);
        assert_eq!(config.token(Some("ghp_env")).unwrap().expose(), "ghp_file");
    }

    #[test]
    fn environment_token_is_the_fallback() {
        let config = parse("[github]\nusername = \"octocat\"\n");
        assert_eq!(config.token(Some("ghp_env")).unwrap().expose(), "ghp_env");
        assert!(config.token(None).is_err());
    }

    #[test]
    fn zero_budget_is_rejected() {
        let config = parse("[github]\nusername = \"u\"\ntoken = \"t\"\n[digest]\npage_budget_bytes = 0\n");
        assert!(matches!(
            config.validate(false, None),
            Err(TrackerError::Configuration { .. })
        ));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = parse("[github]\nusername = \"u\"\ntoken = \"t\"\n[scan]\nmax_concurrency = 0\n");
        assert!(config.validate(false, None).is_err());
    }

    #[test]
    fn blank_username_is_rejected() {
        let config = parse("[github]\nusername = \"  \"\ntoken = \"t\"\n");
        assert!(config.validate(false, None).is_err());
    }

    #[test]
    fn mail_is_only_required_for_mail_delivery() {
        let config = parse("[github]\nusername = \"u\"\ntoken = \"t\"\n");
        assert!(config.validate(false, None).is_ok());
        assert!(config.validate(true, None).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("[github]\nusername = \"u\"\nusr = \"typo\"\n").is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", parse(FULL));
        assert!(!rendered.contains("ghp_file"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn load_config_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.github.username, "octocat");
    }

    #[test]
    fn load_config_reports_the_path() {
        let error = load_config("/nonexistent/starwatch.toml").unwrap_err();
        assert!(format!("{error:#}").contains("/nonexistent/starwatch.toml"));
    }
}
