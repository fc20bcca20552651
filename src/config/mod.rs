use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    /// Base URL of the workspace content API
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// API version header sent with every request
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Integration token (usually supplied via WORKSPACE_TOKEN)
    pub token: Option<String>,
    /// Database holding release/launch records
    pub releases_db: Option<String>,
    /// Database holding development task records
    pub tasks_db: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_version: default_api_version(),
            token: None,
            releases_db: None,
            tasks_db: None,
            page_size: default_page_size(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_api_version() -> String {
    "2022-06-28".to_string()
}

fn default_page_size() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// From address; defaults to the SMTP username when unset
    pub from_address: Option<String>,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Upgrade the connection with STARTTLS (disable only for local relays)
    #[serde(default = "default_smtp_tls")]
    pub starttls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            from_address: None,
            from_name: default_from_name(),
            starttls: default_smtp_tls(),
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Weekly Digest".to_string()
}

fn default_smtp_tls() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Look-back window for completed launches and bug fixes, in days
    #[serde(default = "default_recent_days")]
    pub recent_days: i64,
    /// Look-ahead window for upcoming launches, in days
    #[serde(default = "default_upcoming_days")]
    pub upcoming_days: i64,
    /// To-list used when no recipients are found in the releases database
    #[serde(default)]
    pub fallback_to: Vec<String>,
    /// CC-list used when no recipients are found in the releases database
    #[serde(default)]
    pub fallback_cc: Vec<String>,
    /// Signature appended to the report; literal "\n" renders as <br>
    pub signature: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recent_days: default_recent_days(),
            upcoming_days: default_upcoming_days(),
            fallback_to: Vec::new(),
            fallback_cc: Vec::new(),
            signature: None,
        }
    }
}

fn default_recent_days() -> i64 {
    7
}

fn default_upcoming_days() -> i64 {
    14
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Signature files probed in the working directory, first non-empty wins.
const SIGNATURE_FILES: &[&str] = &["signature.html", "signature.txt", "email-signature.html"];

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn default() -> Self {
        Self {
            workspace: WorkspaceConfig::default(),
            smtp: SmtpConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Overlay settings from the process environment.
    pub fn apply_env(&mut self) {
        self.overlay(|name| std::env::var(name).ok());
    }

    fn overlay(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(token) = var("WORKSPACE_TOKEN") {
            self.workspace.token = Some(token);
        }
        if let Some(id) = var("RELEASES_DB") {
            self.workspace.releases_db = Some(id);
        }
        if let Some(id) = var("TASKS_DB") {
            self.workspace.tasks_db = Some(id);
        }
        if let Some(user) = var("SMTP_USERNAME") {
            self.smtp.username = Some(user);
        }
        if let Some(pass) = var("SMTP_PASSWORD") {
            self.smtp.password = Some(pass);
        }
        if let Some(raw) = var("RECIPIENTS") {
            self.report.fallback_to = split_list(&raw);
        }
        if let Some(raw) = var("CC_RECIPIENTS") {
            self.report.fallback_cc = split_list(&raw);
        }
        if let Some(signature) = var("EMAIL_SIGNATURE") {
            if !signature.is_empty() {
                self.report.signature = Some(signature);
            }
        }
    }

    /// Check that everything a run needs is present. SMTP settings are only
    /// required when the report will actually be sent.
    pub fn validate(&self, dry_run: bool) -> Result<()> {
        if self.workspace.token.is_none() {
            bail!("Workspace token not configured (set WORKSPACE_TOKEN)");
        }
        if self.workspace.releases_db.is_none() {
            bail!("Releases database id not configured (set RELEASES_DB)");
        }
        if self.workspace.tasks_db.is_none() {
            bail!("Tasks database id not configured (set TASKS_DB)");
        }
        if !dry_run {
            if self.smtp.username.is_none() {
                bail!("SMTP username not configured (set SMTP_USERNAME)");
            }
            if self.smtp.password.is_none() {
                bail!("SMTP password not configured (set SMTP_PASSWORD)");
            }
        }
        Ok(())
    }

    /// Resolve the signature HTML: a signature file in the working directory
    /// wins over the configured text.
    pub fn signature_html(&self) -> String {
        signature_from(Path::new("."), self.report.signature.as_deref())
    }
}

fn signature_from(dir: &Path, configured: Option<&str>) -> String {
    for name in SIGNATURE_FILES {
        match std::fs::read_to_string(dir.join(name)) {
            Ok(content) => {
                let content = content.trim();
                if !content.is_empty() {
                    info!("Loaded signature from {}", name);
                    return content.to_string();
                }
            }
            Err(_) => continue,
        }
    }
    configured
        .map(|s| s.replace("\\n", "<br>"))
        .unwrap_or_default()
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
