//! Site configuration (gitpost.yml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main site configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub repository: RepositoryConfig,
    pub content: ContentConfig,
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Override file values with the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Override file values using an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(owner) = lookup("GH_REPO_OWNER") {
            self.repository.owner = owner;
        }
        if let Some(name) = lookup("GH_REPO_NAME") {
            self.repository.name = name;
        }
        if let Some(token) = lookup("GH_TOKEN").or_else(|| lookup("GITHUB_TOKEN")) {
            self.repository.token = Some(token);
        }
        if let Some(secret) =
            lookup("GH_WEBHOOK_SECRET").or_else(|| lookup("GITHUB_WEBHOOK_SECRET"))
        {
            self.webhook.secret = Some(secret);
        }
    }

    /// Check that everything needed to reach the repository is present
    pub fn validate(&self) -> Result<()> {
        if self.repository.owner.trim().is_empty() {
            bail!("repository.owner is not set (or GH_REPO_OWNER)");
        }
        if self.repository.name.trim().is_empty() {
            bail!("repository.name is not set (or GH_REPO_NAME)");
        }
        if self.content.fetch_concurrency == 0 {
            bail!("content.fetch_concurrency must be at least 1");
        }
        if self.content.search_limit == 0 {
            bail!("content.search_limit must be at least 1");
        }
        if self.repository.token.is_none() {
            tracing::warn!("No GitHub token configured. API requests will be rate limited.");
        }
        Ok(())
    }
}

/// Remote repository holding the Markdown posts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub owner: String,
    pub name: String,
    pub token: Option<String>,
    pub api_base: String,
    /// Directory inside the repository that holds the posts
    pub path: String,
    pub timeout_secs: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            name: String::new(),
            token: None,
            api_base: "https://api.github.com".to_string(),
            path: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Content processing options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Moment.js style format for `display_date`
    pub date_format: String,
    /// File names skipped in addition to the built-in ignore set
    pub ignore: Vec<String>,
    pub fetch_concurrency: usize,
    pub search_limit: usize,
    pub recent_count: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            date_format: "MMMM DD, YYYY".to_string(),
            ignore: Vec::new(),
            fetch_concurrency: 4,
            search_limit: 10,
            recent_count: 6,
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
    pub public_dir: Option<PathBuf>,
    /// Public base URL of the site, used for sitemap links
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 8080,
            public_dir: None,
            url: "http://localhost:8080".to_string(),
        }
    }
}

/// Push webhook options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub secret: Option<String>,
    /// Branches whose pushes trigger a refresh
    pub branches: Vec<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            branches: vec!["main".to_string(), "master".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.repository.api_base, "https://api.github.com");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.content.search_limit, 10);
        assert_eq!(config.webhook.branches, vec!["main", "master"]);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
repository:
  owner: acme
  name: posts
content:
  fetch_concurrency: 2
  ignore:
    - DRAFTS.md
server:
  port: 3000
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.repository.owner, "acme");
        assert_eq!(config.repository.name, "posts");
        assert_eq!(config.repository.timeout_secs, 30);
        assert_eq!(config.content.fetch_concurrency, 2);
        assert_eq!(config.content.ignore, vec!["DRAFTS.md"]);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.ip, "127.0.0.1");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gitpost.yml");
        fs::write(&path, "repository:\n  owner: acme\n  name: posts\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.repository.owner, "acme");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("GH_REPO_OWNER", "env-owner"),
            ("GH_REPO_NAME", "env-repo"),
            ("GITHUB_TOKEN", "fallback-token"),
            ("GH_WEBHOOK_SECRET", ""),
        ]
        .into_iter()
        .collect();

        let mut config = SiteConfig::default();
        config.repository.owner = "file-owner".to_string();
        config.apply_env_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.repository.owner, "env-owner");
        assert_eq!(config.repository.name, "env-repo");
        assert_eq!(config.repository.token.as_deref(), Some("fallback-token"));
        assert_eq!(config.webhook.secret, None);
    }

    #[test]
    fn test_webhook_secret_fallback() {
        let mut config = SiteConfig::default();
        config.apply_env_from(|k| {
            (k == "GITHUB_WEBHOOK_SECRET").then(|| "gh-secret".to_string())
        });
        assert_eq!(config.webhook.secret.as_deref(), Some("gh-secret"));

        let env: HashMap<&str, &str> = [
            ("GH_WEBHOOK_SECRET", "preferred"),
            ("GITHUB_WEBHOOK_SECRET", "fallback"),
        ]
        .into_iter()
        .collect();
        let mut config = SiteConfig::default();
        config.apply_env_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.webhook.secret.as_deref(), Some("preferred"));
    }

    #[test]
    fn test_validate_requires_repository() {
        let mut config = SiteConfig::default();
        assert!(config.validate().is_err());

        config.repository.owner = "acme".to_string();
        assert!(config.validate().is_err());

        config.repository.name = "posts".to_string();
        assert!(config.validate().is_ok());

        config.content.fetch_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
