// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use depot_app::Role;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";
const DEFAULT_TIMEOUT: &str = "10s";
const APP_NAME: &str = "depot";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub session: Session,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            session: Session::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    pub token_path: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
            token_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub role: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            role: Some(Role::Admin.as_str().to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("DEPOT_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set DEPOT_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and move values under [api] and [session]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.api.base_url
            && base_url.trim().is_empty()
        {
            bail!("api.base_url in {} must not be empty", path.display());
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(role) = &self.session.role
            && Role::parse(role).is_none()
        {
            bail!(
                "session.role in {} must be admin, operator, or viewer, got {role:?}",
                path.display()
            );
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn token_path(&self) -> Option<PathBuf> {
        self.api.token_path.as_deref().map(PathBuf::from)
    }

    pub fn role(&self) -> Role {
        self.session
            .role
            .as_deref()
            .and_then(Role::parse)
            .unwrap_or(Role::Admin)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# depot config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\ntimeout = \"{}\"\n# Optional. Bearer token read from this file when present.\n# token_path = \"/absolute/path/to/token\"\n\n[session]\n# admin, operator, or viewer\nrole = \"admin\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use <N>ms or <N>s (for example 500ms or 10s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use depot_app::Role;
    use std::path::PathBuf;
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.base_url(), "http://localhost:8080/api/v1");
        assert_eq!(config.timeout()?, Duration::from_secs(10));
        assert_eq!(config.role(), Role::Admin);
        assert_eq!(config.token_path(), None);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[api]\nbase_url = \"http://x\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        assert!(error.to_string().contains("version = 1"));
        Ok(())
    }

    #[test]
    fn wrong_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 7\n")?;
        let error = Config::load(&path).expect_err("wrong version should fail");
        assert!(error.to_string().contains("unsupported config version 7"));
        Ok(())
    }

    #[test]
    fn values_load_and_trailing_slash_is_trimmed() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n\n[api]\nbase_url = \"http://10.0.0.9:8080/api/v1/\"\ntimeout = \"500ms\"\ntoken_path = \"/tmp/token\"\n\n[session]\nrole = \"viewer\"\n",
        )?;
        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "http://10.0.0.9:8080/api/v1");
        assert_eq!(config.timeout()?, Duration::from_millis(500));
        assert_eq!(config.token_path(), Some(PathBuf::from("/tmp/token")));
        assert_eq!(config.role(), Role::Viewer);
        Ok(())
    }

    #[test]
    fn bad_role_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n\n[session]\nrole = \"root\"\n")?;
        let error = Config::load(&path).expect_err("bad role should fail");
        assert!(error.to_string().contains("session.role"));
        Ok(())
    }

    #[test]
    fn duration_parsing_accepts_ms_and_s_only() {
        assert_eq!(parse_duration("10s").expect("seconds"), Duration::from_secs(10));
        assert_eq!(
            parse_duration("250ms").expect("millis"),
            Duration::from_millis(250)
        );
        assert!(parse_duration("5m").is_err());
        assert!(parse_duration("fast").is_err());
    }

    #[test]
    fn example_config_mentions_the_target_path() {
        let example = Config::example_config(&PathBuf::from("/tmp/depot/config.toml"));
        assert!(example.contains("/tmp/depot/config.toml"));
        assert!(example.contains("version = 1"));
        assert!(example.contains("[api]"));
        assert!(example.contains("[session]"));
    }
}
