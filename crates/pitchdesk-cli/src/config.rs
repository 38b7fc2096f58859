// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use pitchdesk_app::{EmailTemplate, SearchField};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_CONTACT_EMAIL: &str = "proposals@pitchdesk.example";
const DEFAULT_NOTICE_SECONDS: u64 = 4;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub default_template: Option<String>,
    pub search_by: Option<String>,
    pub contact_email: Option<String>,
    pub notice_seconds: Option<u64>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            default_template: Some(EmailTemplate::default().as_str().to_owned()),
            search_by: Some(SearchField::default().as_str().to_owned()),
            contact_email: Some(DEFAULT_CONTACT_EMAIL.to_owned()),
            notice_seconds: Some(DEFAULT_NOTICE_SECONDS),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("PITCHDESK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set PITCHDESK_CONFIG_PATH to the config file"
            )
        })?;

        let app_dir = config_root.join(pitchdesk_db::APP_NAME);
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
                    "config file {} has no version; add `version = 1` and put values under [storage], [ui], and [log]",
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
        if let Some(db_path) = &self.storage.db_path {
            pitchdesk_db::validate_db_path(db_path)?;
        }

        if let Some(template) = &self.ui.default_template
            && EmailTemplate::parse(template).is_none()
        {
            bail!(
                "ui.default_template in {} must be one of {}, got {template:?}",
                path.display(),
                template_names()
            );
        }

        if let Some(field) = &self.ui.search_by
            && SearchField::parse(field).is_none()
        {
            bail!(
                "ui.search_by in {} must be one of {}, got {field:?}",
                path.display(),
                search_field_names()
            );
        }

        if self.ui.notice_seconds == Some(0) {
            bail!(
                "ui.notice_seconds in {} must be positive, got 0",
                path.display()
            );
        }

        if let Some(level) = &self.log.level {
            LevelFilter::from_str(level).map_err(|_| {
                anyhow!(
                    "log.level in {} must be one of off, error, warn, info, debug, trace; got {level:?}",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => pitchdesk_db::default_db_path(),
        }
    }

    pub fn default_template(&self) -> EmailTemplate {
        self.ui
            .default_template
            .as_deref()
            .and_then(EmailTemplate::parse)
            .unwrap_or_default()
    }

    pub fn search_by(&self) -> SearchField {
        self.ui
            .search_by
            .as_deref()
            .and_then(SearchField::parse)
            .unwrap_or_default()
    }

    pub fn contact_email(&self) -> &str {
        self.ui
            .contact_email
            .as_deref()
            .unwrap_or(DEFAULT_CONTACT_EMAIL)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_secs(self.ui.notice_seconds.unwrap_or(DEFAULT_NOTICE_SECONDS))
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }

        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].file to a writable log path")
        })?;
        let app_dir = data_root.join(pitchdesk_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create log directory {}", app_dir.display()))?;
        Ok(app_dir.join("pitchdesk.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# pitchdesk config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/pitchdesk/pitchdesk.db)\n# db_path = \"/absolute/path/to/pitchdesk.db\"\n\n[ui]\n# One of: {}\ndefault_template = \"{}\"\n# One of: {}\nsearch_by = \"{}\"\ncontact_email = \"{}\"\nnotice_seconds = {}\n\n[log]\n# off, error, warn, info, debug or trace. RUST_LOG overrides this.\nlevel = \"{}\"\n# Optional. Default is pitchdesk.log next to the database.\n# file = \"/absolute/path/to/pitchdesk.log\"\n",
            path.display(),
            template_names(),
            EmailTemplate::default().as_str(),
            search_field_names(),
            SearchField::default().as_str(),
            DEFAULT_CONTACT_EMAIL,
            DEFAULT_NOTICE_SECONDS,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn template_names() -> String {
    EmailTemplate::ALL
        .iter()
        .map(|template| template.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn search_field_names() -> String {
    SearchField::ALL
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
