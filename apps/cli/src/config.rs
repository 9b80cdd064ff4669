use std::{collections::HashMap, path::Path, time::Duration};

use anyhow::{bail, Context};
use client_core::ClientOptions;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_NAME: &str = "ims";
const ENV_PREFIX: &str = "IMS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Zero disables the query cache.
    pub cache_ttl_secs: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".into(),
            api_token: None,
            request_timeout_secs: 30,
            cache_ttl_secs: 30,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    /// Defaults, then the settings file, then `IMS_*` variables.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_from(path, None)
    }

    fn load_from(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> anyhow::Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder
            .build()
            .context("failed to read settings")?
            .try_deserialize()
            .context("invalid settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Applies the `--api-url` flag on top of everything else.
    pub fn with_api_url(mut self, api_url: Option<String>) -> anyhow::Result<Self> {
        if let Some(api_url) = api_url {
            self.api_url = api_url;
            self.validate()?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.api_url)
            .with_context(|| format!("api_url is not a valid url: {}", self.api_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("api_url must use http or https: {}", self.api_url);
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api_url.clone(),
            api_token: self.api_token.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
        }
    }
}
