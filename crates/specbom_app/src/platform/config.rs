use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;
use specbom_core::{PollPolicy, StateSettings};
use specbom_engine::{ClientSettings, EngineConfig, LaunchSettings, DEFAULT_BASE_URL};

use crate::cli::GlobalArgs;

pub const DEFAULT_PROXY_LISTEN: &str = "127.0.0.1:8787";

/// Optional settings file. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub environment: Option<String>,
    pub model: Option<String>,
    pub interaction: Option<String>,
    pub poll_secs: Option<u64>,
    pub max_idle_ticks: Option<u32>,
    pub queue_ttl_minutes: Option<i64>,
    pub request_timeout_secs: Option<u64>,
    pub catalog_limit: Option<usize>,
    pub bom_limit: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub proxy_listen: Option<SocketAddr>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub engine: EngineConfig,
    pub state: StateSettings,
    pub proxy_listen: SocketAddr,
}

impl Settings {
    pub fn api_key(&self) -> Option<&str> {
        self.engine.client.api_key.as_deref()
    }
}

/// Layers flags/env over the config file over built-in defaults.
pub fn resolve(args: &GlobalArgs) -> anyhow::Result<Settings> {
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    merge(args, file)
}

fn merge(args: &GlobalArgs, file: FileConfig) -> anyhow::Result<Settings> {
    let defaults = EngineConfig::default();
    let poll_secs = args.poll_secs.or(file.poll_secs).unwrap_or(5);
    if poll_secs == 0 {
        bail!("poll interval must be at least one second");
    }
    let queue_ttl_minutes = args.queue_ttl_minutes.or(file.queue_ttl_minutes).unwrap_or(60);
    if queue_ttl_minutes <= 0 {
        bail!("queue TTL must be a positive number of minutes");
    }

    let client = ClientSettings {
        base_url: non_blank(args.api_base.clone())
            .or(non_blank(file.api_base))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        api_key: non_blank(args.api_key.clone()).or(non_blank(file.api_key)),
        connect_timeout: None,
        request_timeout: args
            .request_timeout_secs
            .or(file.request_timeout_secs)
            .map(Duration::from_secs),
    };
    let launch = LaunchSettings {
        interaction: non_blank(args.interaction.clone())
            .or(non_blank(file.interaction))
            .unwrap_or_else(|| LaunchSettings::default().interaction),
        environment: non_blank(args.environment.clone()).or(non_blank(file.environment)),
        model: non_blank(args.model.clone()).or(non_blank(file.model)),
    };
    let engine = EngineConfig {
        client,
        launch,
        output_dir: args
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or(defaults.output_dir),
        catalog_limit: file.catalog_limit.unwrap_or(defaults.catalog_limit),
        bom_limit: file.bom_limit.unwrap_or(defaults.bom_limit),
        max_download_bytes: defaults.max_download_bytes,
    };

    let state = StateSettings {
        poll: PollPolicy {
            interval: Duration::from_secs(poll_secs),
            max_idle_ticks: args
                .max_idle_ticks
                .or(file.max_idle_ticks)
                .unwrap_or(PollPolicy::default().max_idle_ticks),
        },
        queue_ttl: chrono::Duration::minutes(queue_ttl_minutes),
        ..StateSettings::default()
    };

    let proxy_listen = match file.proxy_listen {
        Some(addr) => addr,
        None => DEFAULT_PROXY_LISTEN
            .parse()
            .context("default proxy listen address")?,
    };

    Ok(Settings {
        engine,
        state,
        proxy_listen,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn args(extra: &[&str]) -> GlobalArgs {
        let mut argv = vec!["specbom", "list"];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let settings = merge(&args(&[]), FileConfig::default()).unwrap();
        assert_eq!(settings.state.poll.interval, Duration::from_secs(5));
        assert_eq!(settings.state.poll.max_idle_ticks, 60);
        assert_eq!(settings.state.queue_ttl, chrono::Duration::minutes(60));
        assert_eq!(settings.engine.launch.interaction, "SpecToBOM@1");
        assert_eq!(settings.engine.catalog_limit, 100);
        assert_eq!(settings.engine.bom_limit, 50);
        assert_eq!(settings.proxy_listen.to_string(), DEFAULT_PROXY_LISTEN);
    }

    #[test]
    fn flags_override_file_values() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("specbom.ron");
        fs::write(
            &path,
            r#"(
                api_base: Some("http://127.0.0.1:8787/api/vertesia"),
                interaction: Some("SpecToBOM@2"),
                poll_secs: Some(10),
                bom_limit: Some(20),
            )"#,
        )
        .unwrap();

        let file = FileConfig::load(&path).unwrap();
        let settings = merge(&args(&["--poll-secs", "3"]), file).unwrap();
        assert_eq!(
            settings.engine.client.base_url,
            "http://127.0.0.1:8787/api/vertesia"
        );
        assert_eq!(settings.engine.launch.interaction, "SpecToBOM@2");
        assert_eq!(settings.state.poll.interval, Duration::from_secs(3));
        assert_eq!(settings.engine.bom_limit, 20);
        assert_eq!(settings.api_key(), None);
    }

    #[test]
    fn blank_values_fall_through() {
        let file = FileConfig {
            model: Some("  ".into()),
            ..FileConfig::default()
        };
        let settings = merge(&args(&["--api-key", ""]), file).unwrap();
        assert_eq!(settings.engine.launch.model, None);
        assert_eq!(settings.api_key(), None);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.ron");
        fs::write(&path, "(pol_secs: Some(3))").unwrap();
        assert!(FileConfig::load(&path).is_err());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        assert!(merge(&args(&["--poll-secs", "0"]), FileConfig::default()).is_err());
    }
}
