use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use roadmapper_utils::paths::{STATE_DIR_NAME, roadmapper_home};

use super::{
    CliArgs, Config, ConfigSource, DEFAULT_PROVIDER, Defaults, LlmConfig,
};

/// Environment variable overriding `[llm] provider`
pub const PROVIDER_ENV_VAR: &str = "ROADMAPPER_PROVIDER";

/// Environment variable overriding `[llm] call_budget`
pub const CALL_BUDGET_ENV_VAR: &str = "ROADMAPPER_CALL_BUDGET";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
struct TomlConfig {
    defaults: Option<Defaults>,
    llm: Option<LlmConfig>,
}

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults
    ///
    /// Uses the current working directory as the starting point for config
    /// file discovery when no explicit path is given.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let mut source_attribution = HashMap::new();

        let mut defaults = Defaults::default();
        let mut llm = LlmConfig::default();

        for key in [
            "store_dir",
            "retry_backoff_ms",
            "job_yield_ms",
            "call_timeout_secs",
            "verbose",
            "llm.models",
        ] {
            source_attribution.insert(key.to_string(), ConfigSource::Defaults);
        }

        let config_path = match &cli_args.config_path {
            Some(explicit_path) => {
                if !explicit_path.exists() {
                    return Err(roadmapper_utils::error::ConfigError::NotFound {
                        path: explicit_path.display().to_string(),
                    }
                    .into());
                }
                Some(explicit_path.clone())
            }
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            let config_source = ConfigSource::ConfigFile(path.clone());

            if let Some(file_defaults) = file_config.defaults {
                if file_defaults.store_dir.is_some() {
                    defaults.store_dir = file_defaults.store_dir;
                    source_attribution.insert("store_dir".to_string(), config_source.clone());
                }
                if file_defaults.retry_backoff_ms.is_some() {
                    defaults.retry_backoff_ms = file_defaults.retry_backoff_ms;
                    source_attribution
                        .insert("retry_backoff_ms".to_string(), config_source.clone());
                }
                if file_defaults.job_yield_ms.is_some() {
                    defaults.job_yield_ms = file_defaults.job_yield_ms;
                    source_attribution.insert("job_yield_ms".to_string(), config_source.clone());
                }
                if file_defaults.call_timeout_secs.is_some() {
                    defaults.call_timeout_secs = file_defaults.call_timeout_secs;
                    source_attribution
                        .insert("call_timeout_secs".to_string(), config_source.clone());
                }
                if file_defaults.verbose.is_some() {
                    defaults.verbose = file_defaults.verbose;
                    source_attribution.insert("verbose".to_string(), config_source.clone());
                }
            }

            if let Some(file_llm) = file_config.llm {
                if file_llm.provider.is_some() {
                    llm.provider = file_llm.provider;
                    source_attribution.insert("llm.provider".to_string(), config_source.clone());
                }
                if !file_llm.models.is_empty() {
                    llm.models = file_llm.models;
                    source_attribution.insert("llm.models".to_string(), config_source.clone());
                }
                if file_llm.call_budget.is_some() {
                    llm.call_budget = file_llm.call_budget;
                    source_attribution
                        .insert("llm.call_budget".to_string(), config_source.clone());
                }
                if file_llm.openrouter.is_some() {
                    llm.openrouter = file_llm.openrouter;
                    source_attribution.insert("llm.openrouter".to_string(), config_source.clone());
                }
                if file_llm.anthropic.is_some() {
                    llm.anthropic = file_llm.anthropic;
                    source_attribution.insert("llm.anthropic".to_string(), config_source);
                }
            }
        }

        // Environment overrides the file, CLI overrides both
        if let Ok(env_provider) = env::var(PROVIDER_ENV_VAR)
            && !env_provider.trim().is_empty()
        {
            llm.provider = Some(env_provider.trim().to_string());
            source_attribution.insert("llm.provider".to_string(), ConfigSource::Env);
        }
        if let Ok(env_budget) = env::var(CALL_BUDGET_ENV_VAR)
            && let Ok(budget) = env_budget.trim().parse::<u32>()
        {
            llm.call_budget = Some(budget);
            source_attribution.insert("llm.call_budget".to_string(), ConfigSource::Env);
        }

        if let Some(store_dir) = &cli_args.store_dir {
            defaults.store_dir = Some(store_dir.clone());
            source_attribution.insert("store_dir".to_string(), ConfigSource::Cli);
        }
        if let Some(verbose) = cli_args.verbose {
            defaults.verbose = Some(verbose);
            source_attribution.insert("verbose".to_string(), ConfigSource::Cli);
        }
        if let Some(provider) = &cli_args.provider {
            llm.provider = Some(provider.clone());
            source_attribution.insert("llm.provider".to_string(), ConfigSource::Cli);
        }
        if cli_args.dry_run {
            llm.provider = Some("dry-run".to_string());
            source_attribution.insert("llm.provider".to_string(), ConfigSource::Cli);
        }
        if !cli_args.models.is_empty() {
            llm.models = cli_args.models.clone();
            source_attribution.insert("llm.models".to_string(), ConfigSource::Cli);
        }
        if let Some(budget) = cli_args.call_budget {
            llm.call_budget = Some(budget);
            source_attribution.insert("llm.call_budget".to_string(), ConfigSource::Cli);
        }

        if llm.provider.is_none() {
            llm.provider = Some(DEFAULT_PROVIDER.to_string());
            source_attribution.insert("llm.provider".to_string(), ConfigSource::Defaults);
        }

        let config = Self {
            defaults,
            llm,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Discover the config file by searching upward from `start_dir`
    ///
    /// Walks up looking for `.roadmapper/config.toml`, stopping at repository
    /// root markers (.git, .hg) or the filesystem root. Falls back to
    /// `config.toml` inside `ROADMAPPER_HOME`.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(STATE_DIR_NAME).join("config.toml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists() || current_dir.join(".hg").exists() {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        let home_config = roadmapper_home().join("config.toml");
        if home_config.is_absolute() && home_config.exists() {
            return Ok(Some(home_config.into_std_path_buf()));
        }

        Ok(None)
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content).map_err(|e| {
                    roadmapper_utils::error::ConfigError::InvalidFile(format!(
                        "{}: {e}",
                        path.display()
                    ))
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let state = dir.join(STATE_DIR_NAME);
        fs::create_dir_all(&state).unwrap();
        let path = state.join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_config_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();

        let config = Config::discover_from(temp.path(), &CliArgs::default()).unwrap();
        assert_eq!(config.source_attribution["llm.models"], ConfigSource::Defaults);
        assert_eq!(config.models().len(), super::super::DEFAULT_MODELS.len());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        let path = write_config(
            temp.path(),
            r#"
[defaults]
retry_backoff_ms = 250

[llm]
provider = "anthropic"
models = ["claude-a", "claude-b"]
"#,
        );

        let config = Config::discover_from(temp.path(), &CliArgs::default()).unwrap();
        assert_eq!(config.defaults.retry_backoff_ms, Some(250));
        assert_eq!(config.models(), vec!["claude-a", "claude-b"]);
        assert_eq!(
            config.source_attribution["llm.models"],
            ConfigSource::ConfigFile(path)
        );
    }

    #[test]
    fn test_discovery_walks_upward() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[llm]\nmodels = [\"m1\"]\n");
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_from(&nested, &CliArgs::default()).unwrap();
        assert_eq!(config.models(), vec!["m1"]);
    }

    #[test]
    fn test_cli_overrides_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(
            temp.path(),
            "[llm]\nprovider = \"anthropic\"\nmodels = [\"file-model\"]\n",
        );

        let cli = CliArgs {
            models: vec!["cli-model".to_string()],
            dry_run: true,
            ..CliArgs::default()
        };
        let config = Config::discover_from(temp.path(), &cli).unwrap();
        assert_eq!(config.provider(), "dry-run");
        assert_eq!(config.models(), vec!["cli-model"]);
        assert_eq!(config.source_attribution["llm.models"], ConfigSource::Cli);
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let cli = CliArgs {
            config_path: Some(temp.path().join("nope.toml")),
            ..CliArgs::default()
        };
        let err = Config::discover_from(temp.path(), &cli).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[llm\nprovider = ");

        let err = Config::discover_from(temp.path(), &CliArgs::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid configuration file"));
    }
}
