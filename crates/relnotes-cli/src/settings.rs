use anyhow::Context;
use relnotes_core::config::{find_config_file, ConfigLayer, Settings};
use std::path::{Path, PathBuf};

/// The three configuration layers for this invocation.
pub struct Sources {
    pub env: ConfigLayer,
    pub cli: ConfigLayer,
    pub file: ConfigLayer,
    pub file_path: Option<PathBuf>,
}

/// Read the environment and the config file.
///
/// The file is `explicit` (`--config` / `RELNOTES_CONFIG`) when given,
/// otherwise `relnotes.yaml` or `relnotes.yml` in the working directory.
pub fn collect(cli: ConfigLayer, explicit: Option<&Path>) -> anyhow::Result<Sources> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let file_path = find_config_file(&cwd, explicit)?;
    let file = match &file_path {
        Some(path) => ConfigLayer::load(path)?,
        None => ConfigLayer::default(),
    };
    Ok(Sources {
        env: ConfigLayer::from_process_env(),
        cli,
        file,
        file_path,
    })
}

impl Sources {
    /// Highest priority first: env, then CLI, then file.
    fn layers(&self) -> [ConfigLayer; 3] {
        [self.env.clone(), self.cli.clone(), self.file.clone()]
    }

    pub fn merged(&self) -> ConfigLayer {
        ConfigLayer::merge(self.layers())
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        Settings::resolve(self.layers()).context("invalid configuration")
    }
}
