//! Layered configuration: defaults, TOML file, environment, then command line.

use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

use config::{
    builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File, FileFormat,
};
use miette::{miette, Context, IntoDiagnostic, Result};
use serde::Deserialize;

use crate::{cli::Args, types::Proxy};

const ENV_PREFIX: &str = "TUBEBATCH";
const DEFAULT_CONFIG_FILE: &str = "tubebatch.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub input: PathBuf,
    pub metadata: PathBuf,
    pub out_dir: PathBuf,
    pub token_cache: PathBuf,
    pub delay_secs: f64,
    pub workers: Option<NonZeroUsize>,
    #[serde(default)]
    pub proxies: String,
}

impl Settings {
    pub fn load(args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => File::from(path.clone()).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        Self::from_sources(file, Environment::with_prefix(ENV_PREFIX), args)
    }

    fn from_sources<F>(file: F, env: Environment, args: &Args) -> Result<Self>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let settings: Settings = Self::builder(file, env, args)
            .and_then(|builder| builder.build())
            .and_then(|config| config.try_deserialize::<Settings>())
            .into_diagnostic()
            .wrap_err("Invalid configuration")?;

        if !settings.delay_secs.is_finite() || settings.delay_secs < 0. {
            return Err(miette!(
                "The delay must be a positive number of seconds, got {}",
                settings.delay_secs
            ));
        }

        Ok(settings)
    }

    fn builder<F>(
        file: F,
        env: Environment,
        args: &Args,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());

        Config::builder()
            .set_default("input", "files/video_urls.csv")?
            .set_default("metadata", "files/video_metadata.csv")?
            .set_default("out_dir", "videos")?
            .set_default("token_cache", "po_token_cache.txt")?
            .set_default("delay_secs", 5.0)?
            .add_source(file)
            .add_source(env.try_parsing(true))
            .set_override_option("input", path(&args.input))?
            .set_override_option("metadata", path(&args.metadata))?
            .set_override_option("out_dir", path(&args.out))?
            .set_override_option("token_cache", path(&args.token_cache))?
            .set_override_option("delay_secs", args.delay_secs)?
            .set_override_option("workers", args.workers.map(|w| w.get() as u64))?
            .set_override_option("proxies", args.proxies.clone())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_secs)
    }

    pub fn proxies(&self) -> Result<Vec<Proxy>> {
        Proxy::parse_list(&self.proxies)
            .map_err(|err| miette!("{err}"))
            .wrap_err("Invalid proxy list")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use clap::Parser;
    use tempfile::TempDir;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(vars))
    }

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("tubebatch").chain(argv.iter().copied())).unwrap()
    }

    fn no_file(dir: &TempDir) -> File<config::FileSourceFile, FileFormat> {
        File::from(dir.path().join("absent.toml"))
            .format(FileFormat::Toml)
            .required(false)
    }

    #[test]
    fn defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::from_sources(no_file(&dir), env(&[]), &args(&[])).unwrap();

        assert_eq!(settings.input, PathBuf::from("files/video_urls.csv"));
        assert_eq!(settings.metadata, PathBuf::from("files/video_metadata.csv"));
        assert_eq!(settings.out_dir, PathBuf::from("videos"));
        assert_eq!(settings.token_cache, PathBuf::from("po_token_cache.txt"));
        assert_eq!(settings.delay(), Duration::from_secs(5));
        assert!(settings.workers.is_none());
        assert!(settings.proxies().unwrap().is_empty());
    }

    #[test]
    fn layers_override_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tubebatch.toml");
        std::fs::write(
            &path,
            "input = \"from_file.csv\"\nout_dir = \"file_videos\"\nworkers = 2\ndelay_secs = 1\n",
        )
        .unwrap();
        let file = File::from(path).format(FileFormat::Toml);

        let settings = Settings::from_sources(
            file,
            env(&[("TUBEBATCH_OUT_DIR", "env_videos"), ("TUBEBATCH_WORKERS", "6")]),
            &args(&["--workers", "8", "--proxies", "10.0.0.1:3128"]),
        )
        .unwrap();

        assert_eq!(settings.input, PathBuf::from("from_file.csv"));
        assert_eq!(settings.out_dir, PathBuf::from("env_videos"));
        assert_eq!(settings.workers, NonZeroUsize::new(8));
        assert_eq!(settings.delay(), Duration::from_secs(1));
        assert_eq!(settings.proxies().unwrap()[0].as_str(), "http://10.0.0.1:3128");
    }

    #[test]
    fn negative_delay_is_rejected() {
        let dir = TempDir::new().unwrap();
        let res = Settings::from_sources(
            no_file(&dir),
            env(&[("TUBEBATCH_DELAY_SECS", "-1")]),
            &args(&[]),
        );
        assert!(res.is_err());
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = File::from(dir.path().join("absent.toml"))
            .format(FileFormat::Toml)
            .required(true);
        assert!(Settings::from_sources(file, env(&[]), &args(&[])).is_err());
    }
}
