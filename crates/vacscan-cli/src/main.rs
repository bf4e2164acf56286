//! `vacscan` - collect hh.ru vacancies from the command line.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use vacscan_collector::{CollectionResult, HhClient, VacancyCollector};
use vacscan_core::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "vacscan", version)]
#[command(about = "Collect hh.ru vacancies into a column table, with on-disk caching")]
struct Cli {
    /// Free-text search
    #[arg(short, long)]
    text: Option<String>,

    /// Professional role ids to filter by
    #[arg(short = 'p', long, num_args = 1..)]
    professional_roles: Vec<u32>,

    /// Number of concurrent detail fetches (values below 1 mean 1)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    workers: Option<i64>,

    /// Ignore cached results and collect again
    #[arg(short, long)]
    refresh: bool,

    /// Save the given arguments into the config file
    #[arg(short, long)]
    update: bool,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the collected table to this file as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Cli {
    /// Overlay command-line values onto the loaded configuration.
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(text) = &self.text {
            config.query.text = Some(text.clone());
        }
        if !self.professional_roles.is_empty() {
            config.query.professional_roles.clone_from(&self.professional_roles);
        }
        if let Some(workers) = self.workers {
            config.collector.workers = workers;
        }
        if self.refresh {
            config.collector.refresh = true;
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,vacscan=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

/// Resolve the config path, load it, then apply environment and command-line
/// overrides in that order. Persists the result when `--update` is given.
fn load_config<F>(cli: &Cli, env: F) -> Result<(AppConfig, PathBuf)>
where
    F: Fn(&str) -> Option<String>,
{
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::config_path().context("Failed to locate config directory")?,
    };

    let mut config = AppConfig::load_from(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config.apply_overrides(env);
    cli.apply_to(&mut config);

    if cli.update {
        config
            .save_to(&config_path)
            .with_context(|| format!("Failed to save config to {}", config_path.display()))?;
        info!("Saved settings to {}", config_path.display());
    }

    Ok((config, config_path))
}

fn write_output(path: &Path, result: &CollectionResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize results")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    info!("Wrote {} vacancies to {}", result.len(), path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    info!("Starting vacscan v{}", env!("CARGO_PKG_VERSION"));

    let (config, config_path) = load_config(&cli, |key| std::env::var(key).ok())?;
    info!("Using config {}", config_path.display());

    let query = config.query.to_query();
    if query.is_empty() {
        warn!("No text or filters given, collecting every listed vacancy");
    }

    let api = Arc::new(
        HhClient::from_config(&config.collector).context("Failed to build HTTP client")?,
    );
    let collector =
        VacancyCollector::from_config(api, &config).context("Failed to set up collector")?;

    let result = collector
        .collect(&query, config.collector.refresh)
        .await
        .context("Vacancy collection failed")?;

    if let Some(path) = &cli.output {
        write_output(path, &result)?;
    }

    let with_salary = result.has_salary().iter().filter(|has| **has).count();
    println!("Vacancies collected: {}", result.len());
    println!("With salary:         {with_salary}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("vacscan").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = parse(&[
            "-t", "rust", "-p", "96", "104", "-n", "4", "-r", "-u", "-c", "cfg.toml", "-o",
            "out.json",
        ]);
        assert_eq!(cli.text.as_deref(), Some("rust"));
        assert_eq!(cli.professional_roles, vec![96, 104]);
        assert_eq!(cli.workers, Some(4));
        assert!(cli.refresh);
        assert!(cli.update);
        assert_eq!(cli.config, Some(PathBuf::from("cfg.toml")));
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_negative_workers_accepted() {
        let cli = parse(&["--workers", "-3"]);
        assert_eq!(cli.workers, Some(-3));
    }

    #[test]
    fn test_arguments_override_config() {
        let mut config = AppConfig::default();
        config.query.text = Some("python".to_string());
        config.query.professional_roles = vec![1];
        config.collector.workers = 2;

        parse(&["--text", "rust"]).apply_to(&mut config);
        assert_eq!(config.query.text.as_deref(), Some("rust"));
        assert_eq!(config.query.professional_roles, vec![1]);
        assert_eq!(config.collector.workers, 2);
        assert!(!config.collector.refresh);

        parse(&["-p", "96", "-n", "8", "-r"]).apply_to(&mut config);
        assert_eq!(config.query.professional_roles, vec![96]);
        assert_eq!(config.collector.workers, 8);
        assert!(config.collector.refresh);
    }

    #[test]
    fn test_update_persists_arguments() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("config.toml");
        let path_arg = path.to_string_lossy().into_owned();

        let cli = parse(&["-c", &path_arg, "-t", "rust", "-n", "3", "-u"]);
        let (config, used_path) = load_config(&cli, no_env).expect("load and save");
        assert_eq!(used_path, path);
        assert_eq!(config.collector.workers, 3);

        let reloaded = AppConfig::load_from(&path).expect("reload saved config");
        assert_eq!(reloaded.query.text.as_deref(), Some("rust"));
        assert_eq!(reloaded.collector.workers, 3);
    }

    #[test]
    fn test_without_update_config_file_untouched() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("config.toml");
        let path_arg = path.to_string_lossy().into_owned();

        let cli = parse(&["-c", &path_arg, "-t", "rust"]);
        let (config, _) = load_config(&cli, no_env).expect("load");
        assert_eq!(config.query.text.as_deref(), Some("rust"));
        assert!(!path.exists());
    }

    #[test]
    fn test_arguments_win_over_environment() {
        let tmp = TempDir::new().expect("create temp dir");
        let path_arg = tmp.path().join("config.toml").to_string_lossy().into_owned();
        let env = |key: &str| (key == "VACSCAN_WORKERS").then(|| "6".to_string());

        let (config, _) = load_config(&parse(&["-c", &path_arg]), env).expect("load");
        assert_eq!(config.collector.workers, 6);

        let (config, _) = load_config(&parse(&["-c", &path_arg, "-n", "2"]), env).expect("load");
        assert_eq!(config.collector.workers, 2);
    }

    #[test]
    fn test_write_output_is_json_columns() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("out.json");

        write_output(&path, &CollectionResult::new()).expect("write output");
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read output"))
                .expect("valid JSON");
        assert!(json.is_object());
        assert_eq!(json["Ids"], serde_json::json!([]));
    }
}
