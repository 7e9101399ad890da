// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::PathBuf;

use polypress::app_config::{self, Config};
use polypress::store::endpoint_for_content_type;
use polypress::{Controller, EntryTarget};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Which content type an entry belongs to
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct EndpointArgs {
    /// API endpoint of the content type (e.g. 'articles')
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Singular content-type name (e.g. 'article', 'category')
    #[arg(long)]
    content_type: Option<String>,
}

impl EndpointArgs {
    fn resolve(&self) -> Result<String> {
        match (&self.endpoint, &self.content_type) {
            (Some(endpoint), _) => Ok(endpoint.clone()),
            (None, Some(content_type)) => Ok(endpoint_for_content_type(content_type)),
            (None, None) => Err(anyhow!("Either --endpoint or --content-type is required")),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate an entry into other locales
    Translate {
        /// Document identifier of the entry
        #[arg(value_name = "ENTRY_ID", required_unless_present = "slug")]
        entry_id: Option<String>,

        /// Find the entry by slug instead of identifier
        #[arg(long, conflicts_with = "entry_id")]
        slug: Option<String>,

        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Only translate into this locale
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// List the locales configured in the content store
    Locales,

    /// Create draft variants of an entry in every locale it lacks
    Seed {
        /// Document identifier of the entry
        #[arg(value_name = "ENTRY_ID")]
        entry_id: String,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Check the translation engine credentials
    Check,

    /// Generate shell completions for polypress
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// polypress - HTML-preserving translation of content-store entries
#[derive(Parser, Debug)]
#[command(name = "polypress")]
#[command(version)]
#[command(about = "Translate content-store entries while preserving their markup")]
#[command(long_about = "polypress translates articles, categories and tags stored in a Strapi
instance into every other configured locale using DeepL, restoring element
attributes the engine would otherwise drop.

EXAMPLES:
    polypress translate abc123 --endpoint articles          # All locales
    polypress translate abc123 --endpoint articles -l fr    # French only
    polypress translate --slug hello-world --content-type article
    polypress seed abc123 --endpoint articles               # Draft copies
    polypress locales
    polypress completions bash > polypress.bash

CONFIGURATION:
    Configuration is read from polypress.json, or from the user config
    directory, or from --config. A default file is created when missing.
    STRAPI_BASE_URL, STRAPI_API_TOKEN and DEEPL_AUTH_KEY override the
    credentials in the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                color, now, record.level(), record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Accept everything here; the effective level is set after the config loads
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "polypress", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = cli.log_level {
        log::set_max_level(app_config::LogLevel::from(level).to_level_filter());
    }

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;
    config.apply_env_overrides();

    match cli.log_level {
        Some(level) => config.log_level = level.into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Translate { entry_id, slug, endpoint, locale } => {
            let endpoint = endpoint.resolve()?;
            let target = match (entry_id, slug) {
                (_, Some(slug)) => EntryTarget::Slug(slug),
                (Some(id), None) => EntryTarget::Id(id),
                (None, None) => return Err(anyhow!("ENTRY_ID or --slug is required")),
            };

            let summary = controller.translate(&target, &endpoint, locale.as_deref()).await?;
            if !summary.success {
                return Err(anyhow!(
                    "Translation failed for: {}",
                    summary.failed_locales().join(", ")
                ));
            }
        }
        Commands::Locales => {
            for locale in controller.locales().await? {
                println!("{}", locale);
            }
        }
        Commands::Seed { entry_id, endpoint } => {
            let endpoint = endpoint.resolve()?;
            let results = controller.seed(&entry_id, &endpoint).await?;
            let created = results.iter().filter(|r| r.success).count();
            info!("Created {} draft(s) for {}/{}", created, endpoint, entry_id);
        }
        Commands::Check => {
            controller.check_engine().await?;
            info!("Translation engine reachable");
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
