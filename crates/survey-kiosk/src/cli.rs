use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use schemars::schema_for;
use serde_json::json;
use survey_spec::{Cardinality, Locale, LocalizedContent, QuestionId, SurveyCatalog};
use survey_wizard::{
    ConfigError, Intent, KioskConfig, SessionSnapshot, SubmissionRecord, SystemClock,
    WizardController, transport_for,
};
use tokio::io::BufReader;
use tracing::info;

use crate::{bridge, locale, logging};

#[derive(Parser, Debug)]
#[command(
    name = "survey-kiosk",
    about = "Headless host for the visitor survey wizard",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Emit logs as JSON on stderr
    #[arg(long = "log-json", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read intents from stdin and print session snapshots to stdout
    Run(RunArgs),
    /// Print localized question titles and choices
    Catalog(CatalogArgs),
    /// Print a JSON Schema for one of the wire documents
    Schema(SchemaArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct ConfigSource {
    /// TOML configuration file
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Submission endpoint; overrides the file and SURVEY_ENDPOINT
    #[arg(long = "endpoint", value_name = "URL")]
    endpoint: Option<String>,
    /// Client identifier; overrides the file and SURVEY_CLIENT_ID
    #[arg(long = "client-id", value_name = "ID")]
    client_id: Option<String>,
    /// Locale new sessions start in (ja, en, zh, ko, es or auto)
    #[arg(long = "locale", value_name = "LOCALE")]
    locale: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    #[command(flatten)]
    source: ConfigSource,
}

#[derive(Args, Debug, Clone)]
struct CatalogArgs {
    /// Display locale (ja, en, zh, ko, es or auto)
    #[arg(long = "locale", value_name = "LOCALE")]
    locale: Option<String>,
    /// Emit JSON instead of text
    #[arg(long = "json")]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemaTarget {
    Record,
    Snapshot,
    Intent,
}

#[derive(Args, Debug, Clone)]
struct SchemaArgs {
    #[arg(value_enum, default_value = "record")]
    target: SchemaTarget,
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    #[command(flatten)]
    source: ConfigSource,
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.log_json);
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Catalog(args) => catalog(args),
        Commands::Schema(args) => schema(args),
        Commands::Config(args) => config(args),
    }
}

fn resolve_config(source: &ConfigSource) -> Result<KioskConfig> {
    let mut config = KioskConfig::load(source.config.as_deref())
        .context("failed to load kiosk configuration")?;
    if let Some(endpoint) = source.endpoint.as_deref() {
        config.set_endpoint(endpoint)?;
    }
    if let Some(client_id) = source.client_id.as_deref() {
        config.client_id = client_id.to_string();
    }
    config.default_locale = locale::select_locale(source.locale.as_deref(), config.default_locale)
        .map_err(ConfigError::Locale)?;
    config.validate()?;
    Ok(config)
}

fn run(args: RunArgs) -> Result<()> {
    let config = resolve_config(&args.source)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(async move {
        let transport = transport_for(&config).context("failed to build submission transport")?;
        info!(
            endpoint = config.endpoint.as_ref().map(|url| url.as_str()).unwrap_or("dry-run"),
            locale = %config.default_locale,
            "survey kiosk starting"
        );
        let controller = WizardController::new(config, Arc::new(SystemClock), transport)?;
        bridge::run_bridge(
            controller,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
        .await?;
        Ok(())
    })
}

fn catalog(args: CatalogArgs) -> Result<()> {
    let locale = locale::select_locale(args.locale.as_deref(), Locale::default())?;
    let content = LocalizedContent::builtin();
    let catalog = content.catalog();

    if args.json {
        let questions: Vec<_> = QuestionId::ALL
            .into_iter()
            .map(|question| {
                json!({
                    "id": question,
                    "step": question.step(),
                    "title": content.question_title(locale, question),
                    "choices": choices(catalog, question, locale)
                        .into_iter()
                        .map(|(id, label)| json!({ "id": id, "label": label }))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&questions)?);
        return Ok(());
    }

    println!("{}", content.text(locale, "survey.title"));
    for question in QuestionId::ALL {
        println!();
        println!(
            "[{}] {}",
            question.step(),
            content.question_title(locale, question)
        );
        if question.cardinality() == Cardinality::FreeText {
            println!("    (free text)");
            continue;
        }
        for (id, label) in choices(catalog, question, locale) {
            println!("    {id:<28} {label}");
        }
    }
    Ok(())
}

fn choices<'a>(
    catalog: &'a SurveyCatalog,
    question: QuestionId,
    locale: Locale,
) -> Vec<(&'a str, &'a str)> {
    let Some(options) = catalog.get(question) else {
        return Vec::new();
    };
    options
        .options()
        .iter()
        .filter_map(|option| {
            options
                .label_in(&option.id, locale)
                .map(|label| (option.id.as_str(), label))
        })
        .collect()
}

fn schema(args: SchemaArgs) -> Result<()> {
    let schema = match args.target {
        SchemaTarget::Record => schema_for!(SubmissionRecord),
        SchemaTarget::Snapshot => schema_for!(SessionSnapshot),
        SchemaTarget::Intent => schema_for!(Intent),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn config(args: ConfigArgs) -> Result<()> {
    let config = resolve_config(&args.source)?;
    print!("{}", config.to_toml().context("failed to render configuration")?);
    Ok(())
}
