//! `fotoreg` command line: form server plus offline helpers

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use fotoreg_core::config::ENV_TOKEN;
use fotoreg_core::{
    render_issues, render_preview, validate, AppConfig, Draft, SystemClock, Vocabulary,
};
use fotoreg_server::{missing_worksheets, serve, AppState};
use fotoreg_sheets::SheetsClient;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("fotoreg")
        .version(fotoreg_core::VERSION)
        .about("Species-observation photo registration form")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("serve")
                .about("Run the web form")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("log-json")
                        .long("log-json")
                        .action(ArgAction::SetTrue)
                        .help("Emit logs as JSON lines"),
                )
                .arg(
                    Arg::new("verify-sheet")
                        .long("verify-sheet")
                        .action(ArgAction::SetTrue)
                        .help("Check the digitizer worksheets exist before serving"),
                ),
        )
        .subcommand(
            Command::new("vocab")
                .about("Load the reference lists and summarize them")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .default_value("data/lista_categorias.csv")
                        .value_parser(value_parser!(PathBuf))
                        .help("Reference CSV file"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the full lists as JSON"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Validate a draft stored as JSON and print the preview")
                .arg(
                    Arg::new("draft")
                        .long("draft")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Draft JSON file"),
                )
                .arg(
                    Arg::new("token")
                        .long("token")
                        .env(ENV_TOKEN)
                        .required(true)
                        .help("Expected authentication token"),
                ),
        )
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("serve", args)) => run_serve(args).await,
        Some(("vocab", args)) => run_vocab(args),
        Some(("check", args)) => run_check(args),
        _ => Ok(()),
    }
}

async fn run_serve(args: &ArgMatches) -> anyhow::Result<()> {
    init_tracing(args.get_flag("log-json"));

    let config_path = args.get_one::<PathBuf>("config");
    let config = AppConfig::load(config_path.map(PathBuf::as_path))
        .context("loading configuration")?;
    let bind = config.bind;

    let vocabulary = Vocabulary::load(&config.vocabulary_path)?;
    let client = SheetsClient::new(
        &config.sheets,
        config.secrets.spreadsheet_key,
        config.secrets.access_token,
    )?;

    if args.get_flag("verify-sheet") {
        let missing = missing_worksheets(&client)
            .await
            .context("listing spreadsheet worksheets")?;
        for digitizer in missing {
            tracing::warn!(worksheet = digitizer.name(), "Worksheet missing; saves will fail");
        }
    }

    let state = Arc::new(AppState::new(
        vocabulary,
        config.secrets.token,
        Arc::new(client),
        Arc::new(SystemClock),
        config.zone,
    ));

    serve(state, bind, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Could not listen for shutdown signal");
        }
    })
    .await?;
    Ok(())
}

fn run_vocab(args: &ArgMatches) -> anyhow::Result<()> {
    init_tracing(false);

    let path = args.get_one::<PathBuf>("path").context("missing --path")?;
    let vocabulary = Vocabulary::load(path)?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&vocabulary)?);
    } else {
        println!("Reference lists in {}", path.display());
        println!("  Plants:    {}", vocabulary.plants().len());
        println!("  Birds:     {}", vocabulary.birds().len());
        println!("  Insects:   {}", vocabulary.insects().len());
        println!("  Taxa:      {}", vocabulary.taxa().len());
        println!("  Observers: {}", vocabulary.observers().len());
        println!("  Sites:     {}", vocabulary.sites().len());
    }
    Ok(())
}

fn run_check(args: &ArgMatches) -> anyhow::Result<()> {
    let path = args.get_one::<PathBuf>("draft").context("missing --draft")?;
    let token = args.get_one::<String>("token").context("missing --token")?;

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let draft: Draft = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    let draft = draft.normalized();

    let issues = validate(&draft, token);
    if !issues.is_empty() {
        print!("{}", render_issues(&issues));
        bail!("{} issue(s) found", issues.len());
    }

    for line in render_preview(&draft) {
        println!("{line}");
    }
    Ok(())
}
