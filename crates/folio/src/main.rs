use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use folio::{Catalog, CorpusLayout, Library};
use folio_lexicon::{DEFAULT_API_URL, Dictionary, RemoteDictionary};
use folio_markup::LoadMode;
use folio_types::WorkKind;
use serde::Serialize;
use serde_json::json;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CORPUS_DIR: &str = "attached_assets";
const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config()?;
    info!(
        "using corpus at {} (mode: {:?})",
        config.corpus_dir.display(),
        config.load_mode
    );
    if config.offline {
        info!("remote dictionary disabled");
    } else {
        info!(
            "remote dictionary at {} (timeout {} ms)",
            config.api_url,
            config.timeout.as_millis()
        );
    }

    let start = Instant::now();
    let catalog = Catalog::build(&config.corpus_dir, &config.layout, config.load_mode)?;
    info!("startup ingest took {} ms", start.elapsed().as_millis());

    let lexicon = Arc::clone(catalog.lexicon());
    let remote = if config.offline {
        None
    } else {
        Some(RemoteDictionary::new(&config.api_url, config.timeout)?)
    };
    let library = Library::new(catalog, Arc::new(Dictionary::new(lexicon, remote)));

    run(&library, config.command).await
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Summary,
    Works,
    Passages(u32),
    Passage(u32),
    Define(String),
}

async fn run(library: &Library, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Summary => {
            let works = library.works();
            let plays = works.iter().filter(|w| w.kind == WorkKind::Play).count();
            print_json(&json!({
                "works": works.len(),
                "plays": plays,
                "sonnets": works.len() - plays,
                "passages": library.catalog().passages().len(),
                "lexiconEntries": library.lexicon_len(),
            }))
        }
        Command::Works => print_json(&library.works()),
        Command::Passages(work_id) => match library.work(work_id) {
            Some(_) => print_json(&library.passages_for(work_id)),
            None => not_found(&format!("work {work_id}")),
        },
        Command::Passage(id) => match library.passage(id) {
            Some(passage) => print_json(passage),
            None => not_found(&format!("passage {id}")),
        },
        Command::Define(word) => match library.define(&word).await {
            Some(definition) => print_json(&definition),
            None => not_found(&format!("definition for {word:?}")),
        },
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

fn not_found(what: &str) -> anyhow::Result<()> {
    print_json(&json!({ "message": format!("{what} not found") }))
}

#[derive(Debug, Clone)]
struct Config {
    corpus_dir: PathBuf,
    load_mode: LoadMode,
    layout: CorpusLayout,
    api_url: String,
    timeout: Duration,
    offline: bool,
    command: Command,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    offline: bool,
    corpus_dir: Option<PathBuf>,
    load_mode: Option<LoadMode>,
    positional: Vec<String>,
}

/// Flags take either `--flag value` or `--flag=value`.
fn parse_args(raw: impl IntoIterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut args = raw.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--offline" => cli.offline = true,
            "--corpus-dir" => {
                if let Some(path) = args.next() {
                    cli.corpus_dir = Some(PathBuf::from(path));
                }
            }
            "--load-mode" => {
                if let Some(mode) = args.next() {
                    cli.load_mode = parse_load_mode(&mode);
                }
            }
            _ => {
                if let Some(path) = arg.strip_prefix("--corpus-dir=") {
                    cli.corpus_dir = Some(PathBuf::from(path));
                } else if let Some(mode) = arg.strip_prefix("--load-mode=") {
                    cli.load_mode = parse_load_mode(mode);
                } else if arg.starts_with("--") {
                    bail!("unknown option {arg}");
                } else {
                    cli.positional.push(arg);
                }
            }
        }
    }
    Ok(cli)
}

fn load_config() -> anyhow::Result<Config> {
    let CliArgs {
        offline,
        corpus_dir: cli_corpus_dir,
        load_mode: cli_load_mode,
        positional,
    } = parse_args(env::args().skip(1))?;

    let corpus_dir = cli_corpus_dir
        .or_else(|| env::var("FOLIO_CORPUS_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS_DIR));
    let load_mode = cli_load_mode
        .or_else(|| {
            env::var("FOLIO_LOAD_MODE")
                .ok()
                .as_deref()
                .and_then(parse_load_mode)
        })
        .unwrap_or(LoadMode::Mmap);

    let mut layout = CorpusLayout::default();
    if let Some(files) = env::var("FOLIO_SONNET_FILES").ok().and_then(|v| parse_list(&v)) {
        layout.sonnet_files = files;
    }
    if let Some(files) = env::var("FOLIO_LEXICON_FILES").ok().and_then(|v| parse_list(&v)) {
        layout.lexicon_files = files;
    }

    let api_url = env::var("DICTIONARY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let timeout_ms = env::var("DICTIONARY_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_TIMEOUT_MS);

    Ok(Config {
        corpus_dir,
        load_mode,
        layout,
        api_url,
        timeout: Duration::from_millis(timeout_ms),
        offline,
        command: parse_command(&positional)?,
    })
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    let id = |raw: Option<&String>, what: &str| -> anyhow::Result<u32> {
        let raw = raw.with_context(|| format!("missing {what}"))?;
        raw.parse()
            .with_context(|| format!("{what} must be a positive integer, got {raw:?}"))
    };
    let command = match args.first().map(String::as_str) {
        None | Some("summary") => Command::Summary,
        Some("works") => Command::Works,
        Some("passages") => Command::Passages(id(args.get(1), "work id")?),
        Some("passage") => Command::Passage(id(args.get(1), "passage id")?),
        Some("define") => Command::Define(args.get(1).cloned().context("missing word")?),
        Some(other) => bail!(
            "unknown command {other:?} (expected summary, works, passages, passage or define)"
        ),
    };
    Ok(command)
}

fn parse_list(raw: &str) -> Option<Vec<String>> {
    let names: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();
    (!names.is_empty()).then_some(names)
}

fn parse_load_mode(raw: &str) -> Option<LoadMode> {
    match raw.to_ascii_lowercase().as_str() {
        "mmap" => Some(LoadMode::Mmap),
        "owned" => Some(LoadMode::Owned),
        _ => None,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
