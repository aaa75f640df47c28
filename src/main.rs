use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use xrayfeed::command::Command;
use xrayfeed::config::{ConfigStore, FileConfigStore, LoadOptions};
use xrayfeed::document::SnapshotDocument;
use xrayfeed::engine::Engine;
use xrayfeed::scan;

const HELP: &str = "XRayFeed: highlight trending posts in a rendered feed.

  scan  <snapshot.json> [--config <file>]   Run one pass and print the marked snapshot
  serve <snapshot.json> [--config <file>]   Run the engine; JSON commands on stdin
  reset [--config <file>]                   Restore the default config
  --version, -V        Show version and exit
  --help,    -h        Show this help message
  --check-updates      Check for updates and exit";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if handle_cli_flags(&args) {
        return;
    }

    if let Err(err) = run(&args) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags(args: &[String]) -> bool {
    let mut saw_flag = false;
    for arg in args {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("XRayFeed {}", xrayfeed::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!("{HELP}");
                saw_flag = true;
            }
            "--check-updates" => {
                saw_flag = true;
                if let Err(err) = check_updates_once() {
                    eprintln!("Update check failed: {err:?}");
                    std::process::exit(1);
                }
            }
            _ => {}
        }
    }
    saw_flag
}

fn run(args: &[String]) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("scan") => scan_once(&args[1..]),
        Some("serve") => serve(&args[1..]),
        Some("reset") => reset_config(&args[1..]),
        Some(other) => bail!("unknown command {other:?}; see --help"),
        None => {
            println!("{HELP}");
            Ok(())
        }
    }
}

struct Target {
    snapshot: PathBuf,
    options: LoadOptions,
}

fn parse_target(args: &[String]) -> Result<Target> {
    let mut snapshot = None;
    let mut options = LoadOptions::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a file path")?;
                options.config_file = Some(PathBuf::from(path));
            }
            other if snapshot.is_none() => snapshot = Some(PathBuf::from(other)),
            other => bail!("unexpected argument {other:?}"),
        }
    }
    Ok(Target {
        snapshot: snapshot.context("missing snapshot path")?,
        options,
    })
}

fn scan_once(args: &[String]) -> Result<()> {
    let target = parse_target(args)?;
    let mut doc = SnapshotDocument::open(&target.snapshot)?;
    let store = FileConfigStore::open(target.options).context("open config store")?;
    let config = store.get().context("load config")?;

    let summary = scan::run_pass(&mut doc, &config, chrono::Utc::now());
    log::info!(
        "scanned {} items: {} qualified, {} highlighted",
        summary.scanned,
        summary.qualified,
        summary.highlighted
    );

    let out = serde_json::to_string_pretty(doc.snapshot()).context("encode snapshot")?;
    println!("{out}");
    Ok(())
}

// One JSON message per stdin line: a lifecycle command or {"navigate": url}.
// START, STOP and UPDATE_CONFIG are saved before they reach the engine.
fn serve(args: &[String]) -> Result<()> {
    let target = parse_target(args)?;
    let doc = SnapshotDocument::open(&target.snapshot)?;
    let store: Arc<dyn ConfigStore> =
        Arc::new(FileConfigStore::open(target.options).context("open config store")?);
    let location = doc.location().to_string();
    let handle = Engine::new(store.clone(), doc, location).spawn();

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("ignoring non-JSON input: {err}");
                continue;
            }
        };
        if let Some(location) = value.get("navigate").and_then(Value::as_str) {
            handle.navigate(location)?;
            continue;
        }
        match Command::decode(&value) {
            Ok(command) => {
                if let Some(change) = command.stored_change() {
                    if let Err(err) = store.set(&change) {
                        log::warn!("config not saved: {err:#}");
                    }
                }
                let response = handle.send(command)?;
                writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
                stdout.flush()?;
            }
            Err(err) => log::warn!("ignoring message: {err}"),
        }
    }

    handle.shutdown();
    Ok(())
}

fn reset_config(args: &[String]) -> Result<()> {
    let mut options = LoadOptions::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a file path")?;
                options.config_file = Some(PathBuf::from(path));
            }
            other => bail!("unexpected argument {other:?}"),
        }
    }
    let store = FileConfigStore::open(options).context("open config store")?;
    store.reset().context("reset config")?;
    println!("Config reset: {}", store.path().display());
    Ok(())
}

fn check_updates_once() -> anyhow::Result<()> {
    use semver::Version;

    let skip_env = xrayfeed::update::SKIP_UPDATE_ENV;
    if std::env::var(skip_env).is_ok() {
        println!("Update check skipped: {skip_env} is set.");
        return Ok(());
    }

    let current = Version::parse(xrayfeed::VERSION)?;
    match xrayfeed::update::check_for_update(&current)? {
        Some(info) => {
            let xrayfeed::update::UpdateInfo {
                version,
                release_url,
            } = info;
            println!("Update available: {current} -> {version}\n{release_url}");
        }
        None => {
            println!("XRayFeed {current} is up to date.");
        }
    }
    Ok(())
}
