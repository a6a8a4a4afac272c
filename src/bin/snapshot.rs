//! `snapshot` — CLI surface over the snapshot store.
//!
//! Subcommands: `create <name> <file> [--overwrite]`, `check <name> <file>`,
//! `update <name> <file> [--create-if-missing]`, `list`, `delete <name>`,
//! `clean <name>...` (clean-orphans, keeping the listed names). `--json`
//! selects machine-readable output, `--config <path>` loads a TOML config
//! file. Exit codes follow §6.4.

#[macro_use]
extern crate tuulbelt_core;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tuulbelt_core::snapshot::{CheckOutcome, SnapshotConfig, SnapshotOptions, SnapshotStore};

fn resolve_snapshot_config(config_path: Option<&PathBuf>) -> tuulbelt_core::Result<SnapshotConfig> {
    match config_path {
        Some(path) => {
            let (_lock, _registry, snapshot) = tuulbelt_core::config::load_from_path(path)?.into_configs()?;
            Ok(snapshot)
        }
        None => Ok(SnapshotConfig::default()),
    }
}

enum Action {
    Create {
        name: String,
        file: String,
        overwrite: bool,
    },
    Check {
        name: String,
        file: String,
    },
    Update {
        name: String,
        file: String,
        create_if_missing: bool,
    },
    List,
    Delete {
        name: String,
    },
    Clean {
        keep: Vec<String>,
    },
}

struct Parsed {
    action: Action,
    json: bool,
    config: Option<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<Parsed, String> {
    let mut args = args.into_iter();
    let command = args.next().ok_or("missing subcommand")?;
    let mut rest: Vec<String> = args.collect();

    let mut json = false;
    let mut config = None;
    let mut i = 0;
    while i < rest.len() {
        if rest[i] == "--json" {
            json = true;
            rest.remove(i);
        } else if rest[i] == "--config" {
            config = Some(PathBuf::from(rest.get(i + 1).ok_or("--config requires a value")?));
            rest.drain(i..=i + 1);
        } else {
            i += 1;
        }
    }

    let action = match command.as_str() {
        "create" => {
            let name = rest.first().ok_or("create: missing <name>")?.clone();
            let file = rest.get(1).ok_or("create: missing <file>")?.clone();
            let overwrite = rest.iter().any(|a| a == "--overwrite");
            Action::Create { name, file, overwrite }
        }
        "check" => {
            let name = rest.first().ok_or("check: missing <name>")?.clone();
            let file = rest.get(1).ok_or("check: missing <file>")?.clone();
            Action::Check { name, file }
        }
        "update" => {
            let name = rest.first().ok_or("update: missing <name>")?.clone();
            let file = rest.get(1).ok_or("update: missing <file>")?.clone();
            let create_if_missing = rest.iter().any(|a| a == "--create-if-missing");
            Action::Update {
                name,
                file,
                create_if_missing,
            }
        }
        "list" => Action::List,
        "delete" => {
            let name = rest.first().ok_or("delete: missing <name>")?.clone();
            Action::Delete { name }
        }
        "clean" => Action::Clean { keep: rest },
        other => return Err(format!("unknown subcommand: {other}")),
    };

    Ok(Parsed { action, json, config })
}

fn main() -> anyhow::Result<ExitCode> {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let parsed = match parse_args(raw) {
        Ok(p) => p,
        Err(e) => {
            log_error!("{e}");
            return Ok(ExitCode::from(2));
        }
    };

    match run(parsed) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            log_error!("{err}");
            Ok(ExitCode::from(err.exit_code() as u8))
        }
    }
}

fn default_store(config_path: Option<&PathBuf>) -> tuulbelt_core::Result<SnapshotStore> {
    SnapshotStore::new(resolve_snapshot_config(config_path)?)
}

fn read_file(path: &str) -> tuulbelt_core::Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        tuulbelt_core::Error::new(tuulbelt_core::ErrorKind::Io, format!("failed to read {path}")).with_source(e)
    })
}

fn run(parsed: Parsed) -> tuulbelt_core::Result<()> {
    let store = default_store(parsed.config.as_ref())?;
    match parsed.action {
        Action::Create { name, file, overwrite } => {
            let content = read_file(&file)?;
            let snap = store.create(
                &name,
                &content,
                SnapshotOptions {
                    overwrite,
                    ..Default::default()
                },
            )?;
            println!("created {} ({} bytes)", snap.header.name, snap.header.content_size);
            Ok(())
        }
        Action::Check { name, file } => {
            let content = read_file(&file)?;
            match store.check(&name, &content, SnapshotOptions::default())? {
                CheckOutcome::Match => {
                    println!("match");
                    Ok(())
                }
                CheckOutcome::Mismatch { diff, .. } => {
                    println!("mismatch");
                    println!("{diff}");
                    Err(tuulbelt_core::Error::new(
                        tuulbelt_core::ErrorKind::Conflict,
                        format!("snapshot '{name}' does not match"),
                    ))
                }
            }
        }
        Action::Update {
            name,
            file,
            create_if_missing,
        } => {
            let content = read_file(&file)?;
            let snap = store.update(
                &name,
                &content,
                SnapshotOptions {
                    create_if_missing,
                    ..Default::default()
                },
            )?;
            println!("updated {} ({} bytes)", snap.header.name, snap.header.content_size);
            Ok(())
        }
        Action::List => {
            for header in store.list()? {
                if parsed.json {
                    println!(
                        "{{\"name\":\"{}\",\"hash\":\"{}\",\"size\":{},\"createdAt\":{},\"updatedAt\":{}}}",
                        header.name, header.content_hash, header.content_size, header.created_at, header.updated_at
                    );
                } else {
                    println!(
                        "{}\t{} bytes\thash={}",
                        header.name, header.content_size, header.content_hash
                    );
                }
            }
            Ok(())
        }
        Action::Delete { name } => {
            let outcome = store.delete(&name)?;
            println!("{outcome:?}");
            Ok(())
        }
        Action::Clean { keep } => {
            let keep_refs: Vec<&str> = keep.iter().map(String::as_str).collect();
            let deleted = store.clean_orphans(&keep_refs)?;
            println!("deleted {}", deleted.join(", "));
            Ok(())
        }
    }
}
