//! `portreg` — CLI surface over the port registry.
//!
//! Subcommands: `get [--count N] [--tag T] [--preferred PORT]`, `release <port>`,
//! `release-all`, `list`, `status`, `clean`, `clear [--force]`. `--json` selects
//! machine-readable output, `--config <path>` loads a TOML config file.
//! Exit codes follow §6.4.

#[macro_use]
extern crate tuulbelt_core;

use std::path::PathBuf;
use std::process::ExitCode;
use tuulbelt_core::registry::{AcquireOptions, PortRegistry, RegistryConfig};

fn resolve_registry_config(config_path: Option<&PathBuf>) -> tuulbelt_core::Result<RegistryConfig> {
    match config_path {
        Some(path) => {
            let (_lock, registry, _snapshot) = tuulbelt_core::config::load_from_path(path)?.into_configs()?;
            Ok(registry)
        }
        None => Ok(RegistryConfig::default()),
    }
}

enum Action {
    Get {
        count: usize,
        tag: Option<String>,
        preferred: Option<u16>,
    },
    Release {
        port: u16,
    },
    ReleaseAll,
    List,
    Status,
    Clean,
    Clear {
        force: bool,
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
        "get" => {
            let mut count = 1usize;
            let mut tag = None;
            let mut preferred = None;
            let mut i = 0;
            while i < rest.len() {
                match rest[i].as_str() {
                    "--count" => {
                        count = rest
                            .get(i + 1)
                            .ok_or("--count requires a value")?
                            .parse()
                            .map_err(|_| "--count must be a positive integer".to_string())?;
                        rest.drain(i..=i + 1);
                    }
                    "--tag" => {
                        tag = Some(rest.get(i + 1).ok_or("--tag requires a value")?.clone());
                        rest.drain(i..=i + 1);
                    }
                    "--preferred" => {
                        preferred = Some(
                            rest.get(i + 1)
                                .ok_or("--preferred requires a value")?
                                .parse()
                                .map_err(|_| "--preferred must be a valid port".to_string())?,
                        );
                        rest.drain(i..=i + 1);
                    }
                    other => return Err(format!("unknown flag: {other}")),
                }
            }
            Action::Get { count, tag, preferred }
        }
        "release" => {
            let port = rest
                .first()
                .ok_or("release: missing <port>")?
                .parse()
                .map_err(|_| "release: <port> must be a valid port".to_string())?;
            Action::Release { port }
        }
        "release-all" => Action::ReleaseAll,
        "list" => Action::List,
        "status" => Action::Status,
        "clean" => Action::Clean,
        "clear" => Action::Clear {
            force: rest.iter().any(|a| a == "--force"),
        },
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

fn run(parsed: Parsed) -> tuulbelt_core::Result<()> {
    let registry = PortRegistry::new(resolve_registry_config(parsed.config.as_ref())?)?;
    match parsed.action {
        Action::Get { count, tag, preferred } => {
            let options = AcquireOptions { tag, preferred };
            let ports = registry.acquire_many(count, options)?;
            if parsed.json {
                let rendered: Vec<String> = ports.iter().map(|p| p.to_string()).collect();
                println!("[{}]", rendered.join(","));
            } else {
                for port in ports {
                    println!("{port}");
                }
            }
            Ok(())
        }
        Action::Release { port } => {
            let outcome = registry.release_one(port)?;
            println!("{outcome:?}");
            Ok(())
        }
        Action::ReleaseAll => {
            let count = registry.release_all_by_holder()?;
            println!("released {count}");
            Ok(())
        }
        Action::List => {
            for entry in registry.list()? {
                if parsed.json {
                    println!(
                        "{{\"port\":{},\"pid\":{},\"acquiredAt\":{},\"tag\":{}}}",
                        entry.port,
                        entry.pid,
                        entry.acquired_at,
                        entry
                            .tag
                            .as_ref()
                            .map(|t| format!("\"{t}\""))
                            .unwrap_or_else(|| "null".into()),
                    );
                } else {
                    println!(
                        "{}\tpid={}\tacquired_at={}\ttag={}",
                        entry.port,
                        entry.pid,
                        entry.acquired_at,
                        entry.tag.as_deref().unwrap_or("-")
                    );
                }
            }
            Ok(())
        }
        Action::Status => {
            let status = registry.status()?;
            println!(
                "total={} active={} stale={} owned_by_caller={} range=[{},{}]",
                status.total, status.active, status.stale, status.owned_by_caller, status.min_port, status.max_port
            );
            Ok(())
        }
        Action::Clean => {
            let count = registry.clean_stale()?;
            println!("removed {count}");
            Ok(())
        }
        Action::Clear { force } => {
            registry.clear(force)?;
            println!("cleared");
            Ok(())
        }
    }
}
