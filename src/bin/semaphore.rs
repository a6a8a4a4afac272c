//! `semaphore` — CLI surface over the lock primitive.
//!
//! Subcommands: `try <path> [--tag T]`, `acquire <path> [--tag T] [--timeout SECS]`,
//! `release <path> [--force]`, `status <path>`, `clean <path>`. `--json` selects
//! machine-readable output and `--config <path>` loads a TOML config file, on
//! any subcommand. Exit codes follow §6.4: 0 success, 1 application error,
//! 2 invalid arguments, 3 I/O/system error.

#[macro_use]
extern crate tuulbelt_core;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tuulbelt_core::lock::{LockConfig, ReleaseOutcome, Semaphore, TryAcquireOutcome};
use tuulbelt_core::ErrorKind;

fn resolve_lock_config(config_path: Option<&PathBuf>) -> tuulbelt_core::Result<LockConfig> {
    match config_path {
        Some(path) => {
            let (lock_config, _registry, _snapshot) = tuulbelt_core::config::load_from_path(path)?.into_configs()?;
            Ok(lock_config)
        }
        None => Ok(LockConfig::default()),
    }
}

enum Action {
    Try { path: PathBuf, tag: Option<String> },
    Acquire {
        path: PathBuf,
        tag: Option<String>,
        timeout: Option<Duration>,
    },
    Release { path: PathBuf, force: bool },
    Status { path: PathBuf },
    Clean { path: PathBuf },
}

struct Parsed {
    action: Action,
    json: bool,
    config: Option<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<Parsed, String> {
    let mut args = args.into_iter();
    let command = args.next().ok_or("missing subcommand")?;
    let path = args
        .next()
        .ok_or_else(|| format!("{command}: missing <path>"))
        .map(PathBuf::from)?;

    let mut tag = None;
    let mut force = false;
    let mut json = false;
    let mut timeout = None;
    let mut config = None;

    let mut rest: Vec<String> = args.collect();
    let mut i = 0;
    while i < rest.len() {
        match rest[i].as_str() {
            "--tag" => {
                tag = Some(rest.get(i + 1).ok_or("--tag requires a value")?.clone());
                rest.drain(i..=i + 1);
            }
            "--timeout" => {
                let secs: f64 = rest
                    .get(i + 1)
                    .ok_or("--timeout requires a value")?
                    .parse()
                    .map_err(|_| "--timeout must be a number of seconds".to_string())?;
                timeout = Some(Duration::from_secs_f64(secs));
                rest.drain(i..=i + 1);
            }
            "--config" => {
                config = Some(PathBuf::from(rest.get(i + 1).ok_or("--config requires a value")?));
                rest.drain(i..=i + 1);
            }
            "--force" => {
                force = true;
                rest.remove(i);
            }
            "--json" => {
                json = true;
                rest.remove(i);
            }
            other => return Err(format!("unknown flag: {other}")),
        }
    }

    let action = match command.as_str() {
        "try" => Action::Try { path, tag },
        "acquire" => Action::Acquire { path, tag, timeout },
        "release" => Action::Release { path, force },
        "status" => Action::Status { path },
        "clean" => Action::Clean { path },
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
    let lock_config = resolve_lock_config(parsed.config.as_ref())?;
    match parsed.action {
        Action::Try { path, tag } => {
            let lock = Semaphore::new(path, lock_config)?;
            match lock.try_acquire(tag)? {
                TryAcquireOutcome::Acquired(guard) => {
                    print_result(parsed.json, "acquired", Some(guard.path().display().to_string()));
                    std::mem::forget(guard);
                    Ok(())
                }
                TryAcquireOutcome::HeldBy(record) => Err(tuulbelt_core::Error::new(
                    ErrorKind::Conflict,
                    format!("lock held by pid {}", record.pid),
                )
                .with_holder_pid(record.pid)),
            }
        }
        Action::Acquire { path, tag, timeout } => {
            let lock = Semaphore::new(path, lock_config.clone())?;
            let guard = lock.acquire(tag, timeout)?;
            print_result(parsed.json, "acquired", Some(guard.path().display().to_string()));
            std::mem::forget(guard);
            Ok(())
        }
        Action::Release { path, force } => {
            let lock = Semaphore::new(path, lock_config.clone())?;
            match lock.release(std::process::id(), force)? {
                ReleaseOutcome::Released => {
                    print_result(parsed.json, "released", None);
                    Ok(())
                }
                ReleaseOutcome::NotHeld => {
                    print_result(parsed.json, "not-held", None);
                    Ok(())
                }
            }
        }
        Action::Status { path } => {
            let lock = Semaphore::new(path, lock_config.clone())?;
            let status = lock.status()?;
            if parsed.json {
                println!(
                    "{{\"locked\":{},\"holder_pid\":{},\"is_stale\":{},\"owned_by_caller\":{}}}",
                    status.locked,
                    status.holder.as_ref().map(|h| h.pid.to_string()).unwrap_or_else(|| "null".into()),
                    status.is_stale,
                    status.owned_by_caller,
                );
            } else {
                println!("locked: {}", status.locked);
                if let Some(holder) = status.holder {
                    println!("holder pid: {}", holder.pid);
                    println!("is stale: {}", status.is_stale);
                }
            }
            Ok(())
        }
        Action::Clean { path } => {
            let lock = Semaphore::new(path, lock_config.clone())?;
            match lock.clean_stale()? {
                tuulbelt_core::lock::CleanOutcome::Removed => {
                    print_result(parsed.json, "removed", None);
                    Ok(())
                }
                tuulbelt_core::lock::CleanOutcome::NotRemoved => {
                    print_result(parsed.json, "not-removed", None);
                    Ok(())
                }
            }
        }
    }
}

fn print_result(json: bool, status: &str, path: Option<String>) {
    if json {
        match path {
            Some(p) => println!("{{\"status\":\"{status}\",\"path\":\"{p}\"}}"),
            None => println!("{{\"status\":\"{status}\"}}"),
        }
    } else {
        println!("{status}");
    }
}
