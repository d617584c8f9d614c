// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{commands, infra::t, resolve_language};

const DEFAULT_CONFIG: &str = "locsync.toml";

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    let pos = args.iter().position(|arg| arg == "--lang")?;
    args.get(pos + 1).cloned()
}

/// Installs the diagnostics subscriber on stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    // A second initialization (e.g. in tests) is harmless.
    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}

fn config_arg(locale: &str) -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help(t!("arg_config", locale = locale).to_string())
        .value_name("CONFIG")
        .default_value(DEFAULT_CONFIG)
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn jobs_arg(locale: &str) -> Arg {
    Arg::new("jobs")
        .short('j')
        .long("jobs")
        .help(t!("arg_jobs", locale = locale).to_string())
        .value_name("JOBS")
        .value_parser(clap::value_parser!(usize))
        .action(ArgAction::Set)
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("locsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help(t!("cli_verbose", locale = locale).to_string())
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("pull")
                .about(t!("cmd_pull_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(jobs_arg(locale)),
        )
        .subcommand(
            Command::new("push")
                .about(t!("cmd_push_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(jobs_arg(locale)),
        )
        .subcommand(
            Command::new("wipe")
                .about(t!("cmd_wipe_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(
                    Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .help(t!("arg_yes", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("clean")
                .about(t!("cmd_clean_about", locale = locale).to_string())
                .arg(config_arg(locale)),
        )
}

fn config_path(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let explicit_language = pre_parse_language();
    let language = resolve_language(explicit_language.as_deref());
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();
    init_tracing(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("pull", sub)) => {
            let jobs = sub.get_one::<usize>("jobs").copied();
            commands::pull::execute(config_path(sub), jobs, explicit_language).await?;
        }
        Some(("push", sub)) => {
            let jobs = sub.get_one::<usize>("jobs").copied();
            commands::push::execute(config_path(sub), jobs, explicit_language).await?;
        }
        Some(("wipe", sub)) => {
            let assume_yes = sub.get_flag("yes");
            commands::wipe::execute(config_path(sub), assume_yes, explicit_language).await?;
        }
        Some(("clean", sub)) => {
            commands::clean::execute(config_path(sub), explicit_language).await?;
        }
        _ => {
            // `subcommand_required` makes clap print help and exit before this.
        }
    }
    Ok(())
}
