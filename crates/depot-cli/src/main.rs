// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use config::Config;
use depot_api::{Client, TokenStore};
use depot_app::{AppState, EntityKind, PageAddress};
use depot_query::EntityGateway;
use depot_testkit::MemoryGateway;
use runtime::GatewayRuntime;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `depot --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let initial = match &options.open {
        Some(address) => Some(PageAddress::parse(address).with_context(|| {
            format!(
                "invalid --open address {address:?}; expected <screen>?page=N&limit=N with screen one of: {}",
                screen_keys()
            )
        })?),
        None => None,
    };

    let gateway: Arc<dyn EntityGateway> = if options.demo {
        Arc::new(MemoryGateway::seeded())
    } else {
        let token = match config.token_path() {
            Some(path) => TokenStore::load(&path)?,
            None => TokenStore::new(),
        };
        let client = Client::new(config.base_url(), config.timeout()?, token).with_context(
            || {
                format!(
                    "invalid [api] config in {}; fix base_url/timeout values",
                    options.config_path.display()
                )
            },
        )?;
        if options.check_only {
            client.ping().with_context(|| {
                format!("backend unreachable at {}", client.base_url())
            })?;
            println!("ok: {}", client.base_url());
            return Ok(());
        }
        Arc::new(client)
    };
    if options.check_only {
        // Demo mode has nothing remote to probe; config validation was the check.
        return Ok(());
    }

    let mut state = AppState {
        role: config.role(),
        ..AppState::default()
    };
    if let Some(address) = initial {
        state.active_screen = address.screen;
    }

    let mut runtime = GatewayRuntime::new(gateway, config.role());
    depot_tui::run_app(&mut state, &mut runtime, initial)
}

fn screen_keys() -> String {
    EntityKind::ALL
        .iter()
        .map(|kind| kind.key())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    open: Option<String>,
    demo: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        open: None,
        demo: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--open" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--open requires an address like bookings?page=2&limit=10")
                })?;
                options.open = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("depot");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --open <address>         Open a screen address, e.g. bookings?page=2&limit=10");
    println!("  --demo                   Launch offline with seeded demo data");
    println!("  --check                  Validate config and backend reachability");
    println!("  --help                   Show this help");
}
