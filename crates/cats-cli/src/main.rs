use std::process::ExitCode;

use anyhow::Result;
use cats_cli::cli::{build_cli_command, Cli, Commands};
use clap::Parser;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::subset::SubsetOptions;

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Subset {
            study,
            variant,
            out,
            import_cap,
            load_clip,
            no_candidates,
            no_manifest,
            json,
        }) => commands::subset::handle(SubsetOptions {
            study,
            variant: *variant,
            out: out.as_ref(),
            import_cap: *import_cap,
            load_clip: *load_clip,
            no_candidates: *no_candidates,
            no_manifest: *no_manifest,
            json: *json,
        }),
        Some(Commands::Islands { study, json }) => commands::islands::handle(study, *json),
        Some(Commands::Inspect { study }) => commands::inspect::handle(study),
        None => {
            build_cli_command().print_help()?;
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("could not install log subscriber: {err}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
