//! sqldelta CLI - structural diff of SQL schema definitions

mod args;
mod config;
mod output;
mod snapshot;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use sqldelta_core::DatabaseComparator;

use crate::args::{Args, Command};
use crate::config::Config;
use crate::output::OutputFormatter;
use crate::snapshot::{sql_files, SnapshotLoader};

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.quiet {
        tracing::Level::ERROR
    } else {
        match args.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match run(args) {
        Ok(differs) => {
            if differs {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<bool> {
    match args.command {
        Command::Diff {
            from,
            to,
            dialect,
            engine,
            charset,
            collation,
            format,
            config: config_path,
        } => {
            let config = if let Some(path) = config_path {
                Config::from_file(&path)?
            } else {
                Config::find_and_load()?.unwrap_or_default()
            };

            // CLI takes precedence
            let config = config.merge_with_args(&dialect, &format, &engine, &charset, &collation);

            let dialect = config.dialect()?;
            let defaults = config.resolve_defaults(dialect);
            let formatter = OutputFormatter::new(config.output_format());

            let loader = SnapshotLoader::new(dialect, &formatter)
                .with_name(config.name.as_deref())
                .quiet(args.quiet);
            let source = loader.load(&from)?;
            let target = loader.load(&to)?;

            let diff = DatabaseComparator::new().diff(&source, &target, &defaults);
            formatter.print_diff(diff.as_ref())?;

            Ok(diff.is_some())
        }

        Command::Schema {
            files,
            dialect,
            format,
        } => {
            let config = Config::find_and_load()?
                .unwrap_or_default()
                .merge_with_args(&dialect, &format, &None, &None, &None);
            let formatter = OutputFormatter::new(config.output_format());

            let mut schema_files = Vec::new();
            for path in &files {
                schema_files.extend(sql_files(path)?);
            }

            let database = SnapshotLoader::new(config.dialect()?, &formatter)
                .with_name(config.name.as_deref())
                .quiet(args.quiet)
                .load_sql(&schema_files)?;
            formatter.print_schema(&database)?;

            Ok(false)
        }
    }
}
