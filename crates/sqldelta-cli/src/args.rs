//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sqldelta")]
#[command(author, version, about = "Structural diff of SQL schema definitions")]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare two schema snapshots
    ///
    /// Exits with 0 when the schemas are equivalent, 1 when they differ and
    /// 2 on error.
    Diff {
        /// Source schema: a .sql file, a directory of .sql files or a .json snapshot
        from: PathBuf,

        /// Target schema, in any of the forms accepted for FROM
        to: PathBuf,

        /// SQL dialect (mysql, mysql57, mariadb)
        #[arg(short, long)]
        dialect: Option<String>,

        /// Storage engine the server applies when a table names none
        #[arg(long)]
        engine: Option<String>,

        /// Charset the server applies when a table names none
        #[arg(long)]
        charset: Option<String>,

        /// Collation the server applies when a table names none
        #[arg(long)]
        collation: Option<String>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Configuration file (defaults to the nearest sqldelta.toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Display schema information
    Schema {
        /// Schema definition files or directories
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// SQL dialect (mysql, mysql57, mariadb)
        #[arg(short, long)]
        dialect: Option<String>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output
    Json,
}
