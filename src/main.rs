use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use dirfind::{parse_expression, ConsoleSink, Listing, Predicate};

const EXPRESSION_HELP: &str = "\
Expression (flag/value pairs, all must hold):
  -inum <inode>        inode number equals <inode>
  -name <filename>     entry name equals <filename> exactly
  -size [+-=]<bytes>   size greater than (+, default), less than (-) or equal to (=) <bytes>
  -nlinks <count>      hard-link count equals <count>
  -exec <command>      run `<command> <path>` through /bin/sh for every entry; always true";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ListingArg {
    /// Raw getdents64 records in a fixed buffer
    Raw,
    /// Directory-stream API
    Stream,
}

impl From<ListingArg> for Listing {
    fn from(arg: ListingArg) -> Self {
        match arg {
            ListingArg::Raw    => Listing::Raw,
            ListingArg::Stream => Listing::Stream,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "dirfind",
    version,
    about = "Recursively find entries matching every predicate",
    after_help = EXPRESSION_HELP
)]
struct Cli {
    /// How directory children are enumerated
    #[arg(long, value_enum, default_value = "raw")]
    listing: ListingArg,

    /// Do not descend below this depth (root is depth 0)
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Print a scan summary to stderr when the walk ends
    #[arg(long)]
    stats: bool,

    /// Increase diagnostic logging (-v debug, -vv trace); DIRFIND_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory (or file) to start from
    root: PathBuf,

    /// Predicate expression
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "EXPRESSION")]
    expression: Vec<OsString>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let predicates = match parse_expression(&cli.expression) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("dirfind: {err}\n");
            eprintln!("{}", Cli::command().render_usage());
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, predicates) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dirfind: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, predicates: Vec<Predicate>) -> Result<()> {
    let mut builder = dirfind::search(&cli.root)
        .predicates(predicates)
        .listing(cli.listing.into());
    if let Some(depth) = cli.max_depth {
        builder = builder.max_depth(depth);
    }

    let mut sink = ConsoleSink::stdio();
    let results = builder.run_with(&mut sink)?;
    sink.finish().context("writing results")?;

    if cli.stats {
        let s = &results.stats;
        eprintln!(
            "{} matches, {} entries ({} dirs, {} files, {} other), {} errors in {:.3}s ({} entries/s)",
            results.matches,
            s.entries(),
            s.dirs,
            s.files,
            s.other,
            s.failures,
            s.duration.as_secs_f64(),
            s.entries_per_sec
        );
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("DIRFIND_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
