//! Command-line front end for the threeimp Scheme interpreter.
//!
//! There is no S-expression reader, so this binary selects one of a
//! fixed set of demo programs rather than accepting a source path;
//! everything else -- verbose/quiet logging, exit-code policy -- is
//! ordinary `clap` plumbing over [`threeimp_cli::execute`]/[`threeimp_cli::dump`].

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use threeimp_cli::demos;
use threeimp_vm::VmConfig;

#[derive(Parser)]
#[command(name = "threeimp")]
#[command(about = "Register-machine Scheme interpreter demo CLI")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all but error-level logging
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and run a demo program, printing each top-level result
    Run {
        /// Demo name (see `threeimp list`)
        demo: String,

        /// Value-stack capacity in slots
        #[arg(long, default_value_t = 4 << 20)]
        stack_capacity: usize,

        /// Compile without runtime typechecks
        #[arg(long)]
        no_typecheck: bool,
    },
    /// Compile a demo program and print its instruction listing without running it
    Dump {
        /// Demo name (see `threeimp list`)
        demo: String,
    },
    /// List the available demo programs
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else if cli.quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    match cli.command {
        Commands::Run { demo, stack_capacity, no_typecheck } => {
            let Some(demo) = demos::find(&demo) else {
                bail!("no such demo: {demo} (try `threeimp list`)");
            };
            let config = VmConfig { stack_capacity, typecheck: !no_typecheck, ..VmConfig::default() };
            let results = threeimp_cli::execute(demo, config).map_err(|e| anyhow::anyhow!(e.render()))?;
            println!("{}", threeimp_cli::render_results(&results));
            Ok(())
        }
        Commands::Dump { demo } => {
            let Some(demo) = demos::find(&demo) else {
                bail!("no such demo: {demo} (try `threeimp list`)");
            };
            let listing = threeimp_cli::dump(demo).map_err(|e| anyhow::anyhow!(e.render()))?;
            print!("{listing}");
            Ok(())
        }
        Commands::List => {
            for demo in demos::DEMOS {
                println!("{:<12} {}", demo.name, demo.description);
            }
            Ok(())
        }
    }
}
