use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;

mod commands;

/// isotest - unit tests isolated in their own processes.
///
/// Runs the framework's built-in self-test suite and inspects the runner
/// configuration that suites built with `isotest::main!` will pick up.
///
/// EXAMPLES:
///     isotest selftest                 Run the self-test suite
///     isotest selftest --timeout 30    Lower the default per-test timeout
///     isotest config --json            Show effective settings as JSON
///
/// ENVIRONMENT VARIABLES:
///     ISOTEST_TIMEOUT           Default per-test timeout in seconds
///     ISOTEST_POLL_INTERVAL_US  Child poll interval in microseconds
///     ISOTEST_COLOR             Colorize labels (true/false)
///     ISOTEST_LOG               Diagnostic log filter (e.g. debug)
///     NO_COLOR                  Set to disable colored output
#[derive(Parser)]
#[command(name = "isotest")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in self-test suite
    ///
    /// The suite runs in a forked child; the command succeeds when that
    /// child exits on its own. The suite contains deliberate failures, so
    /// its verdict is always FAILED.
    ///
    /// EXAMPLES:
    ///     isotest selftest
    ///     isotest selftest --no-color --timeout 5
    #[command(visible_alias = "s")]
    Selftest {
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
        /// Default timeout in seconds for tests without their own
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Child poll interval in microseconds
        #[arg(long, value_name = "MICROS")]
        poll_interval_us: Option<u64>,
    },

    /// Show the effective runner configuration
    ///
    /// Merges ~/.isotest/config.toml, the nearest isotest.toml and the
    /// environment, in that order.
    ///
    /// EXAMPLES:
    ///     isotest config
    ///     isotest config --json
    Config {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     isotest completions bash > /etc/bash_completion.d/isotest
    ///     isotest completions zsh > ~/.zfunc/_isotest
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    isotest::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Selftest {
            no_color,
            timeout,
            poll_interval_us,
        } => {
            let args = commands::selftest::SelftestArgs {
                no_color,
                timeout,
                poll_interval_us,
                dir: std::env::current_dir()?,
            };
            commands::selftest::run(args)?;
        }
        Commands::Config { json } => {
            commands::config::run(&std::env::current_dir()?, json)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
