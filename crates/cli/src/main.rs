//! `todoat`: the command-line front end for the sync daemon's control
//! socket and a lightweight operator surface over it.

mod client;
mod color;
mod commands;
mod exit_error;

use clap::Parser;
use exit_error::ExitError;

#[derive(Parser)]
#[command(name = "todoat", version, styles = color::styles())]
struct Cli {
    /// Enable DEBUG-level logging on stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Manage the background sync daemon.
    Daemon(commands::daemon::DaemonArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    todoat_daemon::init_console_logging(cli.verbose);

    let result = match cli.command {
        Command::Daemon(args) => commands::daemon::daemon(args).await,
    };

    if let Err(err) = result {
        match err.downcast::<ExitError>() {
            Ok(exit_error) => {
                eprintln!("{exit_error}");
                std::process::exit(exit_error.code);
            }
            Err(err) => {
                eprintln!("error: {err:#}");
                std::process::exit(1);
            }
        }
    }
}
