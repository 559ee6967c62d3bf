mod platform;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "translator")]
#[command(about = "Submit documents to the translation service and follow their progress")]
pub struct Cli {
    /// RON configuration file.
    #[arg(long, global = true, default_value = "translator.ron")]
    config: PathBuf,
    /// Base URL of the translation service; overrides the config file.
    #[arg(long, global = true)]
    server: Option<String>,
    /// Log progress details to the terminal.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a document and start translating it.
    Submit {
        file: PathBuf,
        #[arg(long)]
        provider: String,
        /// Defaults to the provider's first model.
        #[arg(long)]
        model: Option<String>,
        #[arg(long, env = "TRANSLATOR_API_KEY", hide_env_values = true)]
        api_key: String,
        /// Print the task id and exit instead of following the job.
        #[arg(long)]
        no_watch: bool,
        /// Save the translated artifact into this directory once complete.
        #[arg(long)]
        download: Option<PathBuf>,
    },
    /// Follow an existing translation task.
    Watch {
        task_id: String,
        #[arg(long)]
        download: Option<PathBuf>,
    },
    /// List providers and their models.
    Models,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match platform::run(cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
