pub mod config;
pub mod effects;
pub mod logging;
pub mod render;
pub mod session;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use client_logging::{client_info, client_warn};
use translator_core::{find_provider, ProgressOutcome, SelectedFile, MAX_FILE_BYTES, PROVIDERS};
use translator_engine::EngineHandle;

use crate::{Cli, Command};
use config::AppConfig;
use effects::EffectRunner;
use logging::LogDestination;
use render::Renderer;
use session::{SubmitForm, SubmitOutcome, WatchOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed,
}

impl RunOutcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            RunOutcome::Completed => ExitCode::SUCCESS,
            RunOutcome::Failed => ExitCode::FAILURE,
        }
    }
}

pub fn run(cli: Cli) -> anyhow::Result<RunOutcome> {
    let (mut config, config_problem) = match config::load(&cli.config) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };

    let destination = if config.log_to_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    logging::initialize(destination, cli.verbose);
    if let Some(err) = config_problem {
        client_warn!("Using default configuration: {:#}", err);
    }
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    client_info!("Translation service at {}", config.server_url);

    match cli.command {
        Command::Models => {
            print_models(&mut io::stdout().lock())?;
            Ok(RunOutcome::Completed)
        }
        Command::Submit {
            file,
            provider,
            model,
            api_key,
            no_watch,
            download,
        } => {
            check_provider_and_model(&provider, model.as_deref())?;
            let form = SubmitForm {
                file: read_selected_file(&file)?,
                provider,
                model,
                api_key,
            };
            let runner = connect(&config)?;
            let mut renderer = Renderer::new(io::stdout().lock(), config.server_url.as_str());

            match session::run_submit(&runner, form, &mut renderer)? {
                SubmitOutcome::Rejected(message) => {
                    eprintln!("Error: {message}");
                    Ok(RunOutcome::Failed)
                }
                SubmitOutcome::Navigated(job) if no_watch => {
                    client_info!("Not following task {}", job);
                    Ok(RunOutcome::Completed)
                }
                SubmitOutcome::Navigated(job) => {
                    watch(&runner, &config, job.as_str(), download, &mut renderer)
                }
            }
        }
        Command::Watch { task_id, download } => {
            let runner = connect(&config)?;
            let mut renderer = Renderer::new(io::stdout().lock(), config.server_url.as_str());
            watch(&runner, &config, &task_id, download, &mut renderer)
        }
    }
}

fn watch<W: Write>(
    runner: &EffectRunner,
    config: &AppConfig,
    task_id: &str,
    download_dir: Option<PathBuf>,
    renderer: &mut Renderer<W>,
) -> anyhow::Result<RunOutcome> {
    let options = WatchOptions {
        poll_interval: config.poll_interval(),
        max_poll_attempts: config.max_poll_attempts,
        download_dir,
    };
    let report = session::run_watch(runner, task_id, options, renderer)?;
    client_info!(
        "Task {} settled as {:?} after {} status checks",
        task_id,
        report.outcome,
        report.polls_issued
    );
    Ok(match report.outcome {
        Some(ProgressOutcome::Succeeded) => RunOutcome::Completed,
        _ => RunOutcome::Failed,
    })
}

fn connect(config: &AppConfig) -> anyhow::Result<EffectRunner> {
    let engine = EngineHandle::new(config.client_settings())
        .with_context(|| format!("cannot use server url {:?}", config.server_url))?;
    Ok(EffectRunner::new(engine))
}

/// Unknown providers and models are CLI usage errors, reported with the
/// valid choices instead of silently falling back.
fn check_provider_and_model(provider_id: &str, model_id: Option<&str>) -> anyhow::Result<()> {
    let Some(provider) = find_provider(provider_id) else {
        let known: Vec<&str> = PROVIDERS.iter().map(|p| p.id).collect();
        bail!(
            "unknown provider {provider_id:?}; choose one of: {}",
            known.join(", ")
        );
    };
    if let Some(model_id) = model_id {
        if !provider.has_model(model_id) {
            let known: Vec<&str> = provider.models.iter().map(|m| m.id).collect();
            bail!(
                "{} does not offer model {model_id:?}; choose one of: {}",
                provider.label,
                known.join(", ")
            );
        }
    }
    Ok(())
}

fn read_selected_file(path: &Path) -> anyhow::Result<SelectedFile> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?
        .to_string();
    let size_bytes = fs::metadata(path)
        .with_context(|| format!("cannot access {}", path.display()))?
        .len();
    // Oversize files are rejected by validation without being read.
    if size_bytes > MAX_FILE_BYTES {
        return Ok(SelectedFile::from_parts(name, size_bytes, Vec::<u8>::new()));
    }
    let content = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(SelectedFile::new(name, content))
}

fn print_models(out: &mut impl Write) -> io::Result<()> {
    for provider in PROVIDERS {
        writeln!(out, "{} ({})", provider.id, provider.label)?;
        for (index, model) in provider.models.iter().enumerate() {
            let marker = if index == 0 { "  [default]" } else { "" };
            writeln!(out, "    {:<36} {}{marker}", model.id, model.display_name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unknown_provider_lists_choices() {
        let err = check_provider_and_model("gemini", None).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("gemini"));
        assert!(text.contains("modelscope, openai, qianwen, claude"));
    }

    #[test]
    fn model_must_belong_to_provider() {
        assert!(check_provider_and_model("openai", Some("gpt-4o")).is_ok());
        assert!(check_provider_and_model("openai", None).is_ok());
        let err = check_provider_and_model("openai", Some("claude-3-haiku-20240307")).unwrap_err();
        assert!(err.to_string().contains("gpt-4o"));
    }

    #[test]
    fn selected_file_carries_name_and_bytes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, "hello").unwrap();
        let file = read_selected_file(&path).unwrap();
        assert_eq!(file.name(), "notes.txt");
        assert_eq!(file.size_bytes(), 5);
        assert_eq!(file.content().as_ref(), b"hello");
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(read_selected_file(&temp.path().join("absent.md")).is_err());
    }

    #[test]
    fn catalog_listing_marks_defaults() {
        let mut out = Vec::new();
        print_models(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("modelscope ("));
        assert_eq!(text.matches("[default]").count(), PROVIDERS.len());
    }
}
