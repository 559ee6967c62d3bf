use std::io::{self, Write};

use chrono::Local;
use translator_core::{JobHandle, ProgressOutcome, ProgressView, SubmissionView};

const BAR_WIDTH: usize = 10;

/// Writes view-models to the terminal as plain lines.
///
/// Repeated renders of an unchanged line are skipped, and the preview is
/// printed at most once per job.
pub struct Renderer<W: Write> {
    out: W,
    server_url: String,
    last_line: Option<String>,
    preview_shown: bool,
    download_shown: bool,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, server_url: impl Into<String>) -> Self {
        Self {
            out,
            server_url: server_url.into().trim_end_matches('/').to_string(),
            last_line: None,
            preview_shown: false,
            download_shown: false,
        }
    }

    pub fn submission(&mut self, view: &SubmissionView) -> io::Result<()> {
        let Some(line) = submission_line(view) else {
            return Ok(());
        };
        if self.last_line.as_deref() != Some(line.as_str()) {
            writeln!(self.out, "{line}")?;
            self.last_line = Some(line);
        }
        Ok(())
    }

    pub fn navigated(&mut self, job: &JobHandle) -> io::Result<()> {
        writeln!(self.out, "Task {job} started ({})", job.progress_route())
    }

    pub fn progress(&mut self, view: &ProgressView) -> io::Result<()> {
        let line = format!("[{}] {}", Local::now().format("%H:%M:%S"), progress_line(view));
        // Compare without the timestamp so identical polls stay quiet.
        if self.last_line.as_deref().map(strip_timestamp) != Some(strip_timestamp(&line)) {
            writeln!(self.out, "{line}")?;
            self.last_line = Some(line);
        }

        if let (Some(preview), false) = (&view.preview, self.preview_shown) {
            writeln!(self.out, "--- preview ---")?;
            writeln!(self.out, "{preview}")?;
            writeln!(self.out, "---------------")?;
            self.preview_shown = true;
        }

        if let (true, Some(path), false) =
            (view.show_download, &view.download_path, self.download_shown)
        {
            writeln!(self.out, "Download: {}{path}", self.server_url)?;
            self.download_shown = true;
        }
        Ok(())
    }

    pub fn saved(&mut self, path: &std::path::Path) -> io::Result<()> {
        writeln!(self.out, "Saved {}", path.display())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn submission_line(view: &SubmissionView) -> Option<String> {
    let file = view.file.as_ref()?;
    if view.submitting {
        let provider = view.provider_id.unwrap_or("-");
        let model = view.selected_model.unwrap_or("-");
        Some(format!(
            "Submitting {} ({}) to {provider}/{model}...",
            file.name, file.size_label
        ))
    } else {
        Some(format!("Selected {} ({})", file.name, file.size_label))
    }
}

fn progress_line(view: &ProgressView) -> String {
    let mut line = match view.outcome {
        Some(ProgressOutcome::InvalidTask) | Some(ProgressOutcome::TimedOut) => {
            view.headline.to_string()
        }
        _ => format!(
            "{} {} {}%",
            view.headline,
            progress_bar(view.progress_percent),
            view.progress_percent
        ),
    };
    if !view.message.is_empty() {
        line.push(' ');
        line.push_str(&view.message);
    }
    line
}

fn progress_bar(percent: u8) -> String {
    let filled = (usize::from(percent.min(100)) * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn strip_timestamp(line: &str) -> &str {
    line.split_once("] ").map_or(line, |(_, rest)| rest)
}
