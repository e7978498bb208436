//! Interactive per-file conflict resolution prompt.
//!
//! Implements the engine's [`ResolutionPrompt`] seam with a `dialoguer`
//! select menu. In a non-interactive environment (no TTY) the prompt
//! reports itself unavailable and the engine degrades the remaining
//! conflicts to manual resolution.

use std::path::Path;

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;

use compvc_core::component::ComponentId;
use compvc_core::errors::PromptError;
use compvc_core::merge::{PromptAnswer, ResolutionPrompt};

/// Lines of conflicted content shown above the menu.
const PREVIEW_LINES: usize = 20;

/// Terminal-backed resolution prompt.
pub struct TerminalPrompt;

impl ResolutionPrompt for TerminalPrompt {
    fn ask_file_resolution(
        &self,
        id: &ComponentId,
        path: &Path,
        conflict_preview: &str,
    ) -> Result<PromptAnswer, PromptError> {
        let term = Term::stdout();
        if !term.is_term() {
            return Err(PromptError::Unavailable("stdout is not a terminal".into()));
        }

        println!();
        println!(
            "{} {} {}",
            style("conflict in").bold(),
            style(id.to_string_without_version()).bold().cyan(),
            style(path.display()).bold()
        );
        for line in conflict_preview.lines().take(PREVIEW_LINES) {
            let rendered = if line.starts_with("<<<<<<<")
                || line.starts_with("=======")
                || line.starts_with(">>>>>>>")
                || line.starts_with("|||||||")
            {
                style(line).red().to_string()
            } else {
                line.to_string()
            };
            println!("  {}", rendered);
        }
        if conflict_preview.lines().count() > PREVIEW_LINES {
            println!("  {}", style("...").dim());
        }

        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("resolve this file with")
            .items(&[
                "ours    - keep the local modification",
                "theirs  - take the target version",
                "manual  - leave the markers, resolve later",
            ])
            .default(0)
            .interact()
            .map_err(|e| {
                let dialoguer::Error::IO(io) = e;
                PromptError::Io(io)
            })?;

        Ok(match choice {
            0 => PromptAnswer::Ours,
            1 => PromptAnswer::Theirs,
            _ => PromptAnswer::Manual,
        })
    }
}
