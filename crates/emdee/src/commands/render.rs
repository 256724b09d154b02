//! `emdee render` command implementation.

use std::path::PathBuf;

use clap::Args;
use emdee_session::ExportOptions;
use emdee_session::export::{export_file_name, export_title};

use super::DocumentArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Wrap the HTML in a complete standalone document.
    #[arg(long)]
    standalone: bool,

    /// Theme name written to `data-theme` (standalone only).
    #[arg(long, default_value = "light", requires = "standalone")]
    theme: String,

    /// Body font size in pixels (standalone only).
    #[arg(long, default_value_t = 16, requires = "standalone")]
    font_size: u16,

    /// CSS file embedded in the document head (standalone only).
    #[arg(long, requires = "standalone")]
    stylesheet: Option<PathBuf>,

    /// Write to this file instead of stdout. A directory gets `<title>.html`.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl RenderArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (_, session) = self.document.open(None).await?;
        let source = session.document().and_then(|d| d.source_location());

        let html = if self.standalone {
            let stylesheet = match &self.stylesheet {
                Some(path) => std::fs::read_to_string(path)?,
                None => String::new(),
            };
            let options = ExportOptions {
                theme: self.theme.clone(),
                font_size: self.font_size,
                title: export_title(source),
                stylesheet,
            };
            session.export(&options).unwrap_or_default()
        } else {
            session.html().to_owned()
        };

        match &self.output {
            Some(path) => {
                let path = if path.is_dir() {
                    path.join(export_file_name(source))
                } else {
                    path.clone()
                };
                std::fs::write(&path, html)?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => output.data(&html)?,
        }
        Ok(())
    }
}
