//! `emdee toc` command implementation.

use clap::Args;
use emdee_toc::Heading;

use super::DocumentArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the toc command.
#[derive(Args)]
pub(crate) struct TocArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Deepest heading level to list, 1-6 (overrides config).
    #[arg(long)]
    max_level: Option<u8>,

    /// Print entries as JSON.
    #[arg(long)]
    json: bool,
}

impl TocArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (_, session) = self.document.open(self.max_level).await?;
        let entries = session.toc().entries();

        if self.json {
            output.data(&serde_json::to_string_pretty(entries)?)?;
            return Ok(());
        }
        if entries.is_empty() {
            output.warning("No headings");
            return Ok(());
        }
        for line in outline(entries) {
            output.data(&line)?;
        }
        Ok(())
    }
}

/// Indented `- text (#id)` lines, relative to the shallowest level present.
fn outline(entries: &[Heading]) -> Vec<String> {
    let base = entries.iter().map(|h| h.level).min().unwrap_or(1);
    entries
        .iter()
        .map(|heading| {
            let indent = "  ".repeat(usize::from(heading.level - base));
            format!("{indent}- {} (#{})", heading.text, heading.id)
        })
        .collect()
}
