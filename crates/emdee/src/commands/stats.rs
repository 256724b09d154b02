//! `emdee stats` command implementation.

use clap::Args;
use emdee_session::{Document, reading_stats};

use super::DocumentArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the stats command.
#[derive(Args)]
pub(crate) struct StatsArgs {
    #[command(flatten)]
    pub document: DocumentArgs,
}

impl StatsArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let document = Document::read(self.document.file())?;

        match reading_stats(document.raw_text()) {
            Some(stats) => output.data(&format!(
                "{} words · {} min read",
                stats.words, stats.minutes
            ))?,
            None => output.warning("Document is empty"),
        }
        Ok(())
    }
}
