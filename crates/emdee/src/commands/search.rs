//! `emdee search` command implementation.

use clap::Args;
use emdee_search::SearchSession;

use super::DocumentArgs;
use crate::error::CliError;
use crate::output::Output;

/// Characters of context shown on each side of a match.
const CONTEXT_CHARS: usize = 30;

/// Arguments for the search command.
#[derive(Args)]
pub(crate) struct SearchArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Text to find (literal, case-insensitive).
    query: String,

    /// Print the rendered HTML with matches marked instead of a list.
    #[arg(long)]
    html: bool,
}

impl SearchArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (_, mut session) = self.document.open(None).await?;
        let search = session.search_mut();
        search.set_query(&self.query);

        if self.html {
            output.data(&search.highlighted_html())?;
            return Ok(());
        }

        let status = search.status();
        if search.matches().is_empty() {
            output.warning(if status.is_empty() {
                "Query too short"
            } else {
                status.as_str()
            });
            return Ok(());
        }
        for line in match_lines(search, &output) {
            output.data(&line)?;
        }
        output.info(&status);
        Ok(())
    }
}

/// One `N: …context…` line per match, in document order.
fn match_lines(search: &SearchSession, output: &Output) -> Vec<String> {
    search
        .matches()
        .iter()
        .enumerate()
        .filter_map(|(index, found)| {
            let context = search.match_context(found, CONTEXT_CHARS)?;
            Some(format!(
                "{}: {}{}{}",
                index + 1,
                output.dimmed(context.before.trim_start()),
                output.highlighted(context.matched),
                output.dimmed(context.after.trim_end()),
            ))
        })
        .collect()
}
