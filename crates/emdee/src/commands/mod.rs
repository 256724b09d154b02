//! CLI command implementations.

pub(crate) mod render;
pub(crate) mod search;
pub(crate) mod stats;
pub(crate) mod toc;

pub(crate) use render::RenderArgs;
pub(crate) use search::SearchArgs;
pub(crate) use stats::StatsArgs;
pub(crate) use toc::TocArgs;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, ValueEnum};
use emdee_config::{AssetScheme, CliSettings, Config};
use emdee_extensions::ExtensionLoader;
use emdee_renderer::{
    AssetProtocolResolver, AssetResolver, BuiltinExtensions, FileUriResolver, Pipeline,
    RenderOptions,
};
use emdee_session::{Announcer, ReaderSession};
use emdee_toc::TrackerConfig;

use crate::error::CliError;

/// Arguments shared by every command that opens a document.
#[derive(Args)]
pub(crate) struct DocumentArgs {
    /// Markdown file to open.
    file: PathBuf,

    /// Path to configuration file (default: auto-discover emdee.toml).
    #[arg(short, long, env = "EMDEE_CONFIG")]
    config: Option<PathBuf>,

    /// Disable math typesetting.
    #[arg(long)]
    no_math: bool,

    /// Disable syntax highlighting.
    #[arg(long)]
    no_highlight: bool,

    /// URI form for local images (overrides config).
    #[arg(long, value_enum)]
    asset_scheme: Option<SchemeArg>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemeArg {
    File,
    Asset,
}

impl DocumentArgs {
    pub(crate) fn file(&self) -> &Path {
        &self.file
    }

    fn cli_settings(&self, max_level: Option<u8>) -> CliSettings {
        CliSettings {
            math: self.no_math.then_some(false),
            highlight: self.no_highlight.then_some(false),
            asset_scheme: self.asset_scheme.map(|scheme| match scheme {
                SchemeArg::File => AssetScheme::File,
                SchemeArg::Asset => AssetScheme::Asset,
            }),
            max_level,
        }
    }

    /// Load config, open the document and apply its extension activations.
    pub(crate) async fn open(
        &self,
        max_level: Option<u8>,
    ) -> Result<(Config, ReaderSession), CliError> {
        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings(max_level)))?;
        let mut session = build_session(&config);

        let pending: Vec<_> = session
            .open_path(&self.file)?
            .into_iter()
            .map(|activation| tokio::spawn(activation.run()))
            .collect();
        for handle in pending {
            match handle.await {
                Ok(completion) => {
                    session.apply(completion);
                }
                Err(e) => tracing::warn!(error = %e, "Extension activation task failed"),
            }
        }
        Ok((config, session))
    }
}

/// Announcer that forwards messages to the log.
struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&self, message: &str) {
        tracing::info!(announcement = message);
    }
}

pub(crate) fn render_options(config: &Config) -> RenderOptions {
    RenderOptions {
        math: config.render.math,
        highlight: config.render.highlight,
        smart_punctuation: config.render.smart_punctuation,
        linkify: config.render.linkify,
        max_heading_level: config.toc.max_level,
        memo_entries: config.render.memo_entries,
    }
}

fn asset_resolver(scheme: AssetScheme) -> Arc<dyn AssetResolver> {
    match scheme {
        AssetScheme::File => Arc::new(FileUriResolver),
        AssetScheme::Asset => Arc::new(AssetProtocolResolver),
    }
}

pub(crate) fn build_session(config: &Config) -> ReaderSession {
    let pipeline =
        Pipeline::new(render_options(config)).with_resolver(asset_resolver(config.render.asset_scheme));
    pipeline.warm_up();
    let loader = ExtensionLoader::global_or_init(|| ExtensionLoader::new(BuiltinExtensions));

    ReaderSession::new(pipeline, loader)
        .with_announcer(Arc::new(LogAnnouncer))
        .with_tracker_config(TrackerConfig {
            threshold_offset: config.toc.threshold_offset,
            bottom_epsilon: config.toc.bottom_epsilon,
        })
        .with_min_query_chars(config.search.min_query_chars)
}
