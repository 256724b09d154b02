//! The reader session: one current document and its navigation state.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use emdee_extensions::{CapabilityState, ExtensionId, ExtensionLoader};
use emdee_renderer::{Pipeline, RenderResult};
use emdee_search::SearchSession;
use emdee_toc::{ScrollGeometry, TocTracker, TrackerConfig};
use emdee_view::DocumentView;

use crate::announce::{self, Announcer, SilentAnnouncer};
use crate::document::Document;
use crate::error::SessionError;
use crate::export::{ExportOptions, standalone_document};
use crate::stats::{ReadingStats, reading_stats};

type ActivationFuture = Pin<Box<dyn Future<Output = CapabilityState> + Send>>;

/// Extension activation issued for one document generation.
///
/// Run it anywhere (it owns its loader handle) and hand the
/// [`Completion`] back to [`ReaderSession::apply`].
pub struct Activation {
    generation: u64,
    id: ExtensionId,
    future: ActivationFuture,
}

impl Activation {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn id(&self) -> ExtensionId {
        self.id
    }

    /// Wait for the extension to settle.
    pub async fn run(self) -> Completion {
        let state = self.future.await;
        Completion {
            generation: self.generation,
            id: self.id,
            state,
        }
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activation")
            .field("generation", &self.generation)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Outcome of an [`Activation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completion {
    pub generation: u64,
    pub id: ExtensionId,
    pub state: CapabilityState,
}

struct Current {
    document: Document,
    result: Arc<RenderResult>,
}

/// Current document, its render, table of contents and search.
///
/// Every opened document gets a new generation. Activation completions
/// carry the generation they were issued for and are ignored once another
/// document is open.
pub struct ReaderSession {
    pipeline: Pipeline,
    loader: Arc<ExtensionLoader>,
    announcer: Arc<dyn Announcer>,
    current: Option<Current>,
    generation: u64,
    toc: TocTracker,
    toc_open: bool,
    search: SearchSession,
    min_query_chars: usize,
}

impl ReaderSession {
    pub fn new(pipeline: Pipeline, loader: Arc<ExtensionLoader>) -> Self {
        Self {
            pipeline,
            loader,
            announcer: Arc::new(SilentAnnouncer),
            current: None,
            generation: 0,
            toc: TocTracker::new(TrackerConfig::default()),
            toc_open: false,
            search: SearchSession::new(DocumentView::default()),
            min_query_chars: 1,
        }
    }

    #[must_use]
    pub fn with_announcer(mut self, announcer: Arc<dyn Announcer>) -> Self {
        self.announcer = announcer;
        self
    }

    #[must_use]
    pub fn with_tracker_config(mut self, config: TrackerConfig) -> Self {
        self.toc = TocTracker::new(config);
        self
    }

    #[must_use]
    pub fn with_min_query_chars(mut self, chars: usize) -> Self {
        self.min_query_chars = chars;
        self.search = SearchSession::new(DocumentView::default()).with_min_query_chars(chars);
        self
    }

    /// Make `document` current and render it with the ready extensions.
    ///
    /// Table of contents and search are reset before this returns. The
    /// returned activations cover extensions the document may need that are
    /// not settled yet; the document is re-rendered when one of them is
    /// applied while it is still current.
    pub fn open(&mut self, document: Document) -> Vec<Activation> {
        self.generation += 1;
        self.toc.clear();
        self.search = SearchSession::new(DocumentView::default())
            .with_min_query_chars(self.min_query_chars);

        let name = document.display_name();
        tracing::info!(document = %name, generation = self.generation, "Opening document");

        let activations = ExtensionId::triggered_by(document.raw_text())
            .filter(|id| self.wants(*id) && !self.loader.state(*id).is_settled())
            .map(|id| Activation {
                generation: self.generation,
                id,
                future: Box::pin(self.loader.activate(id)),
            })
            .collect();

        let result = self.render(&document);
        self.current = Some(Current { document, result });
        self.refresh_navigation();
        self.announcer.announce(&announce::opened(&name));
        activations
    }

    /// Read `path` and open it.
    ///
    /// On failure the current document stays as it is.
    pub fn open_path(&mut self, path: impl AsRef<Path>) -> Result<Vec<Activation>, SessionError> {
        let document = Document::read(path)?;
        Ok(self.open(document))
    }

    /// Apply a finished activation. Returns whether the document was re-rendered.
    pub fn apply(&mut self, completion: Completion) -> bool {
        if completion.generation != self.generation {
            tracing::debug!(
                extension = %completion.id,
                issued = completion.generation,
                current = self.generation,
                "Discarding stale extension completion"
            );
            return false;
        }
        if completion.state != CapabilityState::Ready {
            return false;
        }
        let Some(current) = &self.current else {
            return false;
        };

        let result = self.render(&current.document);
        if let Some(current) = &mut self.current {
            current.result = result;
        }
        self.refresh_navigation();
        true
    }

    /// Generation of the current document (0 before the first open).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn document(&self) -> Option<&Document> {
        self.current.as_ref().map(|current| &current.document)
    }

    pub fn rendered(&self) -> Option<&RenderResult> {
        self.current.as_ref().map(|current| current.result.as_ref())
    }

    /// Rendered HTML, empty when no document is open.
    pub fn html(&self) -> &str {
        self.rendered().map_or("", |result| result.html.as_str())
    }

    pub fn toc(&self) -> &TocTracker {
        &self.toc
    }

    /// Report scroll geometry; returns the active heading id.
    pub fn on_scroll(&mut self, geometry: &ScrollGeometry) -> Option<&str> {
        self.toc.on_scroll(geometry)
    }

    /// Show or hide the table of contents panel.
    pub fn toggle_toc(&mut self) -> bool {
        self.toc_open = !self.toc_open;
        self.announcer.announce(announce::toc_toggled(self.toc_open));
        self.toc_open
    }

    pub fn is_toc_open(&self) -> bool {
        self.toc_open
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchSession {
        &mut self.search
    }

    /// Reading statistics of the current document.
    pub fn stats(&self) -> Option<ReadingStats> {
        reading_stats(self.document()?.raw_text())
    }

    /// Standalone HTML of the current render.
    pub fn export(&self, options: &ExportOptions) -> Option<String> {
        self.rendered()
            .map(|result| standalone_document(&result.html, options))
    }

    fn wants(&self, id: ExtensionId) -> bool {
        match id {
            ExtensionId::Math => self.pipeline.options().math,
        }
    }

    fn render(&self, document: &Document) -> Arc<RenderResult> {
        self.pipeline.render(
            document.raw_text(),
            document.source_location(),
            self.loader.capabilities(),
        )
    }

    /// Rebuild TOC entries and the search view from the current render.
    ///
    /// A non-blank query is re-run against the new text.
    fn refresh_navigation(&mut self) {
        let Some(current) = &self.current else {
            return;
        };
        self.toc.set_entries(current.result.headings.clone());

        let view = DocumentView::parse(&current.result.html).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not scan rendered HTML for search");
            DocumentView::default()
        });
        let query = self.search.query().to_owned();
        self.search.replace_view(view);
        if !query.is_empty() {
            self.search.set_query(&query);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announce::RecordingAnnouncer;
    use emdee_extensions::{ExtensionError, ExtensionSource, LoadFuture};
    use emdee_renderer::BuiltinExtensions;
    use pretty_assertions::assert_eq;

    static_assertions::assert_impl_all!(ReaderSession: Send);
    static_assertions::assert_impl_all!(Activation: Send);

    struct FailingSource;

    impl ExtensionSource for FailingSource {
        fn load(&self, id: ExtensionId) -> LoadFuture {
            Box::pin(async move { Err(ExtensionError::new(id, "engine unavailable")) })
        }
    }

    fn session() -> ReaderSession {
        ReaderSession::new(
            Pipeline::default(),
            Arc::new(ExtensionLoader::new(BuiltinExtensions)),
        )
    }

    const GUIDE: &str = "# Guide\n\nRead the intro.\n\n## Install\n\nThe steps.\n\n## Use\n\nThe end.";

    #[test]
    fn test_open_renders_and_builds_navigation() {
        let mut session = session();
        let activations = session.open(Document::new(GUIDE, None));

        assert!(activations.is_empty());
        assert_eq!(session.generation(), 1);
        assert!(session.html().contains(r#"<h2 id="install">"#));

        let ids: Vec<_> = session.toc().entries().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["guide", "install", "use"]);
        assert_eq!(session.toc().active_id(), "guide");

        session.search_mut().set_query("the");
        assert_eq!(session.search().status(), "1 of 3");
    }

    #[test]
    fn test_open_resets_search_and_toc() {
        let mut session = session();
        session.open(Document::new(GUIDE, None));
        session.search_mut().set_query("the");

        session.open(Document::new("plain text", None));
        assert_eq!(session.search().query(), "");
        assert_eq!(session.search().current_index(), 0);
        assert!(session.toc().entries().is_empty());
        assert_eq!(session.toc().active_id(), "");
    }

    #[test]
    fn test_open_announces_file_name() {
        let announcer = Arc::new(RecordingAnnouncer::default());
        let mut session = session().with_announcer(announcer.clone());

        session.open(Document::new("x", Some("/docs/guide.md".into())));
        session.open(Document::new("y", None));
        assert_eq!(announcer.messages(), ["Opened: guide.md", "Opened: Untitled"]);
    }

    #[test]
    fn test_toggle_toc_announces() {
        let announcer = Arc::new(RecordingAnnouncer::default());
        let mut session = session().with_announcer(announcer.clone());

        assert!(session.toggle_toc());
        assert!(session.is_toc_open());
        assert!(!session.toggle_toc());
        assert_eq!(
            announcer.messages(),
            ["Table of contents opened", "Table of contents closed"]
        );
    }

    #[test]
    fn test_open_path_failure_keeps_current_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session();
        session.open(Document::new(GUIDE, None));
        let html = session.html().to_owned();

        let err = session.open_path(dir.path().join("missing.md")).unwrap_err();
        assert!(err.to_string().starts_with("Could not read file: "));
        assert_eq!(session.html(), html);
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn test_open_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "# From disk").unwrap();

        let mut session = session();
        session.open_path(&path).unwrap();
        assert_eq!(session.document().unwrap().source_location(), Some(path.as_path()));
        assert!(session.html().contains("From disk"));
    }

    #[tokio::test]
    async fn test_math_rendered_after_activation() {
        let mut session = session();
        let activations = session.open(Document::new("Area $\\pi r^2$", None));
        assert!(session.html().contains("$\\pi r^2$"));
        assert_eq!(activations.len(), 1);
        assert_eq!(activations[0].id(), ExtensionId::Math);

        for activation in activations {
            let completion = activation.run().await;
            assert!(session.apply(completion));
        }
        assert!(session.html().contains("<math"));
    }

    #[tokio::test]
    async fn test_stale_completion_is_discarded() {
        let mut session = session();
        let activations = session.open(Document::new("Euler $e^{i\\pi}$", None));
        session.open(Document::new("# Newer\n\nNo math here.", None));
        let newer = session.html().to_owned();

        for activation in activations {
            assert_eq!(activation.generation(), 1);
            let completion = activation.run().await;
            assert_eq!(completion.state, CapabilityState::Ready);
            assert!(!session.apply(completion));
        }
        assert_eq!(session.html(), newer);
        assert_eq!(session.toc().entries()[0].id, "newer");

        // The extension is ready now; reopening renders math immediately.
        let activations = session.open(Document::new("Euler $e^{i\\pi}$", None));
        assert!(activations.is_empty());
        assert!(session.html().contains("<math"));
    }

    #[tokio::test]
    async fn test_failed_activation_leaves_math_literal() {
        let mut session = ReaderSession::new(
            Pipeline::default(),
            Arc::new(ExtensionLoader::new(FailingSource)),
        );
        let activations = session.open(Document::new("Cost $5 and $6", None));
        for activation in activations {
            let completion = activation.run().await;
            assert_eq!(completion.state, CapabilityState::Failed);
            assert!(!session.apply(completion));
        }
        assert!(session.html().contains("Cost $5 and $6"));

        // Failed is terminal: no further activation is issued.
        assert!(session.open(Document::new("$x$", None)).is_empty());
    }

    #[tokio::test]
    async fn test_search_query_survives_rerender() {
        let mut session = session();
        let activations = session.open(Document::new("the $x$ and the end", None));
        session.search_mut().set_query("the");
        let before = session.search().matches().len();

        for activation in activations {
            session.apply(activation.run().await);
        }
        assert_eq!(session.search().query(), "the");
        assert_eq!(session.search().matches().len(), before);
    }

    #[test]
    fn test_stats_and_export() {
        let mut session = session();
        assert_eq!(session.stats(), None);
        assert_eq!(session.export(&ExportOptions::default()), None);

        session.open(Document::new("one two three", Some("/d/words.md".into())));
        assert_eq!(
            session.stats(),
            Some(ReadingStats {
                words: 3,
                minutes: 1
            })
        );

        let options = ExportOptions::for_path(session.document().unwrap().source_location());
        let exported = session.export(&options).unwrap();
        assert!(exported.contains("<title>words</title>"));
        assert!(exported.contains("<p>one two three</p>"));
    }

    #[test]
    fn test_math_option_off_skips_activation() {
        let pipeline = Pipeline::new(emdee_renderer::RenderOptions {
            math: false,
            ..Default::default()
        });
        let mut session = ReaderSession::new(
            pipeline,
            Arc::new(ExtensionLoader::new(BuiltinExtensions)),
        );
        assert!(session.open(Document::new("$x$", None)).is_empty());
    }
}
