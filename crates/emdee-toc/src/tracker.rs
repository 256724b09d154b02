//! Active-heading state machine driven by scroll geometry.

use emdee_view::Heading;

/// Tuning of the active-heading walk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Distance below the viewport top that a heading must cross to become active.
    pub threshold_offset: f64,
    /// How close to the maximum scroll position counts as "at the bottom".
    pub bottom_epsilon: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            threshold_offset: 120.0,
            bottom_epsilon: 4.0,
        }
    }
}

/// Top edge of one heading element, in the same coordinate space as
/// [`ScrollGeometry::viewport_top`].
#[derive(Clone, Debug, PartialEq)]
pub struct HeadingPosition {
    pub id: String,
    pub top: f64,
}

impl HeadingPosition {
    pub fn new(id: impl Into<String>, top: f64) -> Self {
        Self { id: id.into(), top }
    }
}

/// Snapshot of the scroll container and its headings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScrollGeometry {
    /// Top edge of the visible area of the scroll container.
    pub viewport_top: f64,
    /// Current scroll offset of the container.
    pub scroll_top: f64,
    /// Total scrollable height of the content.
    pub scroll_height: f64,
    /// Visible height of the container.
    pub client_height: f64,
    /// Heading positions in document order.
    pub headings: Vec<HeadingPosition>,
}

impl ScrollGeometry {
    fn viewport_bottom(&self) -> f64 {
        self.viewport_top + self.client_height
    }

    fn at_bottom(&self, epsilon: f64) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - epsilon
    }
}

/// Id of the heading that should be active for `geometry`.
///
/// The active heading is the last one whose top has crossed the threshold
/// line. At the bottom of the document it is the last one still above the
/// viewport's bottom edge, so a short trailing section can become active.
/// When nothing qualifies the first heading is active. `None` only when
/// there are no headings.
pub fn active_heading<'a>(config: &TrackerConfig, geometry: &'a ScrollGeometry) -> Option<&'a str> {
    let first = geometry.headings.first()?;

    let qualifying = if geometry.at_bottom(config.bottom_epsilon) {
        let bottom = geometry.viewport_bottom();
        geometry.headings.iter().rev().find(|h| h.top < bottom)
    } else {
        let threshold = geometry.viewport_top + config.threshold_offset;
        geometry.headings.iter().rev().find(|h| h.top <= threshold)
    };

    Some(qualifying.unwrap_or(first).id.as_str())
}

/// Scroll offset that brings a heading at `heading_top` to the top of the
/// viewport, clamped to the scrollable range.
pub fn scroll_target(heading_top: f64, geometry: &ScrollGeometry) -> f64 {
    let max = (geometry.scroll_height - geometry.client_height).max(0.0);
    (geometry.scroll_top + heading_top - geometry.viewport_top).clamp(0.0, max)
}

/// Tracker state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TrackerState {
    #[default]
    NoHeadings,
    Tracking(String),
}

/// Entries and active id, as presented by a table-of-contents panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TocState {
    pub entries: Vec<Heading>,
    /// One of the entries' ids, or empty when there are no entries.
    pub active_id: String,
}

/// Tracks the active heading of the currently displayed document.
#[derive(Debug, Default)]
pub struct TocTracker {
    config: TrackerConfig,
    entries: Vec<Heading>,
    state: TrackerState,
    needs_sync: bool,
}

impl TocTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace the entries after a structural change.
    ///
    /// The first entry becomes active until geometry is reported. The host
    /// should call [`on_scroll`](Self::on_scroll) once the new structure is
    /// laid out; [`needs_sync`](Self::needs_sync) stays true until it does.
    pub fn set_entries(&mut self, entries: Vec<Heading>) {
        self.state = match entries.first() {
            Some(first) => TrackerState::Tracking(first.id.clone()),
            None => TrackerState::NoHeadings,
        };
        self.needs_sync = !entries.is_empty();
        self.entries = entries;
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.set_entries(Vec::new());
    }

    /// Recompute the active heading. Returns the active id, if any.
    ///
    /// Positions whose id is not a current entry are ignored, so geometry
    /// reported for a previous document cannot select a foreign id.
    pub fn on_scroll(&mut self, geometry: &ScrollGeometry) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }

        let known = ScrollGeometry {
            headings: geometry
                .headings
                .iter()
                .filter(|position| self.entries.iter().any(|e| e.id == position.id))
                .cloned()
                .collect(),
            ..*geometry
        };

        if let Some(id) = active_heading(&self.config, &known) {
            if self.active_id() != id {
                tracing::trace!(active = id, "Active heading changed");
            }
            self.state = TrackerState::Tracking(id.to_owned());
            self.needs_sync = false;
        }
        self.active()
    }

    /// Whether a geometry sync is pending since the last structural change.
    pub fn needs_sync(&self) -> bool {
        self.needs_sync
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn entries(&self) -> &[Heading] {
        &self.entries
    }

    /// Active id, or the empty string when there are no headings.
    pub fn active_id(&self) -> &str {
        self.active().unwrap_or_default()
    }

    /// Owned snapshot for presentation.
    pub fn snapshot(&self) -> TocState {
        TocState {
            entries: self.entries.clone(),
            active_id: self.active_id().to_owned(),
        }
    }

    fn active(&self) -> Option<&str> {
        match &self.state {
            TrackerState::Tracking(id) => Some(id.as_str()),
            TrackerState::NoHeadings => None,
        }
    }
}
