//! Extension identifiers, lifecycle states and ready-set snapshots.

use std::fmt;

/// Optional rendering capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExtensionId {
    /// `$…$` / `$$…$$` math typesetting.
    Math,
}

impl ExtensionId {
    /// Every known extension, in slot order.
    pub const ALL: [ExtensionId; 1] = [ExtensionId::Math];

    /// Stable name used in logs and configuration.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ExtensionId::Math => "math",
        }
    }

    /// Cheap check whether a document may need this extension.
    ///
    /// False positives are fine (a `$` in prose just activates math once);
    /// false negatives would leave content untypeset.
    #[must_use]
    pub fn is_triggered_by(self, text: &str) -> bool {
        match self {
            ExtensionId::Math => text.contains('$'),
        }
    }

    /// Extensions whose trigger predicate matches `text`.
    pub fn triggered_by(text: &str) -> impl Iterator<Item = ExtensionId> + '_ {
        Self::ALL
            .into_iter()
            .filter(move |id| id.is_triggered_by(text))
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            ExtensionId::Math => 0,
        }
    }

    fn bit(self) -> u32 {
        1 << self.slot()
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle of one extension.
///
/// Transitions are monotonic: `NotRequested → Loading → Ready | Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapabilityState {
    NotRequested,
    Loading,
    Ready,
    /// Load failed; the extension stays unavailable for the process lifetime.
    Failed,
}

impl CapabilityState {
    pub(crate) const fn to_u8(self) -> u8 {
        match self {
            CapabilityState::NotRequested => 0,
            CapabilityState::Loading => 1,
            CapabilityState::Ready => 2,
            CapabilityState::Failed => 3,
        }
    }

    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            1 => CapabilityState::Loading,
            2 => CapabilityState::Ready,
            3 => CapabilityState::Failed,
            _ => CapabilityState::NotRequested,
        }
    }

    /// Whether no further transition can happen.
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, CapabilityState::Ready | CapabilityState::Failed)
    }
}

/// Snapshot of the extensions that are `Ready`.
///
/// Part of the render memoization key: two renders with equal snapshots and
/// equal inputs produce identical output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    ready: u32,
}

impl Capabilities {
    /// Snapshot with no extension ready.
    #[must_use]
    pub const fn none() -> Self {
        Self { ready: 0 }
    }

    /// Snapshot with every known extension ready.
    #[must_use]
    pub fn all() -> Self {
        ExtensionId::ALL
            .into_iter()
            .fold(Self::none(), Capabilities::with)
    }

    /// Copy of this snapshot with `id` marked ready.
    #[must_use]
    pub fn with(self, id: ExtensionId) -> Self {
        Self {
            ready: self.ready | id.bit(),
        }
    }

    /// Whether `id` is ready in this snapshot.
    #[must_use]
    pub fn is_ready(&self, id: ExtensionId) -> bool {
        self.ready & id.bit() != 0
    }

    /// Raw bitset, stable within one build. Used for cache keys.
    #[must_use]
    pub fn bits(&self) -> u32 {
        self.ready
    }
}
