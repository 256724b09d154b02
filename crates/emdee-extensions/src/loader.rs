//! Memoized, coalescing extension activation.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::OnceCell;

use crate::capability::{Capabilities, CapabilityState, ExtensionId};

/// Boxed future returned by [`ExtensionSource::load`].
pub type LoadFuture = Pin<Box<dyn Future<Output = Result<(), ExtensionError>> + Send>>;

/// Error raised by an [`ExtensionSource`] when a capability cannot be brought up.
#[derive(Debug, thiserror::Error)]
#[error("failed to load extension {id}: {message}")]
pub struct ExtensionError {
    /// Extension that failed.
    pub id: ExtensionId,
    /// Human-readable cause.
    pub message: String,
}

impl ExtensionError {
    /// Create a load error for `id`.
    pub fn new(id: ExtensionId, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
        }
    }
}

/// Performs the actual work of bringing an extension up.
///
/// The loader guarantees `load` is called at most once per extension for the
/// lifetime of the [`ExtensionLoader`].
pub trait ExtensionSource: Send + Sync {
    /// Load `id`. Resolves once the capability can be used by renders.
    fn load(&self, id: ExtensionId) -> LoadFuture;
}

/// [`ExtensionSource`] whose loads succeed immediately.
///
/// Useful for hosts that link every capability eagerly and only want the
/// lifecycle bookkeeping.
pub struct ImmediateSource;

impl ExtensionSource for ImmediateSource {
    fn load(&self, _id: ExtensionId) -> LoadFuture {
        Box::pin(async { Ok(()) })
    }
}

/// Per-extension state cell.
struct Slot {
    state: AtomicU8,
    settled: OnceCell<CapabilityState>,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(CapabilityState::NotRequested.to_u8()),
            settled: OnceCell::new(),
        }
    }

    fn state(&self) -> CapabilityState {
        CapabilityState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move forward to `next`. Backward transitions are ignored.
    fn advance(&self, next: CapabilityState) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (next.to_u8() > current && !CapabilityState::from_u8(current).is_settled())
                    .then_some(next.to_u8())
            });
    }
}

/// Owner of the capability-state map.
///
/// State reads are lock-free. The only writer is the activation path, and it
/// only moves states forward, so renders can read a snapshot at any time.
pub struct ExtensionLoader {
    source: Box<dyn ExtensionSource>,
    slots: Vec<Slot>,
}

static GLOBAL: OnceLock<Arc<ExtensionLoader>> = OnceLock::new();

impl ExtensionLoader {
    /// Create an isolated loader backed by `source`.
    pub fn new(source: impl ExtensionSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            slots: ExtensionId::ALL.iter().map(|_| Slot::new()).collect(),
        }
    }

    /// Process-wide loader, created by `init` on first use.
    ///
    /// Later calls return the same instance and ignore `init`.
    pub fn global_or_init(init: impl FnOnce() -> ExtensionLoader) -> Arc<ExtensionLoader> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(init())))
    }

    /// Current state of `id`.
    #[must_use]
    pub fn state(&self, id: ExtensionId) -> CapabilityState {
        self.slot(id).state()
    }

    /// Snapshot of the extensions that are ready right now.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        ExtensionId::ALL
            .into_iter()
            .filter(|id| self.state(*id) == CapabilityState::Ready)
            .fold(Capabilities::none(), Capabilities::with)
    }

    /// Activate `id`, resolving to its settled state.
    ///
    /// The first call starts the load; calls made while it is in flight wait
    /// on the same load, and calls after it settled resolve immediately.
    /// The returned future owns a handle to the loader, so it can be spawned.
    pub fn activate(
        self: &Arc<Self>,
        id: ExtensionId,
    ) -> impl Future<Output = CapabilityState> + Send + 'static {
        let loader = Arc::clone(self);
        async move { loader.activate_in_place(id).await }
    }

    /// Borrowing variant of [`activate`](Self::activate).
    pub async fn activate_in_place(&self, id: ExtensionId) -> CapabilityState {
        let slot = self.slot(id);
        let settled = slot
            .settled
            .get_or_init(|| async {
                slot.advance(CapabilityState::Loading);
                tracing::debug!(extension = %id, "Loading extension");

                let outcome = match self.source.load(id).await {
                    Ok(()) => {
                        tracing::info!(extension = %id, "Extension ready");
                        CapabilityState::Ready
                    }
                    Err(e) => {
                        tracing::warn!(extension = %id, error = %e, "Extension failed to load");
                        CapabilityState::Failed
                    }
                };
                slot.advance(outcome);
                outcome
            })
            .await;
        *settled
    }

    fn slot(&self, id: ExtensionId) -> &Slot {
        &self.slots[id.slot()]
    }
}
