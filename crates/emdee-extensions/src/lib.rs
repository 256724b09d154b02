//! Lazy activation of optional rendering capabilities.
//!
//! Some rendering features are expensive to bring up and only matter for a
//! subset of documents. This crate owns their lifecycle:
//!
//! - [`ExtensionId`]: the known optional capabilities and their trigger predicates
//! - [`CapabilityState`]: `NotRequested → Loading → Ready` (or `Failed`), never reversed
//! - [`Capabilities`]: an immutable snapshot of which extensions are ready
//! - [`ExtensionLoader`]: memoized, coalescing activation driven by an [`ExtensionSource`]
//!
//! Rendering never waits on activation. A caller inspects the document text,
//! fires [`ExtensionLoader::activate`] in the background and renders right away
//! with the current [`ExtensionLoader::capabilities`] snapshot. When activation
//! completes, the caller decides whether the document it was issued for is
//! still current before re-rendering.
//!
//! # Example
//!
//! ```
//! use emdee_extensions::{ExtensionId, ExtensionLoader, ImmediateSource};
//!
//! let loader = ExtensionLoader::new(ImmediateSource);
//! assert!(!loader.capabilities().is_ready(ExtensionId::Math));
//! assert!(ExtensionId::Math.is_triggered_by("Euler: $e^{i\\pi} + 1 = 0$"));
//! ```

mod capability;
mod loader;

pub use capability::{Capabilities, CapabilityState, ExtensionId};
pub use loader::{ExtensionError, ExtensionLoader, ExtensionSource, ImmediateSource, LoadFuture};
