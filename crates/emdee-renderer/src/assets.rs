//! Host-specific rewriting of relative image references.
//!
//! Rendered documents are shown by a host that cannot load paths relative to
//! the markdown file. An [`AssetResolver`] turns such a path into a URI the
//! host can load. Two strategies ship with the crate:
//!
//! - [`FileUriResolver`]: `file:///abs/path` URIs
//! - [`AssetProtocolResolver`]: `asset://localhost/<encoded path>` URIs used
//!   by webview hosts that serve local files through a custom protocol
//!
//! The resolver's [`scheme`](AssetResolver::scheme) is added to the
//! sanitizer's URL allow-list so resolved references survive sanitization.

use std::path::{Component, Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters escaped in `file:` URI paths (path separators stay literal).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Characters escaped by the asset protocol: everything but unreserved
/// characters, so the whole path is a single URI segment.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Converts local file paths into URIs the host can load.
pub trait AssetResolver: Send + Sync {
    /// URI for `reference` relative to `directory`.
    ///
    /// `reference` is already percent-decoded. Returning `None` leaves the
    /// original reference in place.
    fn resolve(&self, directory: &Path, reference: &str) -> Option<String>;

    /// Scheme of the URIs this resolver produces.
    fn scheme(&self) -> &'static str;
}

/// Resolves to `file://` URIs.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileUriResolver;

impl AssetResolver for FileUriResolver {
    fn resolve(&self, directory: &Path, reference: &str) -> Option<String> {
        let path = uri_path(&join_normalized(directory, reference))?;
        Some(format!(
            "file://{}",
            utf8_percent_encode(&path, PATH_SEGMENT)
        ))
    }

    fn scheme(&self) -> &'static str {
        "file"
    }
}

/// Resolves to `asset://localhost/` URIs with the full path encoded as one
/// component.
#[derive(Clone, Copy, Debug, Default)]
pub struct AssetProtocolResolver;

impl AssetResolver for AssetProtocolResolver {
    fn resolve(&self, directory: &Path, reference: &str) -> Option<String> {
        let path = join_normalized(directory, reference);
        let path = path.to_str()?;
        Some(format!(
            "asset://localhost/{}",
            utf8_percent_encode(path, COMPONENT)
        ))
    }

    fn scheme(&self) -> &'static str {
        "asset"
    }
}

/// Whether `reference` is a relative path eligible for resolution.
///
/// Absolute paths, fragments, protocol-relative URLs and anything with a URI
/// scheme (`http:`, `data:`, `mailto:`, ...) are not.
pub fn is_relative_reference(reference: &str) -> bool {
    let reference = reference.trim();
    if reference.is_empty()
        || reference.starts_with('#')
        || reference.starts_with('/')
        || reference.starts_with('\\')
        || Path::new(reference).is_absolute()
    {
        return false;
    }
    !has_scheme(reference)
}

/// Resolve a markdown image reference against the document directory.
///
/// Returns `None` when the reference is not relative or the resolver declines
/// it. A query or fragment suffix is carried over to the resolved URI.
pub fn resolve_reference(
    resolver: &dyn AssetResolver,
    directory: &Path,
    reference: &str,
) -> Option<String> {
    if !is_relative_reference(reference) {
        return None;
    }
    let split = reference.find(['?', '#']).unwrap_or(reference.len());
    let (path, suffix) = reference.split_at(split);
    let decoded = percent_decode_str(path).decode_utf8().ok()?;

    let resolved = resolver.resolve(directory, &decoded);
    if resolved.is_none() {
        tracing::debug!(reference, "Asset reference left unresolved");
    }
    resolved.map(|uri| format!("{uri}{suffix}"))
}

/// `scheme:` prefix per RFC 3986, excluding single-letter Windows drives.
fn has_scheme(reference: &str) -> bool {
    let Some(colon) = reference.find(':') else {
        return false;
    };
    let scheme = &reference[..colon];
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Join and drop `.`/`..` components lexically. `..` never climbs above the root.
fn join_normalized(directory: &Path, reference: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in directory.join(reference).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Forward-slash path with a leading `/`, as used in `file:` URIs.
fn uri_path(path: &Path) -> Option<String> {
    let path = path.to_str()?.replace('\\', "/");
    if path.starts_with('/') {
        Some(path)
    } else {
        Some(format!("/{path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_relative_references() {
        assert!(is_relative_reference("img/diagram.png"));
        assert!(is_relative_reference("./a.png"));
        assert!(is_relative_reference("../shared/a.png"));
        assert!(is_relative_reference("my image.png"));
    }

    #[test]
    fn test_non_relative_references() {
        for reference in [
            "",
            "/abs/a.png",
            "#anchor",
            "http://example.com/a.png",
            "HTTPS://example.com/a.png",
            "//cdn.example.com/a.png",
            "data:image/png;base64,AAAA",
            "mailto:someone@example.com",
            "asset://localhost/x",
        ] {
            assert!(!is_relative_reference(reference), "{reference}");
        }
    }

    #[test]
    fn test_file_uri_resolver() {
        let uri = FileUriResolver.resolve(Path::new("/docs/guide"), "img/my diagram.png");
        assert_eq!(uri.as_deref(), Some("file:///docs/guide/img/my%20diagram.png"));
    }

    #[test]
    fn test_parent_components_are_normalized() {
        let uri = FileUriResolver.resolve(Path::new("/docs/guide"), "./../shared/a.png");
        assert_eq!(uri.as_deref(), Some("file:///docs/shared/a.png"));
    }

    #[test]
    fn test_asset_protocol_resolver_encodes_whole_path() {
        let uri = AssetProtocolResolver.resolve(Path::new("/home/u/notes"), "pics/a b.png");
        assert_eq!(
            uri.as_deref(),
            Some("asset://localhost/%2Fhome%2Fu%2Fnotes%2Fpics%2Fa%20b.png")
        );
    }

    #[test]
    fn test_resolve_reference_decodes_and_keeps_suffix() {
        let uri = resolve_reference(
            &FileUriResolver,
            Path::new("/docs"),
            "my%20image.svg#layer",
        );
        assert_eq!(uri.as_deref(), Some("file:///docs/my%20image.svg#layer"));
    }

    #[test]
    fn test_resolve_reference_skips_absolute_urls() {
        assert_eq!(
            resolve_reference(&FileUriResolver, Path::new("/docs"), "https://x.org/a.png"),
            None
        );
    }

    struct Declining;

    impl AssetResolver for Declining {
        fn resolve(&self, _directory: &Path, _reference: &str) -> Option<String> {
            None
        }

        fn scheme(&self) -> &'static str {
            "none"
        }
    }

    #[test]
    fn test_declining_resolver_leaves_reference() {
        assert_eq!(resolve_reference(&Declining, Path::new("/docs"), "a.png"), None);
    }
}
