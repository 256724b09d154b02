/// Heading element found in a rendered document.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Heading {
    /// Anchor ID (the element's `id` attribute).
    pub id: String,
    /// Display label, without the permalink glyph.
    pub text: String,
    /// Heading level (1-6).
    pub level: u8,
}

impl Heading {
    /// Create a heading entry.
    pub fn new(id: impl Into<String>, text: impl Into<String>, level: u8) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            level,
        }
    }
}
