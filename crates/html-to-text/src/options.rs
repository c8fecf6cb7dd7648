//! Configuration options for HTML to text conversion.

/// Options controlling the conversion output.
///
/// The options are fixed for the lifetime of a conversion; the converter
/// never mutates them. Two independent conversions with equal options
/// produce byte-identical output for the same input.
///
/// # Examples
///
/// ```
/// use html_to_text::ConversionOptions;
///
/// let options = ConversionOptions::default().with_unicode(true);
/// assert!(options.unicode);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    /// Emit typographic characters (curly quotes, dashes, accented letters)
    /// as literal Unicode instead of their plain-ASCII approximations.
    pub unicode: bool,
    /// Flush eligible link references after every paragraph break instead
    /// of only once at the end of the document.
    pub links_each_paragraph: bool,
}

impl ConversionOptions {
    /// Create options with all defaults (ASCII substitution on, link
    /// references gathered at the end of the document).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether typographic characters are emitted as literal Unicode.
    #[must_use]
    pub fn with_unicode(mut self, unicode: bool) -> Self {
        self.unicode = unicode;
        self
    }

    /// Set whether link references are flushed after each paragraph.
    #[must_use]
    pub fn with_links_each_paragraph(mut self, enabled: bool) -> Self {
        self.links_each_paragraph = enabled;
        self
    }
}
