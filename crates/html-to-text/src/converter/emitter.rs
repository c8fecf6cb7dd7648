//! The emission state machine.
//!
//! Consumes tag, data, and entity events in document order and writes
//! Markdown-structured text to a sink. All conversion state lives here:
//! owed line breaks, collapsible spaces, quiet (suppressed) regions, list
//! and blockquote nesting, preformatted mode, and the queue of link
//! references waiting to be dumped as a trailing block.
//!
//! Output is append-only and decided one event at a time; the machine never
//! looks ahead past the event it is handling.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::entities;
use crate::error::Result;
use crate::options::ConversionOptions;
use crate::sink::TextSink;

/// ASCII whitespace runs, collapsed to single spaces in flowing text.
static WHITESPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\r\n\x0B\x0C]+").expect("whitespace pattern compiles"));

/// Attributes of a start tag, reduced to the fields the converter reads.
///
/// Values must arrive entity-decoded; the converter does not re-scan
/// attribute text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagAttrs {
    /// Link target of an anchor.
    pub href: Option<String>,
    /// Image source.
    pub src: Option<String>,
    /// Alternative text of an image.
    pub alt: Option<String>,
    /// Tooltip title, printed alongside the target in the reference list.
    pub title: Option<String>,
}

impl TagAttrs {
    /// Build the record from `(name, value)` pairs, keeping the last value
    /// when a name repeats.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut attrs = Self::default();
        for (name, value) in pairs {
            match name {
                "href" => attrs.href = Some(value.to_string()),
                "src" => attrs.src = Some(value.to_string()),
                "alt" => attrs.alt = Some(value.to_string()),
                "title" => attrs.title = Some(value.to_string()),
                _ => {}
            }
        }
        attrs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Ordered,
    Unordered,
}

/// One open `<ol>`/`<ul>`, innermost last on the stack.
#[derive(Debug)]
struct ListFrame {
    kind: ListKind,
    item_count: usize,
}

/// An open anchor that carried an `href`.
#[derive(Debug)]
struct OpenLink {
    href: String,
    title: Option<String>,
}

/// A link or image target queued for the trailing reference block.
#[derive(Debug)]
struct LinkReference {
    id: u64,
    href: String,
    title: Option<String>,
    /// Output count at the moment the reference was recorded. A reference
    /// is only flushed once later output exists, so an anchor closing right
    /// at a flush point stays queued.
    recorded_at: u64,
}

/// How a write interacts with the skip-empty and blockquote-prefix rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Force {
    /// Normal write; empty text is a no-op.
    No,
    /// Structural marker that must reach the sink, and whose leading `>`
    /// suppresses the blockquote prefix space.
    Marker,
    /// Final write of the document: flush a newline and the reference list.
    End,
}

/// Streaming converter state for a single document.
///
/// Feed events in document order through [`handle_start_tag`],
/// [`handle_end_tag`], [`handle_data`], and [`handle_entity`], then call
/// [`finish`] exactly once to flush pending breaks and the remaining link
/// references. The machine tolerates unbalanced end tags and truncated
/// input; it never fails on malformed markup.
///
/// [`handle_start_tag`]: TextEmitter::handle_start_tag
/// [`handle_end_tag`]: TextEmitter::handle_end_tag
/// [`handle_data`]: TextEmitter::handle_data
/// [`handle_entity`]: TextEmitter::handle_entity
/// [`finish`]: TextEmitter::finish
#[derive(Debug)]
pub struct TextEmitter<S: TextSink> {
    sink: S,
    options: ConversionOptions,
    /// Suppression nesting; no output while > 0 (head, style, script).
    quiet_depth: usize,
    /// Line breaks owed before the next write: 0, 1, or 2 (paragraph).
    pending_breaks: u8,
    /// True at document start and right after a forced line start.
    at_line_start: bool,
    /// A single collapsible space owed before the next write.
    pending_space: bool,
    /// Count of writes that reached the sink.
    output_count: u64,
    /// One entry per open anchor; `None` for anchors without an `href`.
    open_links: Vec<Option<OpenLink>>,
    /// Ids handed out to anchors and images, in document order.
    reference_counter: u64,
    pending_references: Vec<LinkReference>,
    list_stack: Vec<ListFrame>,
    blockquote_depth: usize,
    in_preformatted: bool,
    /// One-shot: the next write after a `<pre>` opens emits the verbatim
    /// marker first.
    preformatted_just_opened: bool,
    last_ended_in_newline: bool,
}

impl<S: TextSink> TextEmitter<S> {
    /// Create a converter writing to `sink`.
    pub fn new(options: ConversionOptions, sink: S) -> Self {
        Self {
            sink,
            options,
            quiet_depth: 0,
            pending_breaks: 0,
            at_line_start: true,
            pending_space: false,
            output_count: 0,
            open_links: Vec::new(),
            reference_counter: 0,
            pending_references: Vec::new(),
            list_stack: Vec::new(),
            blockquote_depth: 0,
            in_preformatted: false,
            preformatted_just_opened: false,
            last_ended_in_newline: false,
        }
    }

    /// Handle a start tag with its (entity-decoded) attributes.
    pub fn handle_start_tag(&mut self, name: &str, attrs: &TagAttrs) -> Result<()> {
        self.handle_tag(name, Some(attrs), true)
    }

    /// Handle an end tag.
    ///
    /// End tags with no matching open are ignored; depth counters never go
    /// negative.
    pub fn handle_end_tag(&mut self, name: &str) -> Result<()> {
        self.handle_tag(name, None, false)
    }

    /// Handle character data.
    ///
    /// Outside preformatted blocks, whitespace runs collapse to single
    /// spaces and a leading space turns into a pending collapsible space.
    pub fn handle_data(&mut self, text: &str) -> Result<()> {
        self.emit(text, true, Force::No)
    }

    /// Handle an entity reference token (`amp`, `#39`, `#x27`).
    ///
    /// The resolved text is written verbatim, without whitespace collapsing.
    /// Inside quiet regions the entity is still resolved, then discarded.
    pub fn handle_entity(&mut self, token: &str) -> Result<()> {
        let resolved = entities::resolve_entity(token, self.options.unicode);
        self.emit(&resolved, false, Force::No)
    }

    /// Finalize the document: flush outstanding breaks, terminate the last
    /// line, and dump every remaining link reference.
    pub fn finish(&mut self) -> Result<()> {
        self.line_break();
        self.emit("", false, Force::End)
    }

    /// Unwrap the emitter, returning the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn handle_tag(&mut self, name: &str, attrs: Option<&TagAttrs>, start: bool) -> Result<()> {
        if let Some(level) = heading_level(name) {
            self.paragraph_break();
            if start {
                let mut marker = "#".repeat(level);
                marker.push(' ');
                self.emit(&marker, false, Force::No)?;
            }
            return Ok(());
        }

        match name {
            "p" | "div" => self.paragraph_break(),
            "br" if start => self.emit("  \n", false, Force::No)?,
            "head" | "style" | "script" => {
                if start {
                    self.quiet_depth += 1;
                } else {
                    self.quiet_depth = self.quiet_depth.saturating_sub(1);
                }
            }
            "blockquote" => {
                if start {
                    self.paragraph_break();
                    self.emit("> ", false, Force::Marker)?;
                    self.at_line_start = true;
                    self.blockquote_depth += 1;
                } else {
                    self.blockquote_depth = self.blockquote_depth.saturating_sub(1);
                    self.paragraph_break();
                }
            }
            "em" | "i" | "u" => self.emit("_", false, Force::No)?,
            "strong" | "b" => self.emit("**", false, Force::No)?,
            "code" if !self.in_preformatted => self.emit("`", false, Force::No)?,
            "a" => {
                if start {
                    let href = attrs.and_then(|attrs| attrs.href.clone());
                    if let Some(href) = href {
                        let title = attrs.and_then(|attrs| attrs.title.clone());
                        self.open_links.push(Some(OpenLink { href, title }));
                        self.emit("[", false, Force::No)?;
                    } else {
                        self.open_links.push(None);
                    }
                } else if let Some(Some(link)) = self.open_links.pop() {
                    self.reference_counter += 1;
                    let reference = LinkReference {
                        id: self.reference_counter,
                        href: link.href,
                        title: link.title,
                        recorded_at: self.output_count,
                    };
                    let marker = format!("][{}]", reference.id);
                    self.emit(&marker, false, Force::No)?;
                    self.pending_references.push(reference);
                }
            }
            "img" if start => {
                self.reference_counter += 1;
                let id = self.reference_counter;
                let src = attrs.and_then(|attrs| attrs.src.clone());
                if let Some(src) = src {
                    let reference = LinkReference {
                        id,
                        href: src,
                        title: attrs.and_then(|attrs| attrs.title.clone()),
                        recorded_at: self.output_count,
                    };
                    self.emit("![", false, Force::No)?;
                    let alt = attrs.and_then(|attrs| attrs.alt.clone());
                    if let Some(alt) = alt {
                        self.emit(&alt, false, Force::No)?;
                    }
                    self.emit(&format!("][{id}]"), false, Force::No)?;
                    self.pending_references.push(reference);
                }
            }
            "ol" | "ul" => {
                if start {
                    let kind = if name == "ol" {
                        ListKind::Ordered
                    } else {
                        ListKind::Unordered
                    };
                    self.list_stack.push(ListFrame {
                        kind,
                        item_count: 0,
                    });
                } else {
                    let _ = self.list_stack.pop();
                }
                self.paragraph_break();
            }
            "li" => {
                if start {
                    self.line_break();
                    let indent = "  ".repeat(self.list_stack.len());
                    self.emit(&indent, false, Force::No)?;
                    let marker = match self.list_stack.last_mut() {
                        Some(frame) if frame.kind == ListKind::Ordered => {
                            frame.item_count += 1;
                            format!("{}. ", frame.item_count)
                        }
                        // Stray <li> outside any list renders as unordered.
                        _ => "* ".to_string(),
                    };
                    self.emit(&marker, false, Force::No)?;
                    self.at_line_start = true;
                } else {
                    self.line_break();
                }
            }
            "tr" => self.line_break(),
            "pre" => {
                if start {
                    self.preformatted_just_opened = true;
                    self.in_preformatted = true;
                } else {
                    self.in_preformatted = false;
                }
                self.paragraph_break();
            }
            _ => {}
        }
        Ok(())
    }

    /// Queue a single line break unless a break is already owed.
    fn line_break(&mut self) {
        if self.pending_breaks == 0 {
            self.pending_breaks = 1;
        }
    }

    /// Queue a paragraph break (two line breaks), superseding a single one.
    fn paragraph_break(&mut self) {
        self.pending_breaks = 2;
    }

    /// The generic output primitive.
    ///
    /// Every byte that reaches the sink funnels through here: whitespace
    /// collapsing for flowing data, the one-shot verbatim marker, lazy
    /// blockquote prefixing, owed break and space flushing, and the
    /// reference-list dump. `literal` marks character data as opposed to
    /// structural markers.
    fn emit(&mut self, data: &str, literal: bool, force: Force) -> Result<()> {
        if self.quiet_depth > 0 {
            return Ok(());
        }

        let mut data = data;
        let collapsed;
        if literal && !self.in_preformatted {
            collapsed = WHITESPACE_RUNS.replace_all(data, " ");
            data = collapsed.as_ref();
            if let Some(rest) = data.strip_prefix(' ') {
                self.pending_space = true;
                data = rest;
            }
        }
        if data.is_empty() && force == Force::No {
            return Ok(());
        }

        if self.preformatted_just_opened {
            self.sink.write_text(" :")?;
            self.preformatted_just_opened = false;
        }

        // The blockquote prefix is applied lazily, here, so it lands on
        // every line started by a flushed break. The nested "> " marker
        // itself must not pick up an extra space.
        let mut prefix = ">".repeat(self.blockquote_depth);
        let marker_line = force != Force::No && data.starts_with('>');
        if !marker_line && self.blockquote_depth > 0 {
            prefix.push(' ');
        }
        let rewritten: String;
        if self.in_preformatted {
            prefix.push_str("    ");
            if data.contains('\n') {
                rewritten = data.replace('\n', &format!("\n{prefix}"));
                data = &rewritten;
            }
        }

        if self.at_line_start {
            self.pending_space = false;
            self.pending_breaks = 0;
            self.at_line_start = false;
        }

        if force == Force::End {
            self.pending_breaks = 0;
            self.sink.write_text("\n")?;
            self.pending_space = false;
        }

        let paragraph_break_due = self.pending_breaks == 2;
        if self.pending_breaks > 0 {
            for _ in 0..self.pending_breaks {
                self.sink.write_text("\n")?;
                self.sink.write_text(&prefix)?;
            }
            self.pending_space = false;
        }

        if self.pending_space {
            if !self.last_ended_in_newline {
                self.sink.write_text(" ")?;
            }
            self.pending_space = false;
        }

        if !self.pending_references.is_empty()
            && ((paragraph_break_due && self.options.links_each_paragraph) || force == Force::End)
        {
            self.flush_references(force == Force::End)?;
        }

        self.pending_breaks = 0;
        self.sink.write_text(data)?;
        self.last_ended_in_newline = data.ends_with('\n');
        self.output_count += 1;
        Ok(())
    }

    /// Dump every reference recorded before the current output position.
    ///
    /// References whose anchor closed at the current position stay queued
    /// for a later flush (or the end of the document).
    fn flush_references(&mut self, end_of_document: bool) -> Result<()> {
        if end_of_document {
            self.sink.write_text("\n")?;
        }
        let mut still_pending = Vec::new();
        let mut flushed_any = false;
        log::trace!(
            "flushing link references: {} queued",
            self.pending_references.len()
        );
        for reference in std::mem::take(&mut self.pending_references) {
            if self.output_count > reference.recorded_at {
                let mut line = format!("    [{}]: {}", reference.id, reference.href);
                if let Some(title) = &reference.title {
                    line.push_str(&format!(" ({title})"));
                }
                line.push('\n');
                self.sink.write_text(&line)?;
                flushed_any = true;
            } else {
                still_pending.push(reference);
            }
        }
        if flushed_any {
            self.sink.write_text("\n")?;
        }
        self.pending_references = still_pending;
        Ok(())
    }
}

/// Heading level for tag names shaped exactly `h1`..`h9`.
fn heading_level(name: &str) -> Option<usize> {
    match name.as_bytes() {
        [b'h', digit @ b'1'..=b'9'] => Some(usize::from(digit - b'0')),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter() -> TextEmitter<String> {
        TextEmitter::new(ConversionOptions::default(), String::new())
    }

    fn emitter_with(options: ConversionOptions) -> TextEmitter<String> {
        TextEmitter::new(options, String::new())
    }

    #[test]
    fn heading_level_requires_exact_shape() {
        assert_eq!(heading_level("h1"), Some(1));
        assert_eq!(heading_level("h9"), Some(9));
        assert_eq!(heading_level("h0"), None);
        assert_eq!(heading_level("h10"), None);
        assert_eq!(heading_level("header"), None);
        assert_eq!(heading_level("hr"), None);
    }

    #[test]
    fn data_collapses_whitespace_runs() {
        let mut e = emitter();
        e.handle_data("one\n\t  two").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "one two\n");
    }

    #[test]
    fn leading_space_becomes_pending_and_collapses() {
        let mut e = emitter();
        e.handle_data("one").unwrap();
        e.handle_data("   ").unwrap();
        e.handle_data(" two").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "one two\n");
    }

    #[test]
    fn entity_events_resolve_through_the_table() {
        let mut e = emitter();
        e.handle_data("it").unwrap();
        e.handle_entity("#8217").unwrap();
        e.handle_data("s").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "it's\n");
    }

    #[test]
    fn entity_events_honor_unicode_mode() {
        let mut e = emitter_with(ConversionOptions::default().with_unicode(true));
        e.handle_entity("mdash").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "\u{2014}\n");
    }

    #[test]
    fn quiet_regions_swallow_everything() {
        let mut e = emitter();
        e.handle_data("before").unwrap();
        e.handle_start_tag("style", &TagAttrs::default()).unwrap();
        e.handle_data("p { color: red }").unwrap();
        e.handle_entity("amp").unwrap();
        e.handle_end_tag("style").unwrap();
        e.handle_data(" after").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "before after\n");
    }

    #[test]
    fn unbalanced_quiet_end_tags_clamp_at_zero() {
        let mut e = emitter();
        e.handle_end_tag("script").unwrap();
        e.handle_end_tag("head").unwrap();
        e.handle_data("still visible").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "still visible\n");
    }

    #[test]
    fn emphasis_and_strong_markers_wrap_both_sides() {
        let mut e = emitter();
        e.handle_start_tag("em", &TagAttrs::default()).unwrap();
        e.handle_data("soft").unwrap();
        e.handle_end_tag("em").unwrap();
        e.handle_data(" and ").unwrap();
        e.handle_start_tag("b", &TagAttrs::default()).unwrap();
        e.handle_data("loud").unwrap();
        e.handle_end_tag("b").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "_soft_ and **loud**\n");
    }

    #[test]
    fn code_markers_suppressed_inside_preformatted() {
        let mut e = emitter();
        e.handle_start_tag("pre", &TagAttrs::default()).unwrap();
        e.handle_start_tag("code", &TagAttrs::default()).unwrap();
        e.handle_data("x = 1").unwrap();
        e.handle_end_tag("code").unwrap();
        e.handle_end_tag("pre").unwrap();
        e.finish().unwrap();
        let out = e.into_sink();
        assert!(!out.contains('`'), "no backticks expected in {out:?}");
        assert!(out.contains("x = 1"));
    }

    #[test]
    fn anchor_without_href_emits_no_marker() {
        let mut e = emitter();
        e.handle_start_tag("a", &TagAttrs::default()).unwrap();
        e.handle_data("plain").unwrap();
        e.handle_end_tag("a").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "plain\n");
    }

    #[test]
    fn stray_anchor_end_is_ignored() {
        let mut e = emitter();
        e.handle_data("text").unwrap();
        e.handle_end_tag("a").unwrap();
        e.handle_end_tag("ul").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "text\n");
    }

    #[test]
    fn anchor_ids_increase_across_links_and_images() {
        let mut e = emitter();
        e.handle_start_tag("a", &TagAttrs::from_pairs([("href", "http://a")]))
            .unwrap();
        e.handle_data("one").unwrap();
        e.handle_end_tag("a").unwrap();
        e.handle_start_tag(
            "img",
            &TagAttrs::from_pairs([("src", "pic.png"), ("alt", "pic")]),
        )
        .unwrap();
        e.handle_start_tag("a", &TagAttrs::from_pairs([("href", "http://b")]))
            .unwrap();
        e.handle_data("two").unwrap();
        e.handle_end_tag("a").unwrap();
        e.finish().unwrap();
        let out = e.into_sink();
        assert!(out.contains("[one][1]"));
        assert!(out.contains("![pic][2]"));
        assert!(out.contains("[two][3]"));
        assert!(out.contains("    [1]: http://a\n"));
        assert!(out.contains("    [2]: pic.png\n"));
        assert!(out.contains("    [3]: http://b\n"));
    }

    #[test]
    fn image_without_src_still_consumes_an_id() {
        let mut e = emitter();
        e.handle_start_tag("img", &TagAttrs::from_pairs([("alt", "ghost")]))
            .unwrap();
        e.handle_start_tag("a", &TagAttrs::from_pairs([("href", "http://x")]))
            .unwrap();
        e.handle_data("link").unwrap();
        e.handle_end_tag("a").unwrap();
        e.finish().unwrap();
        let out = e.into_sink();
        assert!(out.contains("[link][2]"), "id 1 was spent on the image: {out:?}");
        assert!(!out.contains("ghost"));
    }

    #[test]
    fn link_title_rides_into_the_reference_list() {
        let mut e = emitter();
        e.handle_start_tag(
            "a",
            &TagAttrs::from_pairs([("href", "http://x"), ("title", "The X")]),
        )
        .unwrap();
        e.handle_data("x").unwrap();
        e.handle_end_tag("a").unwrap();
        e.finish().unwrap();
        assert!(e.into_sink().contains("    [1]: http://x (The X)\n"));
    }

    #[test]
    fn ordered_list_counts_per_frame() {
        let mut e = emitter();
        e.handle_start_tag("ol", &TagAttrs::default()).unwrap();
        for item in ["a", "b", "c"] {
            e.handle_start_tag("li", &TagAttrs::default()).unwrap();
            e.handle_data(item).unwrap();
            e.handle_end_tag("li").unwrap();
        }
        e.handle_end_tag("ol").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "  1. a\n  2. b\n  3. c\n");
    }

    #[test]
    fn new_ordered_list_restarts_numbering() {
        let mut e = emitter();
        for _ in 0..2 {
            e.handle_start_tag("ol", &TagAttrs::default()).unwrap();
            e.handle_start_tag("li", &TagAttrs::default()).unwrap();
            e.handle_data("only").unwrap();
            e.handle_end_tag("li").unwrap();
            e.handle_end_tag("ol").unwrap();
        }
        e.finish().unwrap();
        let out = e.into_sink();
        assert_eq!(out.matches("1. only").count(), 2);
        assert!(!out.contains("2. "));
    }

    #[test]
    fn unclosed_lists_indent_by_depth() {
        let mut e = emitter();
        e.handle_start_tag("ul", &TagAttrs::default()).unwrap();
        e.handle_start_tag("ul", &TagAttrs::default()).unwrap();
        e.handle_start_tag("ol", &TagAttrs::default()).unwrap();
        e.handle_start_tag("li", &TagAttrs::default()).unwrap();
        e.handle_data("deep").unwrap();
        e.finish().unwrap();
        assert!(e.into_sink().contains("      1. deep"));
    }

    #[test]
    fn list_item_outside_any_list_defaults_to_bullet() {
        let mut e = emitter();
        e.handle_start_tag("li", &TagAttrs::default()).unwrap();
        e.handle_data("stray").unwrap();
        e.handle_end_tag("li").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "* stray\n");
    }

    #[test]
    fn blockquote_prefixes_every_line() {
        let mut e = emitter();
        e.handle_start_tag("blockquote", &TagAttrs::default()).unwrap();
        e.handle_data("first").unwrap();
        e.handle_start_tag("p", &TagAttrs::default()).unwrap();
        e.handle_data("second").unwrap();
        e.handle_end_tag("blockquote").unwrap();
        e.handle_data("outside").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "> first\n> \n> second\n\noutside\n");
    }

    #[test]
    fn nested_blockquote_lines_carry_depth_markers() {
        let mut e = emitter();
        e.handle_start_tag("blockquote", &TagAttrs::default()).unwrap();
        e.handle_data("a").unwrap();
        e.handle_start_tag("blockquote", &TagAttrs::default()).unwrap();
        e.handle_data("b").unwrap();
        e.handle_end_tag("blockquote").unwrap();
        e.handle_data("c").unwrap();
        e.handle_end_tag("blockquote").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "> a\n>\n>> b\n> \n> c\n");
    }

    #[test]
    fn preformatted_marker_fires_once_per_open() {
        let mut e = emitter();
        e.handle_start_tag("pre", &TagAttrs::default()).unwrap();
        e.handle_data("one").unwrap();
        e.handle_data("two").unwrap();
        e.handle_end_tag("pre").unwrap();
        e.finish().unwrap();
        let out = e.into_sink();
        assert_eq!(out.matches(" :").count(), 1);
    }

    #[test]
    fn preformatted_inside_blockquote_prefixes_each_line() {
        let mut e = emitter();
        e.handle_start_tag("blockquote", &TagAttrs::default()).unwrap();
        e.handle_data("intro").unwrap();
        e.handle_start_tag("pre", &TagAttrs::default()).unwrap();
        e.handle_data("line1\nline2").unwrap();
        e.handle_end_tag("pre").unwrap();
        e.handle_end_tag("blockquote").unwrap();
        e.finish().unwrap();
        let out = e.into_sink();
        assert!(out.contains(">     line1\n>     line2"), "got {out:?}");
    }

    #[test]
    fn hard_break_bypasses_coalescing() {
        let mut e = emitter();
        e.handle_data("one").unwrap();
        e.handle_start_tag("br", &TagAttrs::default()).unwrap();
        e.handle_data("two").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "one  \ntwo\n");
    }

    #[test]
    fn table_rows_break_lines() {
        let mut e = emitter();
        e.handle_start_tag("tr", &TagAttrs::default()).unwrap();
        e.handle_data("r1").unwrap();
        e.handle_end_tag("tr").unwrap();
        e.handle_start_tag("tr", &TagAttrs::default()).unwrap();
        e.handle_data("r2").unwrap();
        e.handle_end_tag("tr").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "r1\nr2\n");
    }

    #[test]
    fn paragraph_breaks_coalesce() {
        let mut e = emitter();
        e.handle_start_tag("p", &TagAttrs::default()).unwrap();
        e.handle_data("a").unwrap();
        e.handle_end_tag("p").unwrap();
        e.handle_start_tag("div", &TagAttrs::default()).unwrap();
        e.handle_start_tag("p", &TagAttrs::default()).unwrap();
        e.handle_data("b").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "a\n\nb\n");
    }

    #[test]
    fn references_wait_for_later_output_in_paragraph_mode() {
        let mut e = emitter_with(ConversionOptions::default().with_links_each_paragraph(true));
        e.handle_start_tag("p", &TagAttrs::default()).unwrap();
        e.handle_start_tag("a", &TagAttrs::from_pairs([("href", "http://x")]))
            .unwrap();
        e.handle_data("one").unwrap();
        e.handle_end_tag("a").unwrap();
        e.handle_end_tag("p").unwrap();
        e.handle_start_tag("p", &TagAttrs::default()).unwrap();
        e.handle_data("two").unwrap();
        e.finish().unwrap();
        assert_eq!(
            e.into_sink(),
            "[one][1]\n\n    [1]: http://x\n\ntwo\n"
        );
    }

    #[test]
    fn finish_flushes_references_at_document_end() {
        let mut e = emitter();
        e.handle_start_tag("a", &TagAttrs::from_pairs([("href", "http://x")]))
            .unwrap();
        e.handle_data("link").unwrap();
        e.handle_end_tag("a").unwrap();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "[link][1]\n\n    [1]: http://x\n\n");
    }

    #[test]
    fn empty_document_finishes_with_a_newline() {
        let mut e = emitter();
        e.finish().unwrap();
        assert_eq!(e.into_sink(), "\n");
    }
}
