//! Conversion pipeline: tokenizer events in, plain text out.
//!
//! The html5ever tokenizer is the event source. A [`TokenSink`] adapter
//! forwards each token to the [`TextEmitter`] state machine, which owns all
//! conversion state and writes to the output sink. No tree is ever built;
//! the document is processed in a single streaming pass.

pub mod emitter;

use std::cell::RefCell;

use html5ever::buffer_queue::BufferQueue;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::Attribute;

use crate::entities;
use crate::error::Result;
use crate::options::ConversionOptions;
use crate::sink::{TextSink, WriteSink};
use emitter::{TagAttrs, TextEmitter};

/// Convert an HTML document to Markdown-structured plain text.
///
/// Malformed markup is tolerated: unknown tags are skipped, unbalanced end
/// tags are ignored, and truncated documents still flush whatever output
/// was produced so far.
///
/// # Errors
///
/// Only output-sink write failures surface as errors, and the in-memory
/// sink used here cannot fail; malformed input never errors.
///
/// # Examples
///
/// ```
/// use html_to_text::{convert, ConversionOptions};
///
/// let text = convert("<h1>Title</h1><p>Content</p>", &ConversionOptions::default()).unwrap();
/// assert_eq!(text, "# Title\n\nContent\n");
/// ```
pub fn convert(html: &str, options: &ConversionOptions) -> Result<String> {
    let emitter = TextEmitter::new(options.clone(), String::new());
    let emitter = drive(html, options, emitter)?;
    Ok(emitter.into_sink())
}

/// Convert an HTML document, streaming the output into `writer`.
///
/// # Errors
///
/// Returns an error when writing to `writer` fails.
pub fn convert_to_writer<W: std::io::Write>(
    html: &str,
    options: &ConversionOptions,
    writer: W,
) -> Result<()> {
    let emitter = TextEmitter::new(options.clone(), WriteSink::new(writer));
    let emitter = drive(html, options, emitter)?;
    emitter.into_sink().flush()
}

/// Tokenize `html` and run every event through the emitter.
fn drive<S: TextSink>(
    html: &str,
    options: &ConversionOptions,
    emitter: TextEmitter<S>,
) -> Result<TextEmitter<S>> {
    let sink = EmitterSink {
        emitter: RefCell::new(emitter),
        unify: !options.unicode,
        failure: RefCell::new(None),
    };
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));
    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();
    let sink = tokenizer.sink;
    if let Some(error) = sink.failure.into_inner() {
        return Err(error);
    }
    let mut emitter = sink.emitter.into_inner();
    emitter.finish()?;
    Ok(emitter)
}

/// Adapter between the html5ever tokenizer and the emission state machine.
///
/// The tokenizer resolves character references itself, so typographic
/// substitution is applied here, over decoded character data and attribute
/// values, unless Unicode output was requested. Sink errors are stashed and
/// re-raised once tokenization completes; the tokenizer itself has no error
/// channel.
struct EmitterSink<S: TextSink> {
    emitter: RefCell<TextEmitter<S>>,
    unify: bool,
    failure: RefCell<Option<crate::error::ConversionError>>,
}

impl<S: TextSink> EmitterSink<S> {
    fn dispatch(&self, token: Token, raw: &mut Option<RawKind>) -> Result<()> {
        match token {
            Token::TagToken(tag) => {
                let name: &str = tag.name.as_ref();
                let mut emitter = self.emitter.borrow_mut();
                match tag.kind {
                    TagKind::StartTag => {
                        let attrs = self.extract_attrs(&tag.attrs);
                        emitter.handle_start_tag(name, &attrs)?;
                        if tag.self_closing {
                            // A self-closed element never sees its end tag;
                            // synthesize one so depth counters stay balanced.
                            emitter.handle_end_tag(name)?;
                        } else {
                            *raw = raw_text_kind(name);
                        }
                    }
                    TagKind::EndTag => emitter.handle_end_tag(name)?,
                }
                Ok(())
            }
            Token::CharacterTokens(text) => {
                let mut emitter = self.emitter.borrow_mut();
                if self.unify {
                    emitter.handle_data(entities::unify_text(&text).as_ref())
                } else {
                    emitter.handle_data(&text)
                }
            }
            Token::ParseError(error) => {
                log::debug!("tokenizer recovered from malformed markup: {error}");
                Ok(())
            }
            Token::NullCharacterToken
            | Token::CommentToken(_)
            | Token::DoctypeToken(_)
            | Token::EOFToken => Ok(()),
        }
    }

    fn extract_attrs(&self, attrs: &[Attribute]) -> TagAttrs {
        let mut extracted = TagAttrs::default();
        for attr in attrs {
            let slot = match attr.name.local.as_ref() {
                "href" => &mut extracted.href,
                "src" => &mut extracted.src,
                "alt" => &mut extracted.alt,
                "title" => &mut extracted.title,
                _ => continue,
            };
            *slot = Some(if self.unify {
                entities::unify_text(&attr.value).into_owned()
            } else {
                attr.value.to_string()
            });
        }
        extracted
    }
}

impl<S: TextSink> TokenSink for EmitterSink<S> {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        if self.failure.borrow().is_some() {
            return TokenSinkResult::Continue;
        }
        let mut raw = None;
        if let Err(error) = self.dispatch(token, &mut raw) {
            *self.failure.borrow_mut() = Some(error);
        }
        match raw {
            Some(kind) => TokenSinkResult::RawData(kind),
            None => TokenSinkResult::Continue,
        }
    }
}

/// Raw-text tokenizer state for elements whose content is not markup.
fn raw_text_kind(name: &str) -> Option<RawKind> {
    match name {
        "script" => Some(RawKind::ScriptData),
        "style" => Some(RawKind::Rawtext),
        _ => None,
    }
}
