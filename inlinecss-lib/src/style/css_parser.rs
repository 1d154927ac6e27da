//! Extraction of top-level style rules from stylesheet text.
//!
//! The tokenizer is a small state machine over three states: top level,
//! inside an at-rule block, and inside a declaration block. At-rule blocks
//! are skipped wholesale by brace depth, so nothing nested in `@media`,
//! `@supports`, `@font-face`, ... ever reaches the [`RuleSet`].

use crate::dom::dom_tree::{Document, Handle};
use crate::style::rule_set::{Declaration, RuleSet};
use log::{debug, trace};
use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

/// Anything that can hand over raw CSS text, e.g. a `<style>` element.
pub trait StylesheetSource {
    fn css_text(&self) -> Cow<'_, str>;
}

impl StylesheetSource for str {
    fn css_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl StylesheetSource for String {
    fn css_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl<T: StylesheetSource + ?Sized> StylesheetSource for &T {
    fn css_text(&self) -> Cow<'_, str> {
        (**self).css_text()
    }
}

/// A `<style>` element of a parsed document.
#[derive(Debug, Clone)]
pub struct StyleElement(pub Handle);

impl StylesheetSource for StyleElement {
    fn css_text(&self) -> Cow<'_, str> {
        let text = self
            .0
            .borrow()
            .as_element()
            .map(|elem| elem.text_content())
            .unwrap_or_default();
        Cow::Owned(text)
    }
}

impl Document {
    /// The stylesheet sources embedded in the document, in document order.
    pub fn style_sheets(&self) -> Vec<StyleElement> {
        self.style_elements().into_iter().map(StyleElement).collect()
    }
}

/// One top-level rule as written: trimmed selector text and the raw
/// interior of its declaration block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRule {
    pub selector: String,
    pub block: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    TopLevel,
    /// Inside an `@...{` block; `depth` counts open braces.
    AtRule { depth: usize },
    /// Inside `selector {`; `nested` counts braces of nested blocks being skipped.
    Declarations { nested: usize },
}

/// Parses every source, in order, into one [`RuleSet`].
///
/// Later declarations of the same property for the same selector overwrite
/// earlier ones, across sources too.
pub fn parse_css<I>(sources: I) -> RuleSet
where
    I: IntoIterator,
    I::Item: StylesheetSource,
{
    let mut rule_set = RuleSet::new();
    let mut source_count = 0;
    for source in sources {
        source_count += 1;
        for rule in top_level_rules(&source.css_text()) {
            if rule.selector.is_empty() {
                trace!("Skipping rule block without selector");
                continue;
            }
            rule_set.merge(rule.selector, parse_declarations(&rule.block));
        }
    }
    debug!(
        "Parsed {} selector(s) from {} stylesheet source(s)",
        rule_set.len(),
        source_count
    );
    rule_set
}

/// Splits CSS text into its top-level rules, dropping at-rules and comments.
pub fn top_level_rules(css: &str) -> Vec<RawRule> {
    let mut rules = Vec::new();
    let mut state = State::TopLevel;
    let mut buffer = String::new();
    let mut selector = String::new();
    let mut chars = css.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '/' && chars.next_if_eq(&'*').is_some() {
            skip_comment(&mut chars);
            continue;
        }
        // `<!--` and `-->` around a legacy stylesheet are dropped at top level.
        if state == State::TopLevel
            && ((ch == '<' && skip_token(&mut chars, "!--"))
                || (ch == '-' && skip_token(&mut chars, "->")))
        {
            continue;
        }
        if ch == '"' || ch == '\'' {
            match state {
                State::TopLevel | State::Declarations { nested: 0 } => {
                    copy_string(&mut chars, ch, Some(&mut buffer))
                }
                _ => copy_string(&mut chars, ch, None),
            }
            continue;
        }

        state = match (state, ch) {
            (State::TopLevel, '{') => {
                let prelude = std::mem::take(&mut buffer);
                let prelude = prelude.trim();
                if prelude.starts_with('@') {
                    trace!("Skipping at-rule block `{}`", prelude);
                    State::AtRule { depth: 1 }
                } else {
                    selector = prelude.to_string();
                    State::Declarations { nested: 0 }
                }
            }
            // End of a block-less at-rule such as `@import` or `@charset`,
            // or stray text: either way nothing to keep.
            (State::TopLevel, ';' | '}') => {
                buffer.clear();
                State::TopLevel
            }
            (State::TopLevel, c) => {
                buffer.push(c);
                State::TopLevel
            }

            (State::AtRule { depth }, '{') => State::AtRule { depth: depth + 1 },
            (State::AtRule { depth: 1 }, '}') => State::TopLevel,
            (State::AtRule { depth }, '}') => State::AtRule { depth: depth - 1 },
            (State::AtRule { .. }, _) => state,

            (State::Declarations { nested: 0 }, '}') => {
                rules.push(RawRule {
                    selector: std::mem::take(&mut selector),
                    block: std::mem::take(&mut buffer),
                });
                State::TopLevel
            }
            (State::Declarations { nested: 0 }, '{') => {
                // A nested rule: drop its selector text and skip its block.
                let end = last_declaration_end(&buffer);
                buffer.truncate(end);
                State::Declarations { nested: 1 }
            }
            (State::Declarations { nested: 0 }, c) => {
                buffer.push(c);
                state
            }
            (State::Declarations { nested }, '{') => State::Declarations { nested: nested + 1 },
            (State::Declarations { nested }, '}') => State::Declarations { nested: nested - 1 },
            (State::Declarations { .. }, _) => state,
        };
    }

    // An unterminated final block is closed by the end of the input.
    if let State::Declarations { .. } = state {
        rules.push(RawRule { selector, block: buffer });
    }
    rules
}

/// Parses `prop: value; prop: value` into a [`Declaration`].
///
/// Segments are split on `;` outside strings and parentheses, then on their
/// first `:`. Segments without a colon, or with an empty property or value,
/// are dropped. Later duplicates overwrite earlier ones.
pub fn parse_declarations(block: &str) -> Declaration {
    let mut declaration = Declaration::new();
    for segment in split_declarations(block) {
        let Some((property, value)) = segment.split_once(':') else {
            if !segment.trim().is_empty() {
                trace!("Dropping malformed declaration `{}`", segment.trim());
            }
            continue;
        };
        let (property, value) = (property.trim(), value.trim());
        if property.is_empty() || value.is_empty() {
            continue;
        }
        declaration.set(property, value);
    }
    declaration
}

/// Splits a declaration block on top-level `;`, removing comments.
fn split_declarations(block: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut parens = 0usize;
    let mut chars = block.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '/' if chars.next_if_eq(&'*').is_some() => skip_comment(&mut chars),
            '"' | '\'' => copy_string(&mut chars, ch, Some(&mut current)),
            '(' => {
                parens += 1;
                current.push(ch);
            }
            ')' => {
                parens = parens.saturating_sub(1);
                current.push(ch);
            }
            ';' if parens == 0 => segments.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    segments.push(current);
    segments
}

/// Byte offset just past the last complete declaration in `buffer`.
fn last_declaration_end(buffer: &str) -> usize {
    let mut end = 0;
    let mut parens = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (index, ch) in buffer.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => parens += 1,
            (None, ')') => parens = parens.saturating_sub(1),
            (None, ';') if parens == 0 => end = index + 1,
            _ => {}
        }
    }
    end
}

/// Consumes `rest` if the input continues with it.
fn skip_token(chars: &mut Peekable<Chars<'_>>, rest: &str) -> bool {
    let mut lookahead = chars.clone();
    if rest.chars().all(|expected| lookahead.next() == Some(expected)) {
        *chars = lookahead;
        true
    } else {
        false
    }
}

/// Consumes a comment body up to and including `*/`.
fn skip_comment(chars: &mut Peekable<Chars<'_>>) {
    while let Some(ch) = chars.next() {
        if ch == '*' && chars.next_if_eq(&'/').is_some() {
            return;
        }
    }
}

/// Consumes a quoted string whose opening `quote` was already read, copying it
/// (quotes and escapes included) into `out` when given. A newline ends an
/// unterminated string.
fn copy_string(chars: &mut Peekable<Chars<'_>>, quote: char, mut out: Option<&mut String>) {
    let mut push = |c: char| {
        if let Some(out) = out.as_deref_mut() {
            out.push(c);
        }
    };
    push(quote);
    while let Some(ch) = chars.next() {
        push(ch);
        match ch {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push(escaped);
                }
            }
            '\n' => return,
            c if c == quote => return,
            _ => {}
        }
    }
}
