use crate::dom::dom_tree::{ElementNode, Handle, Node};
use crate::error::SelectorError;
use std::collections::HashSet;
use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

/// ------------------------------
/// 1. Selector Parsing
/// ------------------------------

/// Supported attribute selector operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr="value"]
    Exact,
    /// [attr~="value"]
    Includes,
    /// [attr|="value"]
    DashMatch,
    /// [attr^="value"]
    Prefix,
    /// [attr$="value"]
    Suffix,
    /// [attr*="value"]
    Substring,
}

/// Represents one attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub operator: Option<AttributeOperator>, // None means only existence check
    pub value: Option<String>,
    pub case_insensitive: bool,
}

/// Pseudo-classes the matcher understands. Dynamic pseudo-classes, pseudo-elements
/// and unknown names are kept as `Unsupported` and never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    NthChild(Nth),
    NthLastChild(Nth),
    NthOfType(Nth),
    NthLastOfType(Nth),
    Empty,
    Root,
    /// `:not(...)`
    Not(SelectorList),
    /// `:is(...)` and `:where(...)`
    Is(SelectorList),
    Unsupported(String),
}

/// An `an+b` argument of the `:nth-*` pseudo-classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    pub a: i32,
    pub b: i32,
}

impl Nth {
    /// Parses `odd`, `even`, `3`, `n`, `-n+3`, `2n + 1` and the like.
    pub fn parse(text: &str) -> Option<Nth> {
        let text: String = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match text.as_str() {
            "odd" => return Some(Nth { a: 2, b: 1 }),
            "even" => return Some(Nth { a: 2, b: 0 }),
            _ => {}
        }
        let Some((a, b)) = text.split_once('n') else {
            return text.parse().ok().map(|b| Nth { a: 0, b });
        };
        let a: i32 = match a {
            "" | "+" => 1,
            "-" => -1,
            _ => a.parse().ok()?,
        };
        let b: i32 = match b {
            "" => 0,
            _ if b.starts_with(['+', '-']) => b.parse().ok()?,
            _ => return None,
        };
        Some(Nth { a, b })
    }

    /// True if some `n >= 0` gives `a*n + b == index` (1-based).
    pub fn matches(&self, index: usize) -> bool {
        let (a, b, index) = (i64::from(self.a), i64::from(self.b), index as i64);
        if a == 0 {
            return index == b;
        }
        let diff = index - b;
        diff % a == 0 && diff / a >= 0
    }
}

/// A compound selector: an optional tag, id, classes, attribute selectors and pseudo-classes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: HashSet<String>,
    pub attributes: Vec<AttributeSelector>,
    pub pseudo_classes: Vec<PseudoClass>,
}

/// A complex selector composed of a key compound selector and a list of ancestor parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub key: CompoundSelector,
    /// Ancestors with their combinators, in right-to-left order.
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Supported combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (a space).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

/// A comma-separated group of complex selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

impl SelectorList {
    /// True if any selector of the group matches the element.
    pub fn matches(&self, candidate: &Handle) -> bool {
        self.0
            .iter()
            .any(|complex| matches_complex_selector(candidate, complex))
    }
}

/// Parse a selector group such as `"h1, div.red > p#header + span.foo"`.
pub fn parse_selector_list(selector: &str) -> Result<SelectorList, SelectorError> {
    let mut selectors = Vec::new();
    for part in split_selector_list(selector) {
        let part = part.trim();
        if part.is_empty() {
            return Err(SelectorError::new(selector, "empty selector"));
        }
        selectors.push(parse_complex_selector(part, selector)?);
    }
    Ok(SelectorList(selectors))
}

/// Splits on top-level commas, ignoring those inside brackets, parentheses or quotes.
fn split_selector_list(selector: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (index, ch) in selector.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&selector[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&selector[start..]);
    parts
}

/// Parse one complex selector, e.g. `"div.red>p#header + span.foo"`.
/// `whole` is the full selector text, used for error messages.
pub fn parse_complex_selector(selector: &str, whole: &str) -> Result<ComplexSelector, SelectorError> {
    let mut chars = selector.trim().chars().peekable();
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();

    loop {
        compounds.push(parse_compound_selector(&mut chars, whole)?);
        let saw_whitespace = skip_whitespace(&mut chars);
        let combinator = match chars.peek() {
            None => break,
            Some('>') => Combinator::Child,
            Some('+') => Combinator::AdjacentSibling,
            Some('~') => Combinator::GeneralSibling,
            Some(_) if saw_whitespace => {
                combinators.push(Combinator::Descendant);
                continue;
            }
            Some(&ch) => {
                return Err(SelectorError::new(
                    whole,
                    format!("unexpected character `{}`", ch),
                ))
            }
        };
        chars.next();
        skip_whitespace(&mut chars);
        if chars.peek().is_none() {
            return Err(SelectorError::new(whole, "dangling combinator"));
        }
        combinators.push(combinator);
    }

    let key = compounds.pop().unwrap_or_default();
    let mut ancestors = Vec::with_capacity(compounds.len());
    while let (Some(compound), Some(combinator)) = (compounds.pop(), combinators.pop()) {
        ancestors.push((combinator, compound));
    }
    Ok(ComplexSelector { key, ancestors })
}

/// Parse a compound selector, e.g. `div.red#header[disabled][data-type~="main"]:first-child`.
pub fn parse_compound_selector(
    chars: &mut Peekable<Chars<'_>>,
    whole: &str,
) -> Result<CompoundSelector, SelectorError> {
    let mut compound = CompoundSelector::default();
    let mut empty = true;

    // A leading identifier or '*' is the type selector.
    if let Some(&ch) = chars.peek() {
        if ch == '*' {
            chars.next();
            empty = false;
        } else if is_ident_start(ch) {
            compound.tag = Some(read_ident(chars).to_ascii_lowercase());
            empty = false;
        }
    }

    loop {
        match chars.peek().copied() {
            Some('#') => {
                chars.next();
                compound.id = Some(read_required_ident(chars, whole, "#")?);
            }
            Some('.') => {
                chars.next();
                compound.classes.insert(read_required_ident(chars, whole, ".")?);
            }
            Some('[') => {
                chars.next();
                compound.attributes.push(parse_attribute_selector(chars, whole)?);
            }
            Some(':') => {
                chars.next();
                let pseudo_element = chars.next_if_eq(&':').is_some();
                let name = read_required_ident(chars, whole, ":")?;
                let arguments = if chars.next_if_eq(&'(').is_some() {
                    Some(read_pseudo_arguments(chars, whole)?)
                } else {
                    None
                };
                compound
                    .pseudo_classes
                    .push(parse_pseudo_class(&name, pseudo_element, arguments, whole)?);
            }
            _ => break,
        }
        empty = false;
    }

    if empty {
        return Err(match chars.peek() {
            Some(&ch) => SelectorError::new(whole, format!("unexpected character `{}`", ch)),
            None => SelectorError::new(whole, "expected a selector"),
        });
    }
    Ok(compound)
}

fn parse_pseudo_class(
    name: &str,
    pseudo_element: bool,
    arguments: Option<String>,
    whole: &str,
) -> Result<PseudoClass, SelectorError> {
    if pseudo_element {
        return Ok(PseudoClass::Unsupported(format!("::{}", name)));
    }
    let nth = |args: &str| {
        Nth::parse(args).ok_or_else(|| {
            SelectorError::new(whole, format!("invalid `:{}` argument `{}`", name, args))
        })
    };
    let list = |args: &str| {
        parse_selector_list(args).map_err(|e| SelectorError::new(whole, e.reason))
    };
    let pseudo = match (name.to_ascii_lowercase().as_str(), arguments) {
        ("first-child", None) => PseudoClass::FirstChild,
        ("last-child", None) => PseudoClass::LastChild,
        ("only-child", None) => PseudoClass::OnlyChild,
        ("first-of-type", None) => PseudoClass::FirstOfType,
        ("last-of-type", None) => PseudoClass::LastOfType,
        ("only-of-type", None) => PseudoClass::OnlyOfType,
        ("empty", None) => PseudoClass::Empty,
        ("root", None) => PseudoClass::Root,
        ("nth-child", Some(args)) => PseudoClass::NthChild(nth(&args)?),
        ("nth-last-child", Some(args)) => PseudoClass::NthLastChild(nth(&args)?),
        ("nth-of-type", Some(args)) => PseudoClass::NthOfType(nth(&args)?),
        ("nth-last-of-type", Some(args)) => PseudoClass::NthLastOfType(nth(&args)?),
        ("not", Some(args)) => PseudoClass::Not(list(&args)?),
        ("is" | "where", Some(args)) => PseudoClass::Is(list(&args)?),
        (_, Some(args)) => PseudoClass::Unsupported(format!(":{}({})", name, args)),
        (_, None) => PseudoClass::Unsupported(format!(":{}", name)),
    };
    Ok(pseudo)
}

/// Parse the inside of `[...]`; the opening bracket is already consumed.
fn parse_attribute_selector(
    chars: &mut Peekable<Chars<'_>>,
    whole: &str,
) -> Result<AttributeSelector, SelectorError> {
    skip_whitespace(chars);
    let name = read_ident(chars).to_ascii_lowercase();
    if name.is_empty() {
        return Err(SelectorError::new(whole, "expected an attribute name"));
    }
    skip_whitespace(chars);

    let operator = match chars.next() {
        Some(']') => {
            return Ok(AttributeSelector {
                name,
                operator: None,
                value: None,
                case_insensitive: false,
            })
        }
        Some('=') => AttributeOperator::Exact,
        Some(ch @ ('~' | '|' | '^' | '$' | '*')) => {
            if chars.next_if_eq(&'=').is_none() {
                return Err(SelectorError::new(
                    whole,
                    format!("expected `=` after `{}`", ch),
                ));
            }
            match ch {
                '~' => AttributeOperator::Includes,
                '|' => AttributeOperator::DashMatch,
                '^' => AttributeOperator::Prefix,
                '$' => AttributeOperator::Suffix,
                _ => AttributeOperator::Substring,
            }
        }
        Some(ch) => {
            return Err(SelectorError::new(
                whole,
                format!("unexpected character `{}` in attribute selector", ch),
            ))
        }
        None => return Err(SelectorError::new(whole, "unterminated attribute selector")),
    };

    skip_whitespace(chars);
    let value = match chars.peek().copied() {
        Some(q @ ('"' | '\'')) => {
            chars.next();
            read_quoted(chars, q)
                .ok_or_else(|| SelectorError::new(whole, "unterminated string"))?
        }
        _ => read_ident(chars),
    };
    skip_whitespace(chars);

    let mut case_insensitive = false;
    if let Some(flag) = chars.next_if(|c| matches!(c, 'i' | 'I' | 's' | 'S')) {
        case_insensitive = flag.eq_ignore_ascii_case(&'i');
        skip_whitespace(chars);
    }
    if chars.next() != Some(']') {
        return Err(SelectorError::new(whole, "unterminated attribute selector"));
    }

    Ok(AttributeSelector {
        name,
        operator: Some(operator),
        value: Some(value),
        case_insensitive,
    })
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '-' || ch == '\\' || !ch.is_ascii()
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-' || ch == '\\' || !ch.is_ascii()
}

/// Reads an identifier, resolving `\x` escapes to the escaped character.
fn read_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(ch) = chars.next_if(|c| is_ident_char(*c)) {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                ident.push(escaped);
            }
        } else {
            ident.push(ch);
        }
    }
    ident
}

fn read_required_ident(
    chars: &mut Peekable<Chars<'_>>,
    whole: &str,
    after: &str,
) -> Result<String, SelectorError> {
    let ident = read_ident(chars);
    if ident.is_empty() {
        return Err(SelectorError::new(
            whole,
            format!("expected a name after `{}`", after),
        ));
    }
    Ok(ident)
}

/// Reads up to the closing quote; `None` if the input ends first.
fn read_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> Option<String> {
    let mut value = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => value.push(chars.next()?),
            c if c == quote => return Some(value),
            c => value.push(c),
        }
    }
    None
}

/// Reads balanced pseudo-class arguments; the opening parenthesis is already consumed.
fn read_pseudo_arguments(
    chars: &mut Peekable<Chars<'_>>,
    whole: &str,
) -> Result<String, SelectorError> {
    let mut depth = 1usize;
    let mut arguments = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(arguments.trim().to_string());
                }
            }
            '"' | '\'' => {
                let quoted = read_quoted(chars, ch)
                    .ok_or_else(|| SelectorError::new(whole, "unterminated string"))?;
                arguments.push(ch);
                arguments.push_str(&quoted);
                arguments.push(ch);
                continue;
            }
            _ => {}
        }
        arguments.push(ch);
    }
    Err(SelectorError::new(whole, "unterminated `(`"))
}

/// Returns true if any whitespace was skipped.
fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) -> bool {
    let mut skipped = false;
    while chars.next_if(|c| c.is_whitespace()).is_some() {
        skipped = true;
    }
    skipped
}

/// ------------------------------
/// 2. Selector Matching
/// ------------------------------

/// Returns true if the element matches the CompoundSelector.
/// Checks tag, id, classes, attribute conditions and pseudo-classes.
pub fn matches_compound(candidate: &Handle, compound: &CompoundSelector) -> bool {
    let node = candidate.borrow();
    let Some(elem) = node.as_element() else {
        return false;
    };
    if let Some(ref tag) = compound.tag {
        if !elem.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(ref id_val) = compound.id {
        if elem.attribute("id") != Some(id_val.as_str()) {
            return false;
        }
    }
    if !compound.classes.is_empty() {
        let Some(class_attr) = elem.attribute("class") else {
            return false;
        };
        let elem_classes: HashSet<&str> = class_attr.split_whitespace().collect();
        if !compound
            .classes
            .iter()
            .all(|class| elem_classes.contains(class.as_str()))
        {
            return false;
        }
    }
    if !compound
        .attributes
        .iter()
        .all(|attr_sel| matches_attribute(elem, attr_sel))
    {
        return false;
    }
    compound
        .pseudo_classes
        .iter()
        .all(|pseudo| matches_pseudo_class(candidate, pseudo))
}

fn matches_attribute(elem: &ElementNode, attr_sel: &AttributeSelector) -> bool {
    let Some(actual_val) = elem.attribute(&attr_sel.name) else {
        return false;
    };
    let (Some(operator), Some(expected)) = (&attr_sel.operator, &attr_sel.value) else {
        // No operator means just existence; already confirmed.
        return true;
    };
    let (actual, expected) = if attr_sel.case_insensitive {
        (actual_val.to_lowercase(), expected.to_lowercase())
    } else {
        (actual_val.to_string(), expected.clone())
    };
    match operator {
        AttributeOperator::Exact => actual == expected,
        AttributeOperator::Includes => actual.split_whitespace().any(|word| word == expected),
        AttributeOperator::DashMatch => {
            actual == expected || actual.starts_with(&format!("{}-", expected))
        }
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

fn matches_pseudo_class(candidate: &Handle, pseudo: &PseudoClass) -> bool {
    let position = |same_type: bool| sibling_position(candidate, same_type);
    match pseudo {
        PseudoClass::FirstChild => position(false).is_some_and(|(index, _)| index == 1),
        PseudoClass::LastChild => position(false).is_some_and(|(index, count)| index == count),
        PseudoClass::OnlyChild => position(false).is_some_and(|(_, count)| count == 1),
        PseudoClass::FirstOfType => position(true).is_some_and(|(index, _)| index == 1),
        PseudoClass::LastOfType => position(true).is_some_and(|(index, count)| index == count),
        PseudoClass::OnlyOfType => position(true).is_some_and(|(_, count)| count == 1),
        PseudoClass::NthChild(nth) => position(false).is_some_and(|(index, _)| nth.matches(index)),
        PseudoClass::NthLastChild(nth) => {
            position(false).is_some_and(|(index, count)| nth.matches(count - index + 1))
        }
        PseudoClass::NthOfType(nth) => position(true).is_some_and(|(index, _)| nth.matches(index)),
        PseudoClass::NthLastOfType(nth) => {
            position(true).is_some_and(|(index, count)| nth.matches(count - index + 1))
        }
        // Comments do not count as content.
        PseudoClass::Empty => candidate.borrow().children().iter().all(|child| {
            match &*child.borrow() {
                Node::Comment(_) => true,
                Node::Text(text) => text.is_empty(),
                _ => false,
            }
        }),
        PseudoClass::Root => parent_node(candidate).is_some_and(|parent| !is_element(&parent)),
        PseudoClass::Not(list) => !list.matches(candidate),
        PseudoClass::Is(list) => list.matches(candidate),
        PseudoClass::Unsupported(_) => false,
    }
}

/// Matches a ComplexSelector against a candidate element.
/// The matching proceeds right-to-left, using parent pointers and the parent's
/// child list for siblings.
pub fn matches_complex_selector(candidate: &Handle, complex: &ComplexSelector) -> bool {
    matches_compound(candidate, &complex.key) && matches_ancestors(candidate, &complex.ancestors)
}

/// Tries every possible ancestor or sibling for each step, so a failed deeper
/// step can backtrack to another candidate.
fn matches_ancestors(current: &Handle, rest: &[(Combinator, CompoundSelector)]) -> bool {
    let Some(((combinator, compound), rest)) = rest.split_first() else {
        return true;
    };
    let step = |node: &Handle| matches_compound(node, compound) && matches_ancestors(node, rest);
    match combinator {
        Combinator::Child => parent_element(current).is_some_and(|parent| step(&parent)),
        Combinator::Descendant => {
            let mut ancestor = parent_element(current);
            while let Some(node) = ancestor {
                if step(&node) {
                    return true;
                }
                ancestor = parent_element(&node);
            }
            false
        }
        Combinator::AdjacentSibling => previous_element_siblings(current)
            .first()
            .is_some_and(|sibling| step(sibling)),
        Combinator::GeneralSibling => previous_element_siblings(current).iter().any(step),
    }
}

/// Helper: the parent node of an element (element or document root).
fn parent_node(node: &Handle) -> Option<Handle> {
    node.borrow().as_element()?.parent()
}

fn is_element(node: &Handle) -> bool {
    node.borrow().is_element()
}

/// Helper: the parent of a node, only if it is an element.
fn parent_element(node: &Handle) -> Option<Handle> {
    parent_node(node).filter(is_element)
}

/// Helper: element siblings before `node`, nearest first.
fn previous_element_siblings(node: &Handle) -> Vec<Handle> {
    let Some(parent) = parent_node(node) else {
        return Vec::new();
    };
    let parent_ref = parent.borrow();
    let siblings = parent_ref.children();
    let position = siblings
        .iter()
        .position(|child| Rc::ptr_eq(child, node))
        .unwrap_or(0);
    siblings[..position]
        .iter()
        .rev()
        .filter(|sibling| is_element(sibling))
        .cloned()
        .collect()
}

/// Helper: 1-based position of `node` among its element siblings, and their
/// count. With `same_type` only siblings with the same tag are counted.
fn sibling_position(node: &Handle, same_type: bool) -> Option<(usize, usize)> {
    let parent = parent_node(node)?;
    let tag = node.borrow().as_element()?.tag.clone();
    let parent_ref = parent.borrow();
    let mut position = None;
    let mut count = 0;
    for sibling in parent_ref.children() {
        let counted = match sibling.borrow().as_element() {
            Some(elem) => !same_type || elem.tag.eq_ignore_ascii_case(&tag),
            None => false,
        };
        if !counted {
            continue;
        }
        count += 1;
        if Rc::ptr_eq(sibling, node) {
            position = Some(count);
        }
    }
    position.map(|index| (index, count))
}
