use crate::dom::dom_tree::{Document, ElementNode};
use crate::error::InlineError;
use crate::parser::dom_query::query_selector_all;
use crate::style::css_parser::parse_declarations;
use crate::style::rule_set::{Declaration, RuleSet};
use log::{debug, trace};

/// Accessor names whose CSS property name is not a plain hyphenation.
const PROPERTY_ALIASES: &[(&str, &str)] = &[("cssFloat", "float"), ("styleFloat", "float")];

/// Capitalized accessor prefixes that stand for a vendor prefix (`-webkit-`, ...).
const VENDOR_PREFIXES: &[&str] = &["Webkit", "Moz", "Khtml", "Ms", "O"];

/// Translates a style accessor name to the CSS property name it stands for.
///
/// This is the only place where the two naming conventions meet:
/// `backgroundColor` becomes `background-color`, `WebkitTransform` and
/// `msTransform` gain their leading dash, names that already are CSS names
/// are ASCII-lowercased, and custom properties (`--brand`) are returned untouched.
pub fn css_property_name(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    if let Some((_, css)) = PROPERTY_ALIASES.iter().find(|(alias, _)| *alias == name) {
        return (*css).to_string();
    }
    let camel_case = !name.contains('-')
        && name.chars().any(|c| c.is_ascii_uppercase())
        && name.chars().any(|c| c.is_ascii_lowercase());
    if !camel_case {
        return name.to_ascii_lowercase();
    }

    let vendor = VENDOR_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()))
    });
    let microsoft = name
        .strip_prefix("ms")
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()));
    if name.starts_with(|c: char| c.is_ascii_uppercase()) && !vendor {
        return name.to_ascii_lowercase();
    }

    let mut css = String::with_capacity(name.len() + 4);
    if microsoft {
        css.push('-');
    }
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            css.push('-');
            css.push(ch.to_ascii_lowercase());
        } else {
            css.push(ch);
        }
    }
    css
}

/// The inline `style` attribute of one element, as an ordered property map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declaration: Declaration,
}

impl InlineStyle {
    /// Reads the element's current `style` attribute.
    pub fn from_element(element: &ElementNode) -> Self {
        let mut style = InlineStyle::default();
        if let Some(text) = element.attribute("style") {
            for (property, value) in &parse_declarations(text) {
                style.set_property(property, value);
            }
        }
        style
    }

    pub fn get_property(&self, name: &str) -> Option<&str> {
        self.declaration.get(&css_property_name(name))
    }

    /// Sets `name` to `value`, replacing an earlier value in place.
    pub fn set_property(&mut self, name: &str, value: &str) {
        self.declaration.set(css_property_name(name), value);
    }

    pub fn is_empty(&self) -> bool {
        self.declaration.is_empty()
    }

    /// Writes the style back as `prop: value; prop: value;`.
    pub fn write_to(&self, element: &mut ElementNode) {
        element.set_attribute("style", self.declaration.to_string());
    }
}

/// Writes every rule of `rules` onto the inline style of the elements its
/// selector matches.
///
/// Rules are applied in `RuleSet` order, so when two selectors set the same
/// property on one element the later one wins, whatever their specificity.
/// Properties already present inline survive unless a matching rule sets
/// them. Elements that no rule matches are left untouched.
///
/// A selector the query engine cannot parse aborts the injection with
/// [`InlineError::Selector`]; rules applied before it stay applied.
pub fn inject_inline_styles(rules: &RuleSet, document: &mut Document) -> Result<(), InlineError> {
    for (selector, declaration) in rules {
        let matched = query_selector_all(document, selector)?;
        if matched.is_empty() {
            trace!("No element matches `{}`", selector);
            continue;
        }
        debug!(
            "Applying {} propert(ies) of `{}` to {} element(s)",
            declaration.len(),
            selector,
            matched.len()
        );

        for handle in &matched {
            let mut node = handle.borrow_mut();
            let Some(element) = node.as_element_mut() else {
                continue;
            };
            let mut style = InlineStyle::from_element(element);
            for (property, value) in declaration {
                style.set_property(property, value);
            }
            style.write_to(element);
        }
    }
    Ok(())
}
