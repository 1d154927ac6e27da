use indexmap::map::{IntoIter, Iter};
use indexmap::IndexMap;
use std::fmt;

/// Property → value pairs of one selector, in first-seen order.
///
/// Setting a property that is already present replaces its value but keeps
/// its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declaration {
    properties: IndexMap<String, String>,
}

impl Declaration {
    pub fn new() -> Self {
        Declaration::default()
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(property.into(), value.into());
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }

    /// Copies every property of `other` over this one.
    pub fn merge(&mut self, other: Declaration) {
        self.properties.extend(other.properties);
    }

    pub fn iter(&self) -> Iter<'_, String, String> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Declaration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut declaration = Declaration::new();
        for (property, value) in iter {
            declaration.set(property, value);
        }
        declaration
    }
}

impl<'a> IntoIterator for &'a Declaration {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Serializes as an inline style: `prop: value; prop: value;`
impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (property, value)) in self.properties.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}: {};", property, value)?;
        }
        Ok(())
    }
}

/// Selector text → Declaration, ordered by first appearance of the selector.
///
/// A selector never appears twice: merging into an existing selector
/// overwrites its properties one by one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: IndexMap<String, Declaration>,
}

impl RuleSet {
    pub fn new() -> Self {
        RuleSet::default()
    }

    /// Adds the declarations of one rule body. Empty declarations never
    /// create an entry.
    pub fn merge(&mut self, selector: impl Into<String>, declaration: Declaration) {
        if declaration.is_empty() {
            return;
        }
        self.rules
            .entry(selector.into())
            .or_default()
            .merge(declaration);
    }

    pub fn get(&self, selector: &str) -> Option<&Declaration> {
        self.rules.get(selector)
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_, String, Declaration> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Declaration)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (S, Declaration)>>(iter: I) -> Self {
        let mut rule_set = RuleSet::new();
        for (selector, declaration) in iter {
            rule_set.merge(selector, declaration);
        }
        rule_set
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = (&'a String, &'a Declaration);
    type IntoIter = Iter<'a, String, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for RuleSet {
    type Item = (String, Declaration);
    type IntoIter = IntoIter<String, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}

/// Renders the rules back as a stylesheet, one rule per line.
impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (selector, declaration) in &self.rules {
            writeln!(f, "{} {{ {} }}", selector, declaration)?;
        }
        Ok(())
    }
}
