//! Serialization of the DOM tree back to HTML text through html5ever's
//! `HtmlSerializer`, which takes care of escaping and void elements.

use crate::dom::dom_tree::{Document, ElementNode, Handle, Node};
use crate::error::InlineError;
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use std::io;

/// Adapter that lets html5ever walk a `dom_tree` handle.
pub struct SerializableHandle(pub Handle);

impl Serialize for SerializableHandle {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let node = self.0.borrow();
        match (&traversal_scope, &*node) {
            (TraversalScope::IncludeNode, Node::Element(elem)) => {
                serializer.start_elem(
                    elem.qual_name.clone(),
                    elem.attributes
                        .iter()
                        .map(|(name, value)| (name, value.as_str())),
                )?;
                serialize_element_children(elem, serializer)?;
                serializer.end_elem(elem.qual_name.clone())
            }
            (TraversalScope::IncludeNode, Node::Text(text)) => serializer.write_text(text),
            (TraversalScope::IncludeNode, Node::Comment(text)) => serializer.write_comment(text),
            (_, Node::DocumentRoot(root)) => {
                for child in &root.children {
                    SerializableHandle(child.clone())
                        .serialize(serializer, TraversalScope::IncludeNode)?;
                }
                Ok(())
            }
            (TraversalScope::ChildrenOnly(_), Node::Element(elem)) => {
                serialize_element_children(elem, serializer)
            }
            (TraversalScope::ChildrenOnly(_), _) => Ok(()),
        }
    }
}

/// Children of an element, or for a `<template>` the children of its contents.
fn serialize_element_children<S: Serializer>(elem: &ElementNode, serializer: &mut S) -> io::Result<()> {
    let contents = elem.template_contents.as_ref().map(|contents| contents.borrow());
    let children = match &contents {
        Some(fragment) => fragment.children(),
        None => elem.children.as_slice(),
    };
    for child in children {
        SerializableHandle(child.clone()).serialize(serializer, TraversalScope::IncludeNode)?;
    }
    Ok(())
}

fn serialize_with_scope(handle: &Handle, scope: TraversalScope) -> Result<String, InlineError> {
    let mut buffer = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: scope,
        ..Default::default()
    };
    serialize(&mut buffer, &SerializableHandle(handle.clone()), opts)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Serializes `handle` including its own tag.
pub fn outer_html(handle: &Handle) -> Result<String, InlineError> {
    serialize_with_scope(handle, TraversalScope::IncludeNode)
}

/// Serializes only the children of `handle`.
pub fn inner_html(handle: &Handle) -> Result<String, InlineError> {
    serialize_with_scope(handle, TraversalScope::ChildrenOnly(None))
}

impl Document {
    /// The outer HTML of the document element. The doctype is not emitted.
    pub fn to_html(&self) -> Result<String, InlineError> {
        match self.document_element() {
            Some(html) => outer_html(&html),
            None => inner_html(&self.root),
        }
    }
}
