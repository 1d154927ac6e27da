//! This module parses HTML into the custom DOM tree.
//!
//! It uses html5ever as the HTML parser and builds the tree defined in the
//! `crate::dom::dom_tree` module.

use crate::dom::dom_tree::{self, Handle, Node};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink},
    namespace_url, ns, Attribute, LocalName, Namespace, QualName,
};
use log::debug;
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

/// Creates a DOM tree from the provided HTML content.
///
/// Missing `<html>`, `<head>` and `<body>` elements are synthesized the way a
/// browser would.
pub fn create_dom_tree(html_content: &str) -> dom_tree::Document {
    let tree_sink = InlineTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content)
}

/// A TreeSink that builds the `dom_tree` representation.
///
/// It only holds the Document being built; open-element tracking is left to
/// the html5ever tree builder.
pub struct InlineTreeSink {
    document: dom_tree::Document,
}

impl InlineTreeSink {
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
        }
    }
}

impl Default for InlineTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned element name handed back to the tree builder.
#[derive(Debug)]
pub struct SinkElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for SinkElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

/// Sets the parent pointer of `child` when it is an element.
fn adopt(child: &Handle, parent: &Handle) {
    if let Some(elem) = child.borrow_mut().as_element_mut() {
        elem.parent = Some(Rc::downgrade(parent));
    }
}

/// Inserts `child` into `children` at `index`, merging text into an adjacent
/// text node instead of creating a new one.
fn insert_child(parent: &Handle, index: usize, child: NodeOrText<Handle>) {
    let mut parent_ref = parent.borrow_mut();
    let Some(children) = parent_ref.children_mut() else {
        return;
    };
    match child {
        NodeOrText::AppendText(text) => {
            if index > 0 {
                if let Node::Text(existing) = &mut *children[index - 1].borrow_mut() {
                    existing.push_str(&text);
                    return;
                }
            }
            children.insert(index, Rc::new(RefCell::new(Node::Text(text.to_string()))));
        }
        NodeOrText::AppendNode(node) => {
            adopt(&node, parent);
            children.insert(index, node);
        }
    }
}

/// Finds the parent of `target` and the index of `target` within it.
fn position_in_parent(target: &Handle) -> Option<(Handle, usize)> {
    let parent = target.borrow().as_element()?.parent()?;
    let index = parent
        .borrow()
        .children()
        .iter()
        .position(|child| Rc::ptr_eq(child, target))?;
    Some((parent, index))
}

impl TreeSink for InlineTreeSink {
    type Handle = Handle;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = SinkElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document
    }

    /// html5ever reports recoverable errors; they never stop the parse.
    fn parse_error(&self, msg: Cow<'static, str>) {
        debug!("HTML parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match target.borrow().as_element() {
            Some(elem) => SinkElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            // The tree builder only asks for names of elements it created.
            None => SinkElemName {
                ns: ns!(),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        flags: ElementFlags,
    ) -> Self::Handle {
        let mut element = dom_tree::ElementNode::new(name.local.to_string(), name);
        element.attributes = attrs
            .into_iter()
            .map(|attr| (attr.name, attr.value.to_string()))
            .collect();
        if flags.template {
            element.template_contents = Some(Rc::new(RefCell::new(Node::DocumentRoot(
                dom_tree::DocumentRootNode::new(),
            ))));
        }
        Rc::new(RefCell::new(Node::Element(element)))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::Comment(text.to_string())))
    }

    /// Processing instructions only occur in XML; keep their text as a comment.
    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::Comment(format!("?{} {}", target, data))))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let len = parent.borrow().children().len();
        insert_child(parent, len, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if position_in_parent(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        *self.document.doctype.borrow_mut() = Some(dom_tree::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    /// Template contents live in their own fragment, outside the element's children.
    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target
            .borrow()
            .as_element()
            .and_then(|elem| elem.template_contents.clone())
            .unwrap_or_else(|| target.clone())
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    /// Selector matching is always case-sensitive, so the mode is only logged.
    fn set_quirks_mode(&self, mode: QuirksMode) {
        debug!("Quirks mode: {:?}", mode);
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        if let Some((parent, index)) = position_in_parent(sibling) {
            insert_child(&parent, index, child);
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut target_node = target.borrow_mut();
        if let Some(elem) = target_node.as_element_mut() {
            for attr in attrs {
                if !elem.attributes.iter().any(|(name, _)| *name == attr.name) {
                    elem.attributes.push((attr.name, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        if let Some((parent, index)) = position_in_parent(target) {
            if let Some(children) = parent.borrow_mut().children_mut() {
                children.remove(index);
            }
            if let Some(elem) = target.borrow_mut().as_element_mut() {
                elem.parent = None;
            }
        }
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let moved = match node.borrow_mut().children_mut() {
            Some(children) => std::mem::take(children),
            None => return,
        };
        for child in &moved {
            adopt(child, new_parent);
        }
        if let Some(children) = new_parent.borrow_mut().children_mut() {
            children.extend(moved);
        }
    }
}
