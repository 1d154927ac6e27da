use html5ever::{namespace_url, ns, LocalName, QualName};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub mod dom_tree {
    use super::*;

    /// Shared, mutable handle to a node of the tree.
    pub type Handle = Rc<RefCell<Node>>;

    #[derive(Debug, Clone)]
    pub enum Node {
        DocumentRoot(DocumentRootNode),
        Element(ElementNode),
        Text(String),
        Comment(String),
    }

    #[derive(Debug, Clone)]
    pub struct DocumentRootNode {
        pub children: Vec<Handle>,
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        /// Attributes in source order.
        pub attributes: Vec<(QualName, String)>,
        pub children: Vec<Handle>,
        pub parent: Option<Weak<RefCell<Node>>>,
        /// Inert contents of a `<template>`, kept out of `children`.
        pub template_contents: Option<Handle>,
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: Handle,
        pub doctype: RefCell<Option<Doctype>>,
    }

    #[derive(Debug)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    impl DocumentRootNode {
        pub fn new() -> Self {
            DocumentRootNode {
                children: Vec::new(),
            }
        }
    }

    impl Default for DocumentRootNode {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Node {
        /// Children of a container node; text and comments have none.
        pub fn children(&self) -> &[Handle] {
            match self {
                Node::DocumentRoot(root) => &root.children,
                Node::Element(elem) => &elem.children,
                Node::Text(_) | Node::Comment(_) => &[],
            }
        }

        pub fn children_mut(&mut self) -> Option<&mut Vec<Handle>> {
            match self {
                Node::DocumentRoot(root) => Some(&mut root.children),
                Node::Element(elem) => Some(&mut elem.children),
                Node::Text(_) | Node::Comment(_) => None,
            }
        }

        pub fn as_element(&self) -> Option<&ElementNode> {
            match self {
                Node::Element(elem) => Some(elem),
                _ => None,
            }
        }

        pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
            match self {
                Node::Element(elem) => Some(elem),
                _ => None,
            }
        }

        pub fn is_element(&self) -> bool {
            matches!(self, Node::Element(_))
        }
    }

    impl ElementNode {
        pub fn new(tag: String, qual_name: QualName) -> Self {
            ElementNode {
                tag,
                qual_name,
                attributes: Vec::new(),
                children: Vec::new(),
                parent: None,
                template_contents: None,
            }
        }

        /// Looks up an attribute by its local name (ASCII case-insensitive).
        pub fn attribute(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|(qual, _)| (*qual.local).eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        }

        /// Replaces the value of an existing attribute, or appends a new one.
        pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
            let value = value.into();
            match self
                .attributes
                .iter_mut()
                .find(|(qual, _)| (*qual.local).eq_ignore_ascii_case(name))
            {
                Some((_, existing)) => *existing = value,
                None => self.attributes.push((
                    QualName::new(None, ns!(), LocalName::from(name)),
                    value,
                )),
            }
        }

        /// Concatenated text of all descendant text nodes.
        pub fn text_content(&self) -> String {
            let mut text = String::new();
            collect_text(&self.children, &mut text);
            text
        }

        pub fn parent(&self) -> Option<Handle> {
            self.parent.as_ref().and_then(Weak::upgrade)
        }
    }

    fn collect_text(children: &[Handle], out: &mut String) {
        for child in children {
            match &*child.borrow() {
                Node::Text(text) => out.push_str(text),
                Node::Element(elem) => collect_text(&elem.children, out),
                Node::DocumentRoot(_) | Node::Comment(_) => {}
            }
        }
    }

    impl Document {
        /// The first element child of the document root (normally `<html>`).
        pub fn document_element(&self) -> Option<Handle> {
            self.root
                .borrow()
                .children()
                .iter()
                .find(|child| child.borrow().is_element())
                .cloned()
        }

        /// The `<body>` child of the document element, if any.
        pub fn body(&self) -> Option<Handle> {
            let html = self.document_element()?;
            let html_ref = html.borrow();
            let body = html_ref
                .children()
                .iter()
                .find(|child| {
                    child
                        .borrow()
                        .as_element()
                        .is_some_and(|elem| elem.tag.eq_ignore_ascii_case("body"))
                })
                .cloned();
            body
        }

        /// Every element in document order.
        pub fn elements(&self) -> Vec<Handle> {
            let mut out = Vec::new();
            collect_elements(&self.root, &mut out);
            out
        }
    }

    fn collect_elements(node: &Handle, out: &mut Vec<Handle>) {
        let node_ref = node.borrow();
        if node_ref.is_element() {
            out.push(Rc::clone(node));
        }
        for child in node_ref.children() {
            collect_elements(child, out);
        }
    }

    pub fn new_document() -> Document {
        Document {
            root: Rc::new(RefCell::new(Node::DocumentRoot(DocumentRootNode::new()))),
            doctype: RefCell::new(None),
        }
    }

    /// Wraps an element into a detached handle.
    pub fn new_element_handle(tag: &str) -> Handle {
        let qual_name = QualName::new(None, ns!(html), LocalName::from(tag));
        Rc::new(RefCell::new(Node::Element(ElementNode::new(
            tag.to_string(),
            qual_name,
        ))))
    }

    /// Appends `child` to `parent`, fixing up the child's parent pointer.
    pub fn append_child(parent: &Handle, child: Handle) {
        if let Some(elem) = child.borrow_mut().as_element_mut() {
            elem.parent = Some(Rc::downgrade(parent));
        }
        if let Some(children) = parent.borrow_mut().children_mut() {
            children.push(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::dom_tree::*;
    use std::rc::Rc;

    #[test]
    fn set_attribute_replaces_in_place() {
        let handle = new_element_handle("div");
        let mut node = handle.borrow_mut();
        let elem = node.as_element_mut().unwrap();
        elem.set_attribute("id", "a");
        elem.set_attribute("class", "b");
        elem.set_attribute("ID", "c");

        assert_eq!(elem.attribute("id"), Some("c"));
        assert_eq!(elem.attributes.len(), 2);
        assert_eq!(&*elem.attributes[0].0.local, "id");
    }

    #[test]
    fn attribute_lookup_ignores_ascii_case() {
        let handle = new_element_handle("a");
        let mut node = handle.borrow_mut();
        let elem = node.as_element_mut().unwrap();
        elem.set_attribute("HREF", "/x");

        assert_eq!(elem.attribute("href"), Some("/x"));
        assert_eq!(elem.attribute("Href"), Some("/x"));
        assert_eq!(elem.attribute("title"), None);
    }

    #[test]
    fn body_is_found_under_document_element() {
        let document = new_document();
        let html = new_element_handle("html");
        let head = new_element_handle("head");
        let body = new_element_handle("body");
        append_child(&document.root, html.clone());
        append_child(&html, head);
        append_child(&html, body.clone());

        let found = document.body().unwrap();
        assert!(Rc::ptr_eq(&found, &body));
        assert_eq!(document.elements().len(), 3);

        let parent = body.borrow().as_element().unwrap().parent().unwrap();
        assert!(Rc::ptr_eq(&parent, &html));
    }
}
