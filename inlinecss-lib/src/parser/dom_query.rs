use crate::dom::dom_tree::{Document, Handle};
use crate::error::SelectorError;
use crate::style::css_matcher::parse_selector_list;
use log::trace;

/// All elements matching `selector`, in document order.
///
/// The selector is parsed as a comma-separated group; an element matching
/// several parts of the group is returned once.
pub fn query_selector_all(document: &Document, selector: &str) -> Result<Vec<Handle>, SelectorError> {
    let selectors = parse_selector_list(selector)?;
    let matched: Vec<Handle> = document
        .elements()
        .into_iter()
        .filter(|element| selectors.matches(element))
        .collect();
    trace!("`{}` matched {} element(s)", selector, matched.len());
    Ok(matched)
}

/// The first element matching `selector`, if any.
pub fn query_selector(document: &Document, selector: &str) -> Result<Option<Handle>, SelectorError> {
    let selectors = parse_selector_list(selector)?;
    Ok(document
        .elements()
        .into_iter()
        .find(|element| selectors.matches(element)))
}

impl Document {
    /// Every `<style>` element of the document, in document order.
    pub fn style_elements(&self) -> Vec<Handle> {
        self.elements()
            .into_iter()
            .filter(|element| {
                element
                    .borrow()
                    .as_element()
                    .is_some_and(|elem| elem.tag.eq_ignore_ascii_case("style"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<body>
        <div id="myDiv" class="box wide">
            <ul>
                <li class="item">one</li>
                <li class="item special">two</li>
                <li class="item">three</li>
            </ul>
            <p lang="en-US">para</p>
        </div>
        <p>outside</p>
        <a href="https://example.com/x" data-kind="Ext">link</a>
    </body>"#;

    fn ids(document: &Document, selector: &str) -> Vec<String> {
        query_selector_all(document, selector)
            .unwrap()
            .iter()
            .map(|handle| {
                let node = handle.borrow();
                let elem = node.as_element().unwrap();
                match elem.attribute("class") {
                    Some(class) => format!("{}.{}", elem.tag, class.replace(' ', ".")),
                    None => elem.tag.clone(),
                }
            })
            .collect()
    }

    #[test]
    fn test_descendant_and_child() {
        let document = create_dom_tree(PAGE);
        assert_eq!(ids(&document, "body #myDiv"), vec!["div.box.wide"]);
        assert_eq!(ids(&document, "div p"), vec!["p"]);
        assert_eq!(ids(&document, "body > p"), vec!["p"]);
        assert_eq!(ids(&document, "html > p"), Vec::<String>::new());
    }

    #[test]
    fn test_descendant_backtracks() {
        // The nearest `div` above the span is not a child of body; the outer one is.
        let document =
            create_dom_tree(r#"<div class="outer"><div class="inner"><span>x</span></div></div>"#);
        assert_eq!(ids(&document, "body > div span"), vec!["span"]);
        assert_eq!(ids(&document, "body > .inner span"), Vec::<String>::new());

        let document = create_dom_tree(PAGE);
        assert_eq!(ids(&document, "body > div li").len(), 3);
        assert_eq!(ids(&document, "body > ul li").len(), 0);
    }

    #[test]
    fn test_siblings_and_structural_pseudo_classes() {
        let document = create_dom_tree(PAGE);
        assert_eq!(ids(&document, ".item + .special"), vec!["li.item.special"]);
        assert_eq!(ids(&document, ".special ~ li"), vec!["li.item"]);
        assert_eq!(ids(&document, "li:first-child"), vec!["li.item"]);
        assert_eq!(ids(&document, "li:last-child").len(), 1);
        assert_eq!(ids(&document, "ul:only-child"), Vec::<String>::new());
        assert_eq!(ids(&document, ":root"), vec!["html"]);
    }

    #[test]
    fn test_nth_and_negation_pseudo_classes() {
        let document = create_dom_tree(PAGE);
        assert_eq!(ids(&document, "li:nth-child(odd)"), vec!["li.item", "li.item"]);
        assert_eq!(ids(&document, "li:nth-child(2)"), vec!["li.item.special"]);
        assert_eq!(ids(&document, "li:nth-child(2n)"), vec!["li.item.special"]);
        assert_eq!(ids(&document, "li:nth-last-child(-n+2)").len(), 2);
        assert_eq!(ids(&document, "li:not(.special)"), vec!["li.item", "li.item"]);
        assert_eq!(ids(&document, "p:not([lang])"), vec!["p"]);
        assert_eq!(ids(&document, ":is(ul, ol) > li").len(), 3);
    }

    #[test]
    fn test_type_and_empty_pseudo_classes() {
        let document = create_dom_tree(PAGE);
        assert_eq!(ids(&document, "p:first-of-type").len(), 2);
        assert_eq!(ids(&document, "li:last-of-type").len(), 1);
        assert_eq!(ids(&document, "body > a:only-of-type"), vec!["a"]);
        assert_eq!(ids(&document, "li:only-of-type"), Vec::<String>::new());

        let document =
            create_dom_tree("<div><span></span><span> </span><span><!-- c --></span><em>x</em></div>");
        assert_eq!(ids(&document, "span:empty").len(), 2);
        assert_eq!(ids(&document, "em:empty").len(), 0);
    }

    #[test]
    fn test_attribute_matching() {
        let document = create_dom_tree(PAGE);
        assert_eq!(ids(&document, r#"a[href^="https://"]"#), vec!["a"]);
        assert_eq!(ids(&document, "a[data-kind=ext i]"), vec!["a"]);
        assert_eq!(ids(&document, "a[data-kind=ext]").len(), 0);
        assert_eq!(ids(&document, "[lang|=en]"), vec!["p"]);
        assert_eq!(ids(&document, "[class~=wide]"), vec!["div.box.wide"]);
    }

    #[test]
    fn test_selector_group_is_deduplicated_in_document_order() {
        let document = create_dom_tree(PAGE);
        assert_eq!(ids(&document, "p, #myDiv, div"), vec!["div.box.wide", "p", "p"]);
    }

    #[test]
    fn test_dynamic_pseudo_classes_match_nothing() {
        let document = create_dom_tree(PAGE);
        assert!(ids(&document, "a:hover").is_empty());
        assert!(ids(&document, "p::first-line").is_empty());
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let document = create_dom_tree(PAGE);
        let err = query_selector_all(&document, "div >").unwrap_err();
        assert_eq!(err.selector, "div >");
    }

    #[test]
    fn test_query_selector_and_style_elements() {
        let document = create_dom_tree("<style>a{}</style><p>x</p><style>b{}</style>");
        assert_eq!(document.style_elements().len(), 2);
        let first = query_selector(&document, "p").unwrap().unwrap();
        assert_eq!(first.borrow().as_element().unwrap().tag, "p");
    }
}
