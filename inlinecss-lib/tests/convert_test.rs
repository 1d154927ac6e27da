use inlinecss_lib::style::css_parser::parse_css;
use inlinecss_lib::style::injector::inject_inline_styles;
use inlinecss_lib::parser::dom_query::query_selector;
use inlinecss_lib::parser::html::create_dom_tree;
use inlinecss_lib::{convert, InlineError};
use pretty_assertions::assert_eq;

fn style_of(document: &inlinecss_lib::dom::dom_tree::Document, selector: &str) -> Option<String> {
    let handle = query_selector(document, selector).unwrap()?;
    let node = handle.borrow();
    node.as_element()?.attribute("style").map(str::to_string)
}

#[test]
fn test_parse_style_block_into_rule_set() {
    let rules = parse_css([
        "body {background-color: red; color: white; font-size: 14px;} .button {color: blue}",
    ]);
    assert_eq!(rules.selectors().collect::<Vec<_>>(), vec!["body", ".button"]);
    assert_eq!(
        rules.get("body").unwrap().to_string(),
        "background-color: red; color: white; font-size: 14px;"
    );
    assert_eq!(rules.get(".button").unwrap().get("color"), Some("blue"));
}

#[test]
fn test_media_queries_are_left_out() {
    let rules = parse_css([
        "p { margin: 0 } @media print { p { margin: 1in } } h1 { font-weight: bold }",
    ]);
    assert_eq!(rules.selectors().collect::<Vec<_>>(), vec!["p", "h1"]);
    assert_eq!(rules.get("p").unwrap().get("margin"), Some("0"));
}

#[test]
fn test_fifty_rules_reach_fifty_elements() {
    let mut css = String::new();
    let mut body = String::new();
    for i in 0..50 {
        css.push_str(&format!(".c{} {{ width: {}px; }}\n", i, i));
        body.push_str(&format!(r#"<div class="c{}"></div>"#, i));
    }
    let rules = parse_css([css.as_str()]);
    assert_eq!(rules.len(), 50);

    let mut document = create_dom_tree(&body);
    inject_inline_styles(&rules, &mut document).unwrap();
    assert_eq!(style_of(&document, ".c0").as_deref(), Some("width: 0px;"));
    assert_eq!(style_of(&document, ".c49").as_deref(), Some("width: 49px;"));
}

#[test]
fn test_multiple_selectors_share_a_declaration() {
    let html = r#"<html><head><style>h1, .title { color: navy; }</style></head>
<body><h1>A</h1><p class="title">B</p></body></html>"#;
    let out = convert(html).unwrap();
    assert!(out.contains(r#"<h1 style="color: navy;">A</h1>"#));
    assert!(out.contains(r#"<p class="title" style="color: navy;">B</p>"#));
}

#[test]
fn test_convert_combines_several_style_blocks() {
    let html = r#"<head><style>p { color: red; margin: 0 }</style><style>p { color: green }</style></head><body><p>x</p></body>"#;
    assert_eq!(
        convert(html).unwrap(),
        r#"<html><head><style>p { color: red; margin: 0 }</style><style>p { color: green }</style></head><body><p style="color: green; margin: 0;">x</p></body></html>"#
    );
}

#[test]
fn test_document_without_styles_passes_through() {
    let html = r#"<!DOCTYPE html><head></head><body style="background-color: red;"><p>Test</p></body>"#;
    assert_eq!(
        convert(html).unwrap(),
        r#"<html><head></head><body style="background-color: red;"><p>Test</p></body></html>"#
    );
}

#[test]
fn test_invalid_selector_is_reported() {
    let html = "<style>p[ { color: red }</style><p>x</p>";
    let err = convert(html).unwrap_err();
    match err {
        InlineError::Selector(e) => assert_eq!(e.selector, "p["),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_template_contents_are_left_alone() {
    let out = convert("<template><p>x</p></template><style>p{color:red}</style><p>y</p>").unwrap();
    assert!(out.contains("<template><p>x</p></template>"));
    assert!(out.contains(r#"<p style="color: red;">y</p>"#));
}

#[test]
fn test_structural_pseudo_classes_are_inlined() {
    let html = concat!(
        "<style>p:not(.a){color:red} tr:nth-child(odd) td{background:#eee}</style>",
        r#"<p class="a">a</p><p>b</p>"#,
        "<table><tr><td>1</td></tr><tr><td>2</td></tr><tr><td>3</td></tr></table>"
    );
    let out = convert(html).unwrap();
    assert!(out.contains(r#"<p class="a">a</p><p style="color: red;">b</p>"#));
    assert_eq!(out.matches(r#"<td style="background: #eee;">"#).count(), 2);
    assert!(out.contains("<td>2</td>"));
}

#[test]
fn test_html_comment_wrapped_stylesheet() {
    let out = convert("<style><!-- p { color: red } --></style><p>x</p>").unwrap();
    assert!(out.contains(r#"<p style="color: red;">x</p>"#));
}
