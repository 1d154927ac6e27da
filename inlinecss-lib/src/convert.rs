use crate::error::InlineError;
use crate::parser::html;
use crate::style::{css_parser, injector};

pub mod style_to_inline {
    use super::*;
    use log::debug;

    /// Parses `html_content`, inlines the rules of its `<style>` blocks and
    /// returns the serialized document.
    ///
    /// The `<style>` elements themselves are kept in the output.
    pub fn convert(html_content: &str) -> Result<String, InlineError> {
        let mut dom_tree = html::create_dom_tree(html_content);
        let style_sheets = dom_tree.style_sheets();
        debug!("Found {} <style> element(s)", style_sheets.len());

        let rules = css_parser::parse_css(&style_sheets);
        injector::inject_inline_styles(&rules, &mut dom_tree)?;
        dom_tree.to_html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pass_through_keeps_inline_style() {
        let html_str =
            r#"<!DOCTYPE html><head></head><body style="background-color: red;"><p>Test</p></body>"#;
        assert_eq!(
            style_to_inline::convert(html_str).unwrap(),
            r#"<html><head></head><body style="background-color: red;"><p>Test</p></body></html>"#
        );
    }

    #[test]
    fn test_style_block_is_inlined_and_kept() {
        let html_str = r#"<!DOCTYPE html>
<html><head><style>
.red { color: red; }
#blue { color: blue; }
@media (max-width: 600px) { .red { color: pink; } }
</style></head><body><div class="red" style="display: flex;">Hello<span id="blue">Blue</span></div></body></html>"#;

        let expected = r#"<html><head><style>
.red { color: red; }
#blue { color: blue; }
@media (max-width: 600px) { .red { color: pink; } }
</style></head><body><div class="red" style="display: flex; color: red;">Hello<span id="blue" style="color: blue;">Blue</span></div></body></html>"#;

        assert_eq!(style_to_inline::convert(html_str).unwrap(), expected);
    }
}
