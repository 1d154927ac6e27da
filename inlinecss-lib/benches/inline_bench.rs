extern crate criterion;

use criterion::{criterion_group, criterion_main, Criterion};

use inlinecss_lib::convert;
use inlinecss_lib::style::css_parser::parse_css;

fn large_stylesheet() -> String {
    let mut css = String::with_capacity(1_000_000);
    for i in 0..10_000 {
        css.push_str(&format!(
            ".c{} {{ color: #{:06x}; margin: {}px; /* rule {} */ }}\n",
            i, i, i % 50, i
        ));
        if i % 100 == 0 {
            css.push_str("@media (max-width: 600px) { .c0 { color: red; } }\n");
        }
    }
    css
}

fn bench_parse_css(c: &mut Criterion) {
    let css = large_stylesheet();

    c.bench_function("parse_css_large_stylesheet", |b| {
        b.iter(|| parse_css([css.as_str()]))
    });
}

fn bench_convert_large_document(c: &mut Criterion) {
    let mut big_html = String::with_capacity(1_000_000);
    big_html.push_str("<html><head><style>");
    for i in 0..100 {
        big_html.push_str(&format!(".c{} {{ padding: {}px; }} div .c{} {{ color: blue; }}\n", i, i, i));
    }
    big_html.push_str("</style></head><body><div>");
    for i in 0..10_000 {
        big_html.push_str(&format!(r#"<p class="c{}">Test</p>"#, i % 100));
    }
    big_html.push_str("</div></body></html>");

    c.bench_function("convert_large_document", |b| {
        b.iter(|| convert(&big_html))
    });
}

criterion_group!(benches, bench_parse_css, bench_convert_large_document);
criterion_main!(benches);
