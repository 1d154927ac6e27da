pub mod css_matcher;
pub mod css_parser;
pub mod injector;
pub mod rule_set;
