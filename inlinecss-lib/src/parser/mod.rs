pub mod dom_query;
pub mod html;
pub mod serialize;
