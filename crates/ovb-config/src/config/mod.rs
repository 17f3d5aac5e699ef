pub mod parse;
pub mod render;
pub mod types;
