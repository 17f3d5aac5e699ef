pub mod settings;
pub mod web;
