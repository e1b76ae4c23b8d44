pub mod http;
pub mod terminal;
pub mod web;
