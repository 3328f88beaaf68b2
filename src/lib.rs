pub mod catalog;
pub mod common;
pub mod configs;
pub mod engine;
pub mod platform;
pub mod protocol;
pub mod render;
pub mod rest;
pub mod server;
pub mod voice;
