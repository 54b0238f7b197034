pub mod adapter;
pub mod app;
pub mod common;
pub mod config;
pub mod http;
pub mod model;
pub mod services;
