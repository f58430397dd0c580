pub mod api;
pub mod app;
pub mod cache;
pub mod client;
pub mod commands;
pub mod config;
pub mod data_mapper;
pub mod event;
pub mod guard;
pub mod logging;
pub mod modal;
pub mod progress;
pub mod query;
pub mod resources;
pub mod routes;
pub mod session;
pub mod ui;
