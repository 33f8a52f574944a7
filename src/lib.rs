pub mod app;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod form;
pub mod handlers;

#[cfg(test)]
pub mod testing;
