//! Browser client for the HorseWatch monitoring service.

pub mod api;
pub mod cache;
pub mod components;
pub mod config;
pub mod hooks;
pub mod runtime;
pub mod service;

#[cfg(test)]
mod testing;
