pub mod adapters;
pub mod config;
pub mod error;
pub mod setup;
pub mod web;
