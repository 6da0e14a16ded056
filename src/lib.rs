//! Library crate for ba-round-tracker, exposing modules for the replay binary and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod services;
pub mod state;
