#![allow(dead_code)]

pub mod config;
pub mod mock_registry;
pub mod server;
