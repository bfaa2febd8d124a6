pub mod adapter;
pub mod bridge;
pub mod config;
pub mod offline;
pub mod render;
pub mod wire;
