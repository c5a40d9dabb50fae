pub mod config;
pub mod constants;
pub mod engine;
pub mod entities;
pub mod error;
pub mod input;
pub mod logging;
pub mod maze;
pub mod power;
pub mod render;
pub mod rng;
pub mod types;
