// src/config/mod.rs
//! Runtime configuration loaded from `config/` files and the environment.

pub mod ai;

pub use ai::{AiConfig, ProviderKind};
