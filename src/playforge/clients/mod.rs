// src/playforge/clients/mod.rs

pub mod common;
pub mod openai;
