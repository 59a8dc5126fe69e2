//! HTTP request handlers

pub mod chat;
pub mod conversion;
pub mod health;
pub mod kb_resources;
pub mod knowledge_bases;
pub mod resources;
pub mod search;
pub mod translation;
