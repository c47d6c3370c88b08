//! flashdeck: backend for an AI language-learning flashcard app.
//!
//! Owns the per-user flashcard data layer over Sled (collection index +
//! card documents, with an atomic rename/move), and exposes a REST surface
//! for collection CRUD, upstream flashcard generation, and checkout session
//! creation. Identity is external: the service only validates provider
//! bearer tokens.

pub mod auth;
pub mod billing;
pub mod config;
pub mod error;
pub mod generate;
pub mod models;
pub mod rest;
pub mod storage;
