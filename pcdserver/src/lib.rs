//! # pcdserver - Enveloppe HTTP de PcapDeck
//!
//! Abstraction simple au-dessus d'Axum : assemblage du router, montage de la
//! documentation Swagger, initialisation du logging et arrêt gracieux sur
//! Ctrl+C.

pub mod logs;
pub mod server;

pub use logs::init_logging;
pub use server::{Server, ServerInfo};
