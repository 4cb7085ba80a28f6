//! WebSocket transport and wire protocol

pub mod broadcast;
pub mod handler;
pub mod protocol;
