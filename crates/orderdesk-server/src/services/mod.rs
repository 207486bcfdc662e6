//! Request-level logic shared by the HTTP handlers.

pub mod chat;
pub mod order_status;
