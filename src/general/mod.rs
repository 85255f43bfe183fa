pub mod active_notes;
pub mod check;
pub mod engine;
pub mod event;
pub mod forwarder;
pub mod mapping;
pub mod panic;
pub mod preset;
pub mod sink;
pub mod stdin_handler;
pub mod transpose;
pub mod velocity;
