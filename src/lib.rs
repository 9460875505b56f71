// File: lib.rs
// Location: /src/lib.rs

pub mod config;
pub mod controller;
pub mod entry;
pub mod events;
pub mod net;
pub mod nm;
pub mod platform;
pub mod qr;
pub mod screen;
pub mod snapshot;
pub mod terminal;

#[cfg(test)]
mod testing;
