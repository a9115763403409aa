pub mod adapters;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod message;
pub mod normalizers;
pub mod registry;
pub mod transport;

#[cfg(test)]
mod testing;
