pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod services;
pub mod srs;
pub mod state;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
