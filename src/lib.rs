pub mod auth;
pub mod cache;
pub mod config;
pub mod domain;
pub mod entity;
pub mod errors;
pub mod gateway;
pub mod select;
pub mod snapshot;
pub mod stores;
pub mod sync;
pub mod telemetry;
pub mod validate;
