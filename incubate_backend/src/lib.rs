pub mod analysis;
pub mod config;
pub mod conversation;
pub mod database;
pub mod demo;
pub mod entry;
pub mod inky;
pub mod lock;
pub mod profile;
pub mod reflection;
pub mod runtime;
pub mod session;
pub mod store;
