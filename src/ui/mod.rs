pub mod commands;
pub mod pacing;
pub mod reflection;
