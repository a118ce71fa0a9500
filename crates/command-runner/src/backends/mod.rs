//! Execution backends: direct and per-user delegation

pub mod local;
pub mod user;

pub use local::LocalRunner;
pub use user::AsUserRunner;
