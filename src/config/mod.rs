//! Persisted configuration (non-secret).

pub mod settings;

pub use settings::Settings;
