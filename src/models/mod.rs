pub mod entry;
pub mod settings;
pub mod user;
pub mod week;
