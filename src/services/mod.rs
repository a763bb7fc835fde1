pub mod charts;
pub mod dates;
pub mod entries;
pub mod mood;
pub mod pagination;
pub mod settings;
