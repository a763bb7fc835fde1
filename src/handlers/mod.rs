pub mod accounts;
pub mod auth;
pub mod entries;
pub mod graphs;
pub mod health;
pub mod pages;
pub mod settings;
