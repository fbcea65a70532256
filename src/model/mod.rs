pub mod catalog;
pub mod config;
pub mod entity;
pub mod record;
