pub mod attribution;
pub mod catalog;
pub mod convert;
pub mod encoding;
pub mod pipeline;
pub mod placeholder;
pub mod providers;
pub mod qa;
pub mod representation;
pub mod store;
pub mod sync;
