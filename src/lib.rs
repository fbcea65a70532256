//! Keeps gettext catalogs and a datastore of per-field, per-language
//! translations in sync, and runs untranslated text through machine
//! translation providers.

pub mod error;
pub mod model;
pub mod parsers;
pub mod protocol;
pub mod services;

pub use error::{ProviderError, Result, StoreError, SyncError, TagError};
pub use model::config::AppConfig;
pub use services::providers::{ProviderRegistry, TranslationProvider};
pub use services::store::TranslationStore;
