use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::config::AppConfig;
use crate::services::pipeline::{self, TranslateRequest};
use crate::services::providers::ProviderRegistry;
use crate::services::store::JsonStore;
use crate::services::{catalog, convert, qa, sync};

mod command;
mod entity;
use command::Command;

/// Everything a request handler needs, opened once per process.
pub struct Context {
    pub config: AppConfig,
    pub store: JsonStore,
    pub registry: ProviderRegistry,
}

impl Context {
    pub fn open(config_path: &Path) -> Result<Self> {
        let config = AppConfig::load_or_default(config_path)?;
        let store = JsonStore::open(&config.store_path, &config.primary_language)?;
        tracing::info!(
            config = %config_path.display(),
            store = %config.store_path.display(),
            languages = ?config.languages,
            "context opened"
        );
        Ok(Context::new(config, store, ProviderRegistry::with_builtin()))
    }

    pub fn new(config: AppConfig, store: JsonStore, registry: ProviderRegistry) -> Self {
        Context {
            config,
            store,
            registry,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ExportPayload {
    #[serde(default)]
    locale: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConvertPayload {
    source_dir: PathBuf,
    #[serde(default)]
    remove_used: bool,
}

#[derive(Debug, Deserialize)]
struct QaPayload {
    language: String,
}

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

/// A missing payload reads as `{}`.
pub(crate) fn parse_payload<T: DeserializeOwned>(payload: &Value) -> std::result::Result<T, String> {
    let value = if payload.is_null() {
        json!({})
    } else {
        payload.clone()
    };
    serde_json::from_value(value).map_err(|e| format!("invalid payload: {e}"))
}

pub fn handle(ctx: &Context, input: &str) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let cmd_str = get_cmd(&req);
    let payload = get_payload(&req);
    let cmd = Command::from(cmd_str);

    let _span = tracing::debug_span!("request", cmd = cmd_str).entered();

    let result = dispatch(ctx, cmd, payload).and_then(|value| {
        if cmd.writes_store() {
            ctx.store.persist().map_err(|e| e.to_string())?;
        }
        Ok(value)
    });

    match result {
        Ok(payload) => ok(id, payload),
        Err(message) => {
            tracing::debug!(cmd = cmd_str, %message, "request failed");
            err(id, message)
        }
    }
}

fn dispatch(ctx: &Context, cmd: Command, payload: &Value) -> std::result::Result<Value, String> {
    let store = ctx.store.memory();
    let config = &ctx.config;

    match cmd {
        Command::Ping => Ok(json!({ "message": "drt-core alive" })),

        Command::CatalogExport => {
            let p: ExportPayload = parse_payload(payload)?;
            let reports =
                sync::export(store, config, p.locale.as_deref()).map_err(|e| e.to_string())?;
            Ok(json!({ "reports": reports }))
        }

        Command::CatalogImport => Ok(json!({ "reports": sync::import(store, config) })),

        Command::CatalogConvert => {
            let p: ConvertPayload = parse_payload(payload)?;
            let reports = convert::convert(store, config, &p.source_dir, p.remove_used);
            Ok(json!({ "reports": reports }))
        }

        Command::CatalogQa => {
            let p: QaPayload = parse_payload(payload)?;
            config
                .require_language(&p.language)
                .map_err(|e| e.to_string())?;
            let po = catalog::load(&config.catalog_path(&p.language)).map_err(|e| e.to_string())?;
            Ok(json!({
                "language": p.language,
                "entries": po.len(),
                "issues": qa::run(&po)
            }))
        }

        Command::Translate => {
            let req: TranslateRequest = parse_payload(payload)?;
            let report =
                pipeline::run(store, config, &ctx.registry, &req).map_err(|e| e.to_string())?;
            Ok(json!({ "report": report }))
        }

        Command::EntityRender => entity::render(ctx, payload),

        Command::EntityWrite => entity::write(ctx, payload),

        Command::Unknown => Err("unknown command".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::model::entity::{EntityKind, TranslatableEntity};
    use crate::model::record::RecordKey;
    use crate::services::providers::TranslationProvider;

    struct Shout;

    impl TranslationProvider for Shout {
        fn name(&self) -> &str {
            "shout"
        }

        fn translate(
            &self,
            text: &str,
            _: &str,
            _: &str,
        ) -> std::result::Result<String, ProviderError> {
            Ok(text.to_uppercase())
        }
    }

    fn context(dir: &Path) -> Context {
        let config = AppConfig {
            languages: vec!["en".into(), "es".into()],
            locale_dir: dir.join("locale"),
            store_path: dir.join("store.json"),
            ..Default::default()
        };
        let store = JsonStore::open(&config.store_path, "en").unwrap();
        store.memory().add_kind(EntityKind::new("page", &["title"]));
        store
            .memory()
            .add_entity(TranslatableEntity::new("page", "1").with_value("title", "Welcome"));

        let mut registry = ProviderRegistry::new();
        registry.register("shout", |_| Ok(Box::new(Shout)));
        Context::new(config, store, registry)
    }

    fn call(ctx: &Context, line: &str) -> Value {
        serde_json::from_str(&handle(ctx, line)).unwrap()
    }

    #[test]
    fn ping_and_bad_requests() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let resp = call(&ctx, r#"{"id": 1, "cmd": "ping"}"#);
        assert_eq!(resp["status"], "ok");
        assert_eq!(resp["id"], 1);

        let resp = call(&ctx, "not json");
        assert_eq!(resp["message"], "invalid json");
        assert!(resp.get("id").is_none());

        let resp = call(&ctx, r#"{"id": 2, "cmd": "nope"}"#);
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["message"], "unknown command");
    }

    #[test]
    fn translate_persists_store() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let resp = call(
            &ctx,
            r#"{"id": "t", "cmd": "translate", "payload": {"language": "es", "provider": "shout", "workers": 2}}"#,
        );
        assert_eq!(resp["status"], "ok", "{resp}");
        assert_eq!(resp["payload"]["report"]["succeeded"], 1);

        let reopened = JsonStore::open(&dir.path().join("store.json"), "en").unwrap();
        let rec = reopened
            .memory()
            .record(&RecordKey::new("page", "1", "title", "es"))
            .unwrap();
        assert_eq!(rec.text, "WELCOME");
    }

    #[test]
    fn configuration_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let resp = call(
            &ctx,
            r#"{"id": 3, "cmd": "translate", "payload": {"language": "en", "provider": "shout"}}"#,
        );
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["message"], "Cannot translate en into itself");

        let resp = call(&ctx, r#"{"id": 4, "cmd": "catalog.export", "payload": {"locale": "fr"}}"#);
        assert_eq!(resp["message"], "Unknown language: fr");
    }

    #[test]
    fn export_edit_import_and_render() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let resp = call(&ctx, r#"{"id": 5, "cmd": "catalog.export"}"#);
        assert_eq!(resp["payload"]["reports"].as_array().unwrap().len(), 2);

        let path = ctx.config.catalog_path("es");
        let mut po = catalog::load(&path).unwrap();
        po.find_mut("Welcome").unwrap().set_translation("Bienvenido");
        catalog::save(&path, &po).unwrap();

        let resp = call(&ctx, r#"{"id": 6, "cmd": "catalog.import"}"#);
        assert_eq!(resp["payload"]["reports"][0]["written"], 1, "{resp}");

        let resp = call(
            &ctx,
            r#"{"id": 7, "cmd": "entity.render", "payload": {"kind": "page", "id": "1", "representation": "dictionary_backed"}}"#,
        );
        assert_eq!(
            resp["payload"]["fields"]["title"],
            json!({"en": "Welcome", "es": "Bienvenido"})
        );

        let resp = call(&ctx, r#"{"id": 8, "cmd": "catalog.qa", "payload": {"language": "es"}}"#);
        assert_eq!(resp["payload"]["issues"], json!([]));
    }

    #[test]
    fn entity_write_updates_primary_value() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let resp = call(
            &ctx,
            r#"{"id": 9, "cmd": "entity.write", "payload": {"kind": "page", "id": "1", "field": "title", "values": {"en": "Hello", "es": "Hola"}}}"#,
        );
        assert_eq!(resp["payload"]["written"], 2);

        let resp = call(
            &ctx,
            r#"{"id": 10, "cmd": "entity.render", "payload": {"kind": "page", "id": "1", "representation": "database_backed", "language": "es"}}"#,
        );
        assert_eq!(resp["payload"]["fields"]["title"], "Hola");

        let resp = call(
            &ctx,
            r#"{"id": 11, "cmd": "entity.render", "payload": {"kind": "page", "id": "404", "representation": "database_backed"}}"#,
        );
        assert_eq!(resp["status"], "error");
    }
}
