use serde::Deserialize;
use serde_json::{json, Value};

use std::collections::BTreeMap;

use super::{parse_payload, Context};
use crate::error::{StoreError, SyncError};
use crate::services::representation::{self, Representation};
use crate::services::store::TranslationStore;

#[derive(Debug, Deserialize)]
struct RenderPayload {
    kind: String,
    id: String,
    representation: Representation,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WritePayload {
    kind: String,
    id: String,
    field: String,
    values: BTreeMap<String, String>,
}

pub fn render(ctx: &Context, payload: &Value) -> Result<Value, String> {
    let p: RenderPayload = parse_payload(payload)?;
    let store = ctx.store.memory();

    let language = p
        .language
        .unwrap_or_else(|| ctx.config.primary_language.clone());
    ctx.config
        .require_language(&language)
        .map_err(|e| e.to_string())?;

    let entity = store
        .get_entity(&p.kind, &p.id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| {
            SyncError::Store(StoreError::UnknownEntity {
                kind: p.kind.clone(),
                id: p.id.clone(),
            })
            .to_string()
        })?;

    let fields = p
        .representation
        .render(store, &ctx.config, &entity, &language)
        .map_err(|e| e.to_string())?;

    Ok(json!({
        "kind": entity.kind,
        "id": entity.id,
        "language": language,
        "fields": fields
    }))
}

pub fn write(ctx: &Context, payload: &Value) -> Result<Value, String> {
    let p: WritePayload = parse_payload(payload)?;

    let written = representation::write_dictionary(
        ctx.store.memory(),
        &ctx.config,
        &p.kind,
        &p.id,
        &p.field,
        &p.values,
    )
    .map_err(|e| e.to_string())?;

    Ok(json!({ "written": written }))
}
