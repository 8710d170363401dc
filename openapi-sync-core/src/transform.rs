//! Structural rewrites applied to a fetched OpenAPI document before it is published
//! as the transformed variant.
//!
//! The rewrites run in a fixed order, since later steps read fields that earlier
//! ones may have altered:
//!
//! 1. [`reorder_paths`]: the `/token` endpoint is moved to the front of `paths`.
//! 2. [`consolidate_security_schemes`]: the `GetToken` scheme is folded into `ApiKey`,
//!    operations referencing it are repointed, operations without their own
//!    `security` get an explicit `ApiToken` one, and the `DenyList` tag is renamed.
//!    Runs only when `GetToken` is present.
//! 3. Both transformed serializations are produced.
//!
//! All of it is total over well-formed JSON: a document without `paths` or
//! `components.securitySchemes` simply skips the corresponding step. Applying
//! [`transform`] to its own output changes nothing.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::serialize::{serialize, Format};

pub const TOKEN_PATH: &str = "/token";
pub const GET_TOKEN_SCHEME: &str = "GetToken";
pub const API_KEY_SCHEME: &str = "ApiKey";
pub const API_TOKEN_SCHEME: &str = "ApiToken";
pub const DENY_LIST_TAG: &str = "DenyList";
pub const DENY_LIST_TAG_RENAMED: &str = "Deny List";

/// Result of [`transform`]: the rewritten document and its two serializations.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub document: Value,
    pub pretty: String,
    pub compact: String,
}

/// What [`consolidate_security_schemes`] touched, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    pub description_merged: bool,
    /// `(method, path)` of every operation whose `GetToken` reference was renamed.
    pub repointed: Vec<(String, String)>,
    /// `(method, path)` of every operation that received the default `ApiToken` security.
    pub defaulted: Vec<(String, String)>,
    pub tags_renamed: usize,
}

pub fn transform(mut doc: Value) -> Result<TransformOutput, serde_json::Error> {
    info!("[TRANSFORM] Reordering and transforming document");

    if reorder_paths(&mut doc) {
        debug!("[TRANSFORM] Moved {TOKEN_PATH} to the front of paths");
    }

    if let Some(report) = consolidate_security_schemes(&mut doc) {
        info!(
            description_merged = report.description_merged,
            repointed = report.repointed.len(),
            defaulted = report.defaulted.len(),
            tags_renamed = report.tags_renamed,
            "[TRANSFORM] Consolidated {GET_TOKEN_SCHEME} into {API_KEY_SCHEME}"
        );
    }

    let pretty = serialize(&doc, Format::TRANSFORMED_PRETTY)?;
    let compact = serialize(&doc, Format::TRANSFORMED_COMPACT)?;

    Ok(TransformOutput {
        document: doc,
        pretty,
        compact,
    })
}

/// Moves the `/token` entry of `paths` to the front, keeping every other entry in
/// its original relative order. Returns whether `/token` was present.
pub fn reorder_paths(doc: &mut Value) -> bool {
    let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) else {
        return false;
    };
    let Some(token) = paths.shift_remove(TOKEN_PATH) else {
        return false;
    };

    let mut reordered = Map::with_capacity(paths.len() + 1);
    reordered.insert(TOKEN_PATH.to_string(), token);
    reordered.extend(std::mem::take(paths));
    *paths = reordered;
    true
}

/// Folds the `GetToken` security scheme into `ApiKey` and normalizes every
/// operation's security and tags.
///
/// Returns `None` (and leaves the document untouched) when there is no
/// `GetToken` scheme, even if some operations lack a `security` field.
pub fn consolidate_security_schemes(doc: &mut Value) -> Option<ConsolidationReport> {
    let schemes = doc
        .get_mut("components")
        .and_then(|c| c.get_mut("securitySchemes"))
        .and_then(Value::as_object_mut)?;
    let get_token = schemes.shift_remove(GET_TOKEN_SCHEME)?;

    let mut report = ConsolidationReport::default();

    // Overwrites unconditionally, whatever ApiKey's description was.
    if let (Some(description), Some(api_key)) = (
        get_token.get("description"),
        schemes.get_mut(API_KEY_SCHEME).and_then(Value::as_object_mut),
    ) {
        api_key.insert("description".to_string(), description.clone());
        report.description_merged = true;
    }

    let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) else {
        return Some(report);
    };

    for (path, item) in paths.iter_mut() {
        let Some(operations) = item.as_object_mut() else {
            continue;
        };
        for (method, operation) in operations.iter_mut() {
            let Some(operation) = operation.as_object_mut() else {
                continue;
            };

            match operation.get_mut("security") {
                Some(security) => {
                    if repoint_security(security) {
                        warn!(method = %method, path = %path, "[TRANSFORM] {GET_TOKEN_SCHEME} in {method} {path}");
                        report.repointed.push((method.clone(), path.clone()));
                    }
                }
                None => {
                    operation.insert("security".to_string(), default_security());
                    report.defaulted.push((method.clone(), path.clone()));
                }
            }

            if let Some(tags) = operation.get_mut("tags").and_then(Value::as_array_mut) {
                for tag in tags.iter_mut() {
                    if tag.as_str() == Some(DENY_LIST_TAG) {
                        *tag = Value::String(DENY_LIST_TAG_RENAMED.to_string());
                        report.tags_renamed += 1;
                    }
                }
            }
        }
    }

    Some(report)
}

/// `[{"ApiToken": []}]`
fn default_security() -> Value {
    let mut requirement = Map::new();
    requirement.insert(API_TOKEN_SCHEME.to_string(), Value::Array(Vec::new()));
    Value::Array(vec![Value::Object(requirement)])
}

/// Renames `GetToken` keys to `ApiKey` in each requirement of a `security` list,
/// keeping the scope list and the list order. Returns whether anything was renamed.
fn repoint_security(security: &mut Value) -> bool {
    let Some(requirements) = security.as_array_mut() else {
        return false;
    };

    let mut renamed = false;
    for requirement in requirements.iter_mut() {
        let Some(requirement) = requirement.as_object_mut() else {
            continue;
        };
        if let Some(scopes) = requirement.shift_remove(GET_TOKEN_SCHEME) {
            requirement.insert(API_KEY_SCHEME.to_string(), scopes);
            renamed = true;
        }
    }
    renamed
}
