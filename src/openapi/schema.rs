//! Type → schema extraction with component registration.
//!
//! Extraction runs a schemars generator per root type with OpenAPI 3
//! settings, registers every named definition into the [`SchemaRegistry`]
//! under its naming-mapped key, rewrites `$ref`s accordingly, and returns a
//! `$ref` (named types) or inline fragment (primitives, containers).

use std::collections::BTreeMap;

use heck::ToUpperCamelCase;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde_json::Value;

use crate::openapi::registry::SchemaRegistry;

/// Maps a type reference (fully-qualified for roots, short for nested
/// definitions) to the component name it is registered under.
pub type NamingFn = dyn Fn(&str) -> String + Send + Sync;

/// The default component naming.
///
/// Generic noise is cut, leading module segments are stripped down to the
/// trailing `module::Type` pair, and when module and type are
/// case-insensitively identical (`users::Users`) the pair collapses to the
/// UpperCamelCase module name. Everything else UpperCamelCases the final
/// segment.
pub fn default_naming(type_ref: &str) -> String {
    let base = type_ref.split('<').next().unwrap_or(type_ref);
    let segments: Vec<&str> = base.split("::").filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => String::new(),
        [only] => only.to_upper_camel_case(),
        [.., module, ty] => {
            if module.eq_ignore_ascii_case(ty) {
                module.to_upper_camel_case()
            } else {
                ty.to_upper_camel_case()
            }
        }
    }
}

/// The shared extraction collaborator handed to [`crate::route::SchemaFn`]
/// hooks: a registry plus the active naming function.
pub struct SchemaExtractor<'a> {
    registry: &'a SchemaRegistry,
    naming: &'a NamingFn,
}

impl<'a> SchemaExtractor<'a> {
    pub fn new(registry: &'a SchemaRegistry, naming: &'a NamingFn) -> Self {
        Self { registry, naming }
    }

    /// Derive the schema fragment for `T`, registering named component
    /// schemas as a side effect.
    pub fn extract<T: JsonSchema>(&mut self) -> Value {
        let mut generator = SchemaSettings::openapi3().into_generator();
        let root = generator.subschema_for::<T>();
        let definitions = generator.take_definitions();

        // Component keys: nested definitions map through the naming function
        // by their short schemars name; the root definition is keyed off the
        // fully-qualified Rust type path so module-collapse rules apply.
        let mut renames: BTreeMap<String, String> = definitions
            .keys()
            .map(|k| (k.clone(), (self.naming)(k)))
            .collect();
        let root_name = T::schema_name();
        if definitions.contains_key(root_name.as_str()) {
            renames.insert(root_name, (self.naming)(std::any::type_name::<T>()));
        }

        for (key, schema) in definitions {
            let mut v = serde_json::to_value(schema).unwrap_or_default();
            rewrite_refs(&mut v, &renames);
            let target = renames
                .get(key.as_str())
                .cloned()
                .unwrap_or_else(|| key.clone());
            self.registry.register(target, v);
        }

        let mut root_v = serde_json::to_value(root).unwrap_or_default();
        rewrite_refs(&mut root_v, &renames);
        root_v
    }
}

/// Free-function form of [`SchemaExtractor::extract`], shaped to coerce to a
/// [`crate::route::SchemaFn`] pointer: `schema_of::<User>`.
pub fn schema_of<T: JsonSchema>(x: &mut SchemaExtractor<'_>) -> Value {
    x.extract::<T>()
}

const REF_PREFIX: &str = "#/components/schemas/";

/// Recursively rewrite `$ref` targets through the rename map.
fn rewrite_refs(value: &mut Value, renames: &BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(s)) = map.get_mut("$ref") {
                if let Some(rest) = s.strip_prefix(REF_PREFIX) {
                    if let Some(renamed) = renames.get(rest) {
                        *s = format!("{REF_PREFIX}{renamed}");
                    }
                }
            }
            for v in map.values_mut() {
                rewrite_refs(v, renames);
            }
        }
        Value::Array(arr) => {
            for v in arr {
                rewrite_refs(v, renames);
            }
        }
        _ => {}
    }
}
