//! Folding several per-image results into one record.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::result::ExtractionResult;
use crate::schema::{FieldKind, TaskSchema};

/// Field values gathered from every successful result of one subject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedResult {
    fields: Map<String, Value>,
}

impl CombinedResult {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if any of `names` was filled by at least one image.
    #[must_use]
    pub fn has_any_field(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.fields.contains_key(*name))
    }
}

impl Serialize for CombinedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("success", &true)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Merge `results` in order into one record.
///
/// Failures are skipped and `null` values ignored. Scalars and objects keep
/// the first value seen. The first list for a field is copied as-is; later
/// lists append only items not already present, compared by deep equality.
#[must_use]
pub fn merge(schema: &TaskSchema, results: &[ExtractionResult]) -> CombinedResult {
    let mut combined = Map::new();

    for payload in results.iter().filter_map(ExtractionResult::payload) {
        for spec in schema.fields() {
            let Some(value) = payload.get(spec.name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            match (spec.kind, value) {
                (FieldKind::List, Value::Array(items)) => match combined.get_mut(spec.name) {
                    // The first list seen is taken verbatim, duplicates included.
                    None => {
                        combined.insert(spec.name.to_string(), value.clone());
                    }
                    Some(Value::Array(acc)) => {
                        for item in items {
                            if !acc.contains(item) {
                                acc.push(item.clone());
                            }
                        }
                    }
                    Some(_) => {}
                },
                _ => {
                    combined
                        .entry(spec.name.to_string())
                        .or_insert_with(|| value.clone());
                }
            }
        }
    }

    CombinedResult { fields: combined }
}
