// ── Ingestion pipeline ──
//
// Raw list payload in, normalized table out:
// envelope -> `_id` alias -> decode -> sort -> dedup -> rank -> set_all.

use std::collections::HashSet;

use serde_json::Value;

use super::table::{EntityAdapter, EntityTable};
use crate::error::CoreError;
use crate::model::Resource;

/// Normalize a raw list response into a ranked, ordered table.
///
/// An empty payload (`null`, `[]`) yields an empty table.
pub fn ingest_list<T: Resource>(raw: Value) -> Result<EntityTable<T>, CoreError> {
    let collection = T::KIND.collection();
    let records = extract_list(raw, collection)?;

    let mut entities = records
        .into_iter()
        .map(|record| decode(normalize_record(record), collection))
        .collect::<Result<Vec<T>, _>>()?;

    entities.sort_by(T::compare);
    let mut seen = HashSet::new();
    entities.retain(|entity| seen.insert(entity.id().clone()));
    for (index, entity) in entities.iter_mut().enumerate() {
        entity.set_rank(index + 1);
    }

    Ok(EntityAdapter::new().set_all(entities))
}

/// Decode a single-record response (`GET /<collection>/<id>`, create, update).
pub fn decode_record<T: Resource>(raw: Value) -> Result<T, CoreError> {
    let record = match raw {
        Value::Object(mut map) if !has_id(&map) && map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    decode(normalize_record(record), T::KIND.collection())
}

/// Decode the record a write echoes back, if it echoes one.
///
/// `null`, an empty body, or an object without an id (a bare status message)
/// yield `None`.
pub fn decode_echo<T: Resource>(raw: Value) -> Result<Option<T>, CoreError> {
    let record = match raw {
        Value::Object(mut map) if !has_id(&map) && map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    let collection = T::KIND.collection();
    match record {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::Object(map) if has_id(&map) => {
            decode(normalize_record(Value::Object(map)), collection).map(Some)
        }
        Value::Object(_) => Ok(None),
        other => Err(CoreError::Decode {
            message: format!("{collection}: expected a record, got {}", kind_of(&other)),
        }),
    }
}

/// Pull the record array out of a list envelope.
///
/// Accepts a bare array, `{ "data": [...] }`, or `{ "<collection>": [...] }`.
pub fn extract_list(raw: Value, collection: &str) -> Result<Vec<Value>, CoreError> {
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for key in ["data", collection] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return Ok(items);
                }
            }
            Err(CoreError::Decode {
                message: format!(
                    "{collection}: expected a list, got an object with keys [{}]",
                    map.keys().cloned().collect::<Vec<_>>().join(", ")
                ),
            })
        }
        other => Err(CoreError::Decode {
            message: format!("{collection}: expected a list, got {}", kind_of(&other)),
        }),
    }
}

/// Alias the server's `_id` field to `id`.
///
/// Numeric ids are stringified. A record carrying both keeps `id`.
pub fn normalize_record(record: Value) -> Value {
    let Value::Object(mut map) = record else {
        return record;
    };
    if let Some(raw_id) = map.remove("_id") {
        if !map.contains_key("id") {
            map.insert("id".into(), raw_id);
        }
    }
    if let Some(Value::Number(n)) = map.get("id") {
        let id = n.to_string();
        map.insert("id".into(), Value::String(id));
    }
    Value::Object(map)
}

fn decode<T: Resource>(record: Value, collection: &str) -> Result<T, CoreError> {
    serde_json::from_value(record).map_err(|e| CoreError::Decode {
        message: format!("{collection}: {e}"),
    })
}

fn has_id(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("_id") || map.contains_key("id")
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Car, EntityId, Notification};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ids<T: Resource>(table: &EntityTable<T>) -> Vec<String> {
        table.ids().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn ranks_follow_hex_order() {
        let table: EntityTable<Car> =
            ingest_list(json!([{ "_id": "3" }, { "_id": "ff" }, { "_id": "1a" }])).unwrap();

        assert_eq!(ids(&table), ["ff", "1a", "3"]);
        let ranks: Vec<_> = table.entities().map(|c| c.rank).collect();
        assert_eq!(ranks, [Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn duplicate_ids_leave_no_rank_gaps() {
        let table: EntityTable<Car> = ingest_list(json!([
            { "_id": "ff", "plate": "FIRST" },
            { "_id": "ff", "plate": "SECOND" },
            { "_id": "1a" },
        ]))
        .unwrap();

        assert_eq!(ids(&table), ["ff", "1a"]);
        let ranks: Vec<_> = table.entities().map(|c| c.rank).collect();
        assert_eq!(ranks, [Some(1), Some(2)]);
        let kept = table.get(&EntityId::from("ff")).unwrap();
        assert_eq!(kept.plate.as_deref(), Some("FIRST"));
    }

    #[test]
    fn non_hex_ids_rank_last() {
        let table: EntityTable<Car> =
            ingest_list(json!([{ "_id": "zz" }, { "_id": "10" }, { "_id": "a" }])).unwrap();
        assert_eq!(ids(&table), ["10", "a", "zz"]);
        let last = table.get(&EntityId::from("zz")).unwrap();
        assert_eq!(last.rank, Some(3));
    }

    #[test]
    fn envelopes_are_unwrapped() {
        let bare: EntityTable<Car> = ingest_list(json!([{ "_id": "1" }])).unwrap();
        let data: EntityTable<Car> = ingest_list(json!({ "data": [{ "_id": "1" }] })).unwrap();
        let named: EntityTable<Car> =
            ingest_list(json!({ "cars": [{ "_id": "1" }], "total": 1 })).unwrap();
        assert_eq!(bare, data);
        assert_eq!(bare, named);
    }

    #[test]
    fn empty_payloads_produce_empty_tables() {
        let empty: EntityTable<Car> = ingest_list(json!([])).unwrap();
        assert!(empty.is_empty());
        let null: EntityTable<Car> = ingest_list(Value::Null).unwrap();
        assert!(null.is_empty());
    }

    #[test]
    fn non_list_payload_is_a_decode_error() {
        let err = ingest_list::<Car>(json!({ "message": "ok" })).unwrap_err();
        assert!(matches!(err, CoreError::Decode { .. }), "got {err:?}");
        let err = ingest_list::<Car>(json!("nope")).unwrap_err();
        assert!(err.to_string().contains("a string"));
    }

    #[test]
    fn created_at_orders_event_like_resources() {
        let table: EntityTable<Notification> = ingest_list(json!([
            { "_id": "ff", "createdAt": "2024-01-01T00:00:00Z" },
            { "_id": "01", "createdAt": "2024-03-01T00:00:00Z" },
            { "_id": "aa" },
        ]))
        .unwrap();
        assert_eq!(ids(&table), ["01", "ff", "aa"]);
    }

    #[test]
    fn unknown_fields_survive() {
        let table: EntityTable<Car> =
            ingest_list(json!([{ "_id": "1", "plate": "B-1", "fuel": "diesel" }])).unwrap();
        let car = table.get(&EntityId::from("1")).unwrap();
        assert_eq!(car.plate.as_deref(), Some("B-1"));
        assert_eq!(car.extra["fuel"], "diesel");
        assert!(!car.extra.contains_key("_id"));
    }

    #[test]
    fn normalize_record_aliases_and_stringifies() {
        assert_eq!(normalize_record(json!({ "_id": 42 })), json!({ "id": "42" }));
        assert_eq!(
            normalize_record(json!({ "_id": "a", "id": "b" })),
            json!({ "id": "b" })
        );
    }

    #[test]
    fn decode_echo_tolerates_status_bodies() {
        assert!(decode_echo::<Car>(Value::Null).unwrap().is_none());
        assert!(decode_echo::<Car>(json!({ "message": "closed" })).unwrap().is_none());
        let echoed = decode_echo::<Car>(json!({ "data": { "_id": "9" } })).unwrap();
        assert_eq!(echoed.unwrap().id, EntityId::from("9"));
        assert!(decode_echo::<Car>(json!(42)).is_err());
    }

    #[test]
    fn decode_record_unwraps_data_envelope() {
        let car: Car = decode_record(json!({ "data": { "_id": "64f0", "plate": "X" } })).unwrap();
        assert_eq!(car.id, EntityId::from("64f0"));
        assert_eq!(car.rank, None);
    }
}
