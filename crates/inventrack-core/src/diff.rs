// ── Field diffs ──
//
// Edits send only the fields the user actually changed. Comparison is on
// serialized JSON values, so a field counts as changed exactly when its
// wire representation differs.

use serde_json::Value;

use crate::error::CoreError;
use crate::model::{Entity, Patch};

/// The identifier key. Never part of a patch and never overwritten by one.
const ID_KEY: &str = "id";

/// Fields of `submitted` whose value differs from the same field of
/// `original`. Keys absent from `original` count as changed.
pub fn diff_fields(original: &Patch, submitted: &Patch) -> Patch {
    submitted
        .iter()
        .filter(|(key, _)| key.as_str() != ID_KEY)
        .filter(|(key, value)| {
            original
                .get(key.as_str())
                .is_none_or(|current| !values_equal(current, value))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Diff a submitted form against the last-fetched record.
///
/// An empty result means nothing changed and no request should be made.
pub fn compute_patch<T: Entity>(original: &T, submitted: &Patch) -> Result<Patch, CoreError> {
    let current = to_object(original)?;
    Ok(diff_fields(&current, submitted))
}

/// Shallow-merge `patch` into `record`. The record keeps its id.
pub fn merge_patch<T: Entity>(record: &T, patch: &Patch) -> Result<T, CoreError> {
    let mut merged = to_object(record)?;
    for (key, value) in patch {
        if key != ID_KEY {
            merged.insert(key.clone(), value.clone());
        }
    }

    serde_json::from_value(Value::Object(merged)).map_err(|e| CoreError::InvalidPatch {
        entity: T::KIND,
        id: record.id().clone(),
        message: e.to_string(),
    })
}

fn to_object<T: Entity>(record: &T) -> Result<Patch, CoreError> {
    let invalid = |message: String| CoreError::InvalidPatch {
        entity: T::KIND,
        id: record.id().clone(),
        message,
    };
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(invalid(format!("record serialized to {other}, not an object"))),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// JSON equality where `5` and `5.0` are the same number.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => (x - y).abs() < f64::EPSILON,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{EntityId, Product};
    use serde_json::json;

    fn patch(v: Value) -> Patch {
        match v {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn product() -> Product {
        serde_json::from_value(json!({
            "id": 42,
            "name": "Widget",
            "category": "Tools",
            "unit_cost": 2.5,
            "unit_price": 4.0,
            "store_quantity": 3,
            "warehouse_quantity": 10,
            "reorder_level": 5
        }))
        .unwrap()
    }

    #[test]
    fn only_changed_fields_are_kept() {
        let original = patch(json!({ "a": 1, "b": 2, "c": 3 }));
        let submitted = patch(json!({ "a": 1, "b": 5, "c": 3 }));
        assert_eq!(diff_fields(&original, &submitted), patch(json!({ "b": 5 })));
    }

    #[test]
    fn identical_submission_is_empty() {
        let original = patch(json!({ "a": 1, "b": [1, 2], "c": { "d": null } }));
        assert!(diff_fields(&original, &original.clone()).is_empty());
    }

    #[test]
    fn integer_and_float_forms_compare_equal() {
        let original = patch(json!({ "qty": 5 }));
        let submitted = patch(json!({ "qty": 5.0 }));
        assert!(diff_fields(&original, &submitted).is_empty());
    }

    #[test]
    fn id_is_never_diffed() {
        let original = patch(json!({ "id": 1, "name": "a" }));
        let submitted = patch(json!({ "id": 2, "name": "a" }));
        assert!(diff_fields(&original, &submitted).is_empty());
    }

    #[test]
    fn product_form_diff() {
        let submitted = patch(json!({
            "name": "Widget",
            "category": "Hardware",
            "unit_price": 4,
            "store_quantity": 7
        }));
        let diff = compute_patch(&product(), &submitted).unwrap();
        insta::assert_json_snapshot!(Value::Object(diff), @r#"
        {
          "category": "Hardware",
          "store_quantity": 7
        }
        "#);
    }

    #[test]
    fn merge_keeps_id_and_untouched_fields() {
        let merged = merge_patch(
            &product(),
            &patch(json!({ "id": 99, "name": "Gadget", "store_quantity": 0 })),
        )
        .unwrap();
        assert_eq!(merged.id, EntityId::from(42));
        assert_eq!(merged.name, "Gadget");
        assert_eq!(merged.store_quantity, 0);
        assert_eq!(merged.category.as_deref(), Some("Tools"));
    }

    #[test]
    fn merge_rejects_ill_typed_values() {
        let err = merge_patch(&product(), &patch(json!({ "store_quantity": "many" }))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPatch { .. }));
    }

    #[test]
    fn unknown_fields_merge_into_extra() {
        let merged = merge_patch(&product(), &patch(json!({ "sku": "W-1" }))).unwrap();
        assert_eq!(merged.extra.get("sku"), Some(&json!("W-1")));
    }
}
