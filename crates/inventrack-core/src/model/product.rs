use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CollectionEntity, Entity, EntityId, EntityKind};

/// A stocked product.
///
/// Quantities are tracked per location (shop floor and warehouse).
/// `stock_value` is whatever the server last computed; use
/// [`computed_stock_value`](Self::computed_stock_value) for a local figure.
/// Fields the server sends that this type doesn't model are kept in `extra`
/// so a round trip through the store never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<EntityId>,
    #[serde(default)]
    pub unit_cost: f64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub store_quantity: u32,
    #[serde(default)]
    pub warehouse_quantity: u32,
    #[serde(default)]
    pub reorder_level: u32,
    #[serde(default)]
    pub stock_value: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    pub fn total_quantity(&self) -> u32 {
        self.store_quantity.saturating_add(self.warehouse_quantity)
    }

    /// At or below the reorder threshold.
    pub fn needs_reorder(&self) -> bool {
        self.total_quantity() <= self.reorder_level
    }

    pub fn computed_stock_value(&self) -> f64 {
        f64::from(self.total_quantity()) * self.unit_cost
    }
}

impl Entity for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl CollectionEntity for Product {
    type Draft = ProductDraft;
}

/// Payload for creating a product. Carries no identifier: the server
/// assigns one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<EntityId>,
    #[serde(default)]
    pub unit_cost: f64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub store_quantity: u32,
    #[serde(default)]
    pub warehouse_quantity: u32,
    #[serde(default)]
    pub reorder_level: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_record_deserializes_with_defaults() {
        let p: Product = serde_json::from_value(json!({ "id": 1, "name": "Widget" })).unwrap();
        assert_eq!(p.id, EntityId::Numeric(1));
        assert_eq!(p.total_quantity(), 0);
        assert!(p.extra.is_empty());
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let raw = json!({ "id": 2, "name": "Bolt", "sku": "B-100", "barcode": null });
        let p: Product = serde_json::from_value(raw).unwrap();
        assert_eq!(p.extra.get("sku"), Some(&json!("B-100")));

        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["sku"], json!("B-100"));
    }

    #[test]
    fn stock_helpers() {
        let p: Product = serde_json::from_value(json!({
            "id": 3,
            "name": "Nut",
            "unit_cost": 0.5,
            "store_quantity": 4,
            "warehouse_quantity": 6,
            "reorder_level": 10
        }))
        .unwrap();
        assert_eq!(p.total_quantity(), 10);
        assert!(p.needs_reorder());
        assert!((p.computed_stock_value() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn draft_omits_unset_options() {
        let draft = ProductDraft {
            name: "Widget".into(),
            ..ProductDraft::default()
        };
        let v = serde_json::to_value(&draft).unwrap();
        assert!(v.get("id").is_none());
        assert!(v.get("category").is_none());
        assert_eq!(v["name"], json!("Widget"));
    }
}
