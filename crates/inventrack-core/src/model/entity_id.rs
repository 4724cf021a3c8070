// ── Record identity ──
//
// Servers hand out numeric, UUID, or opaque string identifiers depending
// on the backing table. EntityId accepts all three and compares by value.
// Strings are parsed the same way whether they come off the wire or from
// user input, so `"5"` and `5` are one identifier.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical identifier for any InvenTrack record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum EntityId {
    Numeric(i64),
    Uuid(Uuid),
    Text(String),
}

impl EntityId {
    pub fn as_numeric(&self) -> Option<i64> {
        match self {
            Self::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Self::Uuid(u) => Some(u),
            _ => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Numeric(i64),
            Text(String),
        }
        Ok(match Wire::deserialize(de)? {
            Wire::Numeric(n) => Self::Numeric(n),
            Wire::Text(s) => Self::from(s),
        })
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self::Numeric(n)
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        if let Ok(n) = s.parse::<i64>() {
            return Self::Numeric(n);
        }
        match Uuid::parse_str(&s) {
            Ok(u) => Self::Uuid(u),
            Err(_) => Self::Text(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_from_numeric_string() {
        let id = EntityId::from("42");
        assert_eq!(id.as_numeric(), Some(42));
    }

    #[test]
    fn entity_id_from_uuid_string() {
        let id = EntityId::from("550e8400-e29b-41d4-a716-446655440000".to_owned());
        assert!(id.as_uuid().is_some());
    }

    #[test]
    fn entity_id_from_opaque_string() {
        let id: EntityId = "sup_7Hc2".parse().unwrap();
        assert_eq!(id, EntityId::Text("sup_7Hc2".into()));
    }

    #[test]
    fn entity_id_wire_forms() {
        let ids: Vec<EntityId> =
            serde_json::from_str(r#"[5, "550e8400-e29b-41d4-a716-446655440000", "abc"]"#)
                .unwrap();
        assert_eq!(ids[0], EntityId::Numeric(5));
        assert!(ids[1].as_uuid().is_some());
        assert_eq!(ids[2], EntityId::Text("abc".into()));
        assert_eq!(serde_json::to_string(&ids[0]).unwrap(), "5");
    }

    #[test]
    fn quoted_numeric_id_matches_parsed_form() {
        let wire: EntityId = serde_json::from_value(serde_json::json!("5")).unwrap();
        assert_eq!(wire, EntityId::from("5"));
        assert_eq!(wire, EntityId::Numeric(5));

        let uuid: EntityId =
            serde_json::from_value(serde_json::json!("550e8400-e29b-41d4-a716-446655440000"))
                .unwrap();
        assert_eq!(uuid, EntityId::from("550e8400-e29b-41d4-a716-446655440000"));
    }

    #[test]
    fn numeric_and_string_forms_match() {
        assert_eq!(EntityId::from("5"), EntityId::from(5));
        assert_eq!(EntityId::from(5).to_string(), "5");
    }
}
