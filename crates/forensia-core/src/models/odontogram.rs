use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Dental chart recorded for a victim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Odontogram {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "victimaId", default)]
    pub victim_id: Option<String>,
    #[serde(rename = "piezas", default)]
    pub teeth: Vec<ToothRecord>,
    #[serde(rename = "observaciones", default)]
    pub notes: Option<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

/// State of a single tooth, FDI numbering (11-48).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ToothRecord {
    #[serde(rename = "numero")]
    pub number: u8,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "notas", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Odontogram {
    pub fn tooth(&self, number: u8) -> Option<&ToothRecord> {
        self.teeth.iter().find(|t| t.number == number)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct OdontogramInput {
    #[serde(rename = "victimaId", skip_serializing_if = "Option::is_none")]
    pub victim_id: Option<String>,
    #[serde(rename = "piezas", skip_serializing_if = "Option::is_none")]
    pub teeth: Option<Vec<ToothRecord>>,
    #[serde(rename = "observaciones", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
