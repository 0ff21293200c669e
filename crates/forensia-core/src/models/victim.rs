use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Victim {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "casoId", default)]
    pub case_id: Option<String>,
    #[serde(rename = "identificada", default)]
    pub identified: bool,
    #[serde(rename = "evidencias", default)]
    pub evidence_ids: Vec<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

impl Victim {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Sin identificar")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct VictimInput {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "casoId", skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(rename = "identificada", skip_serializing_if = "Option::is_none")]
    pub identified: Option<bool>,
}
