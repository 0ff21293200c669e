use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Report {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "titulo", default)]
    pub title: Option<String>,
    #[serde(rename = "contenido", default)]
    pub content: Option<String>,
    #[serde(rename = "casoId", default)]
    pub case_id: Option<String>,
    #[serde(rename = "usuarioId", default)]
    pub author_id: Option<String>,
    #[serde(rename = "evidencias", default)]
    pub evidence_ids: Vec<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ReportInput {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "contenido", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "casoId", skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(rename = "usuarioId", skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}
