use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Evidence {
    // Some endpoints still answer with the storage-level "_id"
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "tipo", default)]
    pub kind: Option<String>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "casoId", default)]
    pub case_id: Option<String>,
    #[serde(rename = "ubicacion", default)]
    pub location: Option<String>,
    #[serde(rename = "fechaRecoleccion", default)]
    pub collected_at: Option<String>,
    #[serde(rename = "imagenes", default)]
    pub image_ids: Vec<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

impl Evidence {
    pub fn has_image(&self, image_id: &str) -> bool {
        self.image_ids.iter().any(|i| i == image_id)
    }

    pub fn belongs_to_case(&self, case_id: &str) -> bool {
        self.case_id.as_deref() == Some(case_id)
    }

    /// Short label for lists: "Foto - Casquillo 9mm"
    pub fn label(&self) -> String {
        match (&self.kind, &self.description) {
            (Some(k), Some(d)) => format!("{} - {}", k, d),
            (Some(k), None) => k.clone(),
            (None, Some(d)) => d.clone(),
            (None, None) => self.id.clone(),
        }
    }
}

/// Payload for creating or updating evidence. Unset fields are omitted on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct EvidenceInput {
    #[serde(rename = "tipo", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "casoId", skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(rename = "ubicacion", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "fechaRecoleccion", skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<String>,
}

impl EvidenceInput {
    pub fn with_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }
}

/// A photo attached to a piece of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct EvidenceImage {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "evidenciaId", default)]
    pub evidence_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct EvidenceImageInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
