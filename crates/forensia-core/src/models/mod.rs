//! Data models for the forensic case-management service.
//!
//! The service owns these payloads; the core only relies on each one having a
//! stable identifier. Fields the models do not name are kept in a flattened
//! `extra` map so a record fetched and sent back is not silently truncated.
//!
//! - `Evidence`, `EvidenceImage`: collected evidence and its photo set
//! - `Victim`: victims attached to a case
//! - `Odontogram`: dental charts used for identification
//! - `Report`: case reports authored by investigators

pub mod evidence;
pub mod odontogram;
pub mod report;
pub mod victim;

use serde::{de::DeserializeOwned, Serialize};

pub use evidence::{Evidence, EvidenceImage, EvidenceImageInput, EvidenceInput};
pub use odontogram::{Odontogram, OdontogramInput, ToothRecord};
pub use report::{Report, ReportInput};
pub use victim::{Victim, VictimInput};

/// A record the controllers can cache and patch by id.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Identifier assigned by the service.
    fn id(&self) -> &str;

    /// Case the record is filed under, for resources scoped to a case.
    fn case_id(&self) -> Option<&str> {
        None
    }
}

impl Record for Evidence {
    fn id(&self) -> &str {
        &self.id
    }

    fn case_id(&self) -> Option<&str> {
        self.case_id.as_deref()
    }
}

impl Record for EvidenceImage {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Odontogram {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Report {
    fn id(&self) -> &str {
        &self.id
    }

    fn case_id(&self) -> Option<&str> {
        self.case_id.as_deref()
    }
}

impl Record for Victim {
    fn id(&self) -> &str {
        &self.id
    }

    fn case_id(&self) -> Option<&str> {
        self.case_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_id_is_exposed_where_records_have_one() {
        let evidence: Evidence =
            serde_json::from_str(r#"{"id":"e1","casoId":"c3"}"#).expect("evidence json");
        let victim: Victim = serde_json::from_str(r#"{"id":"v1"}"#).expect("victim json");
        let odontogram: Odontogram =
            serde_json::from_str(r#"{"id":"o1"}"#).expect("odontogram json");

        assert_eq!(Record::case_id(&evidence), Some("c3"));
        assert_eq!(Record::case_id(&victim), None);
        assert_eq!(Record::case_id(&odontogram), None);
    }
}
