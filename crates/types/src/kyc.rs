use serde::{Deserialize, Serialize};

use crate::MappingError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralKycForm {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub documents: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporateKycForm {
    pub company: String,
    #[serde(default)]
    pub headquarters: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub team_size: Option<u32>,
}

/// KYC form data as submitted in a blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KycForm {
    Empty,
    General(GeneralKycForm),
    Corporate(CorporateKycForm),
}

impl KycForm {
    pub const FIRST_NAME_KEY: &'static str = "first_name";
    pub const COMPANY_KEY: &'static str = "company";

    /// Detect the form type by its distinguishing key and parse it
    pub fn from_blob_value(value: &str) -> Result<Self, MappingError> {
        let json: serde_json::Value = serde_json::from_str(value)?;

        if json.get(Self::FIRST_NAME_KEY).is_some() {
            Ok(KycForm::General(serde_json::from_value(json)?))
        } else if json.get(Self::COMPANY_KEY).is_some() {
            Ok(KycForm::Corporate(serde_json::from_value(json)?))
        } else {
            Err(MappingError::Unsupported("unknown KYC form type".to_string()))
        }
    }
}

/// Lifecycle of the account's identity verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum KycState {
    Empty,
    Pending {
        form: KycForm,
        request_id: u64,
    },
    Approved {
        form: KycForm,
        request_id: u64,
    },
    Rejected {
        form: KycForm,
        request_id: u64,
        reject_reason: String,
    },
}

impl KycState {
    pub fn is_submitted(&self) -> bool {
        !matches!(self, KycState::Empty)
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, KycState::Approved { .. })
    }

    pub fn form(&self) -> Option<&KycForm> {
        match self {
            KycState::Empty => None,
            KycState::Pending { form, .. }
            | KycState::Approved { form, .. }
            | KycState::Rejected { form, .. } => Some(form),
        }
    }

    pub fn request_id(&self) -> Option<u64> {
        match self {
            KycState::Empty => None,
            KycState::Pending { request_id, .. }
            | KycState::Approved { request_id, .. }
            | KycState::Rejected { request_id, .. } => Some(*request_id),
        }
    }
}

/// Account type forced at sign-in regardless of the KYC form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForcedAccountType {
    General,
    Corporate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_form_detected() {
        let form =
            KycForm::from_blob_value(r#"{"first_name": "Ann", "last_name": "Lee"}"#).unwrap();

        match form {
            KycForm::General(general) => assert_eq!(general.first_name, "Ann"),
            other => panic!("unexpected form {other:?}"),
        }
    }

    #[test]
    fn test_corporate_form_detected() {
        let form = KycForm::from_blob_value(r#"{"company": "Coffee Shop", "team_size": 4}"#)
            .unwrap();

        assert!(matches!(form, KycForm::Corporate(ref c) if c.team_size == Some(4)));
    }

    #[test]
    fn test_unknown_form_rejected() {
        assert!(matches!(
            KycForm::from_blob_value(r#"{"nickname": "x"}"#),
            Err(MappingError::Unsupported(_))
        ));
        assert!(matches!(
            KycForm::from_blob_value("not json"),
            Err(MappingError::Json(_))
        ));
    }

    #[test]
    fn test_state_accessors() {
        let state = KycState::Rejected {
            form: KycForm::Empty,
            request_id: 12,
            reject_reason: "blurry photo".to_string(),
        };

        assert!(state.is_submitted());
        assert!(!state.is_approved());
        assert_eq!(state.request_id(), Some(12));
        assert_eq!(state.form(), Some(&KycForm::Empty));
        assert!(!KycState::Empty.is_submitted());
    }

    #[test]
    fn test_state_survives_persistence_format() {
        let state = KycState::Approved {
            form: KycForm::Corporate(CorporateKycForm {
                company: "Coffee Shop".to_string(),
                headquarters: None,
                industry: Some("food".to_string()),
                homepage: None,
                team_size: None,
            }),
            request_id: 3,
        };

        let json = serde_json::to_string(&state).unwrap();
        let restored: KycState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }
}
