//! API models for request and response payloads

use common::{Image, NewUser};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repositories::DeleteResult;
use crate::upload::RejectedFile;

/// Request relayed by the client after a sign-in/sign-up event
///
/// Fields are optional here so that a missing id or email is answered with
/// a 400 rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub id: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl CreateUserRequest {
    pub fn into_new_user(self) -> Result<NewUser, String> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| "User id and email are required".to_string())?;
        let email = self
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| "User id and email are required".to_string())?;

        Ok(NewUser {
            id,
            email,
            full_name: self.full_name,
            avatar_url: self.avatar_url,
        })
    }
}

/// Response for a gallery upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub images: Vec<Image>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedFile>,
}

/// Request for a batch delete
#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<Uuid>,
}

/// Response for a batch delete, one entry per requested id
#[derive(Debug, Serialize)]
pub struct BatchDeleteResponse {
    pub results: Vec<DeleteResult>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_are_reported() {
        let request: CreateUserRequest =
            serde_json::from_str(r#"{ "email": "ada@example.com" }"#).unwrap();
        assert!(request.into_new_user().is_err());

        let request: CreateUserRequest =
            serde_json::from_str(r#"{ "id": "u1", "email": "", "fullName": "Ada" }"#).unwrap();
        assert!(request.into_new_user().is_err());

        let request: CreateUserRequest = serde_json::from_str(
            r#"{ "id": "u1", "email": "ada@example.com", "fullName": "Ada" }"#,
        )
        .unwrap();
        let user = request.into_new_user().unwrap();
        assert_eq!(user.full_name.as_deref(), Some("Ada"));
    }
}
