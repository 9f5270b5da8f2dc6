use serde::{Deserialize, Serialize};

use crate::auth::store::{RoleRecord, UserRecord};
use crate::response::ApiResponse;

/// Admin registration carries the creator's credentials alongside the new
/// account fields.
#[derive(Debug, Deserialize)]
pub struct RegisterAdminRequest {
    #[serde(rename = "emailCreator")]
    pub email_creator: String,
    #[serde(rename = "passwordCreator")]
    pub password_creator: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterVisitRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedUserData {
    #[serde(rename = "createdUser")]
    pub created_user: UserRecord,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Profile response body. The user travels as `data`; `role_info` is a
/// top-level sibling, where existing clients read it.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub envelope: ApiResponse<UserRecord>,
    pub role_info: Vec<RoleRecord>,
}
