use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DeveloperRequest {
    pub name: String,
}
