use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PlatformRequest {
    pub name: String,
}
