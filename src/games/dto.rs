use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::games::repo::GameRow;
use crate::platforms::repo::Platform;

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub title: String,
    pub description: String,
    #[serde(with = "date_format")]
    pub last_update: Date,
    #[serde(with = "date_format")]
    pub release_date: Date,
    #[serde(default)]
    pub image: Option<String>,
    pub developer_id: Uuid,
    pub category_id: Uuid,
    pub platform_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGameRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "date_format::option")]
    pub last_update: Option<Date>,
    #[serde(default, with = "date_format::option")]
    pub release_date: Option<Date>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub developer_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub platform_ids: Option<Vec<Uuid>>,
}

/// Game with its resolved developer/category names and platforms.
#[derive(Debug, Serialize)]
pub struct GameDetails {
    #[serde(flatten)]
    pub game: GameRow,
    pub platforms: Vec<Platform>,
}
