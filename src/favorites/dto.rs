use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::games::repo::Game;

#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub game_id: uuid::Uuid,
}

#[derive(Debug, Serialize)]
pub struct FavoriteDetails {
    pub game: Game,
    #[serde(with = "time::serde::rfc3339")]
    pub favorited_at: OffsetDateTime,
}
