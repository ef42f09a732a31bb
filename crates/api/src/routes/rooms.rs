//! Room catalog for the leader's room picker.

use axum::{extract::State, Json};
use domain::models::room::{room_availability, RoomCatalogResponse};
use persistence::repositories::TeamRepository;
use std::collections::HashMap;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::UserAuth;

/// Finalized team count per stored room value.
pub(crate) async fn occupancy_by_room(
    repo: &TeamRepository,
) -> Result<HashMap<String, i64>, ApiError> {
    Ok(repo
        .room_occupancy()
        .await?
        .into_iter()
        .map(|r| (r.room, r.occupied))
        .collect())
}

/// List selectable rooms with remaining capacity.
///
/// GET /api/v1/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    _user_auth: UserAuth,
) -> Result<Json<RoomCatalogResponse>, ApiError> {
    let repo = TeamRepository::new(state.pool.clone());
    let occupancy = occupancy_by_room(&repo).await?;
    Ok(Json(room_availability(&occupancy)))
}
