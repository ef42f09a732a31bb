//! Admin room board.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::realtime::{tables, ChangeEvent};
use domain::models::room::{build_board, plan_admin_move, Room, RoomBoardResponse, RoomError};
use domain::models::team::MoveTeamRoomRequest;
use domain::models::Team;
use persistence::repositories::{PlacementMode, PlacementOutcome, TeamRepository};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;
use crate::middleware::metrics::record_team_placed;

/// Every room with its teams, plus the `unassigned` column.
///
/// GET /api/v1/admin/rooms/board
pub async fn room_board(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<RoomBoardResponse>, ApiError> {
    let teams = TeamRepository::new(state.pool.clone())
        .list_board_teams()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(build_board(teams)))
}

/// Move a team to another room.
///
/// PUT /api/v1/admin/teams/:team_id/room
///
/// Runs the same capacity check as finalize. Leaves the finalized flag
/// alone, so finalized teams can be moved too.
pub async fn move_team(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(team_id): Path<Uuid>,
    Json(request): Json<MoveTeamRoomRequest>,
) -> Result<Json<Team>, ApiError> {
    request.validate()?;

    let destination = request.room.trim();
    let repo = TeamRepository::new(state.pool.clone());
    let outcome = repo
        .place_in_room(team_id, PlacementMode::AdminMove, |current, accepted| {
            plan_admin_move(accepted, &current.room, destination)
        })
        .await?;

    let (moved, room): (Team, Room) = match outcome {
        PlacementOutcome::Placed {
            team, placement, ..
        } => (team.into(), placement.room),
        PlacementOutcome::Refused(err) => return Err(err.into()),
        PlacementOutcome::RoomFull {
            placement,
            occupied,
        } => {
            let room = placement.room.id;
            warn!(team_id = %team_id, room, occupied, "Room full on admin move");
            return Err(RoomError::RoomFull(room.to_string()).into());
        }
        PlacementOutcome::NotApplied => {
            return Err(ApiError::NotFound("Team not found".to_string()))
        }
    };

    info!(
        team_id = %moved.id,
        to = room.id,
        admin_id = %admin.user_id(),
        "Team moved"
    );
    record_team_placed("admin_move", room.id);

    state
        .realtime
        .publish_change(ChangeEvent::update(tables::TEAMS, &moved));

    Ok(Json(moved))
}
