//! Room catalog and placement policy.
//!
//! Rooms are a static catalog rather than a table. Ordinary rooms hold at most
//! two finalized teams, the overflow room is effectively unbounded and is the
//! forced destination for solo teams, and the `unassigned` pseudo-room collects
//! every team without a catalog room.

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Overflow room id.
pub const OVERFLOW_ROOM: &str = "Library";

/// Pseudo-room id used on the admin board.
pub const UNASSIGNED_ROOM: &str = "unassigned";

/// Capacity of every ordinary room.
pub const ORDINARY_ROOM_CAPACITY: i64 = 2;

/// Nominal capacity of the overflow and unassigned rooms.
pub const UNBOUNDED_CAPACITY: i64 = 999;

const ORDINARY_ROOMS: [&str; 30] = [
    "124",
    "123",
    "121",
    "119",
    "115",
    "103",
    "105",
    "107",
    "201",
    "203",
    "205",
    "207",
    "209",
    "202",
    "204",
    "206",
    "216",
    "211",
    "213",
    "215",
    "217",
    "219",
    "223",
    "225",
    "227",
    "220",
    "222",
    "228",
    "230",
    "Library Conference Room",
];

/// Room placement errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room {0} is at full capacity")]
    RoomFull(String),

    #[error("Unknown room: {0}")]
    UnknownRoom(String),

    #[error("Single-member teams must stay in the Library")]
    SoloTeamPinned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Ordinary,
    Overflow,
    Unassigned,
}

/// A catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Room {
    pub id: &'static str,
    pub kind: RoomKind,
}

impl Room {
    const fn ordinary(id: &'static str) -> Self {
        Self {
            id,
            kind: RoomKind::Ordinary,
        }
    }

    pub const fn overflow() -> Self {
        Self {
            id: OVERFLOW_ROOM,
            kind: RoomKind::Overflow,
        }
    }

    pub const fn unassigned() -> Self {
        Self {
            id: UNASSIGNED_ROOM,
            kind: RoomKind::Unassigned,
        }
    }

    pub fn max_teams(&self) -> i64 {
        match self.kind {
            RoomKind::Ordinary => ORDINARY_ROOM_CAPACITY,
            RoomKind::Overflow | RoomKind::Unassigned => UNBOUNDED_CAPACITY,
        }
    }

    /// Only ordinary rooms enforce capacity.
    pub fn is_bounded(&self) -> bool {
        self.kind == RoomKind::Ordinary
    }

    /// Human-readable label.
    pub fn name(&self) -> String {
        match self.kind {
            RoomKind::Ordinary if self.id.chars().all(|c| c.is_ascii_digit()) => {
                format!("Room {}", self.id)
            }
            RoomKind::Unassigned => "Unassigned Teams".to_string(),
            _ => self.id.to_string(),
        }
    }

    /// Value written to `teams.room`.
    pub fn storage_value(&self) -> &'static str {
        match self.kind {
            RoomKind::Unassigned => "",
            _ => self.id,
        }
    }

    /// Fails with `RoomFull` when `occupied` (excluding the team being placed)
    /// already fills the room.
    pub fn check_capacity(&self, occupied: i64) -> Result<(), RoomError> {
        if self.is_bounded() && occupied >= self.max_teams() {
            return Err(RoomError::RoomFull(self.id.to_string()));
        }
        Ok(())
    }
}

/// Rooms a leader can pick at finalize time: every ordinary room plus the
/// overflow room.
pub fn selectable_rooms() -> Vec<Room> {
    ORDINARY_ROOMS
        .iter()
        .copied()
        .map(Room::ordinary)
        .chain(std::iter::once(Room::overflow()))
        .collect()
}

/// Columns of the admin board, in display order.
pub fn board_rooms() -> Vec<Room> {
    let mut rooms = selectable_rooms();
    rooms.push(Room::unassigned());
    rooms
}

/// Looks up a room by id, including the `unassigned` pseudo-room.
pub fn find_room(id: &str) -> Option<Room> {
    if id == OVERFLOW_ROOM {
        return Some(Room::overflow());
    }
    if id == UNASSIGNED_ROOM {
        return Some(Room::unassigned());
    }
    ORDINARY_ROOMS
        .iter()
        .copied()
        .find(|r| *r == id)
        .map(Room::ordinary)
}

/// Board column for a stored `teams.room` value. Anything that is not a
/// catalog room (`TBD`, empty, stale ids) lands in `unassigned`.
pub fn board_bucket(stored_room: &str) -> Room {
    match find_room(stored_room) {
        Some(room) if room.kind != RoomKind::Unassigned => room,
        _ => Room::unassigned(),
    }
}

/// Where a placement lands and whether capacity must be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub room: Room,
    pub check_capacity: bool,
}

impl Placement {
    fn checked(room: Room) -> Self {
        Self {
            room,
            check_capacity: room.is_bounded(),
        }
    }

    fn unchecked(room: Room) -> Self {
        Self {
            room,
            check_capacity: false,
        }
    }
}

/// Resolves the destination of a leader's finalize request.
///
/// Returns `Ok(None)` when a room choice is required but missing. Solo teams
/// always go to the overflow room whatever was requested.
pub fn plan_finalize(
    accepted_members: i64,
    desired_room: Option<&str>,
) -> Result<Option<Placement>, RoomError> {
    if accepted_members <= 1 {
        return Ok(Some(Placement::unchecked(Room::overflow())));
    }

    let Some(desired) = desired_room.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    match find_room(desired) {
        Some(room) if room.kind != RoomKind::Unassigned => Ok(Some(Placement::checked(room))),
        _ => Err(RoomError::UnknownRoom(desired.to_string())),
    }
}

/// Resolves the destination of an admin board move.
pub fn plan_admin_move(
    accepted_members: i64,
    current_room: &str,
    destination: &str,
) -> Result<Placement, RoomError> {
    let room =
        find_room(destination).ok_or_else(|| RoomError::UnknownRoom(destination.to_string()))?;

    let is_solo = accepted_members <= 1;
    if is_solo && current_room == OVERFLOW_ROOM && room.kind != RoomKind::Overflow {
        return Err(RoomError::SoloTeamPinned);
    }

    Ok(Placement::checked(room))
}

/// Pure placement: resolves the destination and checks capacity against
/// `occupancy`, the finalized team count per room excluding the team
/// being placed.
pub fn assign(
    accepted_members: i64,
    desired_room: Option<&str>,
    occupancy: &HashMap<String, i64>,
) -> Result<Option<Room>, RoomError> {
    let Some(placement) = plan_finalize(accepted_members, desired_room)? else {
        return Ok(None);
    };
    if placement.check_capacity {
        let occupied = occupancy.get(placement.room.id).copied().unwrap_or(0);
        placement.room.check_capacity(occupied)?;
    }
    Ok(Some(placement.room))
}

/// A team card on the admin board.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BoardTeam {
    pub id: Uuid,
    pub name: String,
    pub room: String,
    pub is_finalized: bool,
    pub confirmed: bool,
    pub member_count: i64,
}

/// One column of the admin board.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RoomBoardColumn {
    pub room: Room,
    pub name: String,
    pub max_teams: i64,
    /// Finalized teams counted against capacity.
    pub occupancy: i64,
    pub teams: Vec<BoardTeam>,
}

/// Response for the admin board.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RoomBoardResponse {
    pub rooms: Vec<RoomBoardColumn>,
}

/// Groups teams into board columns.
pub fn build_board(teams: Vec<BoardTeam>) -> RoomBoardResponse {
    let mut columns: Vec<RoomBoardColumn> = board_rooms()
        .into_iter()
        .map(|room| RoomBoardColumn {
            name: room.name(),
            max_teams: room.max_teams(),
            occupancy: 0,
            teams: Vec::new(),
            room,
        })
        .collect();

    for team in teams {
        let bucket = board_bucket(&team.room);
        if let Some(column) = columns.iter_mut().find(|c| c.room.id == bucket.id) {
            if team.is_finalized && bucket.kind != RoomKind::Unassigned {
                column.occupancy += 1;
            }
            column.teams.push(team);
        }
    }

    RoomBoardResponse { rooms: columns }
}

/// Availability of a selectable room for the leader's picker.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RoomAvailability {
    pub id: &'static str,
    pub name: String,
    pub max_teams: i64,
    pub occupied: i64,
    pub remaining: i64,
    pub is_full: bool,
}

/// Response for the room catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RoomCatalogResponse {
    pub data: Vec<RoomAvailability>,
}

/// Builds the picker list from finalized counts per room.
pub fn room_availability(occupancy: &HashMap<String, i64>) -> RoomCatalogResponse {
    let data = selectable_rooms()
        .into_iter()
        .map(|room| {
            let occupied = occupancy.get(room.id).copied().unwrap_or(0);
            let remaining = (room.max_teams() - occupied).max(0);
            RoomAvailability {
                id: room.id,
                name: room.name(),
                max_teams: room.max_teams(),
                occupied,
                remaining,
                is_full: room.is_bounded() && remaining == 0,
            }
        })
        .collect();
    RoomCatalogResponse { data }
}
