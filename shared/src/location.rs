//! Block / floor / room hierarchy and the cascading picker over it.

use serde::{Deserialize, Deserializer, Serialize};

use crate::ValidationError;

numeric_id!(BlockId);
numeric_id!(FloorId);
numeric_id!(RoomId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(default)]
    pub block_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Only present on endpoints that embed the hierarchy.
    #[serde(default)]
    pub floors: Vec<Floor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub id: FloorId,
    pub floor_no: i32,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    #[serde(deserialize_with = "string_or_number")]
    pub room_no: String,
}

impl Floor {
    #[must_use]
    pub fn label(&self) -> String {
        format!("Floor {}", self.floor_no)
    }
}

impl Room {
    #[must_use]
    pub fn label(&self) -> String {
        format!("Room {}", self.room_no)
    }
}

/// Room numbers are created as strings but some backends echo them as
/// numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockRequest<'a> {
    pub block_name: &'a str,
    pub description: &'a str,
}

impl<'a> CreateBlockRequest<'a> {
    pub fn new(block_name: &'a str, description: &'a str) -> Result<Self, ValidationError> {
        if block_name.trim().is_empty() {
            return Err(ValidationError::MissingBlockName);
        }
        Ok(Self {
            block_name: block_name.trim(),
            description: description.trim(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFloorRequest {
    pub block_id: BlockId,
    pub floor_no: i32,
}

impl CreateFloorRequest {
    pub fn new(block_id: Option<BlockId>, floor_no: &str) -> Result<Self, ValidationError> {
        let floor_no = floor_no.trim();
        let Some(block_id) = block_id.filter(|_| !floor_no.is_empty()) else {
            return Err(ValidationError::MissingFloorFields);
        };
        let floor_no = floor_no
            .parse::<i32>()
            .map_err(|_| ValidationError::InvalidFloorNumber(floor_no.to_string()))?;
        Ok(Self { block_id, floor_no })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest<'a> {
    pub floor_id: FloorId,
    pub room_no: &'a str,
}

impl<'a> CreateRoomRequest<'a> {
    pub fn new(floor_id: Option<FloorId>, room_no: &'a str) -> Result<Self, ValidationError> {
        let room_no = room_no.trim();
        match floor_id {
            Some(floor_id) if !room_no.is_empty() => Ok(Self { floor_id, room_no }),
            _ => Err(ValidationError::MissingRoomFields),
        }
    }
}

/// Totals over blocks that embed their floors and rooms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureCounts {
    pub blocks: usize,
    pub floors: usize,
    pub rooms: usize,
}

impl InfrastructureCounts {
    #[must_use]
    pub fn from_blocks(blocks: &[Block]) -> Self {
        let floors = blocks.iter().flat_map(|b| b.floors.iter());
        let (floor_count, room_count) =
            floors.fold((0, 0), |(f, r), floor| (f + 1, r + floor.rooms.len()));
        Self {
            blocks: blocks.len(),
            floors: floor_count,
            rooms: room_count,
        }
    }
}

/// Block → floor → room picker. Every level only ever holds options that
/// belong to the level above, so a completed selection is always consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationSelection {
    blocks: Vec<Block>,
    floors: Vec<Floor>,
    rooms: Vec<Room>,
    block: Option<BlockId>,
    floor: Option<FloorId>,
    room: Option<RoomId>,
}

impl LocationSelection {
    pub fn set_blocks(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
        if let Some(block) = self.block {
            if !self.blocks.iter().any(|b| b.id == block) {
                self.block = None;
                self.clear_floor_level();
            }
        }
    }

    /// Selects a block and drops the floor and room levels. Returns `false`
    /// for a block that is not among the loaded options.
    pub fn select_block(&mut self, id: BlockId) -> bool {
        if !self.blocks.iter().any(|b| b.id == id) {
            return false;
        }
        self.block = Some(id);
        self.clear_floor_level();
        true
    }

    /// Accepts floors fetched for `block`; ignored if the user has since
    /// picked another block.
    pub fn accept_floors(&mut self, block: BlockId, floors: Vec<Floor>) -> bool {
        if self.block != Some(block) {
            return false;
        }
        self.floors = floors;
        self.floor = None;
        self.clear_room_level();
        true
    }

    pub fn select_floor(&mut self, id: FloorId) -> bool {
        if self.block.is_none() || !self.floors.iter().any(|f| f.id == id) {
            return false;
        }
        self.floor = Some(id);
        self.clear_room_level();
        true
    }

    pub fn accept_rooms(&mut self, floor: FloorId, rooms: Vec<Room>) -> bool {
        if self.floor != Some(floor) {
            return false;
        }
        self.rooms = rooms;
        self.room = None;
        true
    }

    pub fn select_room(&mut self, id: RoomId) -> bool {
        if self.floor.is_none() || !self.rooms.iter().any(|r| r.id == id) {
            return false;
        }
        self.room = Some(id);
        true
    }

    /// Forgets the selection but keeps the loaded block list.
    pub fn clear_selection(&mut self) {
        self.block = None;
        self.clear_floor_level();
    }

    #[must_use]
    pub fn complete(&self) -> Option<(BlockId, FloorId, RoomId)> {
        Some((self.block?, self.floor?, self.room?))
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[must_use]
    pub fn floors(&self) -> &[Floor] {
        &self.floors
    }

    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    #[must_use]
    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    #[must_use]
    pub fn floor(&self) -> Option<FloorId> {
        self.floor
    }

    #[must_use]
    pub fn room(&self) -> Option<RoomId> {
        self.room
    }

    fn clear_floor_level(&mut self) {
        self.floors.clear();
        self.floor = None;
        self.clear_room_level();
    }

    fn clear_room_level(&mut self) {
        self.rooms.clear();
        self.room = None;
    }
}
