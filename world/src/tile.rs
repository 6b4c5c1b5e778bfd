//! Per-tile state stored inside the map arena.

use keeper_core::{PlayerId, RoomInstanceId, TerrainTypeId, TileLocation};

/// Single cell of the dungeon map.
///
/// Terrain is layered: the fog-of-war override hides the room override, which
/// in turn hides the base terrain. [`TerrainTile::terrain`] resolves the layer
/// that currently governs the tile.
#[derive(Clone, Debug)]
pub struct TerrainTile {
    location: TileLocation,
    random_value: u32,
    pub(crate) base_terrain: TerrainTypeId,
    pub(crate) room_terrain: Option<TerrainTypeId>,
    pub(crate) fog_of_war_terrain: Option<TerrainTypeId>,
    pub(crate) owner: PlayerId,
    pub(crate) built_room: Option<RoomInstanceId>,
    pub(crate) flood_fill_generation: u32,
    pub(crate) is_tagged: bool,
    pub(crate) is_room_inner_tile: bool,
    pub(crate) is_room_entrance: bool,
    pub(crate) mesh_invalidated: bool,
}

impl TerrainTile {
    pub(crate) fn new(location: TileLocation, random_value: u32) -> Self {
        Self {
            location,
            random_value,
            base_terrain: TerrainTypeId::NULL,
            room_terrain: None,
            fog_of_war_terrain: None,
            owner: PlayerId::Null,
            built_room: None,
            flood_fill_generation: 0,
            is_tagged: false,
            is_room_inner_tile: false,
            is_room_entrance: false,
            mesh_invalidated: false,
        }
    }

    /// Logical location of the tile; fixed once the map is set up.
    #[must_use]
    pub const fn location(&self) -> TileLocation {
        self.location
    }

    /// Effective terrain after applying fog-of-war and room overrides.
    #[must_use]
    pub fn terrain(&self) -> TerrainTypeId {
        self.fog_of_war_terrain
            .or(self.room_terrain)
            .unwrap_or(self.base_terrain)
    }

    /// Terrain beneath any room or fog-of-war override.
    #[must_use]
    pub const fn base_terrain(&self) -> TerrainTypeId {
        self.base_terrain
    }

    /// Room terrain override, present while the tile carries room terrain.
    #[must_use]
    pub const fn room_terrain(&self) -> Option<TerrainTypeId> {
        self.room_terrain
    }

    /// Fog-of-war override, present while the tile is hidden.
    #[must_use]
    pub const fn fog_of_war_terrain(&self) -> Option<TerrainTypeId> {
        self.fog_of_war_terrain
    }

    /// Player owning the tile.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Room instance built on the tile, if any.
    #[must_use]
    pub const fn built_room(&self) -> Option<RoomInstanceId> {
        self.built_room
    }

    /// Cosmetic random value derived from the map seed.
    #[must_use]
    pub const fn random_value(&self) -> u32 {
        self.random_value
    }

    /// Reports whether the tile is marked as a dig target.
    #[must_use]
    pub const fn is_tagged(&self) -> bool {
        self.is_tagged
    }

    /// Reports whether all eight neighbours belong to the same room.
    ///
    /// Only meaningful while the tile is part of a room.
    #[must_use]
    pub const fn is_room_inner_tile(&self) -> bool {
        self.is_room_inner_tile
    }

    /// Reports whether the tile opens onto passable ground outside its room.
    ///
    /// Only meaningful while the tile is part of a room.
    #[must_use]
    pub const fn is_room_entrance(&self) -> bool {
        self.is_room_entrance
    }

    /// Reports whether the render layer still has to rebuild the tile mesh.
    #[must_use]
    pub const fn is_mesh_invalidated(&self) -> bool {
        self.mesh_invalidated
    }

    /// Marks the mesh as stale, returning `true` when it was up to date before.
    pub(crate) fn invalidate_mesh(&mut self) -> bool {
        !std::mem::replace(&mut self.mesh_invalidated, true)
    }

    pub(crate) fn clear_room_flags(&mut self) {
        self.is_room_inner_tile = false;
        self.is_room_entrance = false;
    }
}
