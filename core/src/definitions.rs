//! Static, scenario-scoped definition tables consumed read-only by the world.
//!
//! Every table is indexed by a contiguous type identifier. Index zero holds the
//! null definition so that `*TypeId::NULL` never resolves to a usable entry.

use serde::{Deserialize, Serialize};

use crate::{
    CreatureTypeId, GameObjectTypeId, MapDimensions, PlayerId, RoomTypeId, TerrainTypeId,
};

/// Describes the behaviour of one terrain type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainDefinition {
    /// Unique name used for lookups by name.
    pub name: String,
    /// Identifier of the definition; equals its index in the terrain table.
    pub terrain_type: TerrainTypeId,
    /// Blocks movement and room placement.
    pub is_solid: bool,
    /// Can be claimed by a player.
    pub is_ownable: bool,
    /// Terrain is lava.
    pub is_lava: bool,
    /// Terrain is water.
    pub is_water: bool,
    /// Terrain can never be damaged or repaired.
    pub is_impenetrable: bool,
    /// Terrain can be marked as a dig target.
    pub is_taggable: bool,
    /// Terrain the tile turns into once destroyed.
    pub becomes_when_destroyed: TerrainTypeId,
    /// Terrain the tile turns into once repaired to full health.
    pub becomes_when_max_health: TerrainTypeId,
}

impl TerrainDefinition {
    /// Reports whether damage and repair requests leave this terrain untouched.
    #[must_use]
    pub const fn is_indestructible(&self) -> bool {
        self.is_lava || self.is_water || self.is_impenetrable
    }
}

/// Describes the placement rules and terrain of one room type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomDefinition {
    /// Unique name used for lookups by name.
    pub name: String,
    /// Identifier of the definition; equals its index in the room table.
    pub room_type: RoomTypeId,
    /// Terrain applied to tiles covered by the room.
    pub terrain_type: TerrainTypeId,
    /// Room can be placed on claimed, non-solid ground.
    pub placeable_on_land: bool,
    /// Room can be placed over lava.
    pub placeable_on_lava: bool,
    /// Room can be placed over water.
    pub placeable_on_water: bool,
    /// Room can be built and sold by players.
    pub buildable: bool,
}

impl RoomDefinition {
    /// Reports whether the room spans lava or water rather than claimed land.
    #[must_use]
    pub const fn is_bridge(&self) -> bool {
        !self.placeable_on_land && (self.placeable_on_lava || self.placeable_on_water)
    }
}

/// Material a game object is made of.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameObjectMaterial {
    /// No specific material.
    #[default]
    None,
    /// Flesh.
    Flesh,
    /// Rock.
    Rock,
    /// Wood.
    Wood,
    /// Light metal.
    Metal1,
    /// Heavy metal.
    Metal2,
    /// Magic.
    Magic,
    /// Glass.
    Glass,
}

/// Describes one game object type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameObjectDefinition {
    /// Unique name used for lookups by name.
    pub name: String,
    /// Identifier of the definition; equals its index in the object table.
    pub object_type: GameObjectTypeId,
    /// Material the object is made of.
    pub material: GameObjectMaterial,
}

/// Describes one creature type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureDefinition {
    /// Unique name used for lookups by name.
    pub name: String,
    /// Identifier of the definition; equals its index in the creature table.
    pub creature_type: CreatureTypeId,
}

/// Terrain underneath a bridge tile baked into the scenario.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeTerrain {
    /// The tile is not a bridge or the underlay is unspecified.
    #[default]
    None,
    /// The bridge spans lava.
    Lava,
    /// The bridge spans water.
    Water,
}

/// Per-tile data baked into the scenario.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapTileData {
    /// Terrain placed on the tile, possibly a room terrain.
    pub terrain_type: TerrainTypeId,
    /// Player owning the tile.
    pub owner: PlayerId,
    /// Terrain under the bridge when the tile holds a bridge room.
    pub terrain_under_the_bridge: BridgeTerrain,
}

/// Scenario blob supplying map layout and definition tables.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioData {
    /// Map dimensions in tiles.
    pub dimensions: MapDimensions,
    /// Row-major tile data, `dimensions.width * dimensions.height` entries.
    pub tiles: Vec<MapTileData>,
    /// Terrain table indexed by [`TerrainTypeId`].
    pub terrain_definitions: Vec<TerrainDefinition>,
    /// Room table indexed by [`RoomTypeId`].
    pub room_definitions: Vec<RoomDefinition>,
    /// Game object table indexed by [`GameObjectTypeId`].
    pub game_object_definitions: Vec<GameObjectDefinition>,
    /// Creature table indexed by [`CreatureTypeId`].
    pub creature_definitions: Vec<CreatureDefinition>,
    /// Terrain used under lava bridges.
    pub lava_terrain: TerrainTypeId,
    /// Terrain used under water bridges.
    pub water_terrain: TerrainTypeId,
    /// Claimed path terrain placed under land rooms.
    pub player_coloured_path_terrain: TerrainTypeId,
    /// Claimed wall terrain.
    pub player_coloured_wall_terrain: TerrainTypeId,
    /// Terrain shown over hidden tiles.
    pub fog_of_war_terrain: TerrainTypeId,
}
