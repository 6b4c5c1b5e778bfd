//! Validated, read-only view over the definition tables of a loaded scenario.

use keeper_core::{
    CreatureDefinition, CreatureTypeId, GameObjectDefinition, GameObjectTypeId, MapDimensions,
    RoomDefinition, RoomTypeId, ScenarioData, TerrainDefinition, TerrainTypeId,
};
use thiserror::Error;

/// Problems detected while validating scenario data.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    /// The tile array does not match the declared map dimensions.
    #[error("map of {width}x{height} tiles expects {expected} tile entries, found {actual}")]
    TileCountMismatch {
        /// Declared map width.
        width: u32,
        /// Declared map height.
        height: u32,
        /// Number of entries implied by the dimensions.
        expected: usize,
        /// Number of entries supplied.
        actual: usize,
    },
    /// A definition table lacks the reserved null entry.
    #[error("{table} table is missing the null definition at index 0")]
    EmptyTable {
        /// Name of the offending table.
        table: &'static str,
    },
    /// A definition declares an identifier that differs from its table index.
    #[error("{table} definition at index {index} declares identifier {declared}")]
    MisnumberedDefinition {
        /// Name of the offending table.
        table: &'static str,
        /// Position inside the table.
        index: usize,
        /// Identifier the definition declares.
        declared: u32,
    },
    /// A reference points past the end of the terrain table.
    #[error("{context} references unknown terrain {terrain}")]
    UnknownTerrain {
        /// Where the reference was found.
        context: String,
        /// Identifier that failed to resolve.
        terrain: u32,
    },
    /// A required special terrain was left unset.
    #[error("scenario does not define the {role} terrain")]
    MissingSpecialTerrain {
        /// Role of the missing terrain.
        role: &'static str,
    },
    /// Two room definitions claim the same terrain.
    #[error("terrain {terrain} is claimed by rooms `{first}` and `{second}`")]
    SharedRoomTerrain {
        /// Terrain claimed twice.
        terrain: u32,
        /// First room claiming the terrain.
        first: String,
        /// Second room claiming the terrain.
        second: String,
    },
}

/// Definition tables of the loaded scenario.
#[derive(Clone, Debug)]
pub struct Scenario {
    data: ScenarioData,
    room_by_terrain: Vec<RoomTypeId>,
}

impl Scenario {
    /// Validates the scenario data and builds the terrain-to-room index.
    pub fn new(data: ScenarioData) -> Result<Self, ScenarioError> {
        let dimensions = data.dimensions;
        if data.tiles.len() != dimensions.tile_count() {
            return Err(ScenarioError::TileCountMismatch {
                width: dimensions.width(),
                height: dimensions.height(),
                expected: dimensions.tile_count(),
                actual: data.tiles.len(),
            });
        }

        check_numbering("terrain", data.terrain_definitions.iter().map(|d| d.terrain_type.get()))?;
        check_numbering("room", data.room_definitions.iter().map(|d| d.room_type.get()))?;
        check_numbering(
            "game object",
            data.game_object_definitions.iter().map(|d| d.object_type.get()),
        )?;
        check_numbering(
            "creature",
            data.creature_definitions.iter().map(|d| d.creature_type.get()),
        )?;

        let terrain_count = data.terrain_definitions.len();
        let check_terrain = |context: &dyn Fn() -> String, terrain: TerrainTypeId| {
            if terrain.index() < terrain_count {
                Ok(())
            } else {
                Err(ScenarioError::UnknownTerrain {
                    context: context(),
                    terrain: terrain.get(),
                })
            }
        };

        for definition in &data.terrain_definitions {
            let context = || format!("terrain `{}`", definition.name);
            check_terrain(&context, definition.becomes_when_destroyed)?;
            check_terrain(&context, definition.becomes_when_max_health)?;
        }

        let mut room_by_terrain = vec![RoomTypeId::NULL; terrain_count];
        for definition in data.room_definitions.iter().skip(1) {
            check_terrain(&|| format!("room `{}`", definition.name), definition.terrain_type)?;
            if definition.terrain_type.is_null() {
                continue;
            }
            let slot = &mut room_by_terrain[definition.terrain_type.index()];
            if !slot.is_null() {
                return Err(ScenarioError::SharedRoomTerrain {
                    terrain: definition.terrain_type.get(),
                    first: data.room_definitions[slot.index()].name.clone(),
                    second: definition.name.clone(),
                });
            }
            *slot = definition.room_type;
        }

        for (index, tile) in data.tiles.iter().enumerate() {
            check_terrain(&|| format!("tile {index}"), tile.terrain_type)?;
        }

        let specials = [
            ("lava", data.lava_terrain),
            ("water", data.water_terrain),
            ("player coloured path", data.player_coloured_path_terrain),
            ("player coloured wall", data.player_coloured_wall_terrain),
            ("fog of war", data.fog_of_war_terrain),
        ];
        for (role, terrain) in specials {
            check_terrain(&|| format!("{role} terrain"), terrain)?;
        }
        if data.player_coloured_path_terrain.is_null() {
            return Err(ScenarioError::MissingSpecialTerrain {
                role: "player coloured path",
            });
        }

        Ok(Self {
            data,
            room_by_terrain,
        })
    }

    /// Raw scenario data backing the tables.
    #[must_use]
    pub fn data(&self) -> &ScenarioData {
        &self.data
    }

    /// Map dimensions declared by the scenario.
    #[must_use]
    pub fn dimensions(&self) -> MapDimensions {
        self.data.dimensions
    }

    /// Terrain definition for a known identifier.
    #[must_use]
    pub fn terrain(&self, terrain: TerrainTypeId) -> &TerrainDefinition {
        debug_assert!(terrain.index() < self.data.terrain_definitions.len());
        lookup(&self.data.terrain_definitions, terrain.index())
    }

    /// Terrain definition with the provided name.
    #[must_use]
    pub fn terrain_by_name(&self, name: &str) -> Option<&TerrainDefinition> {
        self.data
            .terrain_definitions
            .iter()
            .find(|definition| definition.name == name)
    }

    /// Room definition for a known identifier.
    #[must_use]
    pub fn room(&self, room: RoomTypeId) -> &RoomDefinition {
        debug_assert!(room.index() < self.data.room_definitions.len());
        lookup(&self.data.room_definitions, room.index())
    }

    /// Room definition with the provided name.
    #[must_use]
    pub fn room_by_name(&self, name: &str) -> Option<&RoomDefinition> {
        self.data
            .room_definitions
            .iter()
            .find(|definition| definition.name == name)
    }

    /// Reports whether the identifier names a real room definition.
    #[must_use]
    pub fn is_room_type(&self, room: RoomTypeId) -> bool {
        !room.is_null() && room.index() < self.data.room_definitions.len()
    }

    /// Game object definition for a known identifier.
    #[must_use]
    pub fn game_object(&self, object: GameObjectTypeId) -> &GameObjectDefinition {
        debug_assert!(object.index() < self.data.game_object_definitions.len());
        lookup(&self.data.game_object_definitions, object.index())
    }

    /// Game object definition with the provided name.
    #[must_use]
    pub fn game_object_by_name(&self, name: &str) -> Option<&GameObjectDefinition> {
        self.data
            .game_object_definitions
            .iter()
            .find(|definition| definition.name == name)
    }

    /// Creature definition for a known identifier.
    #[must_use]
    pub fn creature(&self, creature: CreatureTypeId) -> &CreatureDefinition {
        debug_assert!(creature.index() < self.data.creature_definitions.len());
        lookup(&self.data.creature_definitions, creature.index())
    }

    /// Creature definition with the provided name.
    #[must_use]
    pub fn creature_by_name(&self, name: &str) -> Option<&CreatureDefinition> {
        self.data
            .creature_definitions
            .iter()
            .find(|definition| definition.name == name)
    }

    /// Room definition whose tiles carry the provided terrain.
    #[must_use]
    pub fn room_by_terrain(&self, terrain: TerrainTypeId) -> Option<&RoomDefinition> {
        let room = self.room_by_terrain.get(terrain.index())?;
        (!room.is_null()).then(|| self.room(*room))
    }

    /// Reports whether the terrain belongs to a room definition.
    #[must_use]
    pub fn is_room_terrain(&self, terrain: TerrainTypeId) -> bool {
        self.room_by_terrain(terrain).is_some()
    }

    /// Terrain placed under lava bridges.
    #[must_use]
    pub fn lava_terrain(&self) -> TerrainTypeId {
        self.data.lava_terrain
    }

    /// Terrain placed under water bridges.
    #[must_use]
    pub fn water_terrain(&self) -> TerrainTypeId {
        self.data.water_terrain
    }

    /// Claimed path terrain placed under land rooms.
    #[must_use]
    pub fn player_coloured_path_terrain(&self) -> TerrainTypeId {
        self.data.player_coloured_path_terrain
    }

    /// Claimed wall terrain.
    #[must_use]
    pub fn player_coloured_wall_terrain(&self) -> TerrainTypeId {
        self.data.player_coloured_wall_terrain
    }

    /// Terrain shown over hidden tiles.
    #[must_use]
    pub fn fog_of_war_terrain(&self) -> TerrainTypeId {
        self.data.fog_of_war_terrain
    }
}

// Tables are validated to hold the null entry, so out-of-range identifiers
// degrade to it in release builds.
fn lookup<T>(table: &[T], index: usize) -> &T {
    table.get(index).unwrap_or_else(|| &table[0])
}

fn check_numbering(
    table: &'static str,
    identifiers: impl ExactSizeIterator<Item = u32>,
) -> Result<(), ScenarioError> {
    if identifiers.len() == 0 {
        return Err(ScenarioError::EmptyTable { table });
    }
    for (index, declared) in identifiers.enumerate() {
        if declared as usize != index {
            return Err(ScenarioError::MisnumberedDefinition {
                table,
                index,
                declared,
            });
        }
    }
    Ok(())
}
