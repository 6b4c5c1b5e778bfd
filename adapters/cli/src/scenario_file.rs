//! TOML scenario files: definition tables by name, a symbolic map and a script.

use std::collections::BTreeMap;

use anyhow::{bail, ensure, Context, Result};
use keeper_core::{
    BridgeTerrain, Command, CreatureDefinition, CreatureTypeId, GameObjectDefinition,
    GameObjectMaterial, GameObjectTypeId, MapDimensions, MapTileData, PlayerId, RoomDefinition,
    RoomTypeId, ScenarioData, TerrainDefinition, TerrainTypeId,
};
use serde::Deserialize;

/// Scenario file as written on disk.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScenarioFile {
    /// Seed used when the command line does not override it.
    #[serde(default)]
    pub(crate) seed: u32,
    /// Player driving the interactive selections of the script.
    #[serde(default = "default_player")]
    pub(crate) player: PlayerId,
    map: Vec<String>,
    special: SpecialTerrains,
    legend: BTreeMap<String, LegendEntry>,
    #[serde(default)]
    terrain: Vec<TerrainEntry>,
    #[serde(default)]
    room: Vec<RoomEntry>,
    #[serde(default)]
    game_object: Vec<GameObjectEntry>,
    #[serde(default)]
    creature: Vec<CreatureEntry>,
    /// Steps replayed after entering the world.
    #[serde(default)]
    pub(crate) script: Vec<ScriptStep>,
}

fn default_player() -> PlayerId {
    PlayerId::Keeper1
}

fn neutral() -> PlayerId {
    PlayerId::Neutral
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpecialTerrains {
    lava: Option<String>,
    water: Option<String>,
    player_coloured_path: String,
    player_coloured_wall: Option<String>,
    fog_of_war: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LegendEntry {
    terrain: String,
    #[serde(default = "neutral")]
    owner: PlayerId,
    #[serde(default)]
    bridge: BridgeTerrain,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TerrainEntry {
    name: String,
    solid: bool,
    ownable: bool,
    lava: bool,
    water: bool,
    impenetrable: bool,
    taggable: bool,
    becomes_when_destroyed: Option<String>,
    becomes_when_max_health: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RoomEntry {
    name: String,
    terrain: String,
    placeable_on_land: bool,
    placeable_on_lava: bool,
    placeable_on_water: bool,
    buildable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GameObjectEntry {
    name: String,
    #[serde(default)]
    material: GameObjectMaterial,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreatureEntry {
    name: String,
}

/// One step of the scenario script.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum ScriptStep {
    /// Drag selection routed through the interaction system.
    Select(Selection),
    /// Command applied to the world verbatim.
    Command(Command),
}

/// Interaction mode requested by a scripted selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SelectMode {
    Free,
    ConstructRooms,
    SellRooms,
    DigTerrain,
}

/// Scripted drag selection from one tile to another.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Selection {
    pub(crate) select: SelectMode,
    #[serde(default)]
    pub(crate) room: Option<String>,
    pub(crate) from: [i32; 2],
    #[serde(default)]
    pub(crate) to: Option<[i32; 2]>,
    #[serde(default)]
    pub(crate) alternate: bool,
}

/// Map symbols resolved to terrain and owner, used to print the map back.
#[derive(Clone, Debug, Default)]
pub(crate) struct Legend {
    symbols: Vec<(char, TerrainTypeId, PlayerId)>,
}

impl Legend {
    /// Symbol best describing a tile: exact match first, then terrain only.
    pub(crate) fn symbol_for(&self, terrain: TerrainTypeId, owner: PlayerId) -> char {
        self.symbols
            .iter()
            .find(|(_, t, o)| *t == terrain && *o == owner)
            .or_else(|| self.symbols.iter().find(|(_, t, _)| *t == terrain))
            .map_or('?', |(symbol, _, _)| *symbol)
    }
}

impl ScenarioFile {
    /// Parses a scenario file from TOML text.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse scenario toml contents")
    }

    /// Resolves names into identifiers, producing world data and the map legend.
    pub(crate) fn resolve(&self) -> Result<(ScenarioData, Legend)> {
        let terrain_ids = index_names(self.terrain.iter().map(|entry| entry.name.as_str()))
            .context("invalid terrain table")?;
        let _ = index_names(self.room.iter().map(|entry| entry.name.as_str()))
            .context("invalid room table")?;
        let _ = index_names(self.game_object.iter().map(|entry| entry.name.as_str()))
            .context("invalid game object table")?;
        let _ = index_names(self.creature.iter().map(|entry| entry.name.as_str()))
            .context("invalid creature table")?;

        let terrain = |name: &str| -> Result<TerrainTypeId> {
            terrain_ids
                .get(name)
                .map(|index| TerrainTypeId::new(*index))
                .with_context(|| format!("unknown terrain `{name}`"))
        };
        let optional_terrain = |name: &Option<String>| -> Result<TerrainTypeId> {
            name.as_deref()
                .map_or(Ok(TerrainTypeId::NULL), |name| terrain(name))
        };

        let mut terrain_definitions = vec![TerrainDefinition::default()];
        for (entry, index) in self.terrain.iter().zip(1..) {
            let id = TerrainTypeId::new(index);
            let or_self = |name: &Option<String>| -> Result<TerrainTypeId> {
                Ok(match name {
                    Some(name) => terrain(name)?,
                    None => id,
                })
            };
            terrain_definitions.push(TerrainDefinition {
                name: entry.name.clone(),
                terrain_type: id,
                is_solid: entry.solid,
                is_ownable: entry.ownable,
                is_lava: entry.lava,
                is_water: entry.water,
                is_impenetrable: entry.impenetrable,
                is_taggable: entry.taggable,
                becomes_when_destroyed: or_self(&entry.becomes_when_destroyed)
                    .with_context(|| format!("terrain `{}`", entry.name))?,
                becomes_when_max_health: or_self(&entry.becomes_when_max_health)
                    .with_context(|| format!("terrain `{}`", entry.name))?,
            });
        }

        let mut room_definitions = vec![RoomDefinition::default()];
        for (entry, index) in self.room.iter().zip(1..) {
            room_definitions.push(RoomDefinition {
                name: entry.name.clone(),
                room_type: RoomTypeId::new(index),
                terrain_type: terrain(&entry.terrain)
                    .with_context(|| format!("room `{}`", entry.name))?,
                placeable_on_land: entry.placeable_on_land,
                placeable_on_lava: entry.placeable_on_lava,
                placeable_on_water: entry.placeable_on_water,
                buildable: entry.buildable,
            });
        }

        let game_object_definitions = std::iter::once(GameObjectDefinition::default())
            .chain(self.game_object.iter().zip(1..).map(|(entry, index)| {
                GameObjectDefinition {
                    name: entry.name.clone(),
                    object_type: GameObjectTypeId::new(index),
                    material: entry.material,
                }
            }))
            .collect();
        let creature_definitions = std::iter::once(CreatureDefinition::default())
            .chain(
                self.creature
                    .iter()
                    .zip(1..)
                    .map(|(entry, index)| CreatureDefinition {
                        name: entry.name.clone(),
                        creature_type: CreatureTypeId::new(index),
                    }),
            )
            .collect();

        let mut symbols = BTreeMap::new();
        let mut legend = Legend::default();
        for (key, entry) in &self.legend {
            let mut chars = key.chars();
            let (Some(symbol), None) = (chars.next(), chars.next()) else {
                bail!("legend key `{key}` must be a single character");
            };
            let tile = MapTileData {
                terrain_type: terrain(&entry.terrain)
                    .with_context(|| format!("legend symbol `{symbol}`"))?,
                owner: entry.owner,
                terrain_under_the_bridge: entry.bridge,
            };
            let _ = symbols.insert(symbol, tile);
            legend.symbols.push((symbol, tile.terrain_type, tile.owner));
        }

        let width = self.map.first().map_or(0, |row| row.chars().count());
        let mut tiles = Vec::with_capacity(width * self.map.len());
        for (y, row) in self.map.iter().enumerate() {
            ensure!(
                row.chars().count() == width,
                "map row {y} has {} tiles, expected {width}",
                row.chars().count()
            );
            for (x, symbol) in row.chars().enumerate() {
                let tile = symbols
                    .get(&symbol)
                    .with_context(|| format!("unknown map symbol `{symbol}` at ({x}, {y})"))?;
                tiles.push(*tile);
            }
        }

        let data = ScenarioData {
            dimensions: MapDimensions::new(
                u32::try_from(width).context("map is too wide")?,
                u32::try_from(self.map.len()).context("map is too tall")?,
            ),
            tiles,
            terrain_definitions,
            room_definitions,
            game_object_definitions,
            creature_definitions,
            lava_terrain: optional_terrain(&self.special.lava)?,
            water_terrain: optional_terrain(&self.special.water)?,
            player_coloured_path_terrain: terrain(&self.special.player_coloured_path)?,
            player_coloured_wall_terrain: optional_terrain(&self.special.player_coloured_wall)?,
            fog_of_war_terrain: optional_terrain(&self.special.fog_of_war)?,
        };
        Ok((data, legend))
    }
}

/// Assigns table indices to names, starting at one. Index zero is the null entry.
fn index_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<BTreeMap<&'a str, u32>> {
    let mut indices = BTreeMap::new();
    for (name, index) in names.zip(1..) {
        ensure!(!name.is_empty(), "definition {index} has no name");
        if indices.insert(name, index).is_some() {
            bail!("duplicate definition name `{name}`");
        }
    }
    Ok(indices)
}
