#![allow(dead_code)]

use keeper_core::{
    BridgeTerrain, Command, Event, MapDimensions, MapTileData, PlayerId, RoomDefinition,
    RoomTypeId, ScenarioData, TerrainDefinition, TerrainTypeId, TileLocation,
};
use keeper_world::{apply, World};

pub const DIRT: TerrainTypeId = TerrainTypeId::new(1);
pub const ROCK: TerrainTypeId = TerrainTypeId::new(2);
pub const PATH: TerrainTypeId = TerrainTypeId::new(3);
pub const CLAIMED_PATH: TerrainTypeId = TerrainTypeId::new(4);
pub const LAVA: TerrainTypeId = TerrainTypeId::new(5);
pub const WATER: TerrainTypeId = TerrainTypeId::new(6);
pub const LAIR_FLOOR: TerrainTypeId = TerrainTypeId::new(7);
pub const BRIDGE_DECK: TerrainTypeId = TerrainTypeId::new(8);
pub const TREASURY_FLOOR: TerrainTypeId = TerrainTypeId::new(9);
pub const FOG: TerrainTypeId = TerrainTypeId::new(10);
pub const CLAIMED_WALL: TerrainTypeId = TerrainTypeId::new(11);
pub const HEART_FLOOR: TerrainTypeId = TerrainTypeId::new(12);

pub const LAIR: RoomTypeId = RoomTypeId::new(1);
pub const BRIDGE: RoomTypeId = RoomTypeId::new(2);
pub const TREASURY: RoomTypeId = RoomTypeId::new(3);
pub const HEART: RoomTypeId = RoomTypeId::new(4);

fn terrain(id: TerrainTypeId, name: &str) -> TerrainDefinition {
    TerrainDefinition {
        name: name.to_owned(),
        terrain_type: id,
        becomes_when_destroyed: id,
        becomes_when_max_health: id,
        ..TerrainDefinition::default()
    }
}

fn terrain_table() -> Vec<TerrainDefinition> {
    vec![
        terrain(TerrainTypeId::NULL, "null"),
        TerrainDefinition {
            is_solid: true,
            is_taggable: true,
            becomes_when_destroyed: PATH,
            ..terrain(DIRT, "dirt")
        },
        TerrainDefinition {
            is_solid: true,
            is_impenetrable: true,
            ..terrain(ROCK, "rock")
        },
        TerrainDefinition {
            is_ownable: true,
            becomes_when_max_health: CLAIMED_PATH,
            ..terrain(PATH, "path")
        },
        TerrainDefinition {
            is_ownable: true,
            becomes_when_destroyed: PATH,
            ..terrain(CLAIMED_PATH, "claimed_path")
        },
        TerrainDefinition {
            is_lava: true,
            ..terrain(LAVA, "lava")
        },
        TerrainDefinition {
            is_water: true,
            ..terrain(WATER, "water")
        },
        terrain(LAIR_FLOOR, "lair_floor"),
        terrain(BRIDGE_DECK, "bridge_deck"),
        terrain(TREASURY_FLOOR, "treasury_floor"),
        TerrainDefinition {
            is_solid: true,
            ..terrain(FOG, "fog")
        },
        TerrainDefinition {
            is_solid: true,
            is_ownable: true,
            becomes_when_destroyed: DIRT,
            ..terrain(CLAIMED_WALL, "claimed_wall")
        },
        terrain(HEART_FLOOR, "heart_floor"),
    ]
}

fn room(id: RoomTypeId, name: &str, terrain: TerrainTypeId) -> RoomDefinition {
    RoomDefinition {
        name: name.to_owned(),
        room_type: id,
        terrain_type: terrain,
        placeable_on_land: true,
        buildable: true,
        ..RoomDefinition::default()
    }
}

fn room_table() -> Vec<RoomDefinition> {
    vec![
        RoomDefinition::default(),
        room(LAIR, "lair", LAIR_FLOOR),
        RoomDefinition {
            placeable_on_land: false,
            placeable_on_lava: true,
            placeable_on_water: true,
            ..room(BRIDGE, "bridge", BRIDGE_DECK)
        },
        room(TREASURY, "treasury", TREASURY_FLOOR),
        RoomDefinition {
            buildable: false,
            ..room(HEART, "dungeon_heart", HEART_FLOOR)
        },
    ]
}

/// Builds scenario data from a character layout.
///
/// `.` claimed path (keeper 1), `2` claimed path (keeper 2), `,` unclaimed path,
/// `#` dirt, `R` rock, `~` lava, `w` water, `L` lair (keeper 1), `T` treasury
/// (keeper 1), `H` dungeon heart (keeper 1), `B` bridge over lava (keeper 1),
/// `b` bridge over water (keeper 1).
pub fn scenario(rows: &[&str]) -> ScenarioData {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |row| row.len()) as u32;
    let tiles = rows
        .iter()
        .flat_map(|row| row.chars())
        .map(|symbol| {
            let (terrain_type, owner, terrain_under_the_bridge) = match symbol {
                '.' => (CLAIMED_PATH, PlayerId::Keeper1, BridgeTerrain::None),
                '2' => (CLAIMED_PATH, PlayerId::Keeper2, BridgeTerrain::None),
                ',' => (PATH, PlayerId::Neutral, BridgeTerrain::None),
                '#' => (DIRT, PlayerId::Neutral, BridgeTerrain::None),
                'R' => (ROCK, PlayerId::Neutral, BridgeTerrain::None),
                '~' => (LAVA, PlayerId::Neutral, BridgeTerrain::None),
                'w' => (WATER, PlayerId::Neutral, BridgeTerrain::None),
                'L' => (LAIR_FLOOR, PlayerId::Keeper1, BridgeTerrain::None),
                'T' => (TREASURY_FLOOR, PlayerId::Keeper1, BridgeTerrain::None),
                'H' => (HEART_FLOOR, PlayerId::Keeper1, BridgeTerrain::None),
                'B' => (BRIDGE_DECK, PlayerId::Keeper1, BridgeTerrain::Lava),
                'b' => (BRIDGE_DECK, PlayerId::Keeper1, BridgeTerrain::Water),
                other => panic!("unknown layout symbol {other:?}"),
            };
            MapTileData {
                terrain_type,
                owner,
                terrain_under_the_bridge,
            }
        })
        .collect();

    ScenarioData {
        dimensions: MapDimensions::new(width, height),
        tiles,
        terrain_definitions: terrain_table(),
        room_definitions: room_table(),
        game_object_definitions: vec![Default::default()],
        creature_definitions: vec![Default::default()],
        lava_terrain: LAVA,
        water_terrain: WATER,
        player_coloured_path_terrain: CLAIMED_PATH,
        player_coloured_wall_terrain: CLAIMED_WALL,
        fog_of_war_terrain: FOG,
    }
}

/// Loads the layout and enters the world, returning the entry events.
pub fn entered_world(rows: &[&str]) -> (World, Vec<Event>) {
    let mut world = World::new();
    world
        .load_scenario(scenario(rows))
        .expect("fixture scenario is valid");
    let events = run(&mut world, Command::EnterWorld { seed: 7 });
    (world, events)
}

/// Applies a single command and returns the events it produced.
pub fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(world, command, &mut events);
    events
}

pub fn loc(x: i32, y: i32) -> TileLocation {
    TileLocation::new(x, y)
}
