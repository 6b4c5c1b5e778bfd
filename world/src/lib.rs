#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative dungeon state for Keeper.
//!
//! The world owns the tile map, the room registry and the loaded scenario. All
//! mutation flows through [`apply`]; read access goes through [`query`].

mod map;
mod mutation;
mod rooms;
mod scenario;
mod tile;

pub use map::{
    area_bounds, tile_center, tile_corner, world_to_tile, AreaTiles, FloodFillFlags, GameMap,
    WorldBounds,
};
pub use rooms::GenericRoom;
pub use scenario::{Scenario, ScenarioError};
pub use tile::TerrainTile;

use keeper_core::{Command, Event, RejectionReason, ScenarioData, TileLocation};
use tracing::{info, warn};

use crate::{mutation::Mutation, rooms::RoomRegistry};

/// Represents the authoritative Keeper world state.
#[derive(Debug)]
pub struct World {
    scenario: Option<Scenario>,
    map: GameMap,
    rooms: RoomRegistry,
    entered: bool,
}

impl World {
    /// Creates an empty world without a scenario.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scenario: None,
            map: GameMap::new(),
            rooms: RoomRegistry::new(),
            entered: false,
        }
    }

    /// Validates and installs a scenario, leaving any entered world.
    ///
    /// The previous scenario stays in place when validation fails.
    pub fn load_scenario(&mut self, data: ScenarioData) -> Result<(), ScenarioError> {
        let scenario = Scenario::new(data)?;
        info!(
            width = scenario.dimensions().width(),
            height = scenario.dimensions().height(),
            "scenario loaded"
        );
        self.reset();
        self.scenario = Some(scenario);
        Ok(())
    }

    fn reset(&mut self) {
        self.map.clear();
        self.rooms.clear();
        self.entered = false;
    }

    fn mutation<'a>(
        &'a mut self,
        out_events: &'a mut Vec<Event>,
    ) -> Result<Mutation<'a>, RejectionReason> {
        let Self {
            scenario,
            map,
            rooms,
            entered,
        } = self;
        let scenario = scenario.as_ref().ok_or(RejectionReason::ScenarioMissing)?;
        if !*entered {
            return Err(RejectionReason::WorldNotEntered);
        }
        Ok(Mutation {
            scenario,
            map,
            rooms,
            events: out_events,
        })
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::EnterWorld { seed } => {
            let World {
                scenario,
                map,
                rooms,
                entered,
            } = world;
            let Some(scenario) = scenario.as_ref() else {
                reject(RejectionReason::ScenarioMissing, out_events);
                return;
            };
            rooms.clear();
            let mut mutation = Mutation {
                scenario,
                map,
                rooms,
                events: out_events,
            };
            mutation.setup_map_data(seed);
            mutation.events.push(Event::WorldEntered {
                dimensions: scenario.dimensions(),
            });
            mutation.construct_startup_rooms();
            let room_count = mutation.rooms.iter().count();
            *entered = true;
            info!(seed, rooms = room_count, "world entered");
        }
        Command::ClearWorld => {
            world.reset();
            out_events.push(Event::WorldCleared);
            info!("world cleared");
        }
        Command::TileMeshesRebuilt => world.map.clear_mesh_invalidation(),
        command => {
            let outcome = world
                .mutation(out_events)
                .and_then(|mut mutation| dispatch(&mut mutation, command));
            if let Err(reason) = outcome {
                reject(reason, out_events);
            }
        }
    }
}

fn dispatch(mutation: &mut Mutation<'_>, command: Command) -> Result<(), RejectionReason> {
    match command {
        Command::TagTerrain { area } => mutation.set_tagged(area, true),
        Command::UnTagTerrain { area } => mutation.set_tagged(area, false),
        Command::ConstructRoom {
            owner,
            room_type,
            area,
        } => {
            if !mutation.scenario.is_room_type(room_type) {
                return Err(RejectionReason::UnknownRoomType(room_type));
            }
            mutation.construct_room(owner, room_type, area);
        }
        Command::SellRooms { owner, area } => mutation.sell_rooms(owner, area),
        Command::DamageTerrainTile {
            location,
            player,
            hit_points,
        } => {
            check_tile_request(mutation, location, hit_points)?;
            mutation.damage_terrain_tile(location, player);
        }
        Command::RepairTerrainTile {
            location,
            player,
            hit_points,
        } => {
            check_tile_request(mutation, location, hit_points)?;
            mutation.repair_terrain_tile(location, player);
        }
        Command::HideTerrain { area } => mutation.set_fog_of_war(area, true),
        Command::RevealTerrain { area } => mutation.set_fog_of_war(area, false),
        Command::EnterWorld { .. } | Command::ClearWorld | Command::TileMeshesRebuilt => {
            debug_assert!(false, "lifecycle commands are handled by apply");
        }
    }
    Ok(())
}

fn check_tile_request(
    mutation: &Mutation<'_>,
    location: TileLocation,
    hit_points: u32,
) -> Result<(), RejectionReason> {
    if hit_points == 0 {
        return Err(RejectionReason::ZeroHitPoints);
    }
    if !mutation.map.is_within_map(location) {
        return Err(RejectionReason::OutOfBounds(location));
    }
    Ok(())
}

fn reject(reason: RejectionReason, out_events: &mut Vec<Event>) {
    warn!(?reason, "command rejected");
    out_events.push(Event::CommandRejected { reason });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use keeper_core::{RoomInstanceId, TileLocation};

    use super::{GameMap, GenericRoom, Scenario, TerrainTile, World};

    /// Scenario currently loaded into the world.
    #[must_use]
    pub fn scenario(world: &World) -> Option<&Scenario> {
        world.scenario.as_ref()
    }

    /// Reports whether the map has been built from the scenario.
    #[must_use]
    pub fn is_entered(world: &World) -> bool {
        world.entered
    }

    /// Provides read-only access to the tile map.
    #[must_use]
    pub fn map(world: &World) -> &GameMap {
        &world.map
    }

    /// Tile at the provided location.
    #[must_use]
    pub fn tile(world: &World, location: TileLocation) -> Option<&TerrainTile> {
        world.map.tile(location)
    }

    /// Iterates over every room in identifier order.
    pub fn rooms(world: &World) -> impl Iterator<Item = &GenericRoom> {
        world.rooms.iter()
    }

    /// Room with the provided identifier.
    #[must_use]
    pub fn room(world: &World, room: RoomInstanceId) -> Option<&GenericRoom> {
        world.rooms.get(room)
    }

    /// Room built on the tile at the provided location.
    #[must_use]
    pub fn room_at(world: &World, location: TileLocation) -> Option<&GenericRoom> {
        world
            .map
            .tile(location)
            .and_then(TerrainTile::built_room)
            .and_then(|room| world.rooms.get(room))
    }

    /// Tiles whose meshes await a rebuild, in row-major order.
    #[must_use]
    pub fn invalidated_tiles(world: &World) -> Vec<TileLocation> {
        world
            .map
            .tiles()
            .filter(|tile| tile.is_mesh_invalidated())
            .map(TerrainTile::location)
            .collect()
    }
}
