//! Map mutations that keep tiles, rooms and events consistent with each other.

use std::collections::{BTreeMap, BTreeSet};

use keeper_core::{
    BridgeTerrain, Direction, Event, PlayerId, RoomDefinition, RoomInstanceId, RoomTypeId,
    TileArea, TileLocation,
};
use tracing::debug;

use crate::{
    map::{FloodFillFlags, GameMap},
    rooms::RoomRegistry,
    scenario::Scenario,
    tile::TerrainTile,
};

/// Matching used when grouping tiles that already carry room terrain.
const ROOM_FILL: FloodFillFlags = FloodFillFlags {
    same_owner: true,
    same_base_terrain: false,
};

/// Matching used while placing rooms; eligibility is decided by the caller.
const PLACEMENT_FILL: FloodFillFlags = FloodFillFlags {
    same_owner: false,
    same_base_terrain: false,
};

/// Borrowed view of the world state touched while executing one command.
pub(crate) struct Mutation<'a> {
    pub(crate) scenario: &'a Scenario,
    pub(crate) map: &'a mut GameMap,
    pub(crate) rooms: &'a mut RoomRegistry,
    pub(crate) events: &'a mut Vec<Event>,
}

impl Mutation<'_> {
    /// Builds the map from the scenario tile data.
    pub(crate) fn setup_map_data(&mut self, seed: u32) {
        let scenario = self.scenario;
        let dimensions = scenario.dimensions();
        self.map.setup(dimensions, seed);

        let width = dimensions.width().max(1) as usize;
        for (index, data) in scenario.data().tiles.iter().enumerate() {
            let location = TileLocation::new((index % width) as i32, (index / width) as i32);
            let Some(tile) = self.map.tile_mut(location) else {
                debug_assert!(false, "scenario tile {index} lies outside the map");
                continue;
            };

            tile.owner = data.owner;
            tile.mesh_invalidated = true;
            match scenario.room_by_terrain(data.terrain_type) {
                Some(room) => {
                    tile.base_terrain = if room.is_bridge() {
                        match data.terrain_under_the_bridge {
                            BridgeTerrain::Lava if !scenario.lava_terrain().is_null() => {
                                scenario.lava_terrain()
                            }
                            BridgeTerrain::Water if !scenario.water_terrain().is_null() => {
                                scenario.water_terrain()
                            }
                            _ => scenario.player_coloured_path_terrain(),
                        }
                    } else {
                        scenario.player_coloured_path_terrain()
                    };
                    tile.room_terrain = Some(data.terrain_type);
                }
                None => tile.base_terrain = data.terrain_type,
            }
        }
    }

    /// Turns every unassigned patch of room terrain into a room instance.
    pub(crate) fn construct_startup_rooms(&mut self) {
        let whole_map = self.map.dimensions().area();
        for location in self.map.iter_area(whole_map) {
            let pending = self
                .map
                .tile(location)
                .is_some_and(|tile| tile.room_terrain.is_some() && tile.built_room.is_none());
            if pending {
                self.construct_startup_room(location);
            }
        }
    }

    fn construct_startup_room(&mut self, origin: TileLocation) {
        let scenario = self.scenario;
        let Some(tile) = self.map.tile(origin) else {
            return;
        };
        let owner = tile.owner;
        let Some(room_type) = tile
            .room_terrain
            .and_then(|terrain| scenario.room_by_terrain(terrain))
            .map(|definition| definition.room_type)
        else {
            debug_assert!(false, "startup room at {origin:?} has no room definition");
            return;
        };

        let segment = self.map.flood_fill4_matching(origin, None, ROOM_FILL, |tile| {
            tile.built_room.is_none()
        });
        let room = self.create_room(room_type, owner);
        self.enlarge_room(room, &segment);
        self.refresh_room_flags(room);
    }

    /// Sets or clears the dig-target mark on every taggable tile in the area.
    pub(crate) fn set_tagged(&mut self, area: TileArea, tagged: bool) {
        for location in self.map.iter_area(area) {
            let Some(tile) = self.map.tile_mut(location) else {
                continue;
            };
            if tile.is_tagged == tagged || !self.scenario.terrain(tile.terrain()).is_taggable {
                continue;
            }
            tile.is_tagged = tagged;
            self.events.push(Event::TileTagChanged { location, tagged });
            if tile.invalidate_mesh() {
                self.events.push(Event::TileMeshInvalidated { location });
            }
        }
    }

    /// Reports whether a room of `definition` may be built on the tile by `owner`.
    pub(crate) fn can_place_room_on_location(
        &self,
        definition: &RoomDefinition,
        owner: PlayerId,
        location: TileLocation,
    ) -> bool {
        let Some(tile) = self.map.tile(location) else {
            return false;
        };
        let terrain_type = tile.terrain();
        if tile.built_room.is_some() || self.scenario.is_room_terrain(terrain_type) {
            return false;
        }

        let terrain = self.scenario.terrain(terrain_type);
        let on_land = definition.placeable_on_land
            && !terrain.is_solid
            && terrain.is_ownable
            && tile.owner == owner;
        on_land
            || (definition.placeable_on_lava && terrain.is_lava)
            || (definition.placeable_on_water && terrain.is_water)
    }

    /// Builds rooms on every legal tile of the area, merging with adjacent rooms
    /// of the same definition and owner.
    pub(crate) fn construct_room(&mut self, owner: PlayerId, room_type: RoomTypeId, area: TileArea) {
        let scenario = self.scenario;
        let definition = scenario.room(room_type);

        let eligible: Vec<TileLocation> = self
            .map
            .iter_area(area)
            .filter(|location| self.can_place_room_on_location(definition, owner, *location))
            .collect();
        if eligible.is_empty() {
            debug!(?owner, ?room_type, "no legal tiles for room construction");
            return;
        }

        let eligible_set: BTreeSet<TileLocation> = eligible.iter().copied().collect();
        let mut assigned = BTreeSet::new();
        for &origin in &eligible {
            if assigned.contains(&origin) {
                continue;
            }
            let segment = self.map.flood_fill4_matching(origin, Some(area), PLACEMENT_FILL, |tile| {
                eligible_set.contains(&tile.location())
            });
            assigned.extend(segment.iter().copied());

            let neighbours = self.adjacent_rooms(&segment, owner, room_type);
            let receiver = match neighbours.split_first() {
                Some((&first, rest)) => {
                    for &other in rest {
                        self.absorb_room(first, other, None);
                    }
                    first
                }
                None => self.create_room(room_type, owner),
            };

            for &location in &segment {
                let _ = self.update_tile(location, |tile| {
                    tile.room_terrain = Some(definition.terrain_type);
                    tile.owner = owner;
                });
            }
            self.enlarge_room(receiver, &segment);
            self.refresh_room_flags(receiver);
        }
    }

    /// Rooms of the owner and definition touching the tiles through a straight edge.
    ///
    /// Rooms are listed once each in discovery order, scanning the tiles in
    /// order and their neighbours north, east, south then west.
    pub(crate) fn adjacent_rooms(
        &self,
        tiles: &[TileLocation],
        owner: PlayerId,
        room_type: RoomTypeId,
    ) -> Vec<RoomInstanceId> {
        let mut found = Vec::new();
        let mut seen = BTreeSet::new();
        for &location in tiles {
            for direction in Direction::STRAIGHT {
                let Some(room) = self
                    .map
                    .neighbour(location, direction)
                    .and_then(TerrainTile::built_room)
                else {
                    continue;
                };
                if self
                    .rooms
                    .get(room)
                    .is_some_and(|room| room.owner() == owner && room.definition() == room_type)
                    && seen.insert(room)
                {
                    found.push(room);
                }
            }
        }
        found
    }

    /// Releases every buildable room tile of the owner inside the area.
    pub(crate) fn sell_rooms(&mut self, owner: PlayerId, area: TileArea) {
        let mut groups: BTreeMap<RoomInstanceId, Vec<TileLocation>> = BTreeMap::new();
        for location in self.map.iter_area(area) {
            let Some(room) = self
                .map
                .tile(location)
                .filter(|tile| tile.owner == owner)
                .and_then(TerrainTile::built_room)
            else {
                continue;
            };
            let sellable = self.rooms.get(room).is_some_and(|room| {
                room.owner() == owner && self.scenario.room(room.definition()).buildable
            });
            if sellable {
                groups.entry(room).or_default().push(location);
            }
        }

        for (room, tiles) in groups {
            self.release_room_tiles(room, &tiles);
        }
    }

    /// Removes tiles from a room, splitting what remains into connected rooms.
    pub(crate) fn release_room_tiles(&mut self, room: RoomInstanceId, tiles: &[TileLocation]) {
        let Some(instance) = self.rooms.get_mut(room) else {
            debug_assert!(false, "released room {room:?} does not exist");
            return;
        };
        let is_bridge = self.scenario.room(instance.definition()).is_bridge();
        let released = instance.release_tiles(self.map, tiles);
        if released.is_empty() {
            return;
        }

        self.events.push(Event::RoomTilesReleased {
            room,
            released: released.len(),
        });
        debug!(?room, released = released.len(), "room tiles released");
        for &location in &released {
            let _ = self.update_tile(location, |tile| {
                tile.room_terrain = None;
                if is_bridge {
                    tile.owner = PlayerId::Neutral;
                }
            });
        }
        self.split_room(room);
    }

    fn split_room(&mut self, room: RoomInstanceId) {
        let Some(instance) = self.rooms.get(room) else {
            return;
        };
        if !instance.has_tiles() {
            self.destroy_room(room);
            return;
        }
        let (definition, owner) = (instance.definition(), instance.owner());

        let segments = self.room_segments(room);
        for segment in segments.iter().skip(1) {
            let split = self.create_room(definition, owner);
            self.absorb_room(split, room, Some(segment));
            self.refresh_room_flags(split);
        }
        self.refresh_room_flags(room);
    }

    /// Partitions the tiles of a room into 4-connected segments.
    ///
    /// The first segment contains the oldest tile of the room.
    pub(crate) fn room_segments(&mut self, room: RoomInstanceId) -> Vec<Vec<TileLocation>> {
        let Some(instance) = self.rooms.get(room) else {
            return Vec::new();
        };
        let tiles = instance.tiles().to_vec();

        let mut assigned = BTreeSet::new();
        let mut segments = Vec::new();
        for origin in tiles {
            if assigned.contains(&origin) {
                continue;
            }
            let segment = self.map.flood_fill4_matching(origin, None, ROOM_FILL, |tile| {
                tile.built_room == Some(room)
            });
            assigned.extend(segment.iter().copied());
            segments.push(segment);
        }
        segments
    }

    /// Applies damage to a tile, releasing any room built on it.
    pub(crate) fn damage_terrain_tile(&mut self, location: TileLocation, player: PlayerId) {
        if let Some(room) = self.map.tile(location).and_then(TerrainTile::built_room) {
            self.release_room_tiles(room, &[location]);
        }
        let scenario = self.scenario;
        let Some(tile) = self.map.tile(location) else {
            return;
        };
        let terrain = scenario.terrain(tile.base_terrain);
        let next = terrain.becomes_when_destroyed;
        if terrain.is_indestructible() || next.is_null() || next == tile.base_terrain {
            return;
        }

        debug!(?location, ?player, from = ?tile.base_terrain, to = ?next, "terrain destroyed");
        let was_tagged = tile.is_tagged;
        let _ = self.update_tile(location, |tile| {
            tile.base_terrain = next;
            tile.is_tagged = false;
        });
        if was_tagged {
            self.events.push(Event::TileTagChanged {
                location,
                tagged: false,
            });
        }
        self.notify_neighbour_rooms(location);
    }

    /// Repairs or claims a tile for the player.
    pub(crate) fn repair_terrain_tile(&mut self, location: TileLocation, player: PlayerId) {
        let scenario = self.scenario;
        let Some(tile) = self.map.tile(location) else {
            return;
        };
        if tile.built_room.is_some() {
            return;
        }
        let terrain = scenario.terrain(tile.base_terrain);
        if terrain.is_indestructible() {
            return;
        }
        let next = terrain.becomes_when_max_health;
        if next.is_null() || next == tile.base_terrain {
            return;
        }

        debug!(?location, ?player, from = ?tile.base_terrain, to = ?next, "terrain repaired");
        let _ = self.update_tile(location, |tile| {
            tile.owner = player;
            tile.base_terrain = next;
        });
        self.notify_neighbour_rooms(location);
    }

    /// Covers or uncovers every tile of the area with the fog-of-war terrain.
    pub(crate) fn set_fog_of_war(&mut self, area: TileArea, hidden: bool) {
        let fog = self.scenario.fog_of_war_terrain();
        if hidden && fog.is_null() {
            debug!("scenario defines no fog of war terrain");
            return;
        }
        let overlay = hidden.then_some(fog);
        for location in self.map.iter_area(area) {
            let _ = self.update_tile(location, |tile| tile.fog_of_war_terrain = overlay);
        }
    }

    fn notify_neighbour_rooms(&mut self, location: TileLocation) {
        let notified: BTreeSet<RoomInstanceId> = Direction::STRAIGHT
            .into_iter()
            .filter_map(|direction| self.map.neighbour(location, direction))
            .filter_map(TerrainTile::built_room)
            .collect();

        for room in notified {
            if let Some(instance) = self.rooms.get(room) {
                instance.neighbour_tile_change(self.map, self.scenario, location);
                self.events
                    .push(Event::RoomNeighbourTileChanged { room, location });
            }
        }
    }

    fn create_room(&mut self, room_type: RoomTypeId, owner: PlayerId) -> RoomInstanceId {
        let room = self.rooms.create_room_instance(room_type, owner);
        debug!(?room, ?room_type, ?owner, "room created");
        self.events.push(Event::RoomCreated {
            room,
            room_type,
            owner,
        });
        room
    }

    fn enlarge_room(&mut self, room: RoomInstanceId, tiles: &[TileLocation]) {
        let Some(instance) = self.rooms.get_mut(room) else {
            debug_assert!(false, "enlarged room {room:?} does not exist");
            return;
        };
        let added = instance.enlarge_room(self.map, tiles);
        if added > 0 {
            self.events.push(Event::RoomEnlarged { room, added });
        }
    }

    fn absorb_room(
        &mut self,
        receiver: RoomInstanceId,
        source: RoomInstanceId,
        subset: Option<&[TileLocation]>,
    ) {
        let transferred = self.rooms.absorb(receiver, source, subset, self.map);
        debug!(?receiver, ?source, transferred, "room absorbed");
        self.events.push(Event::RoomAbsorbed {
            receiver,
            source,
            transferred,
        });
        if self.rooms.get(source).is_some_and(|room| !room.has_tiles()) {
            self.destroy_room(source);
        }
    }

    fn destroy_room(&mut self, room: RoomInstanceId) {
        if self.rooms.destroy_room_instance(room, self.map).is_some() {
            debug!(?room, "room destroyed");
            self.events.push(Event::RoomDestroyed { room });
        }
    }

    fn refresh_room_flags(&mut self, room: RoomInstanceId) {
        if let Some(instance) = self.rooms.get(room) {
            instance.update_tile_flags(self.map, self.scenario);
        }
    }

    /// Applies `change` to a tile, reporting terrain and owner changes and stale
    /// meshes.
    ///
    /// Returns `true` when the effective terrain or the owner changed.
    fn update_tile(&mut self, location: TileLocation, change: impl FnOnce(&mut TerrainTile)) -> bool {
        let Some(tile) = self.map.tile_mut(location) else {
            debug_assert!(false, "updated tile {location:?} lies outside the map");
            return false;
        };
        let (from, owner) = (tile.terrain(), tile.owner);
        change(tile);
        let (to, new_owner) = (tile.terrain(), tile.owner);
        let owner_changed = new_owner != owner;

        if from != to {
            self.events
                .push(Event::TerrainChanged { location, from, to });
        }
        if owner_changed {
            self.events.push(Event::TileOwnerChanged {
                location,
                from: owner,
                to: new_owner,
            });
        }
        if from == to && !owner_changed {
            return false;
        }
        self.invalidate_around(location);
        true
    }

    fn invalidate_around(&mut self, location: TileLocation) {
        let around = std::iter::once(location)
            .chain(Direction::ALL.into_iter().map(|direction| location.offset(direction)));
        for location in around {
            if self
                .map
                .tile_mut(location)
                .is_some_and(TerrainTile::invalidate_mesh)
            {
                self.events.push(Event::TileMeshInvalidated { location });
            }
        }
    }
}
