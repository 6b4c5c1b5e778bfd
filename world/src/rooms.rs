//! Room instances and the registry that allocates their identifiers.

use std::collections::BTreeMap;

use keeper_core::{Direction, PlayerId, RoomInstanceId, RoomTypeId, TileLocation};

use crate::{map::GameMap, scenario::Scenario};

/// Typed, player-owned set of tiles sharing one room definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericRoom {
    id: RoomInstanceId,
    definition: RoomTypeId,
    owner: PlayerId,
    tiles: Vec<TileLocation>,
}

impl GenericRoom {
    pub(crate) fn new(id: RoomInstanceId, definition: RoomTypeId, owner: PlayerId) -> Self {
        Self {
            id,
            definition,
            owner,
            tiles: Vec::new(),
        }
    }

    /// Identifier allocated to the room.
    #[must_use]
    pub const fn id(&self) -> RoomInstanceId {
        self.id
    }

    /// Room definition the instance was built from.
    #[must_use]
    pub const fn definition(&self) -> RoomTypeId {
        self.definition
    }

    /// Player owning the room.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Tiles covered by the room in the order they joined it.
    #[must_use]
    pub fn tiles(&self) -> &[TileLocation] {
        &self.tiles
    }

    /// Reports whether the room still covers at least one tile.
    #[must_use]
    pub fn has_tiles(&self) -> bool {
        !self.tiles.is_empty()
    }

    /// Number of tiles covered by the room.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether the room covers the location.
    #[must_use]
    pub fn contains(&self, location: TileLocation) -> bool {
        self.tiles.contains(&location)
    }

    /// Adds tiles to the room and points them at it. Returns the number added.
    pub(crate) fn enlarge_room(&mut self, map: &mut GameMap, tiles: &[TileLocation]) -> usize {
        let mut added = 0;
        for &location in tiles {
            let Some(tile) = map.tile_mut(location) else {
                debug_assert!(false, "room tile {location:?} lies outside the map");
                continue;
            };
            debug_assert!(
                tile.built_room.is_none() && !self.tiles.contains(&location),
                "tile {location:?} already belongs to a room"
            );
            tile.built_room = Some(self.id);
            self.tiles.push(location);
            added += 1;
        }
        added
    }

    /// Removes the listed tiles that belong to the room and returns them.
    pub(crate) fn release_tiles(
        &mut self,
        map: &mut GameMap,
        tiles: &[TileLocation],
    ) -> Vec<TileLocation> {
        let mut released = Vec::new();
        self.tiles.retain(|location| {
            if !tiles.contains(location) {
                return true;
            }
            if let Some(tile) = map.tile_mut(*location) {
                tile.built_room = None;
                tile.clear_room_flags();
            }
            released.push(*location);
            false
        });
        released
    }

    /// Moves tiles of `other` into this room, all of them unless `subset` is given.
    ///
    /// Returns the number of transferred tiles.
    pub(crate) fn absorb_room(
        &mut self,
        map: &mut GameMap,
        other: &mut GenericRoom,
        subset: Option<&[TileLocation]>,
    ) -> usize {
        debug_assert_ne!(self.id, other.id, "room cannot absorb itself");
        let moved = match subset {
            Some(subset) => {
                let mut moved = Vec::with_capacity(subset.len());
                other.tiles.retain(|location| {
                    let selected = subset.contains(location);
                    if selected {
                        moved.push(*location);
                    }
                    !selected
                });
                moved
            }
            None => std::mem::take(&mut other.tiles),
        };

        for &location in &moved {
            if let Some(tile) = map.tile_mut(location) {
                tile.built_room = Some(self.id);
            }
        }
        let transferred = moved.len();
        self.tiles.extend(moved);
        transferred
    }

    /// Recomputes the inner and entrance flags of every room tile.
    pub(crate) fn update_tile_flags(&self, map: &mut GameMap, scenario: &Scenario) {
        for &location in &self.tiles {
            self.refresh_tile_flags(map, scenario, location);
        }
    }

    /// Reacts to a terrain change on a tile bordering the room.
    pub(crate) fn neighbour_tile_change(
        &self,
        map: &mut GameMap,
        scenario: &Scenario,
        changed: TileLocation,
    ) {
        for direction in Direction::ALL {
            let location = changed.offset(direction);
            if map
                .tile(location)
                .is_some_and(|tile| tile.built_room == Some(self.id))
            {
                self.refresh_tile_flags(map, scenario, location);
            }
        }
    }

    fn refresh_tile_flags(&self, map: &mut GameMap, scenario: &Scenario, location: TileLocation) {
        let in_room = |direction: Direction| {
            map.neighbour(location, direction)
                .is_some_and(|tile| tile.built_room == Some(self.id))
        };
        let inner = Direction::ALL.into_iter().all(in_room);
        let entrance = Direction::STRAIGHT.into_iter().any(|direction| {
            map.neighbour(location, direction).is_some_and(|tile| {
                tile.built_room != Some(self.id) && !scenario.terrain(tile.terrain()).is_solid
            })
        });

        if let Some(tile) = map.tile_mut(location) {
            tile.is_room_inner_tile = inner;
            tile.is_room_entrance = entrance;
        }
    }
}

/// Registry that stores room instances and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct RoomRegistry {
    entries: BTreeMap<RoomInstanceId, GenericRoom>,
    next_room_id: RoomInstanceId,
}

impl RoomRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_room_id: RoomInstanceId::new(0),
        }
    }

    /// Allocates an empty room instance.
    pub(crate) fn create_room_instance(
        &mut self,
        definition: RoomTypeId,
        owner: PlayerId,
    ) -> RoomInstanceId {
        let id = self.next_room_id;
        self.next_room_id = RoomInstanceId::new(id.get() + 1);
        let previous = self
            .entries
            .insert(id, GenericRoom::new(id, definition, owner));
        debug_assert!(previous.is_none(), "room identifier {id:?} reused");
        id
    }

    /// Removes a room, detaching any tiles it still covers.
    pub(crate) fn destroy_room_instance(
        &mut self,
        id: RoomInstanceId,
        map: &mut GameMap,
    ) -> Option<GenericRoom> {
        let mut room = self.entries.remove(&id)?;
        let remaining = room.tiles.clone();
        let _ = room.release_tiles(map, &remaining);
        Some(room)
    }

    /// Moves tiles from `source` into `receiver`; see [`GenericRoom::absorb_room`].
    pub(crate) fn absorb(
        &mut self,
        receiver: RoomInstanceId,
        source: RoomInstanceId,
        subset: Option<&[TileLocation]>,
        map: &mut GameMap,
    ) -> usize {
        if receiver == source {
            debug_assert!(false, "room {receiver:?} cannot absorb itself");
            return 0;
        }
        let Some(mut donor) = self.entries.remove(&source) else {
            debug_assert!(false, "absorbed room {source:?} does not exist");
            return 0;
        };
        let transferred = match self.entries.get_mut(&receiver) {
            Some(room) => room.absorb_room(map, &mut donor, subset),
            None => {
                debug_assert!(false, "receiving room {receiver:?} does not exist");
                0
            }
        };
        let _ = self.entries.insert(source, donor);
        transferred
    }

    pub(crate) fn get(&self, id: RoomInstanceId) -> Option<&GenericRoom> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: RoomInstanceId) -> Option<&mut GenericRoom> {
        self.entries.get_mut(&id)
    }

    /// Iterates rooms in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &GenericRoom> {
        self.entries.values()
    }

    /// Drops every room and restarts identifier allocation.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_room_id = RoomInstanceId::new(0);
    }
}
