//! Tile arena, coordinate transforms and flood-fill region discovery.

use std::collections::VecDeque;

use glam::Vec3;
use keeper_core::{
    Direction, MapDimensions, TileArea, TileLocation, TERRAIN_BLOCK_HALF_SIZE,
    TERRAIN_BLOCK_HEIGHT, TERRAIN_BLOCK_SIZE, TERRAIN_FLOOR_LEVEL,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::tile::TerrainTile;

/// Matching rules applied while flood filling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FloodFillFlags {
    /// Only expand into tiles owned by the origin's owner.
    pub same_owner: bool,
    /// Require identical effective terrain; otherwise only the room terrain
    /// layer has to match the origin.
    pub same_base_terrain: bool,
}

impl Default for FloodFillFlags {
    fn default() -> Self {
        Self {
            same_owner: true,
            same_base_terrain: false,
        }
    }
}

/// Axis-aligned box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBounds {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

/// Restartable iterator over the tile locations of a rectangle clipped to the map.
///
/// Locations are yielded row by row. The iterator holds no borrow of the map, so
/// callers may mutate tiles while walking an area.
#[derive(Clone, Debug)]
pub struct AreaTiles {
    area: TileArea,
    cursor: usize,
}

impl AreaTiles {
    fn new(area: TileArea) -> Self {
        Self { area, cursor: 0 }
    }

    /// Rewinds the iterator to the first tile of the area.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Area walked by the iterator after clipping to the map.
    #[must_use]
    pub const fn area(&self) -> TileArea {
        self.area
    }

    fn len_total(&self) -> usize {
        if self.area.is_empty() {
            return 0;
        }
        self.area.width() as usize * self.area.height() as usize
    }
}

impl Iterator for AreaTiles {
    type Item = TileLocation;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len_total() {
            return None;
        }
        let width = self.area.width() as usize;
        let column = (self.cursor % width) as i32;
        let row = (self.cursor / width) as i32;
        self.cursor += 1;
        Some(TileLocation::new(self.area.x() + column, self.area.y() + row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len_total().saturating_sub(self.cursor);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AreaTiles {}

/// Owns every tile of the dungeon map.
#[derive(Clone, Debug, Default)]
pub struct GameMap {
    dimensions: MapDimensions,
    tiles: Vec<TerrainTile>,
    random_seed: u32,
    flood_fill_generation: u32,
}

impl GameMap {
    /// Creates an empty map without tiles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the tile array and derives per-tile random values from the seed.
    pub fn setup(&mut self, dimensions: MapDimensions, seed: u32) {
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
        let width = dimensions.width();
        let mut tiles = Vec::with_capacity(dimensions.tile_count());
        for row in 0..dimensions.height() {
            for column in 0..width {
                let location = TileLocation::new(column as i32, row as i32);
                tiles.push(TerrainTile::new(location, rng.next_u32()));
            }
        }
        self.dimensions = dimensions;
        self.tiles = tiles;
        self.random_seed = seed;
        self.flood_fill_generation = 0;
    }

    /// Releases every tile.
    pub fn clear(&mut self) {
        self.dimensions = MapDimensions::default();
        self.tiles.clear();
        self.random_seed = 0;
        self.flood_fill_generation = 0;
    }

    /// Dimensions of the map in tiles.
    #[must_use]
    pub const fn dimensions(&self) -> MapDimensions {
        self.dimensions
    }

    /// Seed the map was set up with.
    #[must_use]
    pub const fn random_seed(&self) -> u32 {
        self.random_seed
    }

    /// Reports whether the location lies inside the map.
    #[must_use]
    pub fn is_within_map(&self, location: TileLocation) -> bool {
        self.index(location).is_some()
    }

    /// Tile at the provided logical location.
    #[must_use]
    pub fn tile(&self, location: TileLocation) -> Option<&TerrainTile> {
        self.index(location).map(|index| &self.tiles[index])
    }

    pub(crate) fn tile_mut(&mut self, location: TileLocation) -> Option<&mut TerrainTile> {
        self.index(location).map(move |index| &mut self.tiles[index])
    }

    /// Tile one step away from `location` in `direction`; never wraps around edges.
    #[must_use]
    pub fn neighbour(&self, location: TileLocation, direction: Direction) -> Option<&TerrainTile> {
        self.tile(location.offset(direction))
    }

    /// Tile containing the provided world-space coordinate.
    #[must_use]
    pub fn tile_from_world(&self, coordinate: Vec3) -> Option<&TerrainTile> {
        self.tile(world_to_tile(coordinate))
    }

    /// Iterates over all tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &TerrainTile> {
        self.tiles.iter()
    }

    /// Iterates the locations of `area` clipped to the map bounds.
    #[must_use]
    pub fn iter_area(&self, area: TileArea) -> AreaTiles {
        AreaTiles::new(area.intersection(&self.dimensions.area()))
    }

    /// World-space box enclosing the whole map.
    #[must_use]
    pub fn bounds(&self) -> WorldBounds {
        area_bounds(self.dimensions.area())
    }

    /// Collects the 4-connected region around `origin` matching it under `flags`.
    ///
    /// Expansion never leaves `scan_area` when one is given. The origin is always
    /// part of the result, even when it lies outside the scan area.
    pub fn flood_fill4(
        &mut self,
        origin: TileLocation,
        scan_area: Option<TileArea>,
        flags: FloodFillFlags,
    ) -> Vec<TileLocation> {
        self.flood_fill4_matching(origin, scan_area, flags, |_| true)
    }

    /// Same as [`GameMap::flood_fill4`] with an additional per-tile acceptance test.
    pub fn flood_fill4_matching<F>(
        &mut self,
        origin: TileLocation,
        scan_area: Option<TileArea>,
        flags: FloodFillFlags,
        mut accept: F,
    ) -> Vec<TileLocation>
    where
        F: FnMut(&TerrainTile) -> bool,
    {
        let Some(origin_index) = self.index(origin) else {
            debug_assert!(false, "flood fill origin {origin:?} lies outside the map");
            return Vec::new();
        };

        let generation = self.next_flood_fill_generation();
        let reference = &mut self.tiles[origin_index];
        reference.flood_fill_generation = generation;
        let origin_owner = reference.owner;
        let origin_terrain = reference.terrain();
        let origin_room_terrain = reference.room_terrain;

        let mut output = vec![origin];
        let mut queue = VecDeque::from([origin]);

        while let Some(current) = queue.pop_front() {
            for direction in Direction::STRAIGHT {
                let neighbour = current.offset(direction);
                if scan_area.is_some_and(|area| !area.contains(neighbour)) {
                    continue;
                }
                let Some(index) = self.index(neighbour) else {
                    continue;
                };

                let tile = &mut self.tiles[index];
                if tile.flood_fill_generation == generation {
                    continue;
                }
                if flags.same_owner && tile.owner != origin_owner {
                    continue;
                }
                if flags.same_base_terrain {
                    if tile.terrain() != origin_terrain {
                        continue;
                    }
                } else if tile.room_terrain != origin_room_terrain {
                    continue;
                }
                if !accept(&*tile) {
                    continue;
                }

                tile.flood_fill_generation = generation;
                output.push(neighbour);
                queue.push_back(neighbour);
            }
        }

        output
    }

    pub(crate) fn clear_mesh_invalidation(&mut self) {
        for tile in &mut self.tiles {
            tile.mesh_invalidated = false;
        }
    }

    fn next_flood_fill_generation(&mut self) -> u32 {
        if self.flood_fill_generation == u32::MAX {
            for tile in &mut self.tiles {
                tile.flood_fill_generation = 0;
            }
            self.flood_fill_generation = 0;
        }
        self.flood_fill_generation += 1;
        self.flood_fill_generation
    }

    fn index(&self, location: TileLocation) -> Option<usize> {
        let column = u32::try_from(location.x()).ok()?;
        let row = u32::try_from(location.y()).ok()?;
        if column >= self.dimensions.width() || row >= self.dimensions.height() {
            return None;
        }
        let width = usize::try_from(self.dimensions.width()).ok()?;
        let row = usize::try_from(row).ok()?;
        let column = usize::try_from(column).ok()?;
        Some(row * width + column)
    }
}

/// Converts a world-space coordinate to the logical tile containing it.
#[must_use]
pub fn world_to_tile(coordinate: Vec3) -> TileLocation {
    let x = ((coordinate.x + TERRAIN_BLOCK_HALF_SIZE) / TERRAIN_BLOCK_SIZE).floor();
    let y = ((coordinate.z + TERRAIN_BLOCK_HALF_SIZE) / TERRAIN_BLOCK_SIZE).floor();
    TileLocation::new(x as i32, y as i32)
}

/// World-space centre of the top face of a tile.
#[must_use]
pub fn tile_center(location: TileLocation) -> Vec3 {
    Vec3::new(
        location.x() as f32 * TERRAIN_BLOCK_SIZE,
        TERRAIN_FLOOR_LEVEL + TERRAIN_BLOCK_HEIGHT,
        location.y() as f32 * TERRAIN_BLOCK_SIZE,
    )
}

/// World-space north-west corner of the top face of a tile.
#[must_use]
pub fn tile_corner(location: TileLocation) -> Vec3 {
    Vec3::new(
        location.x() as f32 * TERRAIN_BLOCK_SIZE - TERRAIN_BLOCK_HALF_SIZE,
        TERRAIN_FLOOR_LEVEL + TERRAIN_BLOCK_HEIGHT,
        location.y() as f32 * TERRAIN_BLOCK_SIZE - TERRAIN_BLOCK_HALF_SIZE,
    )
}

/// World-space box enclosing every tile of `area`, floor to block top.
#[must_use]
pub fn area_bounds(area: TileArea) -> WorldBounds {
    let min = Vec3::new(
        area.x() as f32 * TERRAIN_BLOCK_SIZE - TERRAIN_BLOCK_HALF_SIZE,
        TERRAIN_FLOOR_LEVEL,
        area.y() as f32 * TERRAIN_BLOCK_SIZE - TERRAIN_BLOCK_HALF_SIZE,
    );
    let max = Vec3::new(
        min.x + area.width() as f32 * TERRAIN_BLOCK_SIZE,
        TERRAIN_FLOOR_LEVEL + TERRAIN_BLOCK_HEIGHT,
        min.z + area.height() as f32 * TERRAIN_BLOCK_SIZE,
    );
    WorldBounds { min, max }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use keeper_core::{PlayerId, TerrainTypeId};

    use super::*;

    const PATH: TerrainTypeId = TerrainTypeId::new(1);
    const WATER: TerrainTypeId = TerrainTypeId::new(2);

    fn uniform_map(width: u32, height: u32) -> GameMap {
        let mut map = GameMap::new();
        map.setup(MapDimensions::new(width, height), 0xDEAD_BEEF);
        for row in 0..height as i32 {
            for column in 0..width as i32 {
                let tile = map
                    .tile_mut(TileLocation::new(column, row))
                    .expect("tile inside map");
                tile.base_terrain = PATH;
                tile.owner = PlayerId::Keeper1;
            }
        }
        map
    }

    fn set_terrain(map: &mut GameMap, x: i32, y: i32, terrain: TerrainTypeId) {
        map.tile_mut(TileLocation::new(x, y))
            .expect("tile inside map")
            .base_terrain = terrain;
    }

    fn as_set(locations: &[TileLocation]) -> BTreeSet<TileLocation> {
        locations.iter().copied().collect()
    }

    #[test]
    fn setup_is_deterministic_for_identical_seeds() {
        let mut first = GameMap::new();
        let mut second = GameMap::new();
        first.setup(MapDimensions::new(6, 4), 17);
        second.setup(MapDimensions::new(6, 4), 17);

        let first_values: Vec<u32> = first.tiles().map(TerrainTile::random_value).collect();
        let second_values: Vec<u32> = second.tiles().map(TerrainTile::random_value).collect();
        assert_eq!(first_values, second_values);
        assert_eq!(first_values.len(), 24);

        let mut third = GameMap::new();
        third.setup(MapDimensions::new(6, 4), 18);
        let third_values: Vec<u32> = third.tiles().map(TerrainTile::random_value).collect();
        assert_ne!(first_values, third_values);
    }

    #[test]
    fn setup_assigns_row_major_locations() {
        let map = uniform_map(3, 2);
        let locations: Vec<TileLocation> = map.tiles().map(TerrainTile::location).collect();
        assert_eq!(
            locations,
            vec![
                TileLocation::new(0, 0),
                TileLocation::new(1, 0),
                TileLocation::new(2, 0),
                TileLocation::new(0, 1),
                TileLocation::new(1, 1),
                TileLocation::new(2, 1),
            ]
        );
    }

    #[test]
    fn neighbour_lookup_never_wraps() {
        let map = uniform_map(3, 3);
        let corner = TileLocation::new(0, 0);
        assert!(map.neighbour(corner, Direction::West).is_none());
        assert!(map.neighbour(corner, Direction::North).is_none());
        assert!(map.neighbour(corner, Direction::NorthEast).is_none());
        assert_eq!(
            map.neighbour(corner, Direction::SouthEast)
                .map(TerrainTile::location),
            Some(TileLocation::new(1, 1))
        );
        let far = TileLocation::new(2, 2);
        assert!(map.neighbour(far, Direction::East).is_none());
        assert!(map.neighbour(far, Direction::South).is_none());
    }

    #[test]
    fn area_iteration_is_row_major_and_clipped() {
        let map = uniform_map(4, 4);
        let mut tiles = map.iter_area(TileArea::new(2, -1, 5, 3));
        assert_eq!(tiles.area(), TileArea::new(2, 0, 2, 2));
        let first_pass: Vec<TileLocation> = tiles.by_ref().collect();
        assert_eq!(
            first_pass,
            vec![
                TileLocation::new(2, 0),
                TileLocation::new(3, 0),
                TileLocation::new(2, 1),
                TileLocation::new(3, 1),
            ]
        );
        assert!(tiles.next().is_none());

        tiles.reset();
        let second_pass: Vec<TileLocation> = tiles.collect();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn area_outside_map_yields_nothing() {
        let map = uniform_map(4, 4);
        assert_eq!(map.iter_area(TileArea::new(10, 10, 3, 3)).count(), 0);
    }

    #[test]
    fn world_coordinates_round_trip_through_tile_centres() {
        let map = uniform_map(5, 5);
        let location = TileLocation::new(3, 2);
        let centre = tile_center(location);
        assert_eq!(world_to_tile(centre), location);
        assert_eq!(
            map.tile_from_world(centre).map(TerrainTile::location),
            Some(location)
        );

        let corner = tile_corner(location);
        assert_eq!(world_to_tile(corner), location);
        assert_eq!(world_to_tile(Vec3::new(-0.6, 0.0, 0.0)).x(), -1);
        assert!(map.tile_from_world(Vec3::new(-0.6, 0.0, 0.0)).is_none());
    }

    #[test]
    fn map_bounds_enclose_all_tiles() {
        let map = uniform_map(4, 3);
        let bounds = map.bounds();
        assert_eq!(bounds.min, Vec3::new(-0.5, TERRAIN_FLOOR_LEVEL, -0.5));
        assert_eq!(
            bounds.max,
            Vec3::new(3.5, TERRAIN_FLOOR_LEVEL + TERRAIN_BLOCK_HEIGHT, 2.5)
        );
    }

    #[test]
    fn flood_fill_is_origin_invariant() {
        let mut map = uniform_map(6, 6);
        for row in 0..6 {
            set_terrain(&mut map, 3, row, WATER);
        }
        let flags = FloodFillFlags {
            same_owner: true,
            same_base_terrain: true,
        };

        let from_corner = as_set(&map.flood_fill4(TileLocation::new(0, 0), None, flags));
        let from_middle = as_set(&map.flood_fill4(TileLocation::new(2, 4), None, flags));
        assert_eq!(from_corner.len(), 18);
        assert_eq!(from_corner, from_middle);
        assert!(from_corner.iter().all(|location| location.x() < 3));
    }

    #[test]
    fn flood_fill_excludes_diagonal_connections() {
        let mut map = uniform_map(3, 3);
        for row in 0..3 {
            for column in 0..3 {
                set_terrain(&mut map, column, row, WATER);
            }
        }
        set_terrain(&mut map, 0, 0, PATH);
        set_terrain(&mut map, 1, 1, PATH);
        let flags = FloodFillFlags {
            same_owner: true,
            same_base_terrain: true,
        };

        let region = map.flood_fill4(TileLocation::new(0, 0), None, flags);
        assert_eq!(region, vec![TileLocation::new(0, 0)]);
    }

    #[test]
    fn flood_fill_respects_scan_area() {
        let mut map = uniform_map(6, 6);
        let scan = TileArea::new(1, 1, 3, 2);
        let region = as_set(&map.flood_fill4(
            TileLocation::new(2, 2),
            Some(scan),
            FloodFillFlags::default(),
        ));
        assert_eq!(region.len(), 6);
        assert!(region.iter().all(|location| scan.contains(*location)));
    }

    #[test]
    fn flood_fill_with_empty_scan_area_yields_origin() {
        let mut map = uniform_map(4, 4);
        let origin = TileLocation::new(1, 1);
        let region = map.flood_fill4(
            origin,
            Some(TileArea::new(0, 0, 0, 0)),
            FloodFillFlags::default(),
        );
        assert_eq!(region, vec![origin]);
    }

    #[test]
    fn flood_fill_matches_owner_when_requested() {
        let mut map = uniform_map(4, 1);
        map.tile_mut(TileLocation::new(2, 0))
            .expect("tile inside map")
            .owner = PlayerId::Keeper2;

        let owned = map.flood_fill4(TileLocation::new(0, 0), None, FloodFillFlags::default());
        assert_eq!(as_set(&owned).len(), 2);

        let any_owner = map.flood_fill4(
            TileLocation::new(0, 0),
            None,
            FloodFillFlags {
                same_owner: false,
                same_base_terrain: false,
            },
        );
        assert_eq!(as_set(&any_owner).len(), 4);
    }

    #[test]
    fn flood_fill_category_match_separates_room_terrain() {
        let mut map = uniform_map(4, 1);
        map.tile_mut(TileLocation::new(2, 0))
            .expect("tile inside map")
            .room_terrain = Some(TerrainTypeId::new(9));

        let plain = map.flood_fill4(TileLocation::new(0, 0), None, FloodFillFlags::default());
        assert_eq!(
            as_set(&plain),
            as_set(&[TileLocation::new(0, 0), TileLocation::new(1, 0)])
        );
        let room = map.flood_fill4(TileLocation::new(2, 0), None, FloodFillFlags::default());
        assert_eq!(room, vec![TileLocation::new(2, 0)]);
    }

    #[test]
    fn sequential_fills_over_disjoint_regions_stay_separate() {
        let mut map = uniform_map(5, 3);
        for row in 0..3 {
            set_terrain(&mut map, 2, row, WATER);
        }
        let flags = FloodFillFlags {
            same_owner: true,
            same_base_terrain: true,
        };

        let left = as_set(&map.flood_fill4(TileLocation::new(0, 0), None, flags));
        let right = as_set(&map.flood_fill4(TileLocation::new(4, 2), None, flags));
        assert_eq!(left.len(), 6);
        assert_eq!(right.len(), 6);
        assert!(left.is_disjoint(&right));

        let left_again = as_set(&map.flood_fill4(TileLocation::new(1, 1), None, flags));
        assert_eq!(left, left_again);
    }

    #[test]
    fn generation_wrap_clears_tile_stamps() {
        let mut map = uniform_map(3, 3);
        map.flood_fill_generation = u32::MAX - 1;
        let first = map.flood_fill4(TileLocation::new(0, 0), None, FloodFillFlags::default());
        assert_eq!(first.len(), 9);
        assert_eq!(map.flood_fill_generation, u32::MAX);

        let second = map.flood_fill4(TileLocation::new(2, 2), None, FloodFillFlags::default());
        assert_eq!(second.len(), 9);
        assert_eq!(map.flood_fill_generation, 1);
    }

    #[test]
    fn matching_predicate_limits_expansion() {
        let mut map = uniform_map(5, 1);
        let blocked = TileLocation::new(2, 0);
        let region = map.flood_fill4_matching(
            TileLocation::new(0, 0),
            None,
            FloodFillFlags::default(),
            |tile| tile.location() != blocked,
        );
        assert_eq!(
            as_set(&region),
            as_set(&[TileLocation::new(0, 0), TileLocation::new(1, 0)])
        );
    }

    #[test]
    fn clear_releases_tiles() {
        let mut map = uniform_map(3, 3);
        map.clear();
        assert_eq!(map.dimensions(), MapDimensions::default());
        assert!(map.tile(TileLocation::new(0, 0)).is_none());
        assert_eq!(map.tiles().count(), 0);
    }
}
