#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Keeper dungeon simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired map mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing every
//! terrain, ownership and room change so that render layers and systems can
//! react deterministically.

mod definitions;

pub use definitions::{
    BridgeTerrain, CreatureDefinition, GameObjectDefinition, GameObjectMaterial, MapTileData,
    RoomDefinition, ScenarioData, TerrainDefinition,
};

use serde::{Deserialize, Serialize};

/// Side length of a single map tile measured in world units.
pub const TERRAIN_BLOCK_SIZE: f32 = 1.0;
/// Half of [`TERRAIN_BLOCK_SIZE`], used to centre tiles on integer coordinates.
pub const TERRAIN_BLOCK_HALF_SIZE: f32 = 0.5;
/// World-space height of the dungeon floor.
pub const TERRAIN_FLOOR_LEVEL: f32 = 1.0;
/// World-space height of a solid terrain block.
pub const TERRAIN_BLOCK_HEIGHT: f32 = 1.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Builds the tile map from the loaded scenario and materialises startup rooms.
    EnterWorld {
        /// Seed driving the per-tile cosmetic random values.
        seed: u32,
    },
    /// Releases the tile map and every room instance.
    ClearWorld,
    /// Marks every taggable tile inside the area as a dig target.
    TagTerrain {
        /// Tiles affected by the request.
        area: TileArea,
    },
    /// Removes the dig-target mark from every taggable tile inside the area.
    UnTagTerrain {
        /// Tiles affected by the request.
        area: TileArea,
    },
    /// Constructs rooms of the requested type on every legal tile inside the area.
    ConstructRoom {
        /// Player that pays for and owns the constructed rooms.
        owner: PlayerId,
        /// Definition describing the room to construct.
        room_type: RoomTypeId,
        /// Tiles affected by the request.
        area: TileArea,
    },
    /// Sells every room tile owned by the player inside the area.
    SellRooms {
        /// Player selling the rooms.
        owner: PlayerId,
        /// Tiles affected by the request.
        area: TileArea,
    },
    /// Damages a single tile, transitioning its terrain when destroyed.
    DamageTerrainTile {
        /// Tile receiving the damage.
        location: TileLocation,
        /// Player inflicting the damage.
        player: PlayerId,
        /// Amount of damage dealt; must be positive.
        hit_points: u32,
    },
    /// Repairs or claims a single tile, transitioning its terrain at full health.
    RepairTerrainTile {
        /// Tile receiving the repair.
        location: TileLocation,
        /// Player performing the repair; becomes the owner of the tile.
        player: PlayerId,
        /// Amount of health restored; must be positive.
        hit_points: u32,
    },
    /// Covers every tile inside the area with the fog-of-war terrain.
    HideTerrain {
        /// Tiles affected by the request.
        area: TileArea,
    },
    /// Removes the fog-of-war terrain from every tile inside the area.
    RevealTerrain {
        /// Tiles affected by the request.
        area: TileArea,
    },
    /// Acknowledges that the render layer rebuilt every invalidated tile mesh.
    TileMeshesRebuilt,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the world map was built from the loaded scenario.
    WorldEntered {
        /// Dimensions of the freshly built map.
        dimensions: MapDimensions,
    },
    /// Announces that the world map and all rooms were released.
    WorldCleared,
    /// Reports that the dig-target mark of a tile changed.
    TileTagChanged {
        /// Tile whose mark changed.
        location: TileLocation,
        /// Mark applied after processing the command.
        tagged: bool,
    },
    /// Reports that the effective terrain of a tile changed.
    TerrainChanged {
        /// Tile whose terrain changed.
        location: TileLocation,
        /// Effective terrain before the change.
        from: TerrainTypeId,
        /// Effective terrain after the change.
        to: TerrainTypeId,
    },
    /// Reports that a tile passed to another player.
    TileOwnerChanged {
        /// Tile whose owner changed.
        location: TileLocation,
        /// Owner before the change.
        from: PlayerId,
        /// Owner after the change.
        to: PlayerId,
    },
    /// Confirms that a new room instance was created.
    RoomCreated {
        /// Identifier allocated to the room.
        room: RoomInstanceId,
        /// Definition of the room.
        room_type: RoomTypeId,
        /// Player owning the room.
        owner: PlayerId,
    },
    /// Confirms that tiles were added to a room.
    RoomEnlarged {
        /// Room that grew.
        room: RoomInstanceId,
        /// Number of tiles added.
        added: usize,
    },
    /// Confirms that one room took over tiles of another.
    RoomAbsorbed {
        /// Room receiving the tiles.
        receiver: RoomInstanceId,
        /// Room that gave up its tiles.
        source: RoomInstanceId,
        /// Number of tiles transferred.
        transferred: usize,
    },
    /// Confirms that tiles were removed from a room.
    RoomTilesReleased {
        /// Room that shrank.
        room: RoomInstanceId,
        /// Number of tiles released.
        released: usize,
    },
    /// Confirms that a room instance was destroyed.
    RoomDestroyed {
        /// Identifier of the destroyed room.
        room: RoomInstanceId,
    },
    /// Notifies a room that the terrain of an adjacent tile changed.
    RoomNeighbourTileChanged {
        /// Room adjacent to the change.
        room: RoomInstanceId,
        /// Tile whose terrain changed.
        location: TileLocation,
    },
    /// Requests that the render layer rebuilds the mesh of a tile.
    TileMeshInvalidated {
        /// Tile whose visual representation is stale.
        location: TileLocation,
    },
    /// Reports that a command could not be applied.
    CommandRejected {
        /// Specific reason the command was rejected.
        reason: RejectionReason,
    },
}

/// Reasons a command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// No scenario was loaded before entering the world.
    ScenarioMissing,
    /// The command requires an entered world.
    WorldNotEntered,
    /// The requested room type is not defined by the scenario.
    UnknownRoomType(RoomTypeId),
    /// The targeted tile lies outside the map.
    OutOfBounds(TileLocation),
    /// Damage or repair requests must carry positive hit points.
    ZeroHitPoints,
}

/// Player identifiers known to the simulation.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PlayerId {
    /// Not a player.
    #[default]
    Null,
    /// The heroes.
    Good,
    /// Unclaimed terrain and neutral creatures.
    Neutral,
    /// First keeper.
    Keeper1,
    /// Second keeper.
    Keeper2,
    /// Third keeper.
    Keeper3,
    /// Fourth keeper.
    Keeper4,
}

macro_rules! type_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Reserved identifier that never refers to a valid definition.
            pub const NULL: Self = Self(0);

            /// Creates a new type identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }

            /// Reports whether the identifier is the reserved null value.
            #[must_use]
            pub const fn is_null(&self) -> bool {
                self.0 == 0
            }

            /// Index of the definition inside its scenario table.
            #[must_use]
            pub const fn index(&self) -> usize {
                self.0 as usize
            }
        }
    };
}

type_id!(
    /// Identifier of a terrain definition.
    TerrainTypeId
);
type_id!(
    /// Identifier of a room definition.
    RoomTypeId
);
type_id!(
    /// Identifier of a game object definition.
    GameObjectTypeId
);
type_id!(
    /// Identifier of a creature definition.
    CreatureTypeId
);

/// Unique identifier assigned to a room instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomInstanceId(u64);

impl RoomInstanceId {
    /// Creates a new room identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the room identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Logical location of a tile on the map grid.
///
/// Coordinates are signed so that neighbour offsets of edge tiles can be
/// expressed and then rejected by bounds checks instead of wrapping.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileLocation {
    x: i32,
    y: i32,
}

impl TileLocation {
    /// Creates a new tile location.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the tile.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the tile.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Location one step away in the provided direction.
    #[must_use]
    pub const fn offset(self, direction: Direction) -> Self {
        let (dx, dy) = direction.vector();
        Self {
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
        }
    }
}

/// Axis-aligned rectangle of tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileArea {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl TileArea {
    /// Creates an area anchored at `(x, y)` spanning `width` by `height` tiles.
    ///
    /// Negative extents are clamped to zero, producing an empty area.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: if width < 0 { 0 } else { width },
            height: if height < 0 { 0 } else { height },
        }
    }

    /// Creates an area spanning the provided corner tiles inclusively, in any order.
    #[must_use]
    pub fn spanning(first: TileLocation, second: TileLocation) -> Self {
        let min_x = first.x().min(second.x());
        let min_y = first.y().min(second.y());
        let max_x = first.x().max(second.x());
        let max_y = first.y().max(second.y());
        Self::new(
            min_x,
            min_y,
            span_length(min_x, max_x),
            span_length(min_y, max_y),
        )
    }

    /// Area covering a single tile.
    #[must_use]
    pub const fn single(location: TileLocation) -> Self {
        Self::new(location.x(), location.y(), 1, 1)
    }

    /// Leftmost column of the area.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Topmost row of the area.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Width of the area in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height of the area in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Reports whether the area covers no tiles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Reports whether the location lies inside the area.
    #[must_use]
    pub const fn contains(&self, location: TileLocation) -> bool {
        location.x() >= self.x
            && location.y() >= self.y
            && (location.x() as i64) < self.x as i64 + self.width as i64
            && (location.y() as i64) < self.y as i64 + self.height as i64
    }

    /// Overlap between two areas; empty when they do not intersect.
    #[must_use]
    pub fn intersection(&self, other: &TileArea) -> TileArea {
        let min_x = self.x.max(other.x);
        let min_y = self.y.max(other.y);
        let max_x = (self.x as i64 + self.width as i64).min(other.x as i64 + other.width as i64);
        let max_y = (self.y as i64 + self.height as i64).min(other.y as i64 + other.height as i64);
        let width = (max_x - min_x as i64).clamp(0, i64::from(i32::MAX)) as i32;
        let height = (max_y - min_y as i64).clamp(0, i64::from(i32::MAX)) as i32;
        TileArea::new(min_x, min_y, width, height)
    }
}

/// Inclusive tile count between two coordinates, saturating at `i32::MAX`.
fn span_length(min: i32, max: i32) -> i32 {
    (i64::from(max) - i64::from(min) + 1).clamp(0, i64::from(i32::MAX)) as i32
}

/// Fixed dimensions of a map measured in tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapDimensions {
    width: u32,
    height: u32,
}

impl MapDimensions {
    /// Creates new map dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of tiles.
    #[must_use]
    pub const fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Area covering the whole map.
    #[must_use]
    pub fn area(&self) -> TileArea {
        let width = i32::try_from(self.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.height).unwrap_or(i32::MAX);
        TileArea::new(0, 0, width, height)
    }
}

/// Compass directions between neighbouring tiles.
///
/// ```text
///   NW   N   NE
///        |
///  W <--- ---> E
///        |
///   SW   S   SE
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing rows.
    North,
    /// North and east.
    NorthEast,
    /// Toward increasing columns.
    East,
    /// South and east.
    SouthEast,
    /// Toward increasing rows.
    South,
    /// South and west.
    SouthWest,
    /// Toward decreasing columns.
    West,
    /// North and west.
    NorthWest,
}

impl Direction {
    /// All eight directions in clockwise order starting at north.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// The four straight directions in clockwise order starting at north.
    pub const STRAIGHT: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit offset `(dx, dy)` of the direction.
    #[must_use]
    pub const fn vector(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::South => Self::North,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
            Self::NorthWest => Self::SouthEast,
        }
    }

    /// Reports whether the direction is one of N, E, S or W.
    #[must_use]
    pub const fn is_straight(self) -> bool {
        matches!(self, Self::North | Self::East | Self::South | Self::West)
    }
}
