#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure map interaction system translating cursor selections into world commands.

use keeper_core::{Command, Event, PlayerId, RoomTypeId, TileArea, TileLocation};

/// Hit points applied by a single dig or claim action.
pub const DEFAULT_DIG_HIT_POINTS: u32 = 10;

/// Determines what a confirmed selection does to the map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MapInteractionMode {
    /// Selections toggle dig-target marks.
    #[default]
    Free,
    /// Selections construct rooms of the given type.
    ConstructRooms(RoomTypeId),
    /// Selections sell rooms.
    SellRooms,
    /// Clicks destroy the hovered tile, or claim it with the alternate action.
    DigTerrain,
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InteractionInput {
    /// Tile currently hovered by the cursor.
    pub cursor: Option<TileLocation>,
    /// Selection button went down on this frame.
    pub press: bool,
    /// Selection button went up on this frame.
    pub release: bool,
    /// Player requested to abandon the current selection.
    pub cancel: bool,
    /// Alternate modifier held; claims instead of digging.
    pub alternate: bool,
}

/// Interaction system that turns drag selections into map commands.
#[derive(Clone, Debug)]
pub struct Interaction {
    player: PlayerId,
    mode: MapInteractionMode,
    drag_origin: Option<TileLocation>,
    hit_points: u32,
}

impl Interaction {
    /// Creates an interaction system acting on behalf of the player.
    #[must_use]
    pub const fn new(player: PlayerId) -> Self {
        Self {
            player,
            mode: MapInteractionMode::Free,
            drag_origin: None,
            hit_points: DEFAULT_DIG_HIT_POINTS,
        }
    }

    /// Player on whose behalf commands are issued.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Currently active interaction mode.
    #[must_use]
    pub const fn mode(&self) -> MapInteractionMode {
        self.mode
    }

    /// Switches the interaction mode, abandoning any selection in progress.
    pub fn set_mode(&mut self, mode: MapInteractionMode) {
        self.mode = mode;
        self.drag_origin = None;
    }

    /// Area spanned by the selection in progress, if any.
    #[must_use]
    pub fn selection(&self, cursor: Option<TileLocation>) -> Option<TileArea> {
        let origin = self.drag_origin?;
        Some(TileArea::spanning(origin, cursor.unwrap_or(origin)))
    }

    /// Consumes world events and frame input to emit map commands.
    ///
    /// The `is_tagged` closure should mirror `query::tile(..).is_tagged()` so the
    /// system can decide whether a free-mode selection tags or untags terrain.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        input: InteractionInput,
        mut is_tagged: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(TileLocation) -> bool,
    {
        for event in events {
            match event {
                Event::WorldCleared => self.set_mode(MapInteractionMode::Free),
                Event::WorldEntered { .. } => self.drag_origin = None,
                _ => {}
            }
        }

        if input.cancel {
            self.drag_origin = None;
            return;
        }

        if input.press {
            self.drag_origin = input.cursor;
        }

        if !input.release {
            return;
        }
        let Some(area) = self.selection(input.cursor) else {
            return;
        };
        let origin = self.drag_origin.take();

        let command = match self.mode {
            MapInteractionMode::Free => {
                if origin.is_some_and(&mut is_tagged) {
                    Command::UnTagTerrain { area }
                } else {
                    Command::TagTerrain { area }
                }
            }
            MapInteractionMode::ConstructRooms(room_type) => Command::ConstructRoom {
                owner: self.player,
                room_type,
                area,
            },
            MapInteractionMode::SellRooms => Command::SellRooms {
                owner: self.player,
                area,
            },
            MapInteractionMode::DigTerrain => {
                let Some(location) = input.cursor else {
                    return;
                };
                if input.alternate {
                    Command::RepairTerrainTile {
                        location,
                        player: self.player,
                        hit_points: self.hit_points,
                    }
                } else {
                    Command::DamageTerrainTile {
                        location,
                        player: self.player,
                        hit_points: self.hit_points,
                    }
                }
            }
        };
        out.push(command);
    }
}
