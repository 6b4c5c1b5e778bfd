//! Plain-text summary of the world after a scripted run.

use std::fmt::Write as _;

use keeper_world::{query, World};

use crate::scenario_file::Legend;

/// Renders the room list followed by the map drawn with legend symbols.
pub(crate) fn render(world: &World, legend: &Legend) -> String {
    let mut out = String::new();
    let rooms: Vec<_> = query::rooms(world).collect();
    let _ = writeln!(out, "rooms: {}", rooms.len());
    for room in rooms {
        let name = query::scenario(world)
            .map_or("?", |scenario| scenario.room(room.definition()).name.as_str());
        let _ = writeln!(
            out,
            "  #{} {name} owner={:?} tiles={}",
            room.id().get(),
            room.owner(),
            room.tile_count()
        );
    }

    let map = query::map(world);
    let width = map.dimensions().width() as usize;
    for (index, tile) in map.tiles().enumerate() {
        out.push(legend.symbol_for(tile.terrain(), tile.owner()));
        if (index + 1) % width.max(1) == 0 {
            out.push('\n');
        }
    }
    out
}
