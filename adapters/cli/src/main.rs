#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays a scripted Keeper dungeon scenario.

mod report;
mod scenario_file;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use keeper_core::{Command, Event, TileLocation};
use keeper_system_interaction::{Interaction, InteractionInput, MapInteractionMode};
use keeper_world::{apply, query, World};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::scenario_file::{Legend, ScenarioFile, ScriptStep, SelectMode, Selection};

/// Command-line arguments accepted by the Keeper replay tool.
#[derive(Debug, Parser)]
#[command(name = "keeper", about = "Replays a scripted dungeon scenario")]
struct Args {
    /// Scenario file to load.
    #[arg(long)]
    scenario: PathBuf,
    /// Overrides the seed stored in the scenario file.
    #[arg(long)]
    seed: Option<u32>,
    /// Logs every world event.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Keeper command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let contents = fs::read_to_string(&args.scenario)
        .with_context(|| format!("failed to read scenario file {}", args.scenario.display()))?;
    let file = ScenarioFile::parse(&contents)?;
    let (world, legend) = run(&file, args.seed)?;
    print!("{}", report::render(&world, &legend));
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the world from the scenario file and replays its script.
fn run(file: &ScenarioFile, seed: Option<u32>) -> Result<(World, Legend)> {
    let (data, legend) = file.resolve()?;
    let mut world = World::new();
    world
        .load_scenario(data)
        .context("scenario failed validation")?;

    let seed = seed.unwrap_or(file.seed);
    let mut events = Vec::new();
    apply(&mut world, Command::EnterWorld { seed }, &mut events);
    info!(seed, rooms = query::rooms(&world).count(), "world entered");

    let mut interaction = Interaction::new(file.player);
    for (index, step) in file.script.iter().enumerate() {
        let commands = step_commands(&world, &mut interaction, &events, step)
            .with_context(|| format!("script step {index}"))?;
        events.clear();
        for command in commands {
            apply(&mut world, command, &mut events);
        }
        for event in &events {
            debug!(step = index, ?event, "world event");
            if let Event::CommandRejected { reason } = event {
                bail!("script step {index} was rejected: {reason:?}");
            }
        }
    }
    Ok((world, legend))
}

fn step_commands(
    world: &World,
    interaction: &mut Interaction,
    events: &[Event],
    step: &ScriptStep,
) -> Result<Vec<Command>> {
    let selection = match step {
        ScriptStep::Command(command) => return Ok(vec![command.clone()]),
        ScriptStep::Select(selection) => selection,
    };

    let mut commands = Vec::new();
    let is_tagged = |location: TileLocation| {
        query::tile(world, location).is_some_and(|tile| tile.is_tagged())
    };
    interaction.handle(events, InteractionInput::default(), is_tagged, &mut commands);
    interaction.set_mode(interaction_mode(world, selection)?);

    let [x, y] = selection.from;
    let from = TileLocation::new(x, y);
    let [x, y] = selection.to.unwrap_or(selection.from);
    let to = TileLocation::new(x, y);
    interaction.handle(
        &[],
        InteractionInput {
            cursor: Some(from),
            press: true,
            ..InteractionInput::default()
        },
        is_tagged,
        &mut commands,
    );
    interaction.handle(
        &[],
        InteractionInput {
            cursor: Some(to),
            release: true,
            alternate: selection.alternate,
            ..InteractionInput::default()
        },
        is_tagged,
        &mut commands,
    );
    Ok(commands)
}

fn interaction_mode(world: &World, selection: &Selection) -> Result<MapInteractionMode> {
    Ok(match selection.select {
        SelectMode::Free => MapInteractionMode::Free,
        SelectMode::SellRooms => MapInteractionMode::SellRooms,
        SelectMode::DigTerrain => MapInteractionMode::DigTerrain,
        SelectMode::ConstructRooms => {
            let Some(name) = selection.room.as_deref() else {
                bail!("room construction requires a room name");
            };
            let room = query::scenario(world)
                .and_then(|scenario| scenario.room_by_name(name))
                .with_context(|| format!("unknown room `{name}`"))?;
            MapInteractionMode::ConstructRooms(room.room_type)
        }
    })
}

#[cfg(test)]
mod tests {
    use keeper_core::{PlayerId, RoomInstanceId, TerrainTypeId};

    use super::*;

    const SAMPLE: &str = include_str!("../scenarios/dungeon.toml");

    fn sample_run() -> World {
        let file = ScenarioFile::parse(SAMPLE).expect("sample parses");
        run(&file, None).expect("sample script replays").0
    }

    fn room_summary(world: &World) -> Vec<(String, usize)> {
        let scenario = query::scenario(world).expect("scenario loaded");
        query::rooms(world)
            .map(|room| {
                (
                    scenario.room(room.definition()).name.clone(),
                    room.tile_count(),
                )
            })
            .collect()
    }

    #[test]
    fn sample_script_builds_expected_rooms() {
        let world = sample_run();
        assert_eq!(
            room_summary(&world),
            vec![
                ("dungeon_heart".to_owned(), 4),
                ("bridge".to_owned(), 6),
                ("lair".to_owned(), 6),
                ("treasury".to_owned(), 4),
                ("lair".to_owned(), 2),
            ]
        );
        let split = query::room(&world, RoomInstanceId::new(4)).expect("split lair exists");
        assert!(split.contains(TileLocation::new(6, 4)));
        assert!(split.contains(TileLocation::new(6, 5)));
    }

    #[test]
    fn sample_script_digs_and_claims_the_tagged_block() {
        let world = sample_run();
        let dug = query::tile(&world, TileLocation::new(2, 1)).expect("tile inside map");
        assert_eq!(dug.terrain(), TerrainTypeId::new(4));
        assert_eq!(dug.owner(), PlayerId::Keeper1);
        assert!(!dug.is_tagged());

        let tagged = query::tile(&world, TileLocation::new(1, 1)).expect("tile inside map");
        assert!(tagged.is_tagged());
    }

    #[test]
    fn report_draws_map_with_legend_symbols() {
        let file = ScenarioFile::parse(SAMPLE).expect("sample parses");
        let (world, legend) = run(&file, Some(5)).expect("sample script replays");
        let report = report::render(&world, &legend);

        assert!(report.starts_with("rooms: 5\n"));
        assert!(report.contains("  #0 dungeon_heart owner=Keeper1 tiles=4\n"));
        let rows: Vec<&str> = report.lines().skip(6).collect();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0], "RRRRRRRRRRRR");
        assert_eq!(rows[1], "R#.....BB##R");
        assert_eq!(rows[4], "R##.L.Lww??R");
        assert_eq!(rows[5], "R#LLL.Lww??R");
    }

    #[test]
    fn rejected_commands_abort_the_script() {
        let contents = format!(
            "{SAMPLE}\n[[script]]\ncommand = \"construct_room\"\nowner = \"Keeper1\"\n\
             room_type = 99\narea = {{ x = 0, y = 0, width = 1, height = 1 }}\n"
        );
        let file = ScenarioFile::parse(&contents).expect("extended sample parses");
        let error = run(&file, None).expect_err("unknown room type is rejected");
        assert!(
            error.to_string().contains("script step 8 was rejected"),
            "unexpected error: {error:#}"
        );
    }

    #[test]
    fn unknown_room_names_are_reported() {
        let contents = SAMPLE.replace("room = \"treasury\"", "room = \"casino\"");
        let file = ScenarioFile::parse(&contents).expect("sample parses");
        let error = run(&file, None).expect_err("casino is undefined");
        assert_eq!(format!("{error:#}"), "script step 2: unknown room `casino`");
    }
}
