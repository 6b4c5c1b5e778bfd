use keeper_core::{Command, Event, PlayerId, RoomTypeId, TileArea, TileLocation};
use keeper_system_interaction::{
    Interaction, InteractionInput, MapInteractionMode, DEFAULT_DIG_HIT_POINTS,
};

fn press(x: i32, y: i32) -> InteractionInput {
    InteractionInput {
        cursor: Some(TileLocation::new(x, y)),
        press: true,
        ..InteractionInput::default()
    }
}

fn release(x: i32, y: i32) -> InteractionInput {
    InteractionInput {
        cursor: Some(TileLocation::new(x, y)),
        release: true,
        ..InteractionInput::default()
    }
}

fn drag(interaction: &mut Interaction, from: (i32, i32), to: (i32, i32)) -> Vec<Command> {
    let mut commands = Vec::new();
    interaction.handle(&[], press(from.0, from.1), |_| false, &mut commands);
    interaction.handle(&[], release(to.0, to.1), |_| false, &mut commands);
    commands
}

#[test]
fn free_mode_drag_tags_spanned_area() {
    let mut interaction = Interaction::new(PlayerId::Keeper1);
    let commands = drag(&mut interaction, (3, 4), (1, 2));

    assert_eq!(
        commands,
        vec![Command::TagTerrain {
            area: TileArea::new(1, 2, 3, 3),
        }],
        "selection corners may be given in any order",
    );
}

#[test]
fn free_mode_untags_when_origin_already_tagged() {
    let mut interaction = Interaction::new(PlayerId::Keeper1);
    let mut commands = Vec::new();
    let origin = TileLocation::new(2, 2);
    let mut queried = None;

    interaction.handle(&[], press(2, 2), |_| false, &mut commands);
    interaction.handle(
        &[],
        release(2, 2),
        |location| {
            queried = Some(location);
            true
        },
        &mut commands,
    );

    assert_eq!(queried, Some(origin));
    assert_eq!(
        commands,
        vec![Command::UnTagTerrain {
            area: TileArea::single(origin),
        }]
    );
}

#[test]
fn construct_mode_emits_room_command_for_player() {
    let mut interaction = Interaction::new(PlayerId::Keeper2);
    interaction.set_mode(MapInteractionMode::ConstructRooms(RoomTypeId::new(3)));

    assert_eq!(
        drag(&mut interaction, (0, 0), (4, 1)),
        vec![Command::ConstructRoom {
            owner: PlayerId::Keeper2,
            room_type: RoomTypeId::new(3),
            area: TileArea::new(0, 0, 5, 2),
        }]
    );
}

#[test]
fn sell_mode_emits_sell_command() {
    let mut interaction = Interaction::new(PlayerId::Keeper1);
    interaction.set_mode(MapInteractionMode::SellRooms);

    assert_eq!(
        drag(&mut interaction, (1, 1), (1, 1)),
        vec![Command::SellRooms {
            owner: PlayerId::Keeper1,
            area: TileArea::single(TileLocation::new(1, 1)),
        }]
    );
}

#[test]
fn dig_mode_damages_or_claims_hovered_tile() {
    let mut interaction = Interaction::new(PlayerId::Keeper1);
    interaction.set_mode(MapInteractionMode::DigTerrain);

    let dug = drag(&mut interaction, (5, 5), (6, 5));
    assert_eq!(
        dug,
        vec![Command::DamageTerrainTile {
            location: TileLocation::new(6, 5),
            player: PlayerId::Keeper1,
            hit_points: DEFAULT_DIG_HIT_POINTS,
        }]
    );

    let mut commands = Vec::new();
    interaction.handle(&[], press(6, 5), |_| false, &mut commands);
    interaction.handle(
        &[],
        InteractionInput {
            alternate: true,
            ..release(6, 5)
        },
        |_| false,
        &mut commands,
    );
    assert_eq!(
        commands,
        vec![Command::RepairTerrainTile {
            location: TileLocation::new(6, 5),
            player: PlayerId::Keeper1,
            hit_points: DEFAULT_DIG_HIT_POINTS,
        }]
    );
}

#[test]
fn cancel_abandons_selection() {
    let mut interaction = Interaction::new(PlayerId::Keeper1);
    let mut commands = Vec::new();

    interaction.handle(&[], press(0, 0), |_| false, &mut commands);
    assert_eq!(
        interaction.selection(Some(TileLocation::new(2, 0))),
        Some(TileArea::new(0, 0, 3, 1))
    );
    interaction.handle(
        &[],
        InteractionInput {
            cancel: true,
            ..InteractionInput::default()
        },
        |_| false,
        &mut commands,
    );
    interaction.handle(&[], release(2, 0), |_| false, &mut commands);

    assert!(commands.is_empty(), "cancelled selections must not emit");
    assert!(interaction.selection(None).is_none());
}

#[test]
fn release_without_press_emits_nothing() {
    let mut interaction = Interaction::new(PlayerId::Keeper1);
    let mut commands = Vec::new();
    interaction.handle(&[], release(1, 1), |_| false, &mut commands);
    assert!(commands.is_empty());
}

#[test]
fn world_clear_resets_mode() {
    let mut interaction = Interaction::new(PlayerId::Keeper1);
    interaction.set_mode(MapInteractionMode::SellRooms);
    let mut commands = Vec::new();

    interaction.handle(&[], press(0, 0), |_| false, &mut commands);
    interaction.handle(
        &[Event::WorldCleared],
        release(0, 0),
        |_| false,
        &mut commands,
    );

    assert_eq!(interaction.mode(), MapInteractionMode::Free);
    assert!(commands.is_empty());
    assert_eq!(interaction.player(), PlayerId::Keeper1);
}
