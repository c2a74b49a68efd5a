use setlerio_core::{
    BuildingKind, BuildingStage, Command, HexCoord, Occupant, TileAction, TileInfo,
};
use setlerio_system_builder::{available_actions, Builder, BuilderInput, MenuEntry};
use setlerio_world::{self as world, query, World};

const TILE: HexCoord = HexCoord::new(1, 0);

fn blank_claimed() -> TileInfo {
    TileInfo {
        hex: TILE,
        occupant: Some(Occupant::Blank),
        claimed: true,
        construction: None,
    }
}

fn click(hex: HexCoord) -> BuilderInput {
    BuilderInput {
        hovered: Some(hex),
        clicked: Some(hex),
        ..BuilderInput::default()
    }
}

fn choose(index: usize) -> BuilderInput {
    BuilderInput {
        chosen_option: Some(index),
        ..BuilderInput::default()
    }
}

#[test]
fn blank_claimed_tile_offers_build_submenu() {
    let options = available_actions(&blank_claimed());

    assert_eq!(options.len(), 1);
    assert_eq!(options[0].label, "Build");
    let MenuEntry::Submenu(buildable) = &options[0].entry else {
        panic!("build entry should open a submenu");
    };
    let actions: Vec<_> = buildable
        .iter()
        .map(|option| (option.label.as_str(), option.entry.clone()))
        .collect();
    assert_eq!(
        actions,
        vec![
            (
                "Build lumberjack's hut",
                MenuEntry::Action(TileAction::Build(BuildingKind::LumberjackHut))
            ),
            (
                "Build tower",
                MenuEntry::Action(TileAction::Build(BuildingKind::Tower))
            ),
        ],
        "town center must never be offered",
    );
}

#[test]
fn unclaimed_or_indestructible_tiles_offer_nothing() {
    let unclaimed = TileInfo {
        claimed: false,
        ..blank_claimed()
    };
    let town_center = TileInfo {
        occupant: Some(Occupant::Building {
            kind: BuildingKind::TownCenter,
            stage: BuildingStage::Built,
        }),
        ..blank_claimed()
    };

    assert!(available_actions(&unclaimed).is_empty());
    assert!(available_actions(&town_center).is_empty());
}

#[test]
fn construction_offers_cancellation_and_buildings_offer_demolition() {
    let under_construction = TileInfo {
        occupant: Some(Occupant::Building {
            kind: BuildingKind::Tower,
            stage: BuildingStage::UnderConstruction,
        }),
        construction: Some(BuildingKind::Tower),
        ..blank_claimed()
    };
    let built = TileInfo {
        occupant: Some(Occupant::Building {
            kind: BuildingKind::LumberjackHut,
            stage: BuildingStage::Built,
        }),
        ..blank_claimed()
    };

    let cancel = available_actions(&under_construction);
    assert_eq!(cancel[0].label, "Cancel construction");
    assert_eq!(
        cancel[0].entry,
        MenuEntry::Action(TileAction::CancelConstruction)
    );

    let destroy = available_actions(&built);
    assert_eq!(destroy[0].label, "Destroy lumberjack's hut");
    assert_eq!(destroy[0].entry, MenuEntry::Action(TileAction::Destroy));
}

#[test]
fn choosing_through_submenu_emits_build_command() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();

    builder.handle(click(TILE), |_| blank_claimed(), &mut commands);
    assert_eq!(builder.menu().map(|menu| menu.tile), Some(TILE));
    assert_eq!(builder.hovered(), Some(TILE));

    builder.handle(choose(0), |_| blank_claimed(), &mut commands);
    assert!(commands.is_empty(), "submenu must not emit commands");

    builder.handle(choose(1), |_| blank_claimed(), &mut commands);
    assert_eq!(
        commands,
        vec![Command::RequestBuild {
            hex: TILE,
            kind: BuildingKind::Tower,
        }],
        "choosing an action should target the menu's tile",
    );
    assert!(builder.menu().is_none());
}

#[test]
fn clicking_elsewhere_closes_the_menu() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();
    let mut looked_up = Vec::new();

    builder.handle(
        click(TILE),
        |hex| {
            looked_up.push(hex);
            blank_claimed()
        },
        &mut commands,
    );
    builder.handle(BuilderInput::default(), |_| blank_claimed(), &mut commands);
    assert!(builder.menu().is_some(), "hover-only frames keep the menu");

    builder.handle(
        click(HexCoord::new(5, 5)),
        |hex| {
            looked_up.push(hex);
            blank_claimed()
        },
        &mut commands,
    );

    assert!(builder.menu().is_none());
    assert_eq!(looked_up, vec![TILE]);
    assert!(commands.is_empty());
}

#[test]
fn dismiss_closes_without_commands() {
    let mut builder = Builder::new();
    let mut commands = Vec::new();

    builder.handle(click(TILE), |_| blank_claimed(), &mut commands);
    builder.handle(
        BuilderInput {
            dismiss: true,
            ..BuilderInput::default()
        },
        |_| blank_claimed(),
        &mut commands,
    );

    assert!(builder.menu().is_none());
    assert!(commands.is_empty());
}

#[test]
fn menu_commands_drive_the_world() {
    let mut world = World::default();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceInfluenceOwner {
            hex: HexCoord::ORIGIN,
            kind: BuildingKind::TownCenter,
        },
        &mut events,
    );

    let mut builder = Builder::default();
    let mut commands = Vec::new();
    for input in [click(TILE), choose(0), choose(0)] {
        builder.handle(input, |hex| query::tile_info(&world, hex), &mut commands);
    }
    for command in commands.drain(..) {
        world::apply(&mut world, command, &mut events);
    }

    assert_eq!(
        query::construction(&world, TILE).map(|job| job.target),
        Some(BuildingKind::LumberjackHut)
    );

    builder.handle(click(TILE), |hex| query::tile_info(&world, hex), &mut commands);
    builder.handle(choose(0), |hex| query::tile_info(&world, hex), &mut commands);
    assert_eq!(commands, vec![Command::CancelConstruction { hex: TILE }]);
}
