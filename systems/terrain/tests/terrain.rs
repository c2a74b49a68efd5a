use setlerio_core::{Command, Event, HexCoord, TerrainConfig, TerrainKind};
use setlerio_system_terrain::TerrainGenerator;
use setlerio_world::{self as world, query, World};

#[test]
fn generated_terrain_installs_into_the_world() {
    let config = TerrainConfig {
        radius: 8,
        seed: 11,
        ..TerrainConfig::default()
    };
    let command = TerrainGenerator::new(config).command();
    let Command::ConfigureTerrain { tiles } = &command else {
        panic!("generator should emit a terrain command");
    };
    let tile_count = tiles.len();

    let mut world = World::default();
    let mut events = Vec::new();
    world::apply(&mut world, command, &mut events);

    assert_eq!(events, vec![Event::TerrainConfigured { tiles: tile_count }]);
    assert_eq!(
        query::terrain_at(&world, HexCoord::ORIGIN),
        Some(TerrainKind::Meadow)
    );
    assert_eq!(query::drawable_count(&world), tile_count);
}

#[test]
fn command_lists_tiles_in_coordinate_order() {
    let command = TerrainGenerator::new(TerrainConfig {
        radius: 6,
        ..TerrainConfig::default()
    })
    .command();

    let Command::ConfigureTerrain { tiles } = command else {
        panic!("generator should emit a terrain command");
    };
    assert!(tiles.windows(2).all(|pair| pair[0].0 < pair[1].0));
}
