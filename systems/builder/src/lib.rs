#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure tile-menu system responsible for emitting build, cancel, and destroy
//! commands.

use setlerio_core::{
    BuildingKind, BuildingStage, Command, HexCoord, Occupant, TileAction, TileInfo,
};

/// Single row of a tile menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuOption {
    /// Text shown to the player.
    pub label: String,
    /// What choosing the option does.
    pub entry: MenuEntry,
}

/// Effect of choosing a menu option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuEntry {
    /// Performs the action on the menu's tile and closes the menu.
    Action(TileAction),
    /// Replaces the menu with a nested list of options.
    Submenu(Vec<MenuOption>),
}

impl MenuOption {
    fn action(label: impl Into<String>, action: TileAction) -> Self {
        Self {
            label: label.into(),
            entry: MenuEntry::Action(action),
        }
    }
}

/// Lists the options a tile offers.
///
/// Blank claimed tiles offer a build submenu, tiles under construction offer
/// cancellation, and finished destructible buildings offer demolition.
#[must_use]
pub fn available_actions(tile: &TileInfo) -> Vec<MenuOption> {
    if tile.construction.is_some() {
        return vec![MenuOption::action(
            "Cancel construction",
            TileAction::CancelConstruction,
        )];
    }

    match tile.occupant {
        Some(Occupant::Blank) if tile.claimed => {
            let buildable = BuildingKind::ALL
                .into_iter()
                .filter(|kind| kind.is_orderable())
                .map(|kind| {
                    MenuOption::action(
                        format!("Build {}", kind.display_name()),
                        TileAction::Build(kind),
                    )
                })
                .collect();
            vec![MenuOption {
                label: "Build".to_owned(),
                entry: MenuEntry::Submenu(buildable),
            }]
        }
        Some(Occupant::Building {
            kind,
            stage: BuildingStage::Built,
        }) if !kind.is_indestructible() => vec![MenuOption::action(
            format!("Destroy {}", kind.display_name()),
            TileAction::Destroy,
        )],
        _ => Vec::new(),
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
///
/// Adapters resolve pointer positions to hexes and menu rows before handing
/// them to the system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Tile currently under the cursor.
    pub hovered: Option<HexCoord>,
    /// Tile clicked on this frame.
    pub clicked: Option<HexCoord>,
    /// Row of the open menu clicked on this frame.
    pub chosen_option: Option<usize>,
    /// Indicates whether the player dismissed the open menu.
    pub dismiss: bool,
}

/// Menu currently open on a tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenMenu {
    /// Tile the menu acts on.
    pub tile: HexCoord,
    /// Rows shown to the player.
    pub options: Vec<MenuOption>,
}

/// Tile-menu system that translates input into world commands.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    hovered: Option<HexCoord>,
    menu: Option<OpenMenu>,
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hovered: None,
            menu: None,
        }
    }

    /// Tile under the cursor as of the last handled input.
    #[must_use]
    pub const fn hovered(&self) -> Option<HexCoord> {
        self.hovered
    }

    /// Menu currently open, if any.
    #[must_use]
    pub fn menu(&self) -> Option<&OpenMenu> {
        self.menu.as_ref()
    }

    /// Consumes adapter-derived input to open menus and emit commands.
    ///
    /// The `tile_at` closure should mirror the semantics of the world's
    /// `query::tile_info` helper so the system sees what the tile offers.
    /// While a menu is open, a click either chooses one of its rows or closes
    /// it; tiles are only inspected when no menu is open.
    pub fn handle<F>(&mut self, input: BuilderInput, mut tile_at: F, out: &mut Vec<Command>)
    where
        F: FnMut(HexCoord) -> TileInfo,
    {
        self.hovered = input.hovered;

        if input.dismiss {
            self.menu = None;
            return;
        }

        if let Some(menu) = self.menu.take() {
            if let Some(index) = input.chosen_option {
                let OpenMenu { tile, options } = menu;
                match options.into_iter().nth(index).map(|option| option.entry) {
                    Some(MenuEntry::Action(action)) => out.push(action.into_command(tile)),
                    Some(MenuEntry::Submenu(options)) => {
                        self.menu = Some(OpenMenu { tile, options });
                    }
                    None => {}
                }
            } else if input.clicked.is_none() {
                self.menu = Some(menu);
            }
            return;
        }

        if let Some(hex) = input.clicked {
            let options = available_actions(&tile_at(hex));
            if !options.is_empty() {
                self.menu = Some(OpenMenu { tile: hex, options });
            }
        }
    }
}
