#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the mazecrawl simulation.
//!
//! This crate defines the message surface that connects the surrounding
//! game loop, the authoritative world, and pure systems. The loop submits
//! [`Command`] values describing desired mutations, the world executes
//! those commands via its `apply` entry point and broadcasts [`Event`]
//! values, and systems consume commands together with immutable
//! configuration to respond deterministically with events of their own.
//!
//! The crate also owns the configuration data model (spawn tables, level
//! budgets, effect templates) that an external loader deserializes before
//! level generation begins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cardinal facings available to actors, in strict cyclic order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Facing toward decreasing row indices.
    North,
    /// Facing toward increasing column indices.
    East,
    /// Facing toward increasing row indices.
    South,
    /// Facing toward decreasing column indices.
    West,
}

impl Direction {
    /// All facings in cyclic order starting from north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Facing after one 90-degree clockwise step.
    #[must_use]
    pub const fn turn_right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Facing after one 90-degree counter-clockwise step.
    #[must_use]
    pub const fn turn_left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// Facing after a half turn.
    #[must_use]
    pub const fn opposite(self) -> Self {
        self.turn_right().turn_right()
    }

    /// Wall bit guarding travel out of a cell toward this facing.
    #[must_use]
    pub const fn wall_bit(self) -> WallMask {
        match self {
            Self::North => WallMask::TOP,
            Self::East => WallMask::RIGHT,
            Self::South => WallMask::BOTTOM,
            Self::West => WallMask::LEFT,
        }
    }
}

/// Bit-encoded wall sides of a single maze cell.
///
/// Bit positions match externally authored level data and must not change.
/// Bits outside the four named sides are reserved for future flags such as
/// doors or secret passages and are preserved verbatim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallMask(u8);

impl WallMask {
    /// Wall on the cell's top (north) side.
    pub const TOP: Self = Self(0b0100_0000);
    /// Wall on the cell's right (east) side.
    pub const RIGHT: Self = Self(0b0001_0000);
    /// Wall on the cell's bottom (south) side.
    pub const BOTTOM: Self = Self(0b0000_0100);
    /// Wall on the cell's left (west) side.
    pub const LEFT: Self = Self(0b0000_0001);
    /// All four sides blocked; the mask reported for out-of-bounds cells.
    pub const SOLID: Self = Self(0b0101_0101);

    /// Wraps a raw byte authored by a level generator.
    #[must_use]
    pub const fn from_raw(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw byte, including reserved bits.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Reports whether the side facing `direction` is walled.
    #[must_use]
    pub const fn blocks(self, direction: Direction) -> bool {
        self.0 & direction.wall_bit().0 != 0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Adjacent cell one step toward `direction`, or `None` when the step
    /// would leave the grid's numeric range.
    #[must_use]
    pub fn neighbor(self, direction: Direction) -> Option<Self> {
        match direction {
            Direction::North => self.row.checked_sub(1).map(|row| Self::new(self.column, row)),
            Direction::East => Some(Self::new(self.column + 1, self.row)),
            Direction::South => Some(Self::new(self.column, self.row + 1)),
            Direction::West => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(column, self.row)),
        }
    }
}

/// Unique identifier assigned to an actor by the world.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Travel relative to an actor's current facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Motion {
    /// One step in the direction the actor faces.
    Forward,
    /// One step opposite to the direction the actor faces.
    Backward,
}

/// In-place rotation of an actor's facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// One 90-degree counter-clockwise step.
    Left,
    /// One 90-degree clockwise step.
    Right,
}

/// Closed tag set of status effects the engine tracks.
///
/// Behaviour attached to a tag (damage per turn, stat deltas) is a lookup
/// performed by consumers; the engine itself only tracks durations and
/// potencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEffectType {
    /// Loses health each turn.
    Poisoned,
    /// Takes fire damage each turn.
    Burning,
    /// Loses health when acting.
    Bleeding,
    /// Deals reduced damage.
    Weakened,
    /// Acts more often.
    Hasted,
    /// Acts less often.
    Slowed,
    /// Sees only adjacent cells.
    Blinded,
    /// Recovers health each turn.
    Regenerating,
}

/// Declarative recipe read from monster or item configuration that may
/// instantiate a status effect on a target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectTemplate {
    /// Effect the template instantiates.
    pub effect: StatusEffectType,
    /// Turns the instance lasts; `-1` never expires.
    pub duration: i32,
    /// Magnitude consumers apply when deriving stats.
    pub potency: i32,
    /// Whether repeated applications coexist instead of refreshing.
    #[serde(default)]
    pub stackable: bool,
    /// Probability in `[0, 1]` that an application takes hold.
    #[serde(default = "default_chance")]
    pub chance: f64,
}

fn default_chance() -> f64 {
    1.0
}

/// Identifier of a spawnable monster, item, container, or debris kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnKind(String);

impl SpawnKind {
    /// Creates a kind identifier from its configured name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Configured name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Colour of the key required to open a locked container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyColor {
    /// Opened by a red key.
    Red,
    /// Opened by a green key.
    Green,
    /// Opened by a blue key.
    Blue,
    /// Opened by a yellow key.
    Yellow,
}

/// Level-gated row of a weighted spawn table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnTableEntry {
    /// Kind placed when this row wins a draw.
    pub kind: SpawnKind,
    /// Lowest level (inclusive) at which the row is eligible.
    pub min_level: u32,
    /// Highest level (inclusive) at which the row is eligible.
    pub max_level: u32,
    /// Selection weight; zero excludes the row entirely.
    pub weight: u32,
    /// Key colour gating the container, if any. Only meaningful for rows
    /// of the container table.
    #[serde(default)]
    pub key_color: Option<KeyColor>,
}

impl SpawnTableEntry {
    /// Reports whether the row may be drawn on `level`.
    #[must_use]
    pub fn eligible_at(&self, level: u32) -> bool {
        self.weight > 0 && self.min_level <= level && level <= self.max_level
    }
}

/// Capability bound for rows selectable by weighted draw.
pub trait Weighted {
    /// Selection weight; zero means never selectable.
    fn weight(&self) -> u32;
}

impl Weighted for SpawnTableEntry {
    fn weight(&self) -> u32 {
        self.weight
    }
}

/// Categories a level budget provisions independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnCategory {
    /// Hostile actors.
    Monsters,
    /// Loose items lying on the floor.
    Items,
    /// Lockable containers with nested loot.
    Containers,
    /// Decorative rubble and remains.
    Debris,
}

impl SpawnCategory {
    /// All categories in the order the planner fills them.
    pub const ALL: [Self; 4] = [Self::Monsters, Self::Items, Self::Containers, Self::Debris];
}

/// Per-level placement counts for each spawn category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBudget {
    /// Dungeon level the budget applies to.
    pub level: u32,
    /// Monsters to place.
    pub monsters: u32,
    /// Loose items to place.
    pub items: u32,
    /// Containers to place.
    pub containers: u32,
    /// Debris piles to place.
    pub debris: u32,
}

impl LevelBudget {
    /// Placement count provisioned for `category`.
    #[must_use]
    pub const fn count(&self, category: SpawnCategory) -> u32 {
        match category {
            SpawnCategory::Monsters => self.monsters,
            SpawnCategory::Items => self.items,
            SpawnCategory::Containers => self.containers,
            SpawnCategory::Debris => self.debris,
        }
    }
}

/// Root configuration aggregate consumed at level-generation time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnTables {
    /// Budgets for levels that deviate from the default.
    pub budgets: Vec<LevelBudget>,
    /// Fallback budget for levels without an exact entry.
    pub default_budget: LevelBudget,
    /// Monster spawn table.
    pub monsters: Vec<SpawnTableEntry>,
    /// Item spawn table.
    pub items: Vec<SpawnTableEntry>,
    /// Container spawn table.
    pub containers: Vec<SpawnTableEntry>,
    /// Debris spawn table.
    pub debris: Vec<SpawnTableEntry>,
    /// Loot table per container kind; each is itself a weighted spawn
    /// table whose per-row level gates still apply.
    pub container_loot: BTreeMap<SpawnKind, Vec<SpawnTableEntry>>,
    /// Loot slots resolved for every placed container.
    #[serde(default = "default_loot_per_container")]
    pub loot_per_container: u32,
}

fn default_loot_per_container() -> u32 {
    1
}

impl SpawnTables {
    /// Budget in force on `level`: the exact entry when present, else the
    /// default budget.
    #[must_use]
    pub fn budget_for(&self, level: u32) -> LevelBudget {
        self.budgets
            .iter()
            .copied()
            .find(|budget| budget.level == level)
            .unwrap_or(self.default_budget)
    }

    /// Spawn table backing `category`.
    #[must_use]
    pub fn table(&self, category: SpawnCategory) -> &[SpawnTableEntry] {
        match category {
            SpawnCategory::Monsters => &self.monsters,
            SpawnCategory::Items => &self.items,
            SpawnCategory::Containers => &self.containers,
            SpawnCategory::Debris => &self.debris,
        }
    }

    /// Checks the aggregate for defects that would otherwise surface as
    /// silently empty levels, returning the first one found.
    ///
    /// Callers run this once after loading, before any level is planned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for budget in &self.budgets {
            for category in SpawnCategory::ALL {
                if budget.count(category) > 0
                    && !self
                        .table(category)
                        .iter()
                        .any(|entry| entry.eligible_at(budget.level))
                {
                    return Err(ConfigError::UnfillableBudget {
                        level: budget.level,
                        category,
                    });
                }
            }
        }

        for category in SpawnCategory::ALL {
            if self.default_budget.count(category) > 0
                && !self.table(category).iter().any(|entry| entry.weight > 0)
            {
                return Err(ConfigError::EmptyCategoryTable { category });
            }
        }

        for entry in &self.containers {
            if entry.weight == 0 {
                continue;
            }
            match self.container_loot.get(&entry.kind) {
                None => {
                    return Err(ConfigError::MissingLootTable {
                        kind: entry.kind.clone(),
                    })
                }
                Some(rows) if !rows.iter().any(|row| row.weight > 0) => {
                    return Err(ConfigError::EmptyLootTable {
                        kind: entry.kind.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

/// Configuration defects detected before a level is generated.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A budget demands placements from a table with no row eligible at
    /// that budget's level.
    #[error("level {level} budgets {category:?} placements but no table row is eligible there")]
    UnfillableBudget {
        /// Level whose budget cannot be filled.
        level: u32,
        /// Category lacking an eligible row.
        category: SpawnCategory,
    },
    /// The default budget demands placements from a table holding no
    /// positively weighted row.
    #[error("default budget requires {category:?} but the table holds no positive weight")]
    EmptyCategoryTable {
        /// Category lacking any positively weighted row.
        category: SpawnCategory,
    },
    /// A selectable container kind has no loot table.
    #[error("container kind {} has no loot table", .kind.as_str())]
    MissingLootTable {
        /// Container kind missing its loot rows.
        kind: SpawnKind,
    },
    /// A container kind's loot table holds no positively weighted row.
    #[error("loot table for {} holds no positive weight", .kind.as_str())]
    EmptyLootTable {
        /// Container kind whose loot table is unusable.
        kind: SpawnKind,
    },
}

/// Ordered multiset of spawn selections produced for one level.
///
/// Entries appear in draw order; assigning them to maze cells is the job
/// of a downstream layout collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelPopulation {
    /// Monster kinds in draw order.
    pub monsters: Vec<SpawnKind>,
    /// Loose item kinds in draw order.
    pub items: Vec<SpawnKind>,
    /// Containers with resolved loot, in draw order.
    pub containers: Vec<ContainerSpawn>,
    /// Debris kinds in draw order.
    pub debris: Vec<SpawnKind>,
}

impl LevelPopulation {
    /// Total number of placements across all categories.
    #[must_use]
    pub fn placement_count(&self) -> usize {
        self.monsters.len() + self.items.len() + self.containers.len() + self.debris.len()
    }

    /// True when no category produced a placement.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placement_count() == 0
    }
}

/// Single container placement with its nested loot resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerSpawn {
    /// Container kind drawn from the container table.
    pub kind: SpawnKind,
    /// Key colour required to open the container, if locked.
    pub key_color: Option<KeyColor>,
    /// Item kinds inside, in draw order.
    pub loot: Vec<SpawnKind>,
}

/// Commands that express all permissible simulation mutations and
/// requests.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the maze with the provided wall layout.
    ConfigureMaze {
        /// Number of cell columns laid out in the grid.
        columns: u32,
        /// Number of cell rows laid out in the grid.
        rows: u32,
        /// Row-major raw wall masks, one byte per cell.
        walls: Vec<u8>,
    },
    /// Introduces an actor at the given cell.
    SpawnActor {
        /// Cell the actor initially occupies.
        cell: CellCoord,
        /// Facing the actor starts with.
        facing: Direction,
    },
    /// Requests that an actor advance one cell relative to its facing.
    Move {
        /// Actor attempting the move.
        actor: ActorId,
        /// Forward or backward travel.
        motion: Motion,
    },
    /// Rotates an actor's facing by one 90-degree step.
    Turn {
        /// Actor turning in place.
        actor: ActorId,
        /// Which way the actor turns.
        rotation: Rotation,
    },
    /// Advances the simulation by one game turn.
    Tick,
    /// Attempts to afflict an actor with a templated status effect.
    Inflict {
        /// Actor targeted by the effect.
        actor: ActorId,
        /// Recipe describing the effect to roll.
        template: EffectTemplate,
    },
    /// Requests a population plan for the given dungeon level.
    PlanPopulation {
        /// Level whose budgets should be filled.
        level: u32,
    },
}

/// Events broadcast after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the maze was rebuilt from raw layout data.
    MazeConfigured {
        /// Number of cell columns in the new maze.
        columns: u32,
        /// Number of cell rows in the new maze.
        rows: u32,
    },
    /// Confirms that an actor entered the maze.
    ActorSpawned {
        /// Identifier assigned to the actor by the world.
        actor: ActorId,
        /// Cell the actor occupies after spawning.
        cell: CellCoord,
        /// Facing the actor starts with.
        facing: Direction,
    },
    /// Confirms that an actor moved between two adjacent cells.
    ActorMoved {
        /// Actor that moved.
        actor: ActorId,
        /// Cell the actor occupied before moving.
        from: CellCoord,
        /// Cell the actor occupies after the move.
        to: CellCoord,
    },
    /// Confirms that an actor's facing changed.
    ActorTurned {
        /// Actor that turned.
        actor: ActorId,
        /// Facing after the rotation.
        facing: Direction,
    },
    /// Announces that one game turn elapsed.
    TurnElapsed,
    /// Confirms that a status effect took hold on an actor.
    EffectApplied {
        /// Actor now afflicted.
        actor: ActorId,
        /// Effect that took hold.
        effect: StatusEffectType,
    },
    /// Reports that an effect instance ran out and was removed.
    EffectExpired {
        /// Actor the effect was removed from.
        actor: ActorId,
        /// Effect that expired.
        effect: StatusEffectType,
    },
    /// Delivers the population plan computed for a level.
    PopulationReady {
        /// Level the plan fills.
        level: u32,
        /// Ordered placements drawn for the level.
        population: LevelPopulation,
    },
    /// Reports that population planning hit a configuration defect.
    PopulationFailed {
        /// Level whose plan was requested.
        level: u32,
        /// Defect that stopped planning.
        error: ConfigError,
    },
}
