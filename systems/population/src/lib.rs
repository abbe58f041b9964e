#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic budget-driven level population system.
//!
//! For each `PlanPopulation` command the system draws spawn kinds from the
//! configured weighted tables until every category budget is filled, then
//! emits [`Event::PopulationReady`] carrying the ordered plan. Each dungeon
//! level draws from its own hash-derived RNG stream, so planning level 7
//! yields the same population whether or not levels 1 through 6 were
//! planned first.

use mazecrawl_core::{
    Command, ConfigError, ContainerSpawn, Event, LevelPopulation, SpawnCategory, SpawnKind,
    SpawnTableEntry, SpawnTables, Weighted,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

const RNG_STREAM_LEVEL_PREFIX: &str = "population/level";

/// Configuration for the population system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Global seed all per-level RNG streams derive from.
    pub rng_seed: u64,
}

impl Config {
    /// Creates a configuration with the provided global seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that answers `PlanPopulation` commands with deterministic
/// [`LevelPopulation`] plans.
#[derive(Debug)]
pub struct Population {
    rng_seed: u64,
}

impl Population {
    /// Creates the system from its configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            rng_seed: config.rng_seed,
        }
    }

    /// Consumes `PlanPopulation` commands and emits
    /// [`Event::PopulationReady`] or [`Event::PopulationFailed`] per
    /// request.
    pub fn handle(
        &self,
        commands: &[Command],
        tables: &SpawnTables,
        out_events: &mut Vec<Event>,
    ) {
        for command in commands {
            if let Command::PlanPopulation { level } = command {
                let mut rng =
                    ChaCha8Rng::seed_from_u64(derive_level_seed(self.rng_seed, *level));
                let planned = tables
                    .validate()
                    .and_then(|()| plan_level(tables, *level, &mut rng));
                match planned {
                    Ok(population) => out_events.push(Event::PopulationReady {
                        level: *level,
                        population,
                    }),
                    Err(error) => out_events.push(Event::PopulationFailed {
                        level: *level,
                        error,
                    }),
                }
            }
        }
    }
}

/// Fills every category budget for `level` by weighted draws with
/// replacement, resolving nested loot for each container drawn.
///
/// A category whose level-gated table is empty contributes nothing rather
/// than failing; configuration defects that loading-time validation
/// guards against (a drawn container kind with a missing or zero-weight
/// loot table) surface as [`ConfigError`].
pub fn plan_level<R: Rng + ?Sized>(
    tables: &SpawnTables,
    level: u32,
    rng: &mut R,
) -> Result<LevelPopulation, ConfigError> {
    let budget = tables.budget_for(level);
    let mut population = LevelPopulation::default();

    for category in SpawnCategory::ALL {
        let count = budget.count(category);
        match category {
            SpawnCategory::Monsters => {
                population.monsters = draw_kinds(tables.table(category), level, count, rng);
            }
            SpawnCategory::Items => {
                population.items = draw_kinds(tables.table(category), level, count, rng);
            }
            SpawnCategory::Containers => {
                let table = WeightedTable::for_level(tables.table(category), level);
                for _ in 0..count {
                    let Some(entry) = table.pick(rng) else {
                        break;
                    };
                    let loot = resolve_loot(tables, &entry.kind, level, rng)?;
                    population.containers.push(ContainerSpawn {
                        kind: entry.kind.clone(),
                        key_color: entry.key_color,
                        loot,
                    });
                }
            }
            SpawnCategory::Debris => {
                population.debris = draw_kinds(tables.table(category), level, count, rng);
            }
        }
    }

    Ok(population)
}

fn draw_kinds<R: Rng + ?Sized>(
    entries: &[SpawnTableEntry],
    level: u32,
    count: u32,
    rng: &mut R,
) -> Vec<SpawnKind> {
    let table = WeightedTable::for_level(entries, level);
    let mut kinds = Vec::new();
    for _ in 0..count {
        let Some(entry) = table.pick(rng) else {
            break;
        };
        kinds.push(entry.kind.clone());
    }
    kinds
}

fn resolve_loot<R: Rng + ?Sized>(
    tables: &SpawnTables,
    container: &SpawnKind,
    level: u32,
    rng: &mut R,
) -> Result<Vec<SpawnKind>, ConfigError> {
    let rows = tables
        .container_loot
        .get(container)
        .ok_or_else(|| ConfigError::MissingLootTable {
            kind: container.clone(),
        })?;
    if !rows.iter().any(|row| row.weight > 0) {
        return Err(ConfigError::EmptyLootTable {
            kind: container.clone(),
        });
    }

    // Level gates may still exclude every row; the container then spawns
    // empty.
    let table = WeightedTable::for_level(rows, level);
    let mut loot = Vec::new();
    for _ in 0..tables.loot_per_container {
        let Some(row) = table.pick(rng) else {
            break;
        };
        loot.push(row.kind.clone());
    }
    Ok(loot)
}

/// Weighted selector over borrowed table rows.
///
/// Rows with zero weight are never admitted, so an empty selector is the
/// only way a draw can fail.
#[derive(Debug)]
pub struct WeightedTable<'a, T> {
    entries: Vec<&'a T>,
    total_weight: u64,
}

impl<'a, T: Weighted> WeightedTable<'a, T> {
    /// Creates an empty selector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            total_weight: 0,
        }
    }

    /// Admits `entry` unless its weight is zero.
    pub fn add(&mut self, entry: &'a T) {
        let weight = entry.weight();
        if weight == 0 {
            return;
        }
        self.entries.push(entry);
        self.total_weight += u64::from(weight);
    }

    /// True when no entry is selectable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the admitted weights.
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Draws one entry with probability proportional to its weight, or
    /// `None` when the selector is empty.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'a T> {
        if self.entries.is_empty() {
            return None;
        }
        let roll = rng.gen_range(0..self.total_weight);
        let mut cumulative = 0u64;
        for entry in &self.entries {
            cumulative += u64::from(entry.weight());
            if roll < cumulative {
                return Some(entry);
            }
        }
        self.entries.first().copied()
    }
}

impl<'a, T: Weighted> Default for WeightedTable<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> WeightedTable<'a, SpawnTableEntry> {
    /// Selector over the rows of `entries` eligible at `level`.
    #[must_use]
    pub fn for_level(entries: &'a [SpawnTableEntry], level: u32) -> Self {
        let mut table = Self::new();
        for entry in entries {
            if entry.eligible_at(level) {
                table.add(entry);
            }
        }
        table
    }
}

fn derive_level_seed(global_seed: u64, level: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(RNG_STREAM_LEVEL_PREFIX.as_bytes());
    hasher.update(level.to_le_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}
