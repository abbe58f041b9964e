#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative dungeon state for the mazecrawl simulation.
//!
//! The surrounding game loop submits [`Command`] values describing desired
//! mutations, [`apply`] executes them deterministically, and interested
//! parties observe the resulting [`Event`] broadcast. Rejected movement is
//! deliberately silent: a blocked step leaves the actor in place and emits
//! nothing, so callers detect rejection only through the unchanged
//! position.

use mazecrawl_core::{ActorId, CellCoord, Command, Direction, Event, Motion, Rotation};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod effects;
mod maze;

pub use maze::Maze;

use crate::effects::EffectStack;

const EFFECT_ROLL_SEED: u64 = 0x6372_6177_6c21_9e37;

/// Side length, in cells, of the game's square maze grid.
pub const GRID_SIDE: u32 = 11;

/// Represents the authoritative dungeon world state.
#[derive(Debug)]
pub struct World {
    maze: Maze,
    actors: Vec<Actor>,
    next_actor: u32,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a world with an open default-sized maze and default seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(EFFECT_ROLL_SEED)
    }

    /// Creates a world whose effect-chance rolls replay from `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            maze: Maze::open(GRID_SIDE, GRID_SIDE),
            actors: Vec::new(),
            next_actor: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn allocate_actor(&mut self) -> ActorId {
        let id = ActorId::new(self.next_actor);
        self.next_actor = self.next_actor.saturating_add(1);
        id
    }

    fn actor_index(&self, actor: ActorId) -> Option<usize> {
        self.actors.iter().position(|entry| entry.id == actor)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct Actor {
    id: ActorId,
    cell: CellCoord,
    facing: Direction,
    effects: EffectStack,
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureMaze {
            columns,
            rows,
            walls,
        } => {
            world.maze = Maze::from_raw(columns, rows, &walls);
            let maze = &world.maze;
            world.actors.retain(|actor| maze.contains(actor.cell));
            out_events.push(Event::MazeConfigured { columns, rows });
        }
        Command::SpawnActor { cell, facing } => {
            if !world.maze.contains(cell) {
                return;
            }
            let actor = world.allocate_actor();
            world.actors.push(Actor {
                id: actor,
                cell,
                facing,
                effects: EffectStack::new(),
            });
            out_events.push(Event::ActorSpawned {
                actor,
                cell,
                facing,
            });
        }
        Command::Move { actor, motion } => {
            let Some(index) = world.actor_index(actor) else {
                return;
            };
            let (from, facing) = {
                let entry = &world.actors[index];
                (entry.cell, entry.facing)
            };
            let travel = match motion {
                Motion::Forward => facing,
                Motion::Backward => facing.opposite(),
            };
            if world.maze.has_wall(from, travel) {
                return;
            }
            let Some(to) = from.neighbor(travel) else {
                return;
            };
            if !world.maze.contains(to) {
                return;
            }
            world.actors[index].cell = to;
            out_events.push(Event::ActorMoved { actor, from, to });
        }
        Command::Turn { actor, rotation } => {
            let Some(index) = world.actor_index(actor) else {
                return;
            };
            let entry = &mut world.actors[index];
            entry.facing = match rotation {
                Rotation::Left => entry.facing.turn_left(),
                Rotation::Right => entry.facing.turn_right(),
            };
            out_events.push(Event::ActorTurned {
                actor,
                facing: entry.facing,
            });
        }
        Command::Tick => {
            out_events.push(Event::TurnElapsed);
            for entry in world.actors.iter_mut() {
                for effect in entry.effects.tick() {
                    out_events.push(Event::EffectExpired {
                        actor: entry.id,
                        effect,
                    });
                }
            }
        }
        Command::Inflict { actor, template } => {
            let rng = &mut world.rng;
            let Some(entry) = world.actors.iter_mut().find(|entry| entry.id == actor) else {
                return;
            };
            if entry.effects.apply(&template, rng) {
                out_events.push(Event::EffectApplied {
                    actor,
                    effect: template.effect,
                });
            }
        }
        // Planning requests are answered by the population system, not
        // the world.
        Command::PlanPopulation { .. } => {}
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Maze, World};
    use crate::effects::ActiveEffect;
    use mazecrawl_core::{ActorId, CellCoord, Direction};

    /// Provides read-only access to the maze's wall grid.
    #[must_use]
    pub fn maze(world: &World) -> &Maze {
        &world.maze
    }

    /// Reports whether a wall blocks travel from `cell` toward
    /// `direction`; out-of-bounds cells are fully walled.
    #[must_use]
    pub fn has_wall(world: &World, cell: CellCoord, direction: Direction) -> bool {
        world.maze.has_wall(cell, direction)
    }

    /// Interior walls whose matching bit is missing on the neighbouring
    /// cell, for level-authoring audits.
    #[must_use]
    pub fn wall_mismatches(world: &World) -> Vec<(CellCoord, Direction)> {
        world.maze.wall_mismatches()
    }

    /// Captures a read-only view of the actors inhabiting the maze.
    #[must_use]
    pub fn actor_view(world: &World) -> ActorView {
        let mut snapshots: Vec<ActorSnapshot> = world
            .actors
            .iter()
            .map(|actor| ActorSnapshot {
                id: actor.id,
                cell: actor.cell,
                facing: actor.facing,
                effects: actor.effects.effects().to_vec(),
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        ActorView { snapshots }
    }

    /// Read-only snapshot describing all actors within the maze.
    #[derive(Clone, Debug, Default)]
    pub struct ActorView {
        snapshots: Vec<ActorSnapshot>,
    }

    impl ActorView {
        /// Iterator over the captured actor snapshots in deterministic
        /// order.
        pub fn iter(&self) -> impl Iterator<Item = &ActorSnapshot> {
            self.snapshots.iter()
        }

        /// Snapshot of a single actor, if it exists.
        #[must_use]
        pub fn actor(&self, actor: ActorId) -> Option<&ActorSnapshot> {
            self.snapshots.iter().find(|snapshot| snapshot.id == actor)
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<ActorSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single actor's state used for
    /// queries.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct ActorSnapshot {
        /// Unique identifier assigned to the actor.
        pub id: ActorId,
        /// Grid cell currently occupied by the actor.
        pub cell: CellCoord,
        /// Direction the actor faces.
        pub facing: Direction,
        /// Active status effects in stable insertion order.
        pub effects: Vec<ActiveEffect>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazecrawl_core::{EffectTemplate, StatusEffectType, WallMask};

    fn spawn(world: &mut World, cell: CellCoord, facing: Direction) -> ActorId {
        let mut events = Vec::new();
        apply(world, Command::SpawnActor { cell, facing }, &mut events);
        match events.as_slice() {
            [Event::ActorSpawned { actor, .. }] => *actor,
            other => panic!("expected spawn event, got {other:?}"),
        }
    }

    fn configure_open_maze(world: &mut World, side: u32) {
        let mut events = Vec::new();
        apply(
            world,
            Command::ConfigureMaze {
                columns: side,
                rows: side,
                walls: vec![0; (side * side) as usize],
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::MazeConfigured {
                columns: side,
                rows: side,
            }]
        );
    }

    #[test]
    fn forward_movement_succeeds_without_a_wall() {
        for (facing, expected) in [
            (Direction::North, CellCoord::new(5, 4)),
            (Direction::East, CellCoord::new(6, 5)),
            (Direction::South, CellCoord::new(5, 6)),
            (Direction::West, CellCoord::new(4, 5)),
        ] {
            let mut world = World::new();
            let actor = spawn(&mut world, CellCoord::new(5, 5), facing);

            let mut events = Vec::new();
            apply(
                &mut world,
                Command::Move {
                    actor,
                    motion: Motion::Forward,
                },
                &mut events,
            );

            assert_eq!(
                events,
                vec![Event::ActorMoved {
                    actor,
                    from: CellCoord::new(5, 5),
                    to: expected,
                }]
            );
        }
    }

    #[test]
    fn backward_movement_uses_the_opposite_side() {
        let mut world = World::new();
        let actor = spawn(&mut world, CellCoord::new(5, 5), Direction::North);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Move {
                actor,
                motion: Motion::Backward,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::ActorMoved {
                actor,
                from: CellCoord::new(5, 5),
                to: CellCoord::new(5, 6),
            }]
        );
    }

    #[test]
    fn walls_reject_movement_silently() {
        let mut world = World::new();
        let mut events = Vec::new();
        // 3x3 maze whose centre cell walls its east side.
        let mut walls = vec![0u8; 9];
        walls[4] = WallMask::RIGHT.raw();
        apply(
            &mut world,
            Command::ConfigureMaze {
                columns: 3,
                rows: 3,
                walls,
            },
            &mut events,
        );

        let actor = spawn(&mut world, CellCoord::new(1, 1), Direction::East);
        let mut move_events = Vec::new();
        apply(
            &mut world,
            Command::Move {
                actor,
                motion: Motion::Forward,
            },
            &mut move_events,
        );

        assert!(move_events.is_empty());
        let view = query::actor_view(&world);
        assert_eq!(view.actor(actor).expect("actor").cell, CellCoord::new(1, 1));
    }

    #[test]
    fn the_grid_edge_always_rejects_movement() {
        let mut world = World::new();
        configure_open_maze(&mut world, 3);
        let actor = spawn(&mut world, CellCoord::new(0, 0), Direction::North);

        for motion in [Motion::Forward, Motion::Backward] {
            let mut events = Vec::new();
            apply(&mut world, Command::Move { actor, motion }, &mut events);
            // Forward leaves the numeric range; backward leaves the grid.
            if motion == Motion::Forward {
                assert!(events.is_empty());
            }
        }

        let mut west = Vec::new();
        apply(
            &mut world,
            Command::Turn {
                actor,
                rotation: Rotation::Left,
            },
            &mut west,
        );
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Move {
                actor,
                motion: Motion::Forward,
            },
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn turning_rotates_one_step() {
        let mut world = World::new();
        let actor = spawn(&mut world, CellCoord::new(2, 2), Direction::North);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Turn {
                actor,
                rotation: Rotation::Right,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::ActorTurned {
                actor,
                facing: Direction::East,
            }]
        );

        events.clear();
        apply(
            &mut world,
            Command::Turn {
                actor,
                rotation: Rotation::Left,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::ActorTurned {
                actor,
                facing: Direction::North,
            }]
        );
    }

    #[test]
    fn spawning_outside_the_maze_is_rejected() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnActor {
                cell: CellCoord::new(GRID_SIDE, 0),
                facing: Direction::South,
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert!(query::actor_view(&world).into_vec().is_empty());
    }

    #[test]
    fn ticks_decay_effects_and_report_expiry() {
        let mut world = World::new();
        let actor = spawn(&mut world, CellCoord::new(1, 1), Direction::North);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Inflict {
                actor,
                template: EffectTemplate {
                    effect: StatusEffectType::Poisoned,
                    duration: 2,
                    potency: 1,
                    stackable: false,
                    chance: 1.0,
                },
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::EffectApplied {
                actor,
                effect: StatusEffectType::Poisoned,
            }]
        );

        events.clear();
        apply(&mut world, Command::Tick, &mut events);
        assert_eq!(events, vec![Event::TurnElapsed]);

        events.clear();
        apply(&mut world, Command::Tick, &mut events);
        assert_eq!(
            events,
            vec![
                Event::TurnElapsed,
                Event::EffectExpired {
                    actor,
                    effect: StatusEffectType::Poisoned,
                },
            ]
        );
        assert!(query::actor_view(&world)
            .actor(actor)
            .expect("actor")
            .effects
            .is_empty());
    }

    #[test]
    fn effect_rolls_replay_under_the_same_seed() {
        let template = EffectTemplate {
            effect: StatusEffectType::Burning,
            duration: 3,
            potency: 1,
            stackable: true,
            chance: 0.5,
        };

        let run = |seed: u64| -> Vec<Event> {
            let mut world = World::with_seed(seed);
            let actor = spawn(&mut world, CellCoord::new(0, 0), Direction::South);
            let mut events = Vec::new();
            for _ in 0..32 {
                apply(&mut world, Command::Inflict { actor, template }, &mut events);
            }
            events
        };

        assert_eq!(run(7), run(7));
        let successes = run(7)
            .iter()
            .filter(|event| matches!(event, Event::EffectApplied { .. }))
            .count();
        assert!(successes > 0 && successes < 32);
    }

    #[test]
    fn reconfiguring_the_maze_drops_stranded_actors() {
        let mut world = World::new();
        configure_open_maze(&mut world, 5);
        let kept = spawn(&mut world, CellCoord::new(1, 1), Direction::North);
        let dropped = spawn(&mut world, CellCoord::new(4, 4), Direction::North);

        configure_open_maze(&mut world, 2);
        let view = query::actor_view(&world);
        assert!(view.actor(kept).is_some());
        assert!(view.actor(dropped).is_none());
    }
}
