//! Narrow interfaces to the subsystems the scheduler does not own.
//!
//! Implementations live outside the scheduler crates (the game, the headless
//! CLI battlefield, or test doubles) and are handed to the schedulers once at
//! construction.

use crate::{EnemyId, EnemyTypeKey, Event, Position};

/// Instantiates enemies on behalf of spawn admission.
pub trait SpawnFactory {
    /// Creates an enemy of `enemy_type` at `position`, steering it toward
    /// `target`. Returns `None` when the instance could not be created.
    fn create(
        &mut self,
        enemy_type: &EnemyTypeKey,
        position: Position,
        target: Position,
    ) -> Option<EnemyId>;

    /// Removes an instance created by [`SpawnFactory::create`] that must not
    /// become visible to the rest of the system.
    fn destroy(&mut self, enemy: EnemyId);
}

/// Resolves the ground height below a horizontal coordinate.
pub trait GroundLocator {
    /// Searches downward from `search_start_y` for at most `max_distance`
    /// units and returns the ground height at `x`, if any.
    fn find_ground(&self, x: f32, search_start_y: f32, max_distance: f32) -> Option<f32>;
}

/// Reports whether a candidate spawn position is crowded.
pub trait OverlapCheck {
    /// Returns `true` when an existing entity lies within `padding` of
    /// `position`.
    fn has_neighbor(&self, position: Position, padding: f32) -> bool;
}

/// Receives damage dealt to the defended castle.
pub trait CastleDamageSink {
    /// Applies `amount` points of damage to the castle.
    fn apply_damage(&mut self, amount: u32);
}

/// Receives scheduler lifecycle events.
pub trait EventSink {
    /// Records a single event.
    fn emit(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}
