//! Deterministic port doubles for exercising the schedulers without a game.
//!
//! Every double hands out a cloneable handle so tests can keep inspecting or
//! steering it after the port itself was boxed into a scheduler.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use bowmaster_core::{EnemyId, EnemyTypeKey, GroundLocator, OverlapCheck, Position, SpawnFactory};

use crate::SpawnPorts;

/// Record of one successful [`SpawnFactory::create`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatedEnemy {
    /// Identifier handed out.
    pub enemy: EnemyId,
    /// Requested archetype.
    pub enemy_type: EnemyTypeKey,
    /// Spawn position.
    pub position: Position,
    /// Movement target assigned at creation.
    pub target: Position,
}

#[derive(Debug, Default)]
struct FactoryState {
    next_id: u64,
    created: Vec<CreatedEnemy>,
    destroyed: Vec<EnemyId>,
    declines: u32,
    reused_ids: VecDeque<EnemyId>,
}

/// Factory that allocates sequential identifiers and records every call.
#[derive(Clone, Debug, Default)]
pub struct ScriptedFactory {
    state: Rc<RefCell<FactoryState>>,
}

impl ScriptedFactory {
    /// Creates a factory whose first identifier is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` creation requests fail.
    pub fn decline_next(&self, count: u32) {
        self.state.borrow_mut().declines += count;
    }

    /// Makes the next creation request return `enemy` instead of a fresh id.
    pub fn reuse_id_next(&self, enemy: EnemyId) {
        self.state.borrow_mut().reused_ids.push_back(enemy);
    }

    /// Enemies created so far, including ones destroyed later.
    #[must_use]
    pub fn created(&self) -> Vec<CreatedEnemy> {
        self.state.borrow().created.clone()
    }

    /// Enemies destroyed through [`SpawnFactory::destroy`].
    #[must_use]
    pub fn destroyed(&self) -> Vec<EnemyId> {
        self.state.borrow().destroyed.clone()
    }
}

impl SpawnFactory for ScriptedFactory {
    fn create(
        &mut self,
        enemy_type: &EnemyTypeKey,
        position: Position,
        target: Position,
    ) -> Option<EnemyId> {
        let mut state = self.state.borrow_mut();
        if state.declines > 0 {
            state.declines -= 1;
            return None;
        }

        let enemy = match state.reused_ids.pop_front() {
            Some(enemy) => enemy,
            None => {
                state.next_id += 1;
                EnemyId::new(state.next_id)
            }
        };
        state.created.push(CreatedEnemy {
            enemy,
            enemy_type: enemy_type.clone(),
            position,
            target,
        });
        Some(enemy)
    }

    fn destroy(&mut self, enemy: EnemyId) {
        self.state.borrow_mut().destroyed.push(enemy);
    }
}

/// Ground locator answering with a fixed height, or nothing at all.
#[derive(Clone, Copy, Debug)]
pub struct FixedGround(pub Option<f32>);

impl GroundLocator for FixedGround {
    fn find_ground(&self, _x: f32, _search_start_y: f32, _max_distance: f32) -> Option<f32> {
        self.0
    }
}

/// Overlap checker replaying queued verdicts, then reporting a clear field.
#[derive(Clone, Debug, Default)]
pub struct ScriptedOverlap {
    verdicts: Rc<RefCell<VecDeque<bool>>>,
}

impl ScriptedOverlap {
    /// Creates a checker that reports no neighbours.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a neighbour for the next `count` checks.
    pub fn crowd_next(&self, count: usize) {
        self.verdicts
            .borrow_mut()
            .extend(std::iter::repeat(true).take(count));
    }
}

impl OverlapCheck for ScriptedOverlap {
    fn has_neighbor(&self, _position: Position, _padding: f32) -> bool {
        self.verdicts.borrow_mut().pop_front().unwrap_or(false)
    }
}

/// Handles retained by a test after boxing the scripted ports.
#[derive(Clone, Debug)]
pub struct ScriptedHandles {
    /// Factory handle.
    pub factory: ScriptedFactory,
    /// Overlap checker handle.
    pub overlap: ScriptedOverlap,
}

/// Builds a clear battlefield on flat ground at `y = 0`.
#[must_use]
pub fn scripted_ports() -> (SpawnPorts, ScriptedHandles) {
    let factory = ScriptedFactory::new();
    let overlap = ScriptedOverlap::new();
    let ports = SpawnPorts {
        factory: Box::new(factory.clone()),
        ground: Box::new(FixedGround(Some(0.0))),
        overlap: Box::new(overlap.clone()),
    };
    (ports, ScriptedHandles { factory, overlap })
}
