//! Headless stand-in for the game world: hosts spawned enemies, marches them
//! toward their target and lets them breach the castle once their lifetime
//! runs out.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc, time::Duration};

use bowmaster_core::{
    CastleDamageSink, EnemyId, EnemyTypeKey, GroundLocator, OverlapCheck, Position, SpawnFactory,
};
use bowmaster_system_spawning::SpawnPorts;
use tracing::{debug, trace};

/// Horizontal distance an enemy covers per simulated second.
const MARCH_SPEED: f32 = 1.5;

#[derive(Debug)]
struct Fighter {
    enemy_type: EnemyTypeKey,
    position: Position,
    target: Position,
    age: Duration,
}

#[derive(Debug)]
struct BattlefieldState {
    next_id: u64,
    fighters: BTreeMap<EnemyId, Fighter>,
    ground_y: Option<f32>,
    castle_health: u32,
}

/// Shared handle to the headless battlefield.
#[derive(Clone, Debug)]
pub(crate) struct Battlefield {
    state: Rc<RefCell<BattlefieldState>>,
}

impl Battlefield {
    pub(crate) fn new(ground_y: Option<f32>, castle_health: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(BattlefieldState {
                next_id: 0,
                fighters: BTreeMap::new(),
                ground_y,
                castle_health,
            })),
        }
    }

    /// Port bundle backed by this battlefield.
    pub(crate) fn spawn_ports(&self) -> SpawnPorts {
        SpawnPorts {
            factory: Box::new(self.clone()),
            ground: Box::new(self.clone()),
            overlap: Box::new(self.clone()),
        }
    }

    pub(crate) fn castle(&self) -> Box<dyn CastleDamageSink> {
        Box::new(self.clone())
    }

    pub(crate) fn castle_health(&self) -> u32 {
        self.state.borrow().castle_health
    }

    pub(crate) fn alive(&self) -> usize {
        self.state.borrow().fighters.len()
    }

    /// Ages and marches every enemy by `elapsed`, returning the enemies whose
    /// lifetime ran out. Returned enemies are removed from the field.
    pub(crate) fn advance(&self, elapsed: Duration, lifetime: Duration) -> Vec<EnemyId> {
        let mut state = self.state.borrow_mut();
        let step = MARCH_SPEED * elapsed.as_secs_f32();
        let mut expired = Vec::new();

        for (enemy, fighter) in &mut state.fighters {
            fighter.age = fighter.age.saturating_add(elapsed);
            let remaining = fighter.target.x() - fighter.position.x();
            let dx = remaining.clamp(-step, step);
            fighter.position = Position::new(fighter.position.x() + dx, fighter.position.y());
            if fighter.age >= lifetime {
                expired.push(*enemy);
            }
        }

        for enemy in &expired {
            if let Some(fighter) = state.fighters.remove(enemy) {
                trace!(
                    enemy = enemy.get(),
                    enemy_type = %fighter.enemy_type,
                    "enemy reached the castle"
                );
            }
        }
        expired
    }
}

impl SpawnFactory for Battlefield {
    fn create(
        &mut self,
        enemy_type: &EnemyTypeKey,
        position: Position,
        target: Position,
    ) -> Option<EnemyId> {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let enemy = EnemyId::new(state.next_id);
        let _ = state.fighters.insert(
            enemy,
            Fighter {
                enemy_type: enemy_type.clone(),
                position,
                target,
                age: Duration::ZERO,
            },
        );
        Some(enemy)
    }

    fn destroy(&mut self, enemy: EnemyId) {
        let _ = self.state.borrow_mut().fighters.remove(&enemy);
    }
}

impl GroundLocator for Battlefield {
    fn find_ground(&self, _x: f32, search_start_y: f32, max_distance: f32) -> Option<f32> {
        let ground = self.state.borrow().ground_y?;
        (ground <= search_start_y && search_start_y - ground <= max_distance).then_some(ground)
    }
}

impl OverlapCheck for Battlefield {
    fn has_neighbor(&self, position: Position, padding: f32) -> bool {
        self.state
            .borrow()
            .fighters
            .values()
            .any(|fighter| fighter.position.distance(position) < padding)
    }
}

impl CastleDamageSink for Battlefield {
    fn apply_damage(&mut self, amount: u32) {
        let mut state = self.state.borrow_mut();
        state.castle_health = state.castle_health.saturating_sub(amount);
        debug!(amount, health = state.castle_health, "castle hit");
    }
}
