#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative roster of the enemies currently alive on the battlefield.
//!
//! Admission control reads caps exclusively from this registry, so every
//! spawned enemy must be registered exactly once and unregistered exactly once
//! when it leaves play.

use std::collections::HashMap;

use bowmaster_core::{EnemyId, EnemyTypeKey};

/// Reasons a registration request may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The identifier is already present in the roster.
    #[error("enemy {} is already registered", .0.get())]
    AlreadyRegistered(EnemyId),
}

/// Tracks live enemies and answers count queries in constant time.
#[derive(Debug, Default)]
pub struct EnemyRegistry {
    alive: HashMap<EnemyId, EnemyTypeKey>,
    per_type: HashMap<EnemyTypeKey, usize>,
}

impl EnemyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an enemy to the roster.
    pub fn register(
        &mut self,
        enemy: EnemyId,
        enemy_type: EnemyTypeKey,
    ) -> Result<(), RegistryError> {
        if self.alive.contains_key(&enemy) {
            return Err(RegistryError::AlreadyRegistered(enemy));
        }

        *self.per_type.entry(enemy_type.clone()).or_insert(0) += 1;
        let _ = self.alive.insert(enemy, enemy_type);
        Ok(())
    }

    /// Removes an enemy from the roster, returning its type when it was present.
    pub fn unregister(&mut self, enemy: EnemyId) -> Option<EnemyTypeKey> {
        let enemy_type = self.alive.remove(&enemy)?;
        if let Some(count) = self.per_type.get_mut(&enemy_type) {
            *count -= 1;
            if *count == 0 {
                let _ = self.per_type.remove(&enemy_type);
            }
        }
        Some(enemy_type)
    }

    /// Number of registered enemies.
    #[must_use]
    pub fn count_all(&self) -> usize {
        self.alive.len()
    }

    /// Number of registered enemies of the provided type.
    #[must_use]
    pub fn count_by_type(&self, enemy_type: &EnemyTypeKey) -> usize {
        self.per_type.get(enemy_type).copied().unwrap_or(0)
    }

    /// Reports whether the enemy is currently registered.
    #[must_use]
    pub fn contains(&self, enemy: EnemyId) -> bool {
        self.alive.contains_key(&enemy)
    }

    /// Type of a registered enemy.
    #[must_use]
    pub fn enemy_type(&self, enemy: EnemyId) -> Option<&EnemyTypeKey> {
        self.alive.get(&enemy)
    }

    /// Identifiers of every registered enemy in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<EnemyId> {
        let mut ids: Vec<EnemyId> = self.alive.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
