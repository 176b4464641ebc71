use bowmaster_core::{EnemyId, EnemyTypeKey};
use bowmaster_registry::{EnemyRegistry, RegistryError};
use proptest::prelude::*;

fn goblin() -> EnemyTypeKey {
    EnemyTypeKey::new("goblin")
}

fn troll() -> EnemyTypeKey {
    EnemyTypeKey::new("troll")
}

#[test]
fn counts_follow_registrations() {
    let mut registry = EnemyRegistry::new();
    registry.register(EnemyId::new(1), goblin()).expect("first");
    registry.register(EnemyId::new(2), goblin()).expect("second");
    registry.register(EnemyId::new(3), troll()).expect("third");

    assert_eq!(registry.count_all(), 3);
    assert_eq!(registry.count_by_type(&goblin()), 2);
    assert_eq!(registry.count_by_type(&troll()), 1);
    assert_eq!(registry.count_by_type(&EnemyTypeKey::new("bat")), 0);

    assert_eq!(registry.unregister(EnemyId::new(1)), Some(goblin()));
    assert_eq!(registry.count_all(), 2);
    assert_eq!(registry.count_by_type(&goblin()), 1);
    assert!(!registry.contains(EnemyId::new(1)));
    assert_eq!(registry.enemy_type(EnemyId::new(3)), Some(&troll()));
    assert_eq!(registry.ids(), vec![EnemyId::new(2), EnemyId::new(3)]);
}

#[test]
fn duplicate_registration_is_rejected_without_drift() {
    let mut registry = EnemyRegistry::new();
    registry.register(EnemyId::new(7), goblin()).expect("first");

    let result = registry.register(EnemyId::new(7), troll());
    assert_eq!(result, Err(RegistryError::AlreadyRegistered(EnemyId::new(7))));
    assert_eq!(registry.count_all(), 1);
    assert_eq!(registry.count_by_type(&goblin()), 1);
    assert_eq!(registry.count_by_type(&troll()), 0);
}

#[test]
fn unregistering_unknown_enemy_is_a_no_op() {
    let mut registry = EnemyRegistry::new();
    registry.register(EnemyId::new(1), goblin()).expect("register");

    assert_eq!(registry.unregister(EnemyId::new(99)), None);
    assert_eq!(registry.unregister(EnemyId::new(1)), Some(goblin()));
    assert_eq!(registry.unregister(EnemyId::new(1)), None);
    assert_eq!(registry.count_all(), 0);
    assert_eq!(registry.count_by_type(&goblin()), 0);
}

proptest! {
    #[test]
    fn register_then_unregister_restores_counts(
        existing in proptest::collection::btree_set(0u64..64, 0..16),
        extra in 64u64..128,
        use_troll in any::<bool>(),
    ) {
        let mut registry = EnemyRegistry::new();
        for (index, id) in existing.iter().enumerate() {
            let kind = if index % 2 == 0 { goblin() } else { troll() };
            registry.register(EnemyId::new(*id), kind).expect("seed registration");
        }
        let kind = if use_troll { troll() } else { goblin() };
        let before_all = registry.count_all();
        let before_kind = registry.count_by_type(&kind);

        registry.register(EnemyId::new(extra), kind.clone()).expect("register extra");
        prop_assert_eq!(registry.count_all(), before_all + 1);
        prop_assert_eq!(registry.count_by_type(&kind), before_kind + 1);

        prop_assert_eq!(registry.unregister(EnemyId::new(extra)), Some(kind.clone()));
        prop_assert_eq!(registry.count_all(), before_all);
        prop_assert_eq!(registry.count_by_type(&kind), before_kind);
    }
}
