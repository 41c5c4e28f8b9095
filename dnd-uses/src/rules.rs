//! Remaining-uses rules for items.
//!
//! Each item type draws on a different resource: features count their own
//! uses, consumables count the whole stack, spells count the caster's slots,
//! thrown weapons count themselves. Items configured to consume another
//! resource count that resource instead.

use crate::command::ItemLookup;
use crate::world::{Actor, ConsumeKind, ConsumeRule, Item, ItemKind, PreparationMode, SpellPool};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many more times something can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Uses {
    Remaining(i64),
    /// No bound applies, or none could be determined.
    Unlimited,
}

impl Uses {
    pub fn remaining(self) -> Option<i64> {
        match self {
            Uses::Remaining(n) => Some(n),
            Uses::Unlimited => None,
        }
    }

    pub fn is_unlimited(self) -> bool {
        matches!(self, Uses::Unlimited)
    }
}

impl From<Option<i64>> for Uses {
    fn from(uses: Option<i64>) -> Self {
        uses.map_or(Uses::Unlimited, Uses::Remaining)
    }
}

impl From<Uses> for Option<i64> {
    fn from(uses: Uses) -> Self {
        uses.remaining()
    }
}

impl fmt::Display for Uses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uses::Remaining(n) => write!(f, "{n}"),
            Uses::Unlimited => write!(f, "∞"),
        }
    }
}

// ============================================================================
// Matching
// ============================================================================

/// Items on the actor that a lookup refers to, in sheet order.
///
/// Names must match exactly. Without a requested type, the first item with
/// the name fixes the type for the rest of the pass, so a name shared by a
/// feature and a weapon only matches whichever comes first.
pub fn matching_items<'a>(actor: &'a Actor, lookup: &ItemLookup) -> Vec<&'a Item> {
    let start: (Option<&str>, Vec<&'a Item>) = (lookup.item_type.as_deref(), Vec::new());
    let (_, matched) = actor
        .items
        .iter()
        .filter(|item| item.name == lookup.name)
        .fold(start, |(required, mut matched), item| {
            let kind = item.kind.as_str();
            match required {
                Some(required) if required != kind => (Some(required), matched),
                _ => {
                    matched.push(item);
                    (Some(kind), matched)
                }
            }
        });
    matched
}

// ============================================================================
// Per-item rules
// ============================================================================

/// Remaining uses of a single item owned by `actor`.
pub fn item_uses(item: &Item, actor: &Actor) -> Uses {
    let uses = match &item.kind {
        ItemKind::Feat => own_uses(item),
        ItemKind::Consumable => Uses::Remaining(stack_uses(item)),
        ItemKind::Spell => spell_uses(item, actor),
        kind => match item.data.consume.as_ref() {
            Some(rule) if rule.target().is_some() => consume_uses(actor, rule),
            _ if *kind == ItemKind::Weapon => weapon_uses(item),
            _ => Uses::Unlimited,
        },
    };
    tracing::trace!(item = %item.name, kind = %item.kind, %uses, "item uses");
    uses
}

/// The item's own counter, if it tracks one.
fn own_uses(item: &Item) -> Uses {
    item.limited_uses()
        .map_or(Uses::Unlimited, |uses| Uses::Remaining(uses.value))
}

/// Uses left across a stack: every full item below the top contributes its
/// maximum, the top one its current value. Items without a counter count as
/// single-use.
fn stack_uses(item: &Item) -> i64 {
    let (value, max) = item
        .limited_uses()
        .map_or((1, 1), |uses| (uses.value, uses.max));
    match item.data.quantity {
        0 => value,
        quantity => value.saturating_add(quantity.saturating_sub(1).saturating_mul(max)),
    }
}

fn spell_uses(item: &Item, actor: &Actor) -> Uses {
    let mode = item.data.preparation.as_ref().map(|p| &p.mode);
    match mode {
        Some(PreparationMode::Pact) => Uses::Remaining(actor.data.spell_slots(SpellPool::Pact)),
        Some(PreparationMode::Innate | PreparationMode::AtWill) => own_uses(item),
        _ if item.data.level > 0 => {
            Uses::Remaining(actor.data.spell_slots(SpellPool::Level(item.data.level)))
        }
        // Cantrip
        _ => Uses::Unlimited,
    }
}

fn consume_uses(actor: &Actor, rule: &ConsumeRule) -> Uses {
    let Some(target) = rule.target() else {
        return Uses::Unlimited;
    };
    match &rule.kind {
        ConsumeKind::Attribute => actor.data.number_at(target).into(),
        ConsumeKind::Ammo | ConsumeKind::Material => {
            Uses::Remaining(actor.item(target).map_or(0, |item| item.data.quantity))
        }
        ConsumeKind::Charges => Uses::Remaining(actor.item(target).map_or(0, stack_uses)),
        ConsumeKind::Other(_) => Uses::Unlimited,
    }
}

/// Thrown weapons are used up until picked back up, unless they return.
fn weapon_uses(item: &Item) -> Uses {
    let properties = item.data.properties;
    if properties.thrown && !properties.returning {
        Uses::Remaining(item.data.quantity)
    } else {
        Uses::Unlimited
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Total uses across matched items. One unlimited item makes the whole
/// group unlimited.
pub fn total_uses(items: &[&Item], actor: &Actor) -> Uses {
    let total = items.iter().try_fold(0i64, |total, item| {
        item_uses(item, actor)
            .remaining()
            .map(|uses| total.saturating_add(uses))
    });
    if total.is_none() {
        tracing::debug!(items = items.len(), "unlimited item in group");
    }
    total.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::LimitedUses;

    fn actor_with(items: Vec<Item>) -> Actor {
        Actor::new("Tester").with_items(items)
    }

    fn uses_of(item: Item) -> Uses {
        let actor = actor_with(vec![item]);
        item_uses(&actor.items[0], &actor)
    }

    #[test]
    fn test_feat_uses() {
        assert_eq!(uses_of(Item::new("Second Wind", "feat").with_uses(1, 1)), Uses::Remaining(1));
        assert_eq!(uses_of(Item::new("Action Surge", "feat").with_uses(0, 1)), Uses::Remaining(0));
        assert_eq!(uses_of(Item::new("Darkvision", "feat")), Uses::Unlimited);
        assert_eq!(
            uses_of(Item::new("Rage", "feat").with_limited_uses(LimitedUses {
                value: 3,
                max: 3,
                per: None,
            })),
            Uses::Unlimited
        );
    }

    #[test]
    fn test_consumable_stack() {
        let potion = Item::new("Potion of Healing", "consumable")
            .with_uses(2, 3)
            .with_quantity(4);
        assert_eq!(uses_of(potion), Uses::Remaining(11));
    }

    #[test]
    fn test_consumable_without_counter_counts_quantity() {
        let rations = Item::new("Rations", "consumable").with_quantity(7);
        assert_eq!(uses_of(rations), Uses::Remaining(7));
    }

    #[test]
    fn test_consumable_without_quantity() {
        assert_eq!(uses_of(Item::new("Scroll", "consumable")), Uses::Remaining(1));
        assert_eq!(
            uses_of(Item::new("Wand", "consumable").with_uses(5, 7)),
            Uses::Remaining(5)
        );
    }

    #[test]
    fn test_consumable_ignores_consume_rule() {
        let potion = Item::new("Potion", "consumable")
            .with_quantity(2)
            .with_consume(ConsumeRule::new(ConsumeKind::Ammo, "missing"));
        assert_eq!(uses_of(potion), Uses::Remaining(2));
    }

    #[test]
    fn test_consumable_stack_saturates() {
        let potion = Item::new("Potion", "consumable").with_quantity(i64::MIN);
        assert_eq!(uses_of(potion), Uses::Remaining(i64::MIN + 1));

        let flasks = Item::new("Flask", "consumable")
            .with_uses(2, 3)
            .with_quantity(i64::MAX);
        assert_eq!(uses_of(flasks), Uses::Remaining(i64::MAX));
    }

    #[test]
    fn test_charges_target_stack_saturates() {
        let actor = Actor::new("Artificer").with_items(vec![
            Item::new("Infused Wand", "consumable")
                .with_id("wand000000000000")
                .with_uses(3, 7)
                .with_quantity(i64::MIN),
            Item::new("Arcane Bolt", "weapon")
                .with_consume(ConsumeRule::new(ConsumeKind::Charges, "wand000000000000")),
        ]);
        assert_eq!(item_uses(&actor.items[1], &actor), Uses::Remaining(i64::MIN + 3));
    }

    #[test]
    fn test_spell_slots_by_level() {
        let actor = Actor::new("Wizard")
            .with_spell_slots(SpellPool::Level(1), 4)
            .with_spell_slots(SpellPool::Level(3), 2)
            .with_items(vec![
                Item::new("Magic Missile", "spell").with_level(1).with_preparation("prepared"),
                Item::new("Fireball", "spell").with_level(3).with_preparation("always"),
                Item::new("Fire Bolt", "spell").with_level(0).with_preparation("prepared"),
                Item::new("Wish", "spell").with_level(9),
            ]);

        let uses: Vec<Uses> = actor.items.iter().map(|i| item_uses(i, &actor)).collect();
        assert_eq!(
            uses,
            vec![
                Uses::Remaining(4),
                Uses::Remaining(2),
                Uses::Unlimited,
                Uses::Remaining(0),
            ]
        );
    }

    #[test]
    fn test_pact_spell() {
        let actor = Actor::new("Warlock")
            .with_spell_slots(SpellPool::Pact, 2)
            .with_spell_slots(SpellPool::Level(1), 9)
            .with_item(Item::new("Hex", "spell").with_level(1).with_preparation("pact"));
        assert_eq!(item_uses(&actor.items[0], &actor), Uses::Remaining(2));
    }

    #[test]
    fn test_innate_and_at_will_spells() {
        let actor = Actor::new("Tiefling")
            .with_spell_slots(SpellPool::Level(2), 3)
            .with_items(vec![
                Item::new("Darkness", "spell")
                    .with_level(2)
                    .with_preparation("innate")
                    .with_uses(1, 1),
                Item::new("Hellish Rebuke", "spell").with_level(1).with_preparation("innate"),
                Item::new("Detect Magic", "spell").with_level(1).with_preparation("atwill"),
            ]);

        let uses: Vec<Uses> = actor.items.iter().map(|i| item_uses(i, &actor)).collect();
        assert_eq!(uses, vec![Uses::Remaining(1), Uses::Unlimited, Uses::Unlimited]);
    }

    #[test]
    fn test_consume_attribute() {
        let actor = Actor::new("Monk")
            .with_attribute("resources.primary.value", 4)
            .with_attribute("details.race", "Human")
            .with_items(vec![
                Item::new("Flurry of Blows", "weapon")
                    .with_consume(ConsumeRule::new(ConsumeKind::Attribute, "resources.primary.value")),
                Item::new("Odd Ability", "other")
                    .with_consume(ConsumeRule::new(ConsumeKind::Attribute, "details.race")),
                Item::new("Missing Ability", "other")
                    .with_consume(ConsumeRule::new(ConsumeKind::Attribute, "resources.tertiary.value")),
            ]);

        let uses: Vec<Uses> = actor.items.iter().map(|i| item_uses(i, &actor)).collect();
        assert_eq!(uses, vec![Uses::Remaining(4), Uses::Unlimited, Uses::Unlimited]);
    }

    #[test]
    fn test_consume_ammo_and_material() {
        let actor = Actor::new("Ranger").with_items(vec![
            Item::new("Arrows", "consumable").with_id("arrows0000000000").with_quantity(20),
            Item::new("Longbow", "weapon")
                .with_consume(ConsumeRule::new(ConsumeKind::Ammo, "arrows0000000000")),
            Item::new("Shortbow", "weapon")
                .with_consume(ConsumeRule::new(ConsumeKind::Ammo, "gone000000000000")),
            Item::new("Diamond Dust", "loot").with_id("dust000000000000").with_quantity(3),
            Item::new("Revivify Kit", "equipment")
                .with_consume(ConsumeRule::new(ConsumeKind::Material, "dust000000000000")),
        ]);

        assert_eq!(item_uses(&actor.items[1], &actor), Uses::Remaining(20));
        assert_eq!(item_uses(&actor.items[2], &actor), Uses::Remaining(0));
        assert_eq!(item_uses(&actor.items[4], &actor), Uses::Remaining(3));
    }

    #[test]
    fn test_consume_charges() {
        let actor = Actor::new("Sorcerer").with_items(vec![
            Item::new("Wand of Magic Missiles", "consumable")
                .with_id("wand000000000000")
                .with_uses(3, 7)
                .with_quantity(2),
            Item::new("Magic Missile (Wand)", "weapon")
                .with_consume(ConsumeRule::new(ConsumeKind::Charges, "wand000000000000")),
            Item::new("Broken Staff", "equipment")
                .with_consume(ConsumeRule::new(ConsumeKind::Charges, "gone000000000000")),
        ]);

        assert_eq!(item_uses(&actor.items[1], &actor), Uses::Remaining(10));
        assert_eq!(item_uses(&actor.items[2], &actor), Uses::Remaining(0));
    }

    #[test]
    fn test_consume_rule_without_target_is_ignored() {
        let javelin = Item::new("Javelin", "weapon")
            .thrown()
            .with_quantity(5)
            .with_consume(ConsumeRule {
                kind: ConsumeKind::Ammo,
                target: Some(String::new()),
            });
        assert_eq!(uses_of(javelin), Uses::Remaining(5));
    }

    #[test]
    fn test_unknown_consume_kind() {
        let item = Item::new("Odd Gadget", "equipment")
            .with_consume(ConsumeRule::new(ConsumeKind::from("hitDice"), "d8"));
        assert_eq!(uses_of(item), Uses::Unlimited);
    }

    #[test]
    fn test_thrown_weapons() {
        let javelin = Item::new("Javelin", "weapon").thrown().with_quantity(5);
        assert_eq!(uses_of(javelin.clone()), Uses::Remaining(5));
        assert_eq!(uses_of(javelin.returning()), Uses::Unlimited);
        assert_eq!(uses_of(Item::new("Longsword", "weapon").with_quantity(1)), Uses::Unlimited);
    }

    #[test]
    fn test_other_items_unlimited() {
        assert_eq!(uses_of(Item::new("Plate Armor", "equipment")), Uses::Unlimited);
        assert_eq!(uses_of(Item::new("Wizard", "class")), Uses::Unlimited);
    }

    #[test]
    fn test_matching_first_type_wins() {
        let actor = actor_with(vec![
            Item::new("Dagger", "feat"),
            Item::new("Dagger", "weapon").thrown().with_quantity(2),
            Item::new("Shortsword", "weapon"),
            Item::new("Dagger", "feat").with_uses(1, 1),
        ]);

        let matched = matching_items(&actor, &ItemLookup::new("Dagger"));
        assert_eq!(matched.len(), 2);
        assert!(matched.iter().all(|item| item.kind == ItemKind::Feat));
    }

    #[test]
    fn test_matching_explicit_type() {
        let actor = actor_with(vec![
            Item::new("Dagger", "feat"),
            Item::new("Dagger", "weapon").thrown().with_quantity(2),
            Item::new("Dagger", "weapon").thrown().with_quantity(3),
        ]);

        let matched = matching_items(&actor, &ItemLookup::new("Dagger").with_type("weapon"));
        assert_eq!(matched.len(), 2);
        assert_eq!(total_uses(&matched, &actor), Uses::Remaining(5));
    }

    #[test]
    fn test_matching_is_exact() {
        let actor = actor_with(vec![
            Item::new("dagger", "weapon"),
            Item::new("Dagger ", "weapon"),
        ]);
        assert!(matching_items(&actor, &ItemLookup::new("Dagger")).is_empty());
    }

    #[test]
    fn test_total_sums_items() {
        let actor = actor_with(vec![
            Item::new("Potion", "consumable").with_quantity(2),
            Item::new("Potion", "consumable").with_quantity(3),
        ]);
        let matched = matching_items(&actor, &ItemLookup::new("Potion"));
        assert_eq!(total_uses(&matched, &actor), Uses::Remaining(5));
    }

    #[test]
    fn test_total_short_circuits_on_unlimited() {
        let actor = actor_with(vec![
            Item::new("Ki", "weapon").thrown().with_quantity(4),
            Item::new("Ki", "weapon"),
            Item::new("Ki", "weapon").thrown().with_quantity(6),
        ]);
        let matched = matching_items(&actor, &ItemLookup::new("Ki"));
        assert_eq!(matched.len(), 3);
        assert_eq!(total_uses(&matched, &actor), Uses::Unlimited);
    }

    #[test]
    fn test_total_of_nothing_is_zero() {
        let actor = actor_with(Vec::new());
        assert_eq!(total_uses(&[], &actor), Uses::Remaining(0));
    }

    #[test]
    fn test_uses_conversions() {
        assert_eq!(Uses::from(Some(3)), Uses::Remaining(3));
        assert_eq!(Uses::from(None), Uses::Unlimited);
        assert_eq!(Option::<i64>::from(Uses::Remaining(2)), Some(2));
        assert_eq!(Uses::Unlimited.to_string(), "∞");
        assert_eq!(Uses::Remaining(12).to_string(), "12");
    }
}
