//! Testing utilities.
//!
//! This module provides:
//! - Standard D&D 5e items set up the way the host stores them
//! - Sample actors with a realistic mix of items
//! - `TestHost` for scripted speaker/actor scenarios

use crate::calculator::UsesCalculator;
use crate::rules::Uses;
use crate::speaker::{HostSnapshot, Speaker};
use crate::world::{Actor, ActorId, ConsumeKind, ConsumeRule, Item, SpellPool, TokenId};

/// Build a `game.dnd5e.rollItemMacro` command for an item.
pub fn roll_item_macro(name: &str) -> String {
    format!("game.dnd5e.rollItemMacro(\"{name}\");")
}

/// Build a `MinorQOL.doRoll` command for an item.
pub fn minor_qol_do_roll(name: &str, item_type: &str) -> String {
    format!("MinorQOL.doRoll(event, \"{name}\", {{type: \"{item_type}\"}});")
}

// ============================================================================
// Standard items
// ============================================================================

pub fn healing_potion(quantity: i64) -> Item {
    Item::new("Potion of Healing", "consumable").with_quantity(quantity)
}

pub fn javelin(quantity: i64) -> Item {
    Item::new("Javelin", "weapon").thrown().with_quantity(quantity)
}

/// A thrown warhammer that flies back to its wielder.
pub fn dwarven_thrower() -> Item {
    Item::new("Dwarven Thrower", "weapon")
        .thrown()
        .returning()
        .with_quantity(1)
}

pub fn arrows(quantity: i64) -> Item {
    Item::new("Arrows", "consumable").with_quantity(quantity)
}

/// A longbow drawing ammunition from `ammo`.
pub fn longbow(ammo: &Item) -> Item {
    Item::new("Longbow", "weapon")
        .with_quantity(1)
        .with_consume(ConsumeRule::new(ConsumeKind::Ammo, ammo.id.as_str()))
}

pub fn wand_of_magic_missiles(charges: i64) -> Item {
    Item::new("Wand of Magic Missiles", "consumable")
        .with_uses(charges, 7)
        .with_quantity(1)
}

pub fn spell(name: &str, level: u8, mode: &str) -> Item {
    Item::new(name, "spell").with_level(level).with_preparation(mode)
}

// ============================================================================
// Sample actors
// ============================================================================

/// A level 5 fighter with a feature, potions and ranged weapons.
pub fn sample_fighter(name: &str) -> Actor {
    let quiver = arrows(20);
    let bow = longbow(&quiver);
    Actor::new(name).with_items(vec![
        Item::new("Second Wind", "feat").with_uses(1, 1),
        Item::new("Action Surge", "feat").with_uses(0, 1),
        Item::new("Fighting Style", "feat"),
        healing_potion(2),
        javelin(4),
        quiver,
        bow,
        Item::new("Longsword", "weapon").with_quantity(1),
    ])
}

/// A level 5 wizard with prepared spells and open slots.
pub fn sample_wizard(name: &str) -> Actor {
    Actor::new(name)
        .with_spell_slots(SpellPool::Level(1), 4)
        .with_spell_slots(SpellPool::Level(2), 3)
        .with_spell_slots(SpellPool::Level(3), 1)
        .with_items(vec![
            spell("Fire Bolt", 0, "prepared"),
            spell("Magic Missile", 1, "prepared"),
            spell("Misty Step", 2, "prepared"),
            spell("Fireball", 3, "prepared"),
            wand_of_magic_missiles(5),
        ])
}

// ============================================================================
// Test host
// ============================================================================

/// A scripted host: a snapshot plus a calculator to query it with.
pub struct TestHost {
    pub snapshot: HostSnapshot,
    pub calculator: UsesCalculator,
}

impl TestHost {
    pub fn new() -> Self {
        Self {
            snapshot: HostSnapshot::new(),
            calculator: UsesCalculator::default(),
        }
    }

    pub fn with_calculator(mut self, calculator: UsesCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    /// Register an actor and return the speaker bound to it.
    pub fn add_actor(&mut self, actor: Actor) -> Speaker {
        let speaker = Speaker::for_actor(actor.id.clone());
        self.snapshot.actors.push(actor);
        speaker
    }

    /// Place a token with its own synthetic actor, linked to `actor`, and
    /// return the speaker for it.
    pub fn add_token(&mut self, actor: &ActorId, token_actor: Actor) -> Speaker {
        let token = TokenId::new();
        self.snapshot.tokens.insert(token.clone(), token_actor);
        Speaker::for_token(token).with_actor(actor.clone())
    }

    pub fn uses(&self, command: &str, speaker: &Speaker) -> Uses {
        self.calculator
            .calculate_uses(command, speaker, &self.snapshot)
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}
