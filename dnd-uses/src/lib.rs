//! Remaining-uses calculator for D&D 5e item macros.
//!
//! A hotbar macro that rolls an item can show how many more times it can
//! be used. This crate provides:
//! - Parsing of item macro commands (`rollItemMacro`, `MinorQOL.doRoll`)
//! - Resolution of the speaking actor against host state
//! - Per-type uses rules for features, consumables, spells and weapons
//!
//! # Quick Start
//!
//! ```
//! use dnd_uses::{calculate_uses, Actor, HostSnapshot, Item, Speaker, Uses};
//!
//! let hero = Actor::new("Thorin")
//!     .with_id("thorin0000000000")
//!     .with_item(Item::new("Javelin", "weapon").thrown().with_quantity(5));
//! let host = HostSnapshot::new().with_actor(hero);
//!
//! let uses = calculate_uses(
//!     r#"game.dnd5e.rollItemMacro("Javelin");"#,
//!     &Speaker::for_actor("thorin0000000000"),
//!     &host,
//! );
//! assert_eq!(uses, Uses::Remaining(5));
//! ```

pub mod calculator;
pub mod command;
pub mod rules;
pub mod speaker;
pub mod testing;
pub mod world;

// Primary public API
pub use calculator::{calculate_uses, can_calculate_uses, CalculatorConfig, UsesCalculator};
pub use command::{ItemLookup, MacroPattern, PatternError};
pub use rules::Uses;
pub use speaker::{resolve_actor, ActorDirectory, HostSnapshot, SnapshotError, Speaker};
pub use world::{Actor, ActorId, Item, ItemId, ItemKind, TokenId};
