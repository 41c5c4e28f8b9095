//! UsesCalculator - the public entry point.
//!
//! Ties the pieces together: parse the macro command, resolve the speaker's
//! actor, match items and total their remaining uses.

use crate::command::{self, ItemLookup, MacroPattern};
use crate::rules::{self, Uses};
use crate::speaker::{resolve_actor, ActorDirectory, Speaker};
use crate::world::Actor;

/// Configuration for a [`UsesCalculator`].
#[derive(Debug, Clone)]
pub struct CalculatorConfig {
    /// Recognised command shapes, tried in order.
    pub patterns: Vec<MacroPattern>,
}

impl CalculatorConfig {
    /// A config that recognises no commands yet.
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Add a command shape, tried after those already configured.
    pub fn with_pattern(mut self, pattern: MacroPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// Add the `rollItemMacro` and `MinorQOL.doRoll` shapes.
    pub fn with_standard_patterns(mut self) -> Self {
        self.patterns.extend(command::standard_patterns());
        self
    }
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self::new().with_standard_patterns()
    }
}

/// Computes remaining uses for item macros.
#[derive(Debug, Clone, Default)]
pub struct UsesCalculator {
    config: CalculatorConfig,
}

lazy_static::lazy_static! {
    static ref DEFAULT_CALCULATOR: UsesCalculator = UsesCalculator::default();
}

impl UsesCalculator {
    pub fn new(config: CalculatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// The item name and type a command refers to.
    pub fn lookup_details(&self, command: &str) -> Option<ItemLookup> {
        command::lookup_details(command, &self.config.patterns)
    }

    /// Whether the command rolls an item at all.
    pub fn can_calculate_uses(&self, command: &str) -> bool {
        command::is_item_command(command, &self.config.patterns)
    }

    /// Remaining uses of the item a command rolls, for whoever is speaking.
    ///
    /// Commands that don't roll an item are [`Uses::Unlimited`]. An item
    /// command with no actor behind it can't be used, so it is zero.
    pub fn calculate_uses<D>(&self, command: &str, speaker: &Speaker, directory: &D) -> Uses
    where
        D: ActorDirectory + ?Sized,
    {
        let Some(lookup) = self.lookup_details(command) else {
            return Uses::Unlimited;
        };
        let actor = resolve_actor(speaker, directory);
        uses_for_lookup(&lookup, actor)
    }

    /// Like [`calculate_uses`](Self::calculate_uses), for a host that has
    /// already resolved the actor.
    pub fn calculate_uses_for_actor(&self, command: &str, actor: Option<&Actor>) -> Uses {
        match self.lookup_details(command) {
            Some(lookup) => uses_for_lookup(&lookup, actor),
            None => Uses::Unlimited,
        }
    }
}

fn uses_for_lookup(lookup: &ItemLookup, actor: Option<&Actor>) -> Uses {
    let Some(actor) = actor else {
        return Uses::Remaining(0);
    };
    let items = rules::matching_items(actor, lookup);
    let uses = rules::total_uses(&items, actor);
    tracing::debug!(%lookup, actor = %actor.name, matched = items.len(), %uses, "calculated uses");
    uses
}

/// [`UsesCalculator::can_calculate_uses`] with the standard patterns.
pub fn can_calculate_uses(command: &str) -> bool {
    DEFAULT_CALCULATOR.can_calculate_uses(command)
}

/// [`UsesCalculator::calculate_uses`] with the standard patterns.
pub fn calculate_uses<D>(command: &str, speaker: &Speaker, directory: &D) -> Uses
where
    D: ActorDirectory + ?Sized,
{
    DEFAULT_CALCULATOR.calculate_uses(command, speaker, directory)
}
