//! Macro command parsing.
//!
//! Hotbar macros that roll an item carry the item's name (and sometimes its
//! type) in their command text. A [`MacroPattern`] recognises one command
//! shape and pulls those out as an [`ItemLookup`].

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Capture group prefix holding the item name.
pub const NAME_GROUP: &str = "itemName";

/// Capture group prefix holding the item type.
pub const TYPE_GROUP: &str = "itemType";

/// The system's own "roll item macro" call. The quote must match on both
/// ends, so there is one alternative per quote character.
const ROLL_ITEM_MACRO: &str = concat!(
    r#"^\s*game\s*\.\s*dnd5e\s*\.\s*rollItemMacro\s*\(\s*"#,
    r#"(?:"(?P<itemName>.+)"|'(?P<itemNameSingle>.+)'|`(?P<itemNameBacktick>.+)`)"#,
    r#"\s*\)\s*;?\s*$"#,
);

/// Minor QoL's `doRoll` call, which also names the item type.
const MINOR_QOL_DO_ROLL: &str =
    r#"MinorQOL\.doRoll\(event, "(?P<itemName>[^"]+)", \{type: "(?P<itemType>[^"]+)".*\}\);?"#;

/// Errors from compiling a macro pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Pattern '{0}' has no itemName capture group")]
    MissingNameGroup(String),
}

/// Item name and optional type recovered from a macro command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemLookup {
    pub name: String,
    /// `None` matches whichever type the first item with this name has.
    pub item_type: Option<String>,
}

impl ItemLookup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item_type: None,
        }
    }

    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }
}

impl fmt::Display for ItemLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.item_type {
            Some(item_type) => write!(f, "{} ({})", self.name, item_type),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One recognised macro command shape.
///
/// Any capture group whose name starts with `itemName` supplies the name and
/// any starting with `itemType` supplies the type; the first one that
/// participates in a match wins.
#[derive(Debug, Clone)]
pub struct MacroPattern {
    label: String,
    regex: Regex,
    name_groups: Vec<String>,
    type_groups: Vec<String>,
}

lazy_static::lazy_static! {
    static ref ROLL_ITEM_MACRO_PATTERN: MacroPattern =
        MacroPattern::new("rollItemMacro", ROLL_ITEM_MACRO)
            .expect("rollItemMacro pattern compiles");

    static ref MINOR_QOL_DO_ROLL_PATTERN: MacroPattern =
        MacroPattern::new("MinorQOL.doRoll", MINOR_QOL_DO_ROLL)
            .expect("MinorQOL.doRoll pattern compiles");
}

impl MacroPattern {
    /// Compile a pattern from a regular expression.
    pub fn new(label: impl Into<String>, pattern: &str) -> Result<Self, PatternError> {
        let label = label.into();
        let regex = Regex::new(pattern)?;
        let groups_with_prefix = |prefix: &str| -> Vec<String> {
            regex
                .capture_names()
                .flatten()
                .filter(|name| name.starts_with(prefix))
                .map(str::to_string)
                .collect()
        };
        let name_groups = groups_with_prefix(NAME_GROUP);
        let type_groups = groups_with_prefix(TYPE_GROUP);

        if name_groups.is_empty() {
            return Err(PatternError::MissingNameGroup(label));
        }

        Ok(Self {
            label,
            regex,
            name_groups,
            type_groups,
        })
    }

    /// `game.dnd5e.rollItemMacro("Item Name");`
    pub fn roll_item_macro() -> Self {
        ROLL_ITEM_MACRO_PATTERN.clone()
    }

    /// `MinorQOL.doRoll(event, "Item Name", {type: "weapon"});`
    pub fn minor_qol_do_roll() -> Self {
        MINOR_QOL_DO_ROLL_PATTERN.clone()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Extract the item lookup from a command, if this pattern matches it.
    pub fn extract(&self, command: &str) -> Option<ItemLookup> {
        let captures = self.regex.captures(command)?;
        let name = first_group(&captures, &self.name_groups)?;
        Some(ItemLookup {
            name: name.to_string(),
            item_type: first_group(&captures, &self.type_groups).map(str::to_string),
        })
    }
}

fn first_group<'h>(captures: &Captures<'h>, groups: &[String]) -> Option<&'h str> {
    groups
        .iter()
        .find_map(|group| captures.name(group))
        .map(|m| m.as_str())
}

/// The command shapes recognised out of the box, in match order.
pub fn standard_patterns() -> Vec<MacroPattern> {
    vec![
        MacroPattern::roll_item_macro(),
        MacroPattern::minor_qol_do_roll(),
    ]
}

/// Extract the item lookup using the first pattern that matches.
pub fn lookup_details(command: &str, patterns: &[MacroPattern]) -> Option<ItemLookup> {
    if command.is_empty() {
        return None;
    }
    let lookup = patterns.iter().find_map(|pattern| {
        pattern.extract(command).inspect(|lookup| {
            tracing::trace!(pattern = pattern.label(), %lookup, "macro command matched");
        })
    });
    if lookup.is_none() {
        tracing::debug!(command, "command is not an item macro");
    }
    lookup
}

/// Whether any pattern recognises the command.
pub fn is_item_command(command: &str, patterns: &[MacroPattern]) -> bool {
    lookup_details(command, patterns).is_some()
}
