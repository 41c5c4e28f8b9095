//! Actor and item data as exposed by the virtual tabletop host.
//!
//! These types mirror the host's D&D 5e JSON shape closely enough to be
//! deserialized straight from an exported actor. They are read-only from the
//! calculator's point of view; the builder methods exist for fixtures and
//! for hosts that assemble actors by hand.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Length of host document ids.
const ID_LENGTH: usize = 16;

/// Macro to define a string-backed id newtype.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Mint a fresh random id in the host's 16 character format.
            pub fn new() -> Self {
                let mut id = Uuid::new_v4().simple().to_string();
                id.truncate(ID_LENGTH);
                Self(id)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Identifier of an actor in the host's actor registry.
    ActorId
);

define_id!(
    /// Identifier of a token placed on a scene.
    TokenId
);

define_id!(
    /// Identifier of an item owned by an actor.
    ItemId
);

// ============================================================================
// Tagged strings
// ============================================================================

/// Macro to define an enum over a host string tag, keeping unknown tags.
macro_rules! string_tag {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $tag:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// A tag this crate has no special rules for.
            Other(String),
        }

        impl $name {
            /// The host's tag for this value.
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $tag,)+
                    $name::Other(tag) => tag.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(tag: String) -> Self {
                match tag.as_str() {
                    $($tag => $name::$variant,)+
                    _ => $name::Other(tag),
                }
            }
        }

        impl From<&str> for $name {
            fn from(tag: &str) -> Self {
                Self::from(tag.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(tag) => tag,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_tag!(
    /// The item's document type.
    ItemKind {
        Feat => "feat",
        Consumable => "consumable",
        Spell => "spell",
        Weapon => "weapon",
    }
);

string_tag!(
    /// What an item's activation consumes.
    ConsumeKind {
        Attribute => "attribute",
        Ammo => "ammo",
        Material => "material",
        Charges => "charges",
    }
);

string_tag!(
    /// How a spell is prepared, selecting the resource pool it draws from.
    PreparationMode {
        Prepared => "prepared",
        Always => "always",
        Pact => "pact",
        Innate => "innate",
        AtWill => "atwill",
    }
);

impl Default for ConsumeKind {
    fn default() -> Self {
        ConsumeKind::Other(String::new())
    }
}

impl Default for PreparationMode {
    fn default() -> Self {
        PreparationMode::Prepared
    }
}

// ============================================================================
// Lenient numbers
// ============================================================================

/// Read a JSON value as a whole number.
///
/// Fractions are truncated toward zero. Anything that is not a JSON number
/// yields `None`.
pub fn whole_number(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|n| n.trunc() as i64))
}

/// Host sheets store counters as numbers, numeric strings, empty strings or
/// null depending on how they were last edited. All of those read as an
/// integer here, with 0 for anything unparseable.
fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::String(text) => text.trim().parse::<f64>().map_or(0, |n| n.trunc() as i64),
        other => whole_number(other).unwrap_or(0),
    })
}

/// Spell levels go through the same lenient read, clamped into `u8`.
fn lenient_level<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let level = lenient_int(deserializer)?;
    Ok(level.clamp(0, i64::from(u8::MAX)) as u8)
}

// ============================================================================
// Items
// ============================================================================

/// Limited-use counter on an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitedUses {
    #[serde(default, deserialize_with = "lenient_int")]
    pub value: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub max: i64,
    /// Recovery period such as "day", "sr" or "charges".
    #[serde(default)]
    pub per: Option<String>,
}

impl LimitedUses {
    pub fn new(value: i64, max: i64, per: impl Into<String>) -> Self {
        Self {
            value,
            max,
            per: Some(per.into()),
        }
    }

    /// Whether the counter is actually tracked: it needs a recovery period
    /// and a positive maximum.
    pub fn is_limited(&self) -> bool {
        self.per.as_deref().is_some_and(|per| !per.is_empty()) && self.max > 0
    }
}

/// Resource an item depletes when activated, instead of its own counter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumeRule {
    #[serde(rename = "type", default)]
    pub kind: ConsumeKind,
    /// Attribute path or target item id, depending on `kind`.
    #[serde(default)]
    pub target: Option<String>,
}

impl ConsumeRule {
    pub fn new(kind: ConsumeKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: Some(target.into()),
        }
    }

    /// The configured target, ignoring an empty one.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref().filter(|target| !target.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preparation {
    #[serde(default)]
    pub mode: PreparationMode,
}

/// The weapon properties the calculator cares about.
///
/// The host stores a flag per property; all others are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponProperties {
    #[serde(rename = "thr")]
    pub thrown: bool,
    #[serde(rename = "ret")]
    pub returning: bool,
}

/// Nested attribute data of an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemData {
    pub uses: Option<LimitedUses>,
    #[serde(deserialize_with = "lenient_int")]
    pub quantity: i64,
    pub consume: Option<ConsumeRule>,
    pub preparation: Option<Preparation>,
    #[serde(deserialize_with = "lenient_level")]
    pub level: u8,
    pub properties: WeaponProperties,
}

/// An item owned by an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub data: ItemData,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: impl Into<ItemKind>) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            kind: kind.into(),
            data: ItemData::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.id = id.into();
        self
    }

    /// Track a limited-use counter that recovers each day.
    pub fn with_uses(mut self, value: i64, max: i64) -> Self {
        self.data.uses = Some(LimitedUses::new(value, max, "day"));
        self
    }

    pub fn with_limited_uses(mut self, uses: LimitedUses) -> Self {
        self.data.uses = Some(uses);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.data.quantity = quantity;
        self
    }

    pub fn with_consume(mut self, consume: ConsumeRule) -> Self {
        self.data.consume = Some(consume);
        self
    }

    pub fn with_preparation(mut self, mode: impl Into<PreparationMode>) -> Self {
        self.data.preparation = Some(Preparation {
            mode: mode.into(),
        });
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.data.level = level;
        self
    }

    pub fn thrown(mut self) -> Self {
        self.data.properties.thrown = true;
        self
    }

    pub fn returning(mut self) -> Self {
        self.data.properties.returning = true;
        self
    }

    /// The item's limited-use counter, if it is actually tracked.
    pub fn limited_uses(&self) -> Option<&LimitedUses> {
        self.data.uses.as_ref().filter(|uses| uses.is_limited())
    }

    pub fn has_limited_uses(&self) -> bool {
        self.limited_uses().is_some()
    }
}

// ============================================================================
// Actors
// ============================================================================

/// A spell slot pool on an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpellPool {
    Pact,
    /// Slots of a spell level, 1 through 9.
    Level(u8),
}

impl SpellPool {
    /// Path of the pool's remaining slots in actor data.
    pub fn value_path(&self) -> String {
        match self {
            SpellPool::Pact => "spells.pact.value".to_string(),
            SpellPool::Level(level) => format!("spells.spell{level}.value"),
        }
    }
}

/// An actor's nested attribute tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorData(pub Value);

impl ActorData {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Look up a dotted path such as `resources.primary.value`.
    ///
    /// Numeric segments index into arrays.
    pub fn get_property(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.0, |node, key| match node {
            Value::Object(map) => map.get(key),
            Value::Array(values) => key.parse::<usize>().ok().and_then(|i| values.get(i)),
            _ => None,
        })
    }

    /// The value at `path` if it is a number.
    pub fn number_at(&self, path: &str) -> Option<i64> {
        self.get_property(path).and_then(whole_number)
    }

    /// Remaining slots in a spell pool. A pool the actor does not have holds
    /// no slots.
    pub fn spell_slots(&self, pool: SpellPool) -> i64 {
        self.number_at(&pool.value_path()).unwrap_or(0)
    }

    /// Set a dotted path, creating intermediate objects as needed.
    pub fn set_property(&mut self, path: &str, value: Value) {
        fn insert<'a>(node: &mut Value, mut keys: impl Iterator<Item = &'a str>, value: Value) {
            match keys.next() {
                None => *node = value,
                Some(key) => {
                    if !node.is_object() {
                        *node = Value::Object(Map::new());
                    }
                    if let Value::Object(map) = node {
                        insert(map.entry(key).or_insert(Value::Null), keys, value);
                    }
                }
            }
        }
        insert(&mut self.0, path.split('.'), value);
    }
}

/// A character, NPC or vehicle in the host's registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: ActorId,
    pub name: String,
    /// Owned items, in sheet order.
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub data: ActorData,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            items: Vec::new(),
            data: ActorData::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ActorId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = Item>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn with_spell_slots(mut self, pool: SpellPool, remaining: i64) -> Self {
        self.data.set_property(&pool.value_path(), Value::from(remaining));
        self
    }

    pub fn with_attribute(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.data.set_property(path, value.into());
        self
    }

    /// Find an owned item by id.
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id.as_str() == id)
    }
}
