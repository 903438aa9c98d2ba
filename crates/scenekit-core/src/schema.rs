//! Document property schema and its reducer.
//!
//! A document may declare typed properties (think component props). The
//! schema is an insertion-ordered map from key to [`PropertyDefinition`] and
//! is only ever changed by [`reduce`], which returns a new schema.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Metadata shared by every property kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

/// Type of a document property, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyDefinition {
    String(PropertyMeta),
    Number(PropertyMeta),
    Boolean(PropertyMeta),
    Array {
        items: Box<PropertyDefinition>,
        #[serde(flatten)]
        meta: PropertyMeta,
    },
    Object {
        #[serde(default)]
        properties: PropertySchema,
        #[serde(flatten)]
        meta: PropertyMeta,
    },
    Richtext(PropertyMeta),
    Video(PropertyMeta),
    Audio(PropertyMeta),
    Image(PropertyMeta),
}

impl Default for PropertyDefinition {
    fn default() -> Self {
        PropertyDefinition::String(PropertyMeta::default())
    }
}

impl PropertyDefinition {
    pub fn meta(&self) -> &PropertyMeta {
        match self {
            PropertyDefinition::String(meta)
            | PropertyDefinition::Number(meta)
            | PropertyDefinition::Boolean(meta)
            | PropertyDefinition::Richtext(meta)
            | PropertyDefinition::Video(meta)
            | PropertyDefinition::Audio(meta)
            | PropertyDefinition::Image(meta)
            | PropertyDefinition::Array { meta, .. }
            | PropertyDefinition::Object { meta, .. } => meta,
        }
    }
}

/// Insertion-ordered property map. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySchema {
    entries: Vec<(String, PropertyDefinition)>,
}

impl PropertySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&PropertyDefinition> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyDefinition)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Insert or replace. A replaced entry keeps its position.
    fn upsert(&mut self, key: String, definition: PropertyDefinition) {
        match self.position(&key) {
            Some(i) => self.entries[i].1 = definition,
            None => self.entries.push((key, definition)),
        }
    }

    /// First `new_property_{n}` key not in use, counting from `len + 1`.
    fn next_key(&self) -> String {
        let mut n = self.len() + 1;
        loop {
            let key = format!("new_property_{n}");
            if !self.contains_key(&key) {
                return key;
            }
            n += 1;
        }
    }
}

impl FromIterator<(String, PropertyDefinition)> for PropertySchema {
    fn from_iter<I: IntoIterator<Item = (String, PropertyDefinition)>>(iter: I) -> Self {
        let mut schema = PropertySchema::new();
        for (key, definition) in iter {
            schema.upsert(key, definition);
        }
        schema
    }
}

impl Serialize for PropertySchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, definition) in &self.entries {
            map.serialize_entry(key, definition)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PropertySchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = PropertySchema;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of property definitions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut schema = PropertySchema::new();
                while let Some((key, definition)) = access.next_entry::<String, PropertyDefinition>()? {
                    schema.upsert(key, definition);
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

/// Edits to the property schema, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SchemaAction {
    /// Add a property. Without a key one is generated; without a definition
    /// it is a plain string. An existing key is overwritten in place.
    #[serde(rename = "document/properties/define")]
    Define {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        definition: Option<PropertyDefinition>,
    },
    /// Change a key, keeping position and definition.
    #[serde(rename = "document/properties/rename")]
    Rename {
        key: String,
        #[serde(rename = "newKey")]
        new_key: String,
    },
    /// Replace the definition of an existing key.
    #[serde(rename = "document/properties/update")]
    Update {
        key: String,
        definition: PropertyDefinition,
    },
    /// Insert or replace.
    #[serde(rename = "document/properties/put")]
    Put {
        key: String,
        definition: PropertyDefinition,
    },
    #[serde(rename = "document/properties/delete")]
    Delete { key: String },
}

/// Apply `action` to `schema`, returning the new schema.
///
/// Conflicting actions (renaming onto an existing key, updating or deleting
/// a missing key) leave the schema unchanged.
pub fn reduce(schema: &PropertySchema, action: &SchemaAction) -> PropertySchema {
    let mut next = schema.clone();
    match action {
        SchemaAction::Define { key, definition } => {
            let key = key.clone().unwrap_or_else(|| next.next_key());
            next.upsert(key, definition.clone().unwrap_or_default());
        }
        SchemaAction::Rename { key, new_key } => {
            if key == new_key {
                return next;
            }
            if next.contains_key(new_key) {
                log::debug!("Ignoring rename of '{}': '{}' already exists", key, new_key);
                return next;
            }
            match next.position(key) {
                Some(i) => next.entries[i].0 = new_key.clone(),
                None => log::debug!("Ignoring rename of missing property '{}'", key),
            }
        }
        SchemaAction::Update { key, definition } => match next.position(key) {
            Some(i) => next.entries[i].1 = definition.clone(),
            None => log::debug!("Ignoring update of missing property '{}'", key),
        },
        SchemaAction::Put { key, definition } => {
            next.upsert(key.clone(), definition.clone());
        }
        SchemaAction::Delete { key } => match next.position(key) {
            Some(i) => {
                next.entries.remove(i);
            }
            None => log::debug!("Ignoring delete of missing property '{}'", key),
        },
    }
    next
}
