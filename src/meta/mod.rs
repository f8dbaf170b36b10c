//! The string map at the start of a save, with typed views of the well known
//! entries.

pub mod relaxed;

use crate::{ByteCursor, Error, ErrorKind};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entries stored as integers
pub const INTEGER_KEYS: [&str; 6] = ["wave", "build", "width", "height", "saved", "playtime"];

/// Entries stored as relaxed json objects
pub const OBJECT_KEYS: [&str; 2] = ["stats", "rules"];

pub const WAVETIME_KEY: &str = "wavetime";

/// The value of a meta entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
    Object(Value),
}

impl<'de> Deserialize<'de> for MetaValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // numbers keep their text, so the untagged derive can't tell them apart
        let value = Value::deserialize(deserializer)?;
        let result = match value {
            Value::Number(x) => match (x.as_i64(), x.as_f64()) {
                (Some(i), _) => MetaValue::Integer(i),
                (None, Some(f)) => MetaValue::Decimal(f),
                (None, None) => MetaValue::Object(Value::Number(x)),
            },
            Value::String(x) => MetaValue::Text(x),
            x => MetaValue::Object(x),
        };

        Ok(result)
    }
}

/// The wave schedule the game falls back to when the rules do not list one
///
/// ```
/// let spawns = msav::default_spawns();
/// assert_eq!(spawns.as_array().map(|x| x.len()), Some(24));
/// assert_eq!(spawns[0]["type"], "dagger");
/// ```
pub fn default_spawns() -> Value {
    serde_json::json!([
        { "type": "dagger", "end": 10, "scaling": 2 },
        { "type": "crawler", "begin": 4, "end": 13, "scaling": 1.5, "amount": 2 },
        { "type": "wraith", "begin": 12, "end": 16, "scaling": 1 },
        { "type": "dagger", "begin": 11, "spacing": 2, "scaling": 1.7 },
        { "type": "titan", "begin": 7, "end": 30, "spacing": 3, "scaling": 2 },
        { "type": "dagger", "begin": 8, "spacing": 2, "scaling": 1, "amount": 4 },
        { "type": "titan", "begin": 28, "end": 40, "spacing": 3, "scaling": 1 },
        { "type": "titan", "begin": 45, "spacing": 3, "scaling": 2, "effect": 6 },
        { "type": "titan", "begin": 120, "spacing": 2, "scaling": 3, "amount": 5, "effect": 6 },
        { "type": "wraith", "begin": 16, "spacing": 2, "scaling": 1 },
        { "type": "dagger", "begin": 82, "spacing": 3, "scaling": 3, "amount": 4, "effect": 6 },
        { "type": "dagger", "begin": 41, "spacing": 5, "scaling": 3, "effect": 7 },
        { "type": "fortress", "begin": 40, "spacing": 5, "scaling": 2, "amount": 2 },
        { "type": "dagger", "begin": 35, "end": 60, "spacing": 3, "amount": 4, "effect": 6 },
        { "type": "dagger", "begin": 42, "end": 130, "spacing": 3, "amount": 4, "effect": 6 },
        { "type": "ghoul", "begin": 40, "spacing": 2, "scaling": 2, "amount": 2 },
        { "type": "wraith", "begin": 50, "spacing": 5, "scaling": 3, "amount": 4, "effect": 6 },
        { "type": "revenant", "begin": 50, "spacing": 5, "scaling": 3, "amount": 2 },
        { "type": "ghoul", "begin": 53, "spacing": 4, "scaling": 3, "amount": 2 },
        { "type": "eruptor", "begin": 31, "spacing": 3, "scaling": 1, "amount": 4 },
        { "type": "chaos-array", "begin": 41, "spacing": 30, "scaling": 1 },
        { "type": "eradicator", "begin": 81, "spacing": 40, "scaling": 1 },
        { "type": "lich", "begin": 131, "spacing": 40, "scaling": 1 },
        { "type": "ghoul", "begin": 90, "spacing": 4, "scaling": 3, "amount": 2 }
    ])
}

/// Ordered meta entries of a save.
///
/// The six integer entries, `wavetime`, `stats` and `rules` are required
/// and typed on decode. Other entries are kept as text in the order they
/// appeared.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Meta {
    entries: Vec<(String, MetaValue)>,

    /// The rules had no wave schedule so the default one was filled in
    spawns_defaulted: bool,
}

macro_rules! integer_accessors {
    ($($get:ident, $set:ident, $key:literal;)*) => {
        $(
            #[doc = concat!("The `", $key, "` entry")]
            pub fn $get(&self) -> Option<i64> {
                match self.get($key) {
                    Some(MetaValue::Integer(x)) => Some(*x),
                    _ => None,
                }
            }

            pub fn $set(&mut self, value: i64) {
                self.insert($key, MetaValue::Integer(value));
            }
        )*
    };
}

fn format_integer(value: i64) -> String {
    #[cfg(feature = "faster_writer")]
    {
        itoa::Buffer::new().format(value).to_owned()
    }

    #[cfg(not(feature = "faster_writer"))]
    {
        value.to_string()
    }
}

impl Meta {
    pub fn new() -> Self {
        Meta::default()
    }

    /// Lookup an entry by key
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut MetaValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Replace an entry in place or append it when the key is new
    pub fn insert(&mut self, key: &str, value: MetaValue) -> Option<MetaValue> {
        match self.get_mut(key) {
            Some(existing) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key.to_string(), value));
                None
            }
        }
    }

    /// Iterate over the entries in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    integer_accessors! {
        wave, set_wave, "wave";
        build, set_build, "build";
        width, set_width, "width";
        height, set_height, "height";
        saved, set_saved, "saved";
        playtime, set_playtime, "playtime";
    }

    /// Time until the next wave
    pub fn wavetime(&self) -> Option<f64> {
        match self.get(WAVETIME_KEY) {
            Some(MetaValue::Decimal(x)) => Some(*x),
            _ => None,
        }
    }

    pub fn set_wavetime(&mut self, value: f64) {
        self.insert(WAVETIME_KEY, MetaValue::Decimal(value));
    }

    fn object(&self, key: &str) -> Option<&Value> {
        match self.get(key) {
            Some(MetaValue::Object(x)) => Some(x),
            _ => None,
        }
    }

    fn object_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self.get_mut(key) {
            Some(MetaValue::Object(x)) => Some(x),
            _ => None,
        }
    }

    pub fn stats(&self) -> Option<&Value> {
        self.object("stats")
    }

    pub fn stats_mut(&mut self) -> Option<&mut Value> {
        self.object_mut("stats")
    }

    pub fn rules(&self) -> Option<&Value> {
        self.object("rules")
    }

    pub fn rules_mut(&mut self) -> Option<&mut Value> {
        self.object_mut("rules")
    }

    /// Returns true if the wave schedule was absent from the rules and the
    /// default schedule was filled in. An unchanged default schedule is left
    /// out again on encode.
    pub fn spawns_defaulted(&self) -> bool {
        self.spawns_defaulted
    }

    /// Decode the meta section body
    pub fn read(cursor: &mut ByteCursor) -> Result<Self, Error> {
        let pairs = cursor.read_string_map()?;
        let mut entries = Vec::with_capacity(pairs.len());
        for (key, text) in pairs {
            let value = if INTEGER_KEYS.contains(&key.as_str()) {
                match text.parse::<i64>() {
                    Ok(x) => MetaValue::Integer(x),
                    Err(_) => return Err(invalid_meta(key, Some(text))),
                }
            } else if key == WAVETIME_KEY {
                match text.parse::<f64>() {
                    Ok(x) => MetaValue::Decimal(x),
                    Err(_) => return Err(invalid_meta(key, Some(text))),
                }
            } else if OBJECT_KEYS.contains(&key.as_str()) {
                MetaValue::Object(relaxed::from_str(&text)?)
            } else {
                MetaValue::Text(text)
            };

            entries.push((key, value));
        }

        let mut meta = Meta {
            entries,
            spawns_defaulted: false,
        };

        let required = INTEGER_KEYS
            .iter()
            .chain(std::iter::once(&WAVETIME_KEY))
            .chain(OBJECT_KEYS.iter());
        for key in required {
            if meta.get(key).is_none() {
                return Err(invalid_meta(key.to_string(), None));
            }
        }

        if let Some(Value::Object(rules)) = meta.rules_mut() {
            if !rules.contains_key("spawns") {
                rules.insert(String::from("spawns"), default_spawns());
                meta.spawns_defaulted = true;
            }
        }

        Ok(meta)
    }

    fn encode_value(&self, key: &str, value: &MetaValue) -> String {
        match value {
            MetaValue::Integer(x) => format_integer(*x),
            MetaValue::Decimal(x) => format!("{:?}", x),
            MetaValue::Text(x) => x.clone(),
            MetaValue::Object(Value::Object(rules)) if key == "rules" && self.spawns_defaulted => {
                if rules.get("spawns") == Some(&default_spawns()) {
                    let mut rules = rules.clone();
                    rules.shift_remove("spawns");
                    relaxed::to_string(&Value::Object(rules))
                } else {
                    relaxed::to_string(&Value::Object(rules.clone()))
                }
            }
            MetaValue::Object(x) => relaxed::to_string(x),
        }
    }

    /// Encode the meta section body
    pub fn write(&self, cursor: &mut ByteCursor) -> Result<(), Error> {
        let texts: Vec<(&str, String)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), self.encode_value(k, v)))
            .collect();
        cursor.write_string_map(texts.iter().map(|(k, v)| (*k, v.as_str())))
    }
}

fn invalid_meta(key: String, value: Option<String>) -> Error {
    Error::new(ErrorKind::InvalidMeta { key, value })
}

impl Serialize for Meta {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Meta {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct MetaVisitor;

        impl<'de> serde::de::Visitor<'de> for MetaVisitor {
            type Value = Meta;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a map of meta entries")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let size = map.size_hint().unwrap_or(0);
                let mut entries = Vec::with_capacity(size);
                while let Some((key, value)) = map.next_entry::<String, MetaValue>()? {
                    entries.push((key, value));
                }

                Ok(Meta {
                    entries,
                    spawns_defaulted: false,
                })
            }
        }

        deserializer.deserialize_map(MetaVisitor)
    }
}
