//! In-memory view of a map descriptor.
//!
//! The whole document is kept as a `serde_json` object so that fields this
//! crate knows nothing about (layers, tilesets, editor settings …) survive a
//! read → rewrite → write cycle untouched, in their original key order.

use serde_json::{Map, Value};

pub const SCRIPT_PROPERTY: &str = "script";
pub const MAP_IMAGE_PROPERTY: &str = "mapImage";

/// Property names the build looks up. Each may appear at most once.
const TRACKED_PROPERTIES: [&str; 2] = [SCRIPT_PROPERTY, MAP_IMAGE_PROPERTY];

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("descriptor is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("descriptor root is not a JSON object")]
    NotAnObject,

    #[error("property `{name}` is declared {count} times, expected at most once")]
    DuplicateProperty { name: &'static str, count: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    root: Map<String, Value>,
}

impl Descriptor {
    pub fn from_json(json: &str) -> Result<Self, DescriptorError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Wrap a parsed document, rejecting it when a tracked property is
    /// declared more than once.
    pub fn from_value(value: Value) -> Result<Self, DescriptorError> {
        let Value::Object(root) = value else {
            return Err(DescriptorError::NotAnObject);
        };
        let descriptor = Self { root };

        for name in TRACKED_PROPERTIES {
            let count = descriptor.named(name).count();
            if count > 1 {
                return Err(DescriptorError::DuplicateProperty { name, count });
            }
        }

        Ok(descriptor)
    }

    /// The `properties` list, if the document has one.
    pub fn properties(&self) -> Option<&Vec<Value>> {
        self.root.get("properties").and_then(|v| v.as_array())
    }

    pub fn has_properties(&self) -> bool {
        self.properties().is_some()
    }

    /// Value of the first property called `name`.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.named(name).next().and_then(|p| p.get("value"))
    }

    /// Like [`Descriptor::property`], but only when the value is a string.
    pub fn string_property(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(|v| v.as_str())
    }

    /// Overwrite the value of the first property called `name`.
    ///
    /// Returns `false` (and leaves the document alone) when there is no
    /// such property; the property is never inserted.
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) -> bool {
        let Some(props) = self
            .root
            .get_mut("properties")
            .and_then(|v| v.as_array_mut())
        else {
            return false;
        };

        match props
            .iter_mut()
            .find(|p| p.get("name").and_then(|n| n.as_str()) == Some(name))
            .and_then(|p| p.as_object_mut())
        {
            Some(prop) => {
                prop.insert("value".to_string(), value.into());
                true
            }
            None => false,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.root)
    }

    fn named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a Value> + use<'a, 'n> {
        self.properties()
            .into_iter()
            .flatten()
            .filter(move |p| p.get("name").and_then(|n| n.as_str()) == Some(name))
    }
}
