//! Shape check for Tiled JSON maps.
//!
//! A descriptor counts as a map only when it carries the fields every Tiled
//! map export has. Anything else sitting next to the maps (`package.json`,
//! `tsconfig.json`, tileset exports …) fails here.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
enum MapKind {
    #[serde(rename = "map")]
    Map,
}

/// Fields required of a map. Only deserialised to prove they are present
/// and well typed.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct MapShape {
    #[serde(rename = "type")]
    kind: MapKind,
    pub width: u32,
    pub height: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    orientation: String,
    infinite: bool,
    pub layers: Vec<Value>,
    tilesets: Vec<Value>,
    #[serde(default)]
    properties: Option<Vec<PropertyShape>>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct PropertyShape {
    name: String,
    value: Value,
}

pub fn check_map(value: &Value) -> Result<MapShape, serde_json::Error> {
    MapShape::deserialize(value)
}
