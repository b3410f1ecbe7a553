//! AR asset descriptors
//!
//! An asset is one node of a topic's AR scene: a character image, a speech
//! bubble, a 3D primitive. Descriptors are placement and visibility defaults
//! only; the host renderer owns the pixels.

use serde::{Deserialize, Serialize};

/// 3-component vector used for position, rotation (degrees) and scale
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3 { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Vec3 { x, y, z }
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

/// What the host should render for an asset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Image,
    Video,
    Audio,
    Model,
    Text,
}

/// Placement relative to the anchor
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Static description of one scene node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    /// Unique within the topic; `#id` selectors resolve against it
    pub id: String,
    pub kind: AssetKind,
    /// Source URL or inline text, depending on kind
    #[serde(default)]
    pub src: String,
    /// `.class` selectors resolve against these
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub transform: Transform,
    /// Hidden until a timeline step shows it
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub opacity: f64,
}

impl AssetSpec {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_defaults() {
        let asset: AssetSpec =
            serde_json::from_str(r#"{"id": "topic1-cube", "kind": "model"}"#).unwrap();

        assert!(!asset.visible);
        assert_eq!(asset.opacity, 0.0);
        assert_eq!(asset.transform.scale, Vec3::ONE);
        assert_eq!(asset.transform.position, Vec3::ZERO);
    }

    #[test]
    fn test_partial_transform() {
        let asset: AssetSpec = serde_json::from_str(
            r#"{"id": "a", "kind": "image", "transform": {"position": [-0.45, 0, -2]}}"#,
        )
        .unwrap();

        assert_eq!(asset.transform.position, Vec3::new(-0.45, 0.0, -2.0));
        assert_eq!(asset.transform.scale, Vec3::ONE);
    }

    #[test]
    fn test_class_lookup() {
        let asset: AssetSpec = serde_json::from_str(
            r#"{"id": "speech-ui-left", "kind": "text", "classes": ["scenario-ui-prompt-speech", "left"]}"#,
        )
        .unwrap();

        assert!(asset.has_class("left"));
        assert!(!asset.has_class("right"));
    }
}
