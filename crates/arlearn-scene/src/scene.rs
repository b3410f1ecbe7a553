//! Live AR scene
//!
//! A scene is the set of content nodes attached to one anchor. Nodes start
//! from their asset descriptors and are mutated by timeline actions through
//! selector resolution.

use arlearn_content::{AssetSpec, Property, PropertyValue, Selector};
use arlearn_core::{AnchorId, TargetIndex, TopicId};
use arlearn_timeline::{ActionError, StepTarget};

/// One content node
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    /// Live attributes, seeded from the descriptor
    pub asset: AssetSpec,
    /// Text set by a timeline action, replacing the descriptor's
    pub text: Option<String>,
}

impl SceneNode {
    /// Placeholder with the descriptor's defaults
    pub fn placeholder(asset: &AssetSpec) -> Self {
        SceneNode {
            asset: asset.clone(),
            text: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.asset.id
    }

    pub fn is_visible(&self) -> bool {
        self.asset.visible
    }

    pub fn opacity(&self) -> f64 {
        self.asset.opacity
    }

    pub fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.asset)
    }
}

/// Content attached to the anchor of the active topic
#[derive(Clone, Debug)]
pub struct Scene {
    topic: TopicId,
    target: TargetIndex,
    anchor: AnchorId,
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new(topic: TopicId, target: TargetIndex, anchor: AnchorId, nodes: Vec<SceneNode>) -> Self {
        Scene {
            topic,
            target,
            anchor,
            nodes,
        }
    }

    pub fn topic(&self) -> TopicId {
        self.topic
    }

    pub fn target(&self) -> TargetIndex {
        self.target
    }

    pub fn anchor(&self) -> AnchorId {
        self.anchor
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of visible nodes, in declaration order
    pub fn visible_ids(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.is_visible())
            .map(SceneNode::id)
            .collect()
    }

    fn for_each_match(
        &mut self,
        selector: &Selector,
        mut f: impl FnMut(&mut SceneNode),
    ) -> Result<(), ActionError> {
        let mut hit = false;
        for node in self.nodes.iter_mut().filter(|n| n.matches(selector)) {
            f(node);
            hit = true;
        }
        if hit {
            Ok(())
        } else {
            Err(ActionError::NoMatch(selector.to_string()))
        }
    }
}

impl StepTarget for Scene {
    fn show(&mut self, selector: &Selector) -> Result<(), ActionError> {
        self.for_each_match(selector, |n| n.asset.visible = true)
    }

    fn hide(&mut self, selector: &Selector) -> Result<(), ActionError> {
        self.for_each_match(selector, |n| n.asset.visible = false)
    }

    fn set_text(&mut self, selector: &Selector, text: &str) -> Result<(), ActionError> {
        self.for_each_match(selector, |n| n.text = Some(text.to_string()))
    }

    fn set_property(
        &mut self,
        selector: &Selector,
        property: Property,
        value: PropertyValue,
    ) -> Result<(), ActionError> {
        if !value.fits(property) {
            return Err(ActionError::Rejected(format!(
                "{} cannot take {:?}",
                property.as_str(),
                value
            )));
        }

        self.for_each_match(selector, |n| {
            let transform = &mut n.asset.transform;
            match (property, value) {
                (Property::Opacity, PropertyValue::Scalar(v)) => n.asset.opacity = v.clamp(0.0, 1.0),
                (Property::Position, PropertyValue::Vec3(v)) => transform.position = v,
                (Property::Rotation, PropertyValue::Vec3(v)) => transform.rotation = v,
                (Property::Scale, PropertyValue::Vec3(v)) => transform.scale = v,
                _ => {}
            }
        })
    }
}
