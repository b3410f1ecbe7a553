//! Scene builder
//!
//! Materializes the AR content of a topic and tears it down again. A build
//! either commits a complete scene or leaves nothing behind on the backend.

use std::collections::HashMap;

use arlearn_content::TopicRegistry;
use arlearn_core::{ArResult, ListenerId, TopicId};
use arlearn_timeline::TimelineSequencer;

use crate::backend::TrackingBackend;
use crate::scene::{Scene, SceneNode};

#[derive(Debug)]
struct LiveScene {
    scene: Scene,
    listener: ListenerId,
}

/// Builds at most one live scene at a time
#[derive(Debug, Default)]
pub struct SceneBuilder {
    /// Placeholder descriptors per topic; filled once, never invalidated
    cache: HashMap<TopicId, Vec<SceneNode>>,
    live: Option<LiveScene>,
    builds: u64,
    cache_hits: u64,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the scene for `topic`, replacing any live one, and load the
    /// topic's script into the sequencer
    pub fn build(
        &mut self,
        topic: TopicId,
        registry: &TopicRegistry,
        backend: &mut dyn TrackingBackend,
        sequencer: &mut TimelineSequencer,
    ) -> ArResult<()> {
        self.dispose(backend, sequencer);

        let entry = registry.require(topic)?;
        let target = registry.detection().target_for(topic)?;
        let nodes = self.placeholders(topic, registry)?;

        let anchor = backend.create_anchor(target)?;
        let listener = match backend.add_listener(anchor) {
            Ok(listener) => listener,
            Err(e) => {
                backend.remove_anchor(anchor);
                tracing::warn!(topic = %topic, error = %e, "scene build rolled back");
                return Err(e);
            }
        };
        if let Err(e) = backend.attach_content(anchor, &nodes) {
            backend.remove_listener(listener);
            backend.remove_anchor(anchor);
            tracing::warn!(topic = %topic, error = %e, "scene build rolled back");
            return Err(e);
        }

        sequencer.load(topic, entry.timeline.clone());
        self.builds += 1;
        tracing::info!(
            topic = %topic,
            index = %target,
            anchor = %anchor,
            nodes = nodes.len(),
            "scene built"
        );
        self.live = Some(LiveScene {
            scene: Scene::new(topic, target, anchor, nodes),
            listener,
        });
        Ok(())
    }

    fn placeholders(&mut self, topic: TopicId, registry: &TopicRegistry) -> ArResult<Vec<SceneNode>> {
        if let Some(nodes) = self.cache.get(&topic) {
            self.cache_hits += 1;
            tracing::debug!(topic = %topic, "asset descriptors served from cache");
            return Ok(nodes.clone());
        }

        let nodes: Vec<SceneNode> = registry
            .require(topic)?
            .assets
            .iter()
            .map(SceneNode::placeholder)
            .collect();
        self.cache.insert(topic, nodes.clone());
        Ok(nodes)
    }

    /// Halt the timeline, detach listeners and remove content. Returns
    /// whether a scene was live.
    pub fn dispose(&mut self, backend: &mut dyn TrackingBackend, sequencer: &mut TimelineSequencer) -> bool {
        let Some(live) = self.live.take() else {
            return false;
        };

        sequencer.reset();
        if !backend.remove_listener(live.listener) {
            tracing::warn!(listener = ?live.listener, "listener already gone");
        }
        let anchor = live.scene.anchor();
        if !backend.remove_anchor(anchor) {
            tracing::warn!(anchor = %anchor, "anchor already gone");
        }
        tracing::info!(topic = %live.scene.topic(), "scene disposed");
        true
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.live.as_ref().map(|l| &l.scene)
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.live.as_mut().map(|l| &mut l.scene)
    }

    pub fn active_topic(&self) -> Option<TopicId> {
        self.scene().map(Scene::topic)
    }

    pub fn is_built(&self) -> bool {
        self.live.is_some()
    }

    /// Topics with cached descriptors
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    /// Successful builds this session
    pub fn build_count(&self) -> u64 {
        self.builds
    }
}
