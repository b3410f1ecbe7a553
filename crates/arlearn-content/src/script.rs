//! Timeline script model
//!
//! A topic's animated scene is an ordered list of steps. Animate steps tween
//! properties of selected assets; pause steps hold the timeline until a timer
//! or the user resumes it. Scripts are data: one interpreter runs them all.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use arlearn_core::ArError;

use crate::asset::{AssetSpec, Vec3};

/// Default step duration when a script omits one
pub const DEFAULT_DURATION_MS: u64 = 750;

/// Target selector: `#id` or `.class` (compound `.a.b` matches all classes)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selector {
    Id(String),
    Class(Vec<String>),
}

impl Selector {
    pub fn id(id: impl Into<String>) -> Self {
        Selector::Id(id.into())
    }

    /// Whether this selector picks `asset`
    pub fn matches(&self, asset: &AssetSpec) -> bool {
        match self {
            Selector::Id(id) => asset.id == *id,
            Selector::Class(classes) => classes.iter().all(|c| asset.has_class(c)),
        }
    }
}

impl FromStr for Selector {
    type Err = ArError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ArError::InvalidSelector(s.to_string());

        if let Some(id) = s.strip_prefix('#') {
            if id.is_empty() || id.contains(['#', '.', ' ']) {
                return Err(invalid());
            }
            return Ok(Selector::Id(id.to_string()));
        }

        if let Some(rest) = s.strip_prefix('.') {
            let classes: Vec<String> = rest.split('.').map(str::to_string).collect();
            if classes.iter().any(|c| c.is_empty() || c.contains(['#', ' '])) {
                return Err(invalid());
            }
            return Ok(Selector::Class(classes));
        }

        Err(invalid())
    }
}

impl TryFrom<String> for Selector {
    type Error = ArError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Selector> for String {
    fn from(s: Selector) -> Self {
        s.to_string()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "#{}", id),
            Selector::Class(classes) => {
                for c in classes {
                    write!(f, ".{}", c)?;
                }
                Ok(())
            }
        }
    }
}

/// Animatable property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Opacity,
    Position,
    Rotation,
    Scale,
}

impl Property {
    /// Opacity is scalar, the rest are 3-vectors
    pub fn is_scalar(self) -> bool {
        matches!(self, Property::Opacity)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Property::Opacity => "opacity",
            Property::Position => "position",
            Property::Rotation => "rotation",
            Property::Scale => "scale",
        }
    }
}

/// Property value
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Scalar(f64),
    Vec3(Vec3),
}

impl PropertyValue {
    /// Value kind agrees with the property kind
    pub fn fits(&self, property: Property) -> bool {
        match self {
            PropertyValue::Scalar(v) => property.is_scalar() && v.is_finite(),
            PropertyValue::Vec3(v) => !property.is_scalar() && v.is_finite(),
        }
    }
}

/// Tween from one value to another
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyRange {
    pub property: Property,
    pub from: PropertyValue,
    pub to: PropertyValue,
}

impl PropertyRange {
    pub fn opacity(from: f64, to: f64) -> Self {
        PropertyRange {
            property: Property::Opacity,
            from: PropertyValue::Scalar(from),
            to: PropertyValue::Scalar(to),
        }
    }
}

/// Easing curve name, passed through to the animation engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    #[default]
    EaseOutExpo,
    EaseInOutExpo,
    EaseOutBounce,
    EaseOutElastic,
}

/// Where a step starts on the timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOffset {
    /// Relative to the end of everything scheduled so far; negative overlaps
    RelativeMs(i64),
    /// Absolute position from timeline start
    AbsoluteMs(u64),
}

/// Declarative side effect run when a step begins or completes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    Show {
        target: Selector,
    },
    Hide {
        target: Selector,
    },
    SetText {
        target: Selector,
        text: String,
    },
    SetProperty {
        target: Selector,
        property: Property,
        value: PropertyValue,
    },
}

impl StepAction {
    pub fn target(&self) -> &Selector {
        match self {
            StepAction::Show { target }
            | StepAction::Hide { target }
            | StepAction::SetText { target, .. }
            | StepAction::SetProperty { target, .. } => target,
        }
    }
}

/// Tween one or more targets
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimateStep {
    pub targets: Vec<Selector>,
    #[serde(default)]
    pub properties: Vec<PropertyRange>,
    #[serde(default = "default_duration")]
    pub duration_ms: u64,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<StartOffset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_begin: Vec<StepAction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_complete: Vec<StepAction>,
    /// Human-readable description for logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn default_duration() -> u64 {
    DEFAULT_DURATION_MS
}

impl AnimateStep {
    pub fn new(targets: Vec<Selector>, duration_ms: u64) -> Self {
        AnimateStep {
            targets,
            properties: Vec::new(),
            duration_ms,
            easing: Easing::default(),
            delay_ms: 0,
            offset: None,
            on_begin: Vec::new(),
            on_complete: Vec::new(),
            label: None,
        }
    }

    pub fn with_property(mut self, range: PropertyRange) -> Self {
        self.properties.push(range);
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_offset(mut self, offset: StartOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn on_begin(mut self, action: StepAction) -> Self {
        self.on_begin.push(action);
        self
    }

    pub fn on_complete(mut self, action: StepAction) -> Self {
        self.on_complete.push(action);
        self
    }
}

/// Hold the timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseStep {
    /// Auto-resume after this many seconds; 0 waits for the user
    pub seconds: u32,
}

/// One entry of a timeline script
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepSpec {
    Animate(AnimateStep),
    Pause(PauseStep),
}

impl StepSpec {
    pub fn pause(seconds: u32) -> Self {
        StepSpec::Pause(PauseStep { seconds })
    }

    pub fn is_pause(&self) -> bool {
        matches!(self, StepSpec::Pause(_))
    }

    /// Every selector the step refers to, actions included
    pub fn selectors(&self) -> Vec<&Selector> {
        match self {
            StepSpec::Animate(step) => step
                .targets
                .iter()
                .chain(step.on_begin.iter().map(StepAction::target))
                .chain(step.on_complete.iter().map(StepAction::target))
                .collect(),
            StepSpec::Pause(_) => Vec::new(),
        }
    }
}

impl From<AnimateStep> for StepSpec {
    fn from(step: AnimateStep) -> Self {
        StepSpec::Animate(step)
    }
}
