//! Step actions
//!
//! Declarative begin/complete actions are applied to a [`StepTarget`]. A
//! failing action is logged with step context; the timeline carries on.

use thiserror::Error;

use arlearn_content::{Property, PropertyValue, Selector, StepAction};

/// An action could not be applied
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("No element matches {0}")]
    NoMatch(String),

    #[error("Action rejected: {0}")]
    Rejected(String),
}

/// Whatever the timeline animates, normally the live AR scene
pub trait StepTarget {
    fn show(&mut self, selector: &Selector) -> Result<(), ActionError>;

    fn hide(&mut self, selector: &Selector) -> Result<(), ActionError>;

    fn set_text(&mut self, selector: &Selector, text: &str) -> Result<(), ActionError>;

    fn set_property(
        &mut self,
        selector: &Selector,
        property: Property,
        value: PropertyValue,
    ) -> Result<(), ActionError>;
}

/// Apply one declarative action
pub fn apply_action(target: &mut dyn StepTarget, action: &StepAction) -> Result<(), ActionError> {
    match action {
        StepAction::Show { target: sel } => target.show(sel),
        StepAction::Hide { target: sel } => target.hide(sel),
        StepAction::SetText { target: sel, text } => target.set_text(sel, text),
        StepAction::SetProperty {
            target: sel,
            property,
            value,
        } => target.set_property(sel, *property, *value),
    }
}

/// Target that accepts everything and does nothing, for timelines running
/// without a scene
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTarget;

impl StepTarget for NullTarget {
    fn show(&mut self, _selector: &Selector) -> Result<(), ActionError> {
        Ok(())
    }

    fn hide(&mut self, _selector: &Selector) -> Result<(), ActionError> {
        Ok(())
    }

    fn set_text(&mut self, _selector: &Selector, _text: &str) -> Result<(), ActionError> {
        Ok(())
    }

    fn set_property(
        &mut self,
        _selector: &Selector,
        _property: Property,
        _value: PropertyValue,
    ) -> Result<(), ActionError> {
        Ok(())
    }
}
