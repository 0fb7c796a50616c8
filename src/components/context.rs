//! Deferred access from a component back to its entity.
//!
//! While a component hook runs, the entity that owns it is mutably borrowed,
//! so components never touch it directly. They record [`EntityCommand`]s on
//! the [`ComponentContext`] instead and the entity applies them as soon as
//! the hook returns, in the order they were recorded.

use crate::entity::signal::Signal;

/// A request recorded by a component during one of its hooks.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityCommand {
    Subscribe { component: String, signal: String },
    /// `signal: None` drops every subscription of the component.
    Unsubscribe {
        component: String,
        signal: Option<String>,
    },
    /// Queue a signal for the next drain.
    Signal(Signal),
    /// Ask the overlord to switch scenes at the end of the frame.
    RequestScene(String),
}

/// Handle given to component hooks.
pub struct ComponentContext<'a> {
    entity: &'a str,
    component: &'a str,
    commands: &'a mut Vec<EntityCommand>,
}

impl<'a> ComponentContext<'a> {
    pub fn new(entity: &'a str, component: &'a str, commands: &'a mut Vec<EntityCommand>) -> Self {
        Self {
            entity,
            component,
            commands,
        }
    }

    /// Id of the owning entity.
    pub fn entity_id(&self) -> &str {
        self.entity
    }

    /// Id of the component running the hook.
    pub fn component_id(&self) -> &str {
        self.component
    }

    pub fn subscribe(&mut self, signal: impl Into<String>) {
        self.commands.push(EntityCommand::Subscribe {
            component: self.component.to_owned(),
            signal: signal.into(),
        });
    }

    pub fn unsubscribe(&mut self, signal: Option<&str>) {
        self.commands.push(EntityCommand::Unsubscribe {
            component: self.component.to_owned(),
            signal: signal.map(str::to_owned),
        });
    }

    /// Queue a signal. The sender defaults to this component.
    pub fn signal(&mut self, mut signal: Signal) {
        if signal.sender.is_none() {
            signal.sender = Some(self.component.to_owned());
        }
        self.commands.push(EntityCommand::Signal(signal));
    }

    pub fn request_scene(&mut self, scene: impl Into<String>) {
        self.commands.push(EntityCommand::RequestScene(scene.into()));
    }
}
