//! Signal queueing, per-frame update and event dispatch for [`Entity`].
//!
//! Signals are never delivered while they are being raised. [`Entity::signal`]
//! only enqueues; the queue is drained at the start of the entity's next
//! [`Entity::update`]. Anything enqueued during that drain (including by the
//! slots it runs) lands in a fresh queue and waits for the following frame.

use log::trace;

use crate::components::base::{Propagation, SlotReply};
use crate::events::platform::PlatformEvent;
use crate::resources::worldtime::WorldTime;

use super::Entity;
use super::signal::{QueuedSignal, Signal, SignalData};

impl Entity {
    /// Queue `signal` once for every receiver it resolves to: the explicit
    /// target, the components carrying any of its tags, then (unless
    /// disabled) the subscribers of its name. No component is queued twice.
    pub fn signal(&mut self, signal: Signal) {
        let Signal {
            name,
            sender,
            target,
            tags,
            subscribers,
            data,
        } = signal;

        let mut targets: Vec<String> = Vec::new();
        if let Some(target) = target {
            targets.push(target);
        }
        for tag in &tags {
            if let Some(list) = self.components_by_tag.get(tag) {
                for component in list {
                    if !targets.contains(component) {
                        targets.push(component.clone());
                    }
                }
            }
        }
        if subscribers {
            if let Some(list) = self.components_by_signal.get(&name) {
                for component in list {
                    if !targets.contains(component) {
                        targets.push(component.clone());
                    }
                }
            }
        }

        trace!("{}: queued `{}` for {:?}", self, name, targets);
        for target in targets {
            self.signal_queue.push(QueuedSignal {
                signal: name.clone(),
                sender: sender.clone(),
                target,
                data: data.clone(),
            });
        }
    }

    /// Invoke `target`'s slot right away.
    ///
    /// Returns `None` when the target does not exist or is inactive.
    pub fn direct_signal(
        &mut self,
        signal: &str,
        sender: Option<&str>,
        target: &str,
        data: &SignalData,
    ) -> Option<SlotReply> {
        if !self.components.get(target)?.active() {
            return None;
        }
        self.run_hook(target, |component, ctx| component.slot(signal, sender, data, ctx))
    }

    /// Per-frame step: drain the signal queue in FIFO order, then update
    /// every active component. Component update order is unspecified.
    pub fn update(&mut self, time: &WorldTime) {
        let pending = std::mem::take(&mut self.signal_queue);
        for queued in pending {
            self.direct_signal(
                &queued.signal,
                queued.sender.as_deref(),
                &queued.target,
                &queued.data,
            );
        }

        let active: Vec<String> = self
            .components
            .iter()
            .filter(|(_, c)| c.active())
            .map(|(id, _)| id.clone())
            .collect();
        for id in active {
            // An earlier update may have switched this one off.
            if self.components.get(&id).is_some_and(|c| c.active()) {
                self.run_hook(&id, |component, ctx| component.update(ctx, time));
            }
        }
    }

    /// Forward a platform event to the subscribers of its logical signal.
    ///
    /// Subscribers run in subscription order until one stops propagation.
    /// The last answer observed is returned; event kinds without a logical
    /// signal return [`Propagation::CONTINUE`] without dispatching.
    pub fn event(&mut self, event: &PlatformEvent) -> Propagation {
        let Some(signal) = event.kind.signal() else {
            return Propagation::CONTINUE;
        };
        let subscribers = self.subscribers(signal).to_vec();
        if subscribers.is_empty() {
            return Propagation::CONTINUE;
        }

        let data = SignalData::Event(event.clone());
        let sender = self.id.clone();
        let mut result = Propagation::CONTINUE;
        for component in subscribers {
            let Some(reply) = self.direct_signal(signal, Some(&sender), &component, &data) else {
                continue;
            };
            result = reply.propagation();
            if !result.continue_propagation {
                break;
            }
        }
        result
    }
}
