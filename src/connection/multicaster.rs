/// Ordered event fan-out to a dynamic set of listeners
///
/// Each connection key owns a sequence of listener slots. Registration appends
/// a slot and hands back its index as a stable token; unregistration replaces
/// the slot with a tombstone in place, so no later token ever shifts. Tokens
/// are never reused for a different subscriber within a key's sequence - a
/// stale unregister can only ever hit its own (already dead) slot.
use std::collections::HashMap;

use crate::arguments::is_debug_registry_enabled;
use crate::logger::{ self, LogTag };
use super::types::{ ConnectionKey, ListenerHooks, ListenerToken, SocketEvent };

pub enum ListenerSlot {
    Active(ListenerHooks),
    Removed,
}

impl ListenerSlot {
    fn is_active(&self) -> bool {
        matches!(self, ListenerSlot::Active(_))
    }
}

#[derive(Default)]
pub struct ListenerMulticaster {
    slots: HashMap<ConnectionKey, Vec<ListenerSlot>>,
}

impl ListenerMulticaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener slot for the key and return its stable token
    pub fn register(&mut self, key: &ConnectionKey, hooks: ListenerHooks) -> ListenerToken {
        let slots = self.slots.entry(key.clone()).or_default();
        slots.push(ListenerSlot::Active(hooks));
        let token = slots.len() - 1;

        if is_debug_registry_enabled() {
            logger::debug(
                LogTag::Registry,
                &format!("Registered listener {} on {}", token, key)
            );
        }

        token
    }

    /// Tombstone the slot in place; the sequence never shrinks or reindexes
    pub fn unregister(&mut self, key: &ConnectionKey, token: ListenerToken) {
        if let Some(slots) = self.slots.get_mut(key) {
            if let Some(slot) = slots.get_mut(token) {
                *slot = ListenerSlot::Removed;

                if is_debug_registry_enabled() {
                    logger::debug(
                        LogTag::Registry,
                        &format!("Unregistered listener {} on {}", token, key)
                    );
                }
            }
        }
    }

    /// Invoke the matching hook of every active slot, in registration order
    ///
    /// Slot liveness is checked at the moment each slot is visited, so a slot
    /// tombstoned earlier in this very dispatch is skipped. Absent hooks are
    /// silently skipped rather than treated as an error.
    pub fn dispatch(&mut self, key: &ConnectionKey, event: &SocketEvent) {
        let Some(slots) = self.slots.get_mut(key) else {
            return;
        };

        let mut index = 0;
        while index < slots.len() {
            if let ListenerSlot::Active(hooks) = &mut slots[index] {
                match event {
                    SocketEvent::Open => {
                        if let Some(f) = hooks.on_open.as_mut() {
                            f();
                        }
                    }
                    SocketEvent::Message(text) => {
                        if let Some(f) = hooks.on_message.as_mut() {
                            f(text);
                        }
                    }
                    SocketEvent::Error(err) => {
                        if let Some(f) = hooks.on_error.as_mut() {
                            f(err);
                        }
                    }
                    SocketEvent::Closed => {
                        if let Some(f) = hooks.on_close.as_mut() {
                            f();
                        }
                    }
                }
            }
            index += 1;
        }
    }

    /// Number of non-tombstoned listeners for a key
    pub fn active_listener_count(&self, key: &ConnectionKey) -> usize {
        self.slots
            .get(key)
            .map(|slots|
                slots
                    .iter()
                    .filter(|s| s.is_active())
                    .count()
            )
            .unwrap_or(0)
    }

    /// Total slots ever issued for a key, tombstones included
    pub fn slot_count(&self, key: &ConnectionKey) -> usize {
        self.slots
            .get(key)
            .map(|slots| slots.len())
            .unwrap_or(0)
    }
}
