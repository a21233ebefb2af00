//! Delivery of rendered messages to connected actors.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::debug;

use super::{MessageKey, Messenger};
use crate::actor::{normalize_name, Actor};
use crate::i18n::I18n;

/// Outbound channels of currently connected actors, keyed by normalized name.
#[derive(Debug, Default)]
pub struct Connections {
    channels: RwLock<HashMap<String, mpsc::UnboundedSender<String>>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for `name`, returning the receiving end.
    ///
    /// A reconnect replaces the previous channel.
    pub fn connect(&self, name: &str) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        channels.insert(normalize_name(name), tx);
        rx
    }

    /// Forget the connection of `name`.
    pub fn disconnect(&self, name: &str) -> bool {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        channels.remove(&normalize_name(name)).is_some()
    }

    pub fn is_connected(&self, name: &str) -> bool {
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        channels
            .get(&normalize_name(name))
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Push a line to `name`. Returns false if nobody is listening.
    pub fn deliver(&self, name: &str, line: String) -> bool {
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        match channels.get(&normalize_name(name)) {
            Some(tx) => tx.send(line).is_ok(),
            None => false,
        }
    }
}

/// Renders messages from a catalogue and pushes them to the actor's connection.
#[derive(Debug, Clone)]
pub struct LocalizedMessenger {
    i18n: Arc<I18n>,
    connections: Arc<Connections>,
}

impl LocalizedMessenger {
    pub fn new(i18n: Arc<I18n>, connections: Arc<Connections>) -> Self {
        Self { i18n, connections }
    }

    /// Render `key` without delivering it.
    pub fn render(&self, key: MessageKey, args: &[(&str, &str)]) -> String {
        self.i18n.render(key.path(), args)
    }
}

impl Messenger for LocalizedMessenger {
    fn send_with(&self, actor: &Actor, key: MessageKey, args: &[(&str, &str)]) {
        let line = self.render(key, args);
        if !self.connections.deliver(actor.normalized_name(), line) {
            debug!(
                name = %actor.name(),
                message = %key,
                "Actor not connected, message dropped"
            );
        }
    }
}
