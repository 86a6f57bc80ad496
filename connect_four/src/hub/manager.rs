//! Topic subscriptions, directed player delivery and broadcast fan-out.

use std::collections::HashMap;
use tokio::sync::RwLock;

use super::connection::{self, ConnectionHandle, ConnectionId, ConnectionInbox};
use crate::{
    game::entities::{GameId, PlayerId},
    net::messages::ServerMessage,
};

/// Mailbox capacity used by [`ConnectionHub::default`].
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// A broadcast audience.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Topic {
    /// Every socket watching one game.
    Game(GameId),
    /// Every lobby socket.
    Lobby,
}

/// Registry of live connections.
///
/// The hub is the only writer of subscription sets. Publishing copies the
/// subscriber list under a read lock and delivers outside it, so no lock is
/// held while frames are queued.
pub struct ConnectionHub {
    topics: RwLock<HashMap<Topic, Vec<ConnectionHandle>>>,
    players: RwLock<HashMap<PlayerId, ConnectionHandle>>,
    mailbox_capacity: usize,
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new(DEFAULT_MAILBOX_CAPACITY)
    }
}

impl ConnectionHub {
    pub fn new(mailbox_capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            players: RwLock::new(HashMap::new()),
            mailbox_capacity,
        }
    }

    /// Allocates a mailbox for a new connection. Nothing is delivered to it
    /// until it subscribes or is bound to a player.
    pub fn open(&self) -> (ConnectionHandle, ConnectionInbox) {
        connection::channel(self.mailbox_capacity)
    }

    pub async fn subscribe(&self, topic: Topic, handle: &ConnectionHandle) {
        let mut topics = self.topics.write().await;
        let subscribers = topics.entry(topic).or_default();
        if subscribers.iter().all(|h| h.id() != handle.id()) {
            subscribers.push(handle.clone());
        }
    }

    pub async fn unsubscribe(&self, topic: &Topic, id: ConnectionId) {
        let mut topics = self.topics.write().await;
        remove_subscriber(&mut topics, topic, id);
    }

    /// Makes `handle` the directed connection for `player_id`, replacing any
    /// earlier one.
    pub async fn bind_player(&self, player_id: &str, handle: &ConnectionHandle) {
        if player_id.is_empty() {
            return;
        }
        let mut players = self.players.write().await;
        let current = players.get(player_id).map(ConnectionHandle::id);
        if current != Some(handle.id()) {
            log::debug!("Connection {} now serves player {}", handle.id(), player_id);
            players.insert(player_id.to_string(), handle.clone());
        }
    }

    /// Closes a connection and removes it from every topic and player slot.
    pub async fn disconnect(&self, handle: &ConnectionHandle) {
        handle.close();
        let id = handle.id();

        {
            let mut topics = self.topics.write().await;
            topics.retain(|_, subscribers| {
                subscribers.retain(|h| h.id() != id);
                !subscribers.is_empty()
            });
        }

        self.players.write().await.retain(|_, h| h.id() != id);
        log::debug!("Connection {id} deregistered");
    }

    /// Sends `message` to every subscriber of `topic` and returns how many
    /// accepted it.
    ///
    /// A subscriber whose mailbox is closed or full is closed and dropped
    /// from the topic straight away.
    pub async fn publish(&self, topic: &Topic, message: &ServerMessage) -> usize {
        let frame = match message.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("Failed to encode broadcast for {topic:?}: {e}");
                return 0;
            }
        };

        let subscribers = match self.topics.read().await.get(topic) {
            Some(subscribers) => subscribers.clone(),
            None => return 0,
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for handle in &subscribers {
            if handle.deliver(frame.clone()) {
                delivered += 1;
            } else {
                handle.close();
                failed.push(handle.id());
            }
        }

        if !failed.is_empty() {
            log::warn!("Pruning {} dead connection(s) from {:?}", failed.len(), topic);
            let mut topics = self.topics.write().await;
            for id in failed {
                remove_subscriber(&mut topics, topic, id);
            }
        }

        delivered
    }

    /// Sends `message` to the directed connection of `player_id`. A failed
    /// delivery closes that connection and clears the binding.
    pub async fn send_to_player(&self, player_id: &str, message: &ServerMessage) -> bool {
        let Some(handle) = self.players.read().await.get(player_id).cloned() else {
            return false;
        };

        if handle.send(message) {
            return true;
        }

        handle.close();
        let mut players = self.players.write().await;
        if players.get(player_id).map(ConnectionHandle::id) == Some(handle.id()) {
            players.remove(player_id);
        }
        false
    }

    /// True if `player_id` has a directed connection that is still open.
    pub async fn is_player_connected(&self, player_id: &str) -> bool {
        self.players
            .read()
            .await
            .get(player_id)
            .is_some_and(|h| !h.is_closed())
    }

    pub async fn subscriber_count(&self, topic: &Topic) -> usize {
        self.topics.read().await.get(topic).map_or(0, Vec::len)
    }

    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }
}

fn remove_subscriber(
    topics: &mut HashMap<Topic, Vec<ConnectionHandle>>,
    topic: &Topic,
    id: ConnectionId,
) {
    if let Some(subscribers) = topics.get_mut(topic) {
        subscribers.retain(|h| h.id() != id);
        if subscribers.is_empty() {
            topics.remove(topic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_topic() -> Topic {
        Topic::Game("g1".to_string())
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let hub = ConnectionHub::new(8);
        let (a, mut inbox_a) = hub.open();
        let (b, mut inbox_b) = hub.open();
        hub.subscribe(game_topic(), &a).await;
        hub.subscribe(game_topic(), &b).await;
        hub.subscribe(game_topic(), &b).await;

        let delivered = hub.publish(&game_topic(), &ServerMessage::ResetGame).await;
        assert_eq!(delivered, 2);
        assert!(inbox_a.next().await.unwrap().contains("resetGame"));
        assert!(inbox_b.next().await.unwrap().contains("resetGame"));
    }

    #[tokio::test]
    async fn test_failed_delivery_prunes_connection() {
        let hub = ConnectionHub::new(1);
        let (alive, mut inbox) = hub.open();
        let (dead, dead_inbox) = hub.open();
        drop(dead_inbox);
        hub.subscribe(game_topic(), &alive).await;
        hub.subscribe(game_topic(), &dead).await;

        assert_eq!(hub.publish(&game_topic(), &ServerMessage::ResetGame).await, 1);
        assert_eq!(hub.subscriber_count(&game_topic()).await, 1);
        assert!(dead.is_closed());
        assert!(inbox.next().await.is_some());

        // A full mailbox is treated the same way.
        hub.publish(&game_topic(), &ServerMessage::ResetGame).await;
        hub.publish(&game_topic(), &ServerMessage::ResetGame).await;
        assert_eq!(hub.subscriber_count(&game_topic()).await, 0);
        assert_eq!(hub.topic_count().await, 0);
    }

    #[tokio::test]
    async fn test_directed_delivery_uses_latest_binding() {
        let hub = ConnectionHub::default();
        let (old, mut old_inbox) = hub.open();
        let (new, mut new_inbox) = hub.open();
        hub.bind_player("alice", &old).await;
        hub.bind_player("alice", &new).await;

        assert!(hub.send_to_player("alice", &ServerMessage::ResetGame).await);
        assert!(new_inbox.next().await.is_some());

        old.close();
        assert_eq!(old_inbox.next().await, None);
        assert!(!hub.send_to_player("bob", &ServerMessage::ResetGame).await);
    }

    #[tokio::test]
    async fn test_disconnect_clears_everything() {
        let hub = ConnectionHub::default();
        let (handle, mut inbox) = hub.open();
        hub.subscribe(game_topic(), &handle).await;
        hub.subscribe(Topic::Lobby, &handle).await;
        hub.bind_player("alice", &handle).await;
        assert!(hub.is_player_connected("alice").await);

        hub.disconnect(&handle).await;
        assert_eq!(hub.topic_count().await, 0);
        assert!(!hub.is_player_connected("alice").await);
        assert_eq!(inbox.next().await, None);
    }
}
