//! Network connectivity state
//!
//! The native layer pushes connectivity changes into a [`ConnectivityMonitor`];
//! consumers read the latest state or subscribe to changes.

use app_core::providers::NetworkStatusProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Kind of network the device is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// No network interface is up
    None,
    /// Not determined yet
    #[default]
    Unknown,
    /// Wi-Fi
    Wifi,
    /// Mobile data
    Cellular,
    /// Wired
    Ethernet,
    /// Anything else (VPN, bluetooth, ...)
    Other,
}

/// Snapshot of device connectivity, in the shape the native bridge reports it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    /// Network kind
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    /// Whether a network interface is connected
    pub is_connected: bool,
    /// Whether the internet is reachable, once probed
    #[serde(default)]
    pub is_internet_reachable: Option<bool>,
}

impl NetworkState {
    /// Connected over `connection_type`, reachability not yet probed
    pub fn online(connection_type: ConnectionType) -> Self {
        Self {
            connection_type,
            is_connected: true,
            is_internet_reachable: None,
        }
    }

    /// No connection
    pub fn offline() -> Self {
        Self {
            connection_type: ConnectionType::None,
            is_connected: false,
            is_internet_reachable: Some(false),
        }
    }
}

/// Latest connectivity state, fed by the platform
#[derive(Debug)]
pub struct ConnectivityMonitor {
    state: watch::Sender<NetworkState>,
}

impl ConnectivityMonitor {
    /// Create a monitor with an initial state
    pub fn new(initial: NetworkState) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state }
    }

    /// Record a connectivity change
    pub fn update(&self, next: NetworkState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            if current.is_connected != next.is_connected {
                tracing::info!(
                    connected = next.is_connected,
                    kind = ?next.connection_type,
                    "connectivity changed"
                );
            }
            *current = next;
            true
        });
    }

    /// Current state
    pub fn current(&self) -> NetworkState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<NetworkState> {
        self.state.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(NetworkState::default())
    }
}

#[async_trait]
impl NetworkStatusProvider for ConnectivityMonitor {
    /// Interface-level connectivity; reachability probing does not gate it
    async fn is_connected(&self) -> bool {
        self.state.borrow().is_connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bridge_payload() {
        let state: NetworkState = serde_json::from_str(
            r#"{"type": "cellular", "isConnected": true, "isInternetReachable": false}"#,
        )
        .unwrap();

        assert_eq!(state.connection_type, ConnectionType::Cellular);
        assert!(state.is_connected);
        assert_eq!(state.is_internet_reachable, Some(false));

        let unknown: NetworkState =
            serde_json::from_str(r#"{"type": "unknown", "isConnected": false}"#).unwrap();
        assert_eq!(unknown.is_internet_reachable, None);
    }

    #[tokio::test]
    async fn test_is_connected_follows_updates() {
        let monitor = ConnectivityMonitor::new(NetworkState::online(ConnectionType::Wifi));
        assert!(monitor.is_connected().await);

        monitor.update(NetworkState::offline());
        assert!(!monitor.is_connected().await);
        assert_eq!(monitor.current().connection_type, ConnectionType::None);
    }

    #[tokio::test]
    async fn test_unreachable_but_connected_counts_as_connected() {
        let monitor = ConnectivityMonitor::new(NetworkState {
            connection_type: ConnectionType::Wifi,
            is_connected: true,
            is_internet_reachable: Some(false),
        });
        assert!(monitor.is_connected().await);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes_only() {
        let monitor = ConnectivityMonitor::new(NetworkState::online(ConnectionType::Wifi));
        let mut rx = monitor.subscribe();

        monitor.update(NetworkState::online(ConnectionType::Wifi));
        assert!(!rx.has_changed().unwrap());

        monitor.update(NetworkState::online(ConnectionType::Cellular));
        assert!(rx.has_changed().unwrap());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().connection_type, ConnectionType::Cellular);
    }

    #[test]
    fn test_default_is_unknown_and_disconnected() {
        let monitor = ConnectivityMonitor::default();
        let state = monitor.current();
        assert_eq!(state.connection_type, ConnectionType::Unknown);
        assert!(!state.is_connected);
    }
}
