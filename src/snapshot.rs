// File: snapshot.rs
// Location: /src/snapshot.rs

use crate::net::{LinkProperties, Network, NetworkCapabilities, NetworkInfo, WifiInfo};
use crate::platform::{ConnectivityManager, WifiManager};

/// Platform state of the connected network, captured at one point in time.
/// Never mutated in place; updates produce a new snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSnapshot {
    network: Network,
    link_properties: Option<LinkProperties>,
    capabilities: Option<NetworkCapabilities>,
    network_info: Option<NetworkInfo>,
    wifi_info: Option<WifiInfo>,
}

impl NetworkSnapshot {
    /// Reads the current network and its properties. `None` when there is
    /// no current Wi-Fi network.
    pub fn capture(
        wifi_manager: &dyn WifiManager,
        connectivity: &dyn ConnectivityManager,
    ) -> Option<Self> {
        let network = wifi_manager.current_network()?;
        Some(Self {
            network,
            link_properties: connectivity.link_properties(&network),
            capabilities: connectivity.network_capabilities(&network),
            network_info: connectivity.network_info(&network),
            wifi_info: wifi_manager.connection_info(),
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn link_properties(&self) -> Option<&LinkProperties> {
        self.link_properties.as_ref()
    }

    pub fn capabilities(&self) -> Option<&NetworkCapabilities> {
        self.capabilities.as_ref()
    }

    pub fn network_info(&self) -> Option<&NetworkInfo> {
        self.network_info.as_ref()
    }

    pub fn wifi_info(&self) -> Option<&WifiInfo> {
        self.wifi_info.as_ref()
    }

    pub fn with_link_properties(&self, link_properties: LinkProperties) -> Self {
        Self {
            link_properties: Some(link_properties),
            ..self.clone()
        }
    }

    pub fn with_capabilities(&self, capabilities: NetworkCapabilities) -> Self {
        Self {
            capabilities: Some(capabilities),
            ..self.clone()
        }
    }
}
