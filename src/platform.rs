// File: platform.rs
// Location: /src/platform.rs

use crate::config::WifiConfig;
use crate::entry::WIFI_LEVEL_MAX;
use crate::events::EventSink;
use crate::net::{LinkProperties, Network, NetworkCapabilities, NetworkInfo, NetworkRequest, WifiInfo};

/// Connectivity queries and network callback registration. While a
/// callback is registered, link/capability/lost notifications for networks
/// matching the request are posted to the sink.
pub trait ConnectivityManager {
    fn register_network_callback(&self, request: &NetworkRequest, sink: EventSink);
    fn unregister_network_callback(&self);
    fn link_properties(&self, network: &Network) -> Option<LinkProperties>;
    fn network_capabilities(&self, network: &Network) -> Option<NetworkCapabilities>;
    fn network_info(&self, network: &Network) -> Option<NetworkInfo>;
}

pub trait WifiManager {
    fn current_network(&self) -> Option<Network>;
    fn connection_info(&self) -> Option<WifiInfo>;
    fn factory_mac_addresses(&self) -> Vec<String>;
    /// Result arrives as `SaveResult`.
    fn save(&self, config: WifiConfig, sink: EventSink);
}

/// Whatever presents the detail screen.
pub trait DetailsHost {
    /// Close the detail screen.
    fn finish(&self);
    fn show_toast(&self, message: &str);
    /// Ask before removing a passpoint profile; post `ForgetConfirmed` to
    /// proceed.
    fn confirm_forget_passpoint(&self, title: &str, sink: EventSink);
    /// Gate sharing behind user authentication; post `LockScreenPassed` to
    /// proceed.
    fn show_lock_screen(&self, sink: EventSink);
    fn show_share_qr(&self, ssid: &str, payload: &str);
}

pub trait IconInjector {
    fn icon(&self, level: i32) -> String;
}

/// Symbolic icon names per signal level.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalIcons;

impl IconInjector for SignalIcons {
    fn icon(&self, level: i32) -> String {
        let name = match level {
            l if l >= WIFI_LEVEL_MAX => "network-wireless-signal-excellent-symbolic",
            3 => "network-wireless-signal-good-symbolic",
            2 => "network-wireless-signal-ok-symbolic",
            1 => "network-wireless-signal-weak-symbolic",
            _ => "network-wireless-signal-none-symbolic",
        };
        name.to_string()
    }
}
