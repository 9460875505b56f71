// File: entry.rs
// Location: /src/entry.rs

use anyhow::Result;

use crate::events::EventSink;
use crate::net::{LinkProperties, Network, NetworkCapabilities};

/// Signal level reported for networks that are saved but not in range.
pub const WIFI_LEVEL_UNREACHABLE: i32 = -1;
pub const WIFI_LEVEL_MAX: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectedState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privacy {
    DeviceMac,
    RandomizedMac,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStatus {
    Success,
    FailureNoConfig,
    FailureUnknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgetStatus {
    Success,
    FailureUnknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStatus {
    Success,
    FailureUnknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Success,
    Failure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedInfo {
    pub frequency_mhz: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareSecurity {
    Open,
    Wep,
    Wpa,
    Sae,
}

/// Credentials handed out by an entry for QR sharing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareConfig {
    pub ssid: String,
    pub security: ShareSecurity,
    pub password: String,
    pub hidden: bool,
}

/// One Wi-Fi network, saved or in range. Implementations own the state;
/// the detail controller only reads it and requests actions. Action results
/// arrive later as events posted to the given sink.
pub trait WifiEntry {
    fn title(&self) -> String;
    fn summary(&self) -> String;
    fn security_string(&self, concise: bool) -> String;

    fn connected_state(&self) -> ConnectedState;
    fn connected_info(&self) -> Option<ConnectedInfo>;
    /// 0..=4, or [`WIFI_LEVEL_UNREACHABLE`].
    fn level(&self) -> i32;

    fn is_saved(&self) -> bool;
    fn is_passpoint(&self) -> bool;
    fn is_osu_provider(&self) -> bool;
    fn passpoint_fqdn(&self) -> Option<String>;
    fn is_locked_down(&self) -> bool;

    fn privacy(&self) -> Privacy;
    fn mac_address(&self) -> Option<String>;

    fn can_connect(&self) -> bool;
    fn can_forget(&self) -> bool;
    fn can_sign_in(&self) -> bool;
    fn can_share(&self) -> bool;

    /// Registers the sink that receives `EntryUpdated` notifications.
    fn set_listener(&self, sink: EventSink);

    fn connect(&self, sink: EventSink);
    /// May fail synchronously, e.g. when a passpoint profile can't be removed.
    fn forget(&self, sink: EventSink) -> Result<()>;
    fn sign_in(&self, sink: EventSink);
    fn share(&self, sink: EventSink);
}

pub trait WifiEntryCallback {
    fn on_updated(&mut self);
}

pub trait ConnectCallback {
    fn on_connect_result(&mut self, status: ConnectStatus);
}

pub trait ForgetCallback {
    fn on_forget_result(&mut self, status: ForgetStatus);
}

pub trait SignInCallback {
    fn on_sign_in_result(&mut self, status: SignInStatus);
}

pub trait NetworkCallback {
    fn on_link_properties_changed(&mut self, network: Network, link_properties: LinkProperties);
    fn on_capabilities_changed(&mut self, network: Network, capabilities: NetworkCapabilities);
    fn on_lost(&mut self, network: Network);
}
