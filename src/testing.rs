// File: testing.rs
// Location: /src/testing.rs
//
// Recording fakes for the controller's collaborators.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Result, anyhow};
use uuid::Uuid;

use crate::config::WifiConfig;
use crate::controller::{Collaborators, WifiDetailController};
use crate::entry::{
    ConnectedInfo, ConnectedState, Privacy, SaveStatus, ShareConfig, ShareSecurity,
    WIFI_LEVEL_UNREACHABLE, WifiEntry,
};
use crate::events::{self, DetailEvent, EventSink};
use crate::net::{
    LinkProperties, Network, NetworkCapabilities, NetworkInfo, NetworkRequest, NetworkState,
    WifiInfo,
};
use crate::platform::{ConnectivityManager, DetailsHost, IconInjector, WifiManager};

pub fn network(id: u128) -> Network {
    Network::new(Uuid::from_u128(id))
}

pub struct FakeEntry {
    title: String,
    summary: RefCell<String>,
    state: Cell<ConnectedState>,
    connected_info: Cell<Option<ConnectedInfo>>,
    level: Cell<i32>,
    saved: Cell<bool>,
    passpoint: Cell<bool>,
    osu_provider: Cell<bool>,
    locked_down: Cell<bool>,
    privacy: Cell<Privacy>,
    mac: RefCell<Option<String>>,
    abilities: Cell<(bool, bool, bool, bool)>,
    fail_forget: Cell<bool>,
    listener: RefCell<Option<EventSink>>,
    calls: RefCell<Vec<&'static str>>,
}

impl Default for FakeEntry {
    fn default() -> Self {
        Self {
            title: "HomeNet".to_string(),
            summary: RefCell::new(String::new()),
            state: Cell::new(ConnectedState::Disconnected),
            connected_info: Cell::new(None),
            level: Cell::new(WIFI_LEVEL_UNREACHABLE),
            saved: Cell::new(false),
            passpoint: Cell::new(false),
            osu_provider: Cell::new(false),
            locked_down: Cell::new(false),
            privacy: Cell::new(Privacy::DeviceMac),
            mac: RefCell::new(None),
            abilities: Cell::new((false, false, false, false)),
            fail_forget: Cell::new(false),
            listener: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl FakeEntry {
    pub fn set_state(&self, state: ConnectedState) {
        self.state.set(state);
    }

    pub fn set_connected_info(&self, info: Option<ConnectedInfo>) {
        self.connected_info.set(info);
    }

    pub fn set_level(&self, level: i32) {
        self.level.set(level);
    }

    pub fn set_saved(&self, saved: bool) {
        self.saved.set(saved);
    }

    pub fn set_passpoint(&self, passpoint: bool) {
        self.passpoint.set(passpoint);
    }

    pub fn set_osu_provider(&self, osu: bool) {
        self.osu_provider.set(osu);
    }

    pub fn set_locked_down(&self, locked: bool) {
        self.locked_down.set(locked);
    }

    pub fn set_privacy(&self, privacy: Privacy) {
        self.privacy.set(privacy);
    }

    pub fn set_mac(&self, mac: Option<String>) {
        *self.mac.borrow_mut() = mac;
    }

    pub fn set_summary(&self, summary: &str) {
        *self.summary.borrow_mut() = summary.to_string();
    }

    /// forget, sign in, connect, share
    pub fn set_abilities(&self, forget: bool, sign_in: bool, connect: bool, share: bool) {
        self.abilities.set((forget, sign_in, connect, share));
    }

    pub fn fail_forget(&self) {
        self.fail_forget.set(true);
    }

    pub fn has_listener(&self) -> bool {
        self.listener.borrow().is_some()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl WifiEntry for FakeEntry {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn summary(&self) -> String {
        self.summary.borrow().clone()
    }

    fn security_string(&self, concise: bool) -> String {
        let security = if concise { "WPA2" } else { "WPA2-Personal" };
        security.to_string()
    }

    fn connected_state(&self) -> ConnectedState {
        self.state.get()
    }

    fn connected_info(&self) -> Option<ConnectedInfo> {
        self.connected_info.get()
    }

    fn level(&self) -> i32 {
        self.level.get()
    }

    fn is_saved(&self) -> bool {
        self.saved.get()
    }

    fn is_passpoint(&self) -> bool {
        self.passpoint.get()
    }

    fn is_osu_provider(&self) -> bool {
        self.osu_provider.get()
    }

    fn passpoint_fqdn(&self) -> Option<String> {
        self.passpoint.get().then(|| "example.com".to_string())
    }

    fn is_locked_down(&self) -> bool {
        self.locked_down.get()
    }

    fn privacy(&self) -> Privacy {
        self.privacy.get()
    }

    fn mac_address(&self) -> Option<String> {
        self.mac.borrow().clone()
    }

    fn can_connect(&self) -> bool {
        self.abilities.get().2
    }

    fn can_forget(&self) -> bool {
        self.abilities.get().0
    }

    fn can_sign_in(&self) -> bool {
        self.abilities.get().1
    }

    fn can_share(&self) -> bool {
        self.abilities.get().3
    }

    fn set_listener(&self, sink: EventSink) {
        *self.listener.borrow_mut() = Some(sink);
    }

    fn connect(&self, _sink: EventSink) {
        self.calls.borrow_mut().push("connect");
    }

    fn forget(&self, _sink: EventSink) -> Result<()> {
        self.calls.borrow_mut().push("forget");
        if self.fail_forget.get() {
            return Err(anyhow!("profile is managed by the carrier"));
        }
        Ok(())
    }

    fn sign_in(&self, _sink: EventSink) {
        self.calls.borrow_mut().push("sign_in");
    }

    fn share(&self, sink: EventSink) {
        self.calls.borrow_mut().push("share");
        sink.post(DetailEvent::ShareResult(Some(ShareConfig {
            ssid: self.title.clone(),
            security: ShareSecurity::Wpa,
            password: "password123".to_string(),
            hidden: false,
        })));
    }
}

#[derive(Default)]
pub struct FakeConnectivity {
    link_properties: RefCell<HashMap<Network, LinkProperties>>,
    capabilities: RefCell<HashMap<Network, NetworkCapabilities>>,
    registrations: Cell<usize>,
    unregistrations: Cell<usize>,
    last_request: RefCell<Option<NetworkRequest>>,
}

impl FakeConnectivity {
    pub fn set_link_properties(&self, network: Network, lp: LinkProperties) {
        self.link_properties.borrow_mut().insert(network, lp);
    }

    pub fn clear_link_properties(&self) {
        self.link_properties.borrow_mut().clear();
    }

    pub fn set_capabilities(&self, network: Network, caps: NetworkCapabilities) {
        self.capabilities.borrow_mut().insert(network, caps);
    }

    pub fn registrations(&self) -> usize {
        self.registrations.get()
    }

    pub fn unregistrations(&self) -> usize {
        self.unregistrations.get()
    }

    pub fn last_request(&self) -> Option<NetworkRequest> {
        self.last_request.borrow().clone()
    }
}

impl ConnectivityManager for FakeConnectivity {
    fn register_network_callback(&self, request: &NetworkRequest, _sink: EventSink) {
        self.registrations.set(self.registrations.get() + 1);
        *self.last_request.borrow_mut() = Some(request.clone());
    }

    fn unregister_network_callback(&self) {
        self.unregistrations.set(self.unregistrations.get() + 1);
    }

    fn link_properties(&self, network: &Network) -> Option<LinkProperties> {
        self.link_properties.borrow().get(network).cloned()
    }

    fn network_capabilities(&self, network: &Network) -> Option<NetworkCapabilities> {
        self.capabilities.borrow().get(network).copied()
    }

    fn network_info(&self, network: &Network) -> Option<NetworkInfo> {
        self.link_properties.borrow().contains_key(network).then_some(NetworkInfo {
            state: NetworkState::Connected,
            extra_info: None,
        })
    }
}

#[derive(Default)]
pub struct FakeWifiManager {
    current_network: Cell<Option<Network>>,
    connection_info: RefCell<Option<WifiInfo>>,
    factory_macs: RefCell<Vec<String>>,
    save_failure: RefCell<Option<String>>,
    saved: RefCell<Vec<WifiConfig>>,
}

impl FakeWifiManager {
    pub fn set_current_network(&self, network: Option<Network>) {
        self.current_network.set(network);
    }

    pub fn set_connection_info(&self, info: Option<WifiInfo>) {
        *self.connection_info.borrow_mut() = info;
    }

    pub fn set_factory_macs(&self, macs: Vec<String>) {
        *self.factory_macs.borrow_mut() = macs;
    }

    pub fn fail_saves(&self, reason: &str) {
        *self.save_failure.borrow_mut() = Some(reason.to_string());
    }

    pub fn saved(&self) -> Vec<WifiConfig> {
        self.saved.borrow().clone()
    }
}

impl WifiManager for FakeWifiManager {
    fn current_network(&self) -> Option<Network> {
        self.current_network.get()
    }

    fn connection_info(&self) -> Option<WifiInfo> {
        self.connection_info.borrow().clone()
    }

    fn factory_mac_addresses(&self) -> Vec<String> {
        self.factory_macs.borrow().clone()
    }

    fn save(&self, config: WifiConfig, sink: EventSink) {
        self.saved.borrow_mut().push(config);
        let status = match self.save_failure.borrow().clone() {
            Some(reason) => SaveStatus::Failure(reason),
            None => SaveStatus::Success,
        };
        sink.post(DetailEvent::SaveResult(status));
    }
}

/// Confirms every prompt immediately.
#[derive(Default)]
pub struct FakeHost {
    finished: Cell<usize>,
    toasts: RefCell<Vec<String>>,
    forget_confirmations: RefCell<Vec<String>>,
    lock_screen_requests: Cell<usize>,
    shared: RefCell<Vec<(String, String)>>,
}

impl FakeHost {
    pub fn finished(&self) -> usize {
        self.finished.get()
    }

    pub fn toasts(&self) -> Vec<String> {
        self.toasts.borrow().clone()
    }

    pub fn forget_confirmations(&self) -> Vec<String> {
        self.forget_confirmations.borrow().clone()
    }

    pub fn lock_screen_requests(&self) -> usize {
        self.lock_screen_requests.get()
    }

    pub fn shared_payloads(&self) -> Vec<(String, String)> {
        self.shared.borrow().clone()
    }
}

impl DetailsHost for FakeHost {
    fn finish(&self) {
        self.finished.set(self.finished.get() + 1);
    }

    fn show_toast(&self, message: &str) {
        self.toasts.borrow_mut().push(message.to_string());
    }

    fn confirm_forget_passpoint(&self, title: &str, sink: EventSink) {
        self.forget_confirmations.borrow_mut().push(title.to_string());
        sink.post(DetailEvent::ForgetConfirmed);
    }

    fn show_lock_screen(&self, sink: EventSink) {
        self.lock_screen_requests.set(self.lock_screen_requests.get() + 1);
        sink.post(DetailEvent::LockScreenPassed);
    }

    fn show_share_qr(&self, ssid: &str, payload: &str) {
        self.shared
            .borrow_mut()
            .push((ssid.to_string(), payload.to_string()));
    }
}

#[derive(Clone, Default)]
pub struct CountingIcons {
    lookups: Rc<Cell<usize>>,
}

impl CountingIcons {
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }
}

impl IconInjector for CountingIcons {
    fn icon(&self, level: i32) -> String {
        self.lookups.set(self.lookups.get() + 1);
        format!("signal-{}", level)
    }
}

pub struct Harness {
    pub entry: Rc<FakeEntry>,
    pub cm: Rc<FakeConnectivity>,
    pub wifi: Rc<FakeWifiManager>,
    pub host: Rc<FakeHost>,
    pub icons: CountingIcons,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            entry: Rc::new(FakeEntry::default()),
            cm: Rc::new(FakeConnectivity::default()),
            wifi: Rc::new(FakeWifiManager::default()),
            host: Rc::new(FakeHost::default()),
            icons: CountingIcons::default(),
        }
    }

    /// Controller whose outgoing events go nowhere.
    pub fn controller(&self) -> WifiDetailController {
        let (sink, _rx) = events::channel();
        self.controller_with_sink(sink)
    }

    pub fn controller_with_sink(&self, sink: EventSink) -> WifiDetailController {
        WifiDetailController::new(
            Collaborators {
                entry: self.entry.clone(),
                connectivity: self.cm.clone(),
                wifi_manager: self.wifi.clone(),
                host: self.host.clone(),
                icons: Box::new(self.icons.clone()),
            },
            sink,
        )
    }
}
