// File: nm.rs
// Location: /src/nm.rs
//
// NetworkManager backed Wi-Fi entry, connectivity manager and Wi-Fi
// manager. State is read with `nmcli` by `poll_state` and cached; every
// trait query reads the cache. Actions run as tokio tasks and report back
// through the event sink.

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::{DetailsSettings, WifiConfig, WifiSecurity};
use crate::entry::{
    ConnectStatus, ConnectedInfo, ConnectedState, ForgetStatus, Privacy, SaveStatus, ShareConfig,
    ShareSecurity, SignInStatus, WIFI_LEVEL_MAX, WIFI_LEVEL_UNREACHABLE, WifiEntry,
};
use crate::events::{DetailEvent, EventSink};
use crate::net::{
    LINK_SPEED_UNKNOWN, LinkAddress, LinkProperties, Network, NetworkCapabilities, NetworkInfo,
    NetworkRequest, NetworkState, RouteInfo, Transport, WifiInfo,
};
use crate::platform::{ConnectivityManager, WifiManager};

const CONNECTED_STATE_CODE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPoint {
    pub signal: u8,
    pub frequency_mhz: u32,
    pub security: String,
    pub rate_mbps: Option<u32>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedProfile {
    pub uuid: Uuid,
    pub cloned_mac: String,
    pub key_mgmt: String,
    pub permissions: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveLink {
    pub network: Network,
    pub link_properties: LinkProperties,
    pub capabilities: NetworkCapabilities,
    pub wifi_info: WifiInfo,
}

/// Everything the backend knows about one SSID after a poll.
#[derive(Debug, Clone, PartialEq)]
pub struct NmState {
    pub interface: Option<String>,
    pub connected_state: ConnectedState,
    pub access_point: Option<AccessPoint>,
    pub profile: Option<SavedProfile>,
    pub active: Option<ActiveLink>,
    pub hw_address: Option<String>,
    pub factory_mac: Option<String>,
}

impl Default for NmState {
    fn default() -> Self {
        Self {
            interface: None,
            connected_state: ConnectedState::Disconnected,
            access_point: None,
            profile: None,
            active: None,
            hw_address: None,
            factory_mac: None,
        }
    }
}

impl NmState {
    pub fn level(&self) -> i32 {
        self.access_point
            .as_ref()
            .map(|ap| level_from_signal(ap.signal))
            .unwrap_or(WIFI_LEVEL_UNREACHABLE)
    }

    fn capabilities(&self) -> Option<NetworkCapabilities> {
        self.active.as_ref().map(|a| a.capabilities)
    }

    /// Whether anything the entry exposes differs from `other`.
    fn entry_differs(&self, other: &NmState) -> bool {
        self.connected_state != other.connected_state
            || self.level() != other.level()
            || self.access_point.as_ref().map(|ap| (ap.frequency_mhz, &ap.security))
                != other.access_point.as_ref().map(|ap| (ap.frequency_mhz, &ap.security))
            || self.profile != other.profile
            || self.hw_address != other.hw_address
            || self.capabilities() != other.capabilities()
            || self.active.as_ref().map(|a| a.network) != other.active.as_ref().map(|a| a.network)
    }

    fn security_raw(&self) -> String {
        if let Some(ap) = &self.access_point {
            return ap.security.clone();
        }
        self.profile
            .as_ref()
            .map(|p| security_from_key_mgmt(&p.key_mgmt).to_string())
            .unwrap_or_default()
    }
}

pub fn level_from_signal(signal: u8) -> i32 {
    match signal {
        80.. => WIFI_LEVEL_MAX,
        60..=79 => 3,
        40..=59 => 2,
        20..=39 => 1,
        _ => 0,
    }
}

fn security_from_key_mgmt(key_mgmt: &str) -> &'static str {
    match key_mgmt {
        "sae" => "WPA3",
        "wpa-psk" => "WPA2",
        "wpa-eap" | "wpa-eap-suite-b-192" => "WPA2 802.1X",
        "none" | "ieee8021x" => "WEP",
        "owe" => "OWE",
        _ => "",
    }
}

/// `(concise, full)` labels for an nmcli SECURITY column value.
pub fn security_labels(raw: &str) -> (&'static str, &'static str) {
    let raw = raw.trim();
    if raw.is_empty() || raw == "--" {
        ("None", "None")
    } else if raw.contains("802.1X") {
        ("Enterprise", "WPA/WPA2-Enterprise")
    } else if raw.contains("WPA3") && raw.contains("WPA2") {
        ("WPA2/WPA3", "WPA2/WPA3-Personal")
    } else if raw.contains("WPA3") {
        ("WPA3", "WPA3-Personal")
    } else if raw.contains("WPA2") {
        ("WPA2", "WPA2-Personal")
    } else if raw.contains("WPA") {
        ("WPA", "WPA-Personal")
    } else if raw.contains("WEP") {
        ("WEP", "WEP")
    } else if raw.contains("OWE") {
        ("OWE", "Enhanced Open")
    } else {
        ("Secured", "Secured")
    }
}

pub fn share_security(raw: &str) -> Option<ShareSecurity> {
    let raw = raw.trim();
    if raw.contains("802.1X") {
        None
    } else if raw.is_empty() || raw == "--" || raw == "OWE" {
        Some(ShareSecurity::Open)
    } else if raw.contains("WPA3") && !raw.contains("WPA2") {
        Some(ShareSecurity::Sae)
    } else if raw.contains("WPA") {
        Some(ShareSecurity::Wpa)
    } else if raw.contains("WEP") {
        Some(ShareSecurity::Wep)
    } else {
        None
    }
}

pub fn entry_summary(state: &NmState) -> String {
    let summary = match state.connected_state {
        ConnectedState::Connected => match state.capabilities() {
            Some(caps) if caps.captive_portal => "Sign in to network",
            Some(caps) if caps.partial_connectivity => "Limited connection",
            Some(caps) if caps.private_dns_broken => "Private DNS server cannot be accessed",
            Some(caps) if !caps.validated => "Connected, no internet",
            _ => "Connected",
        },
        ConnectedState::Connecting => "Connecting…",
        ConnectedState::Disconnected if state.access_point.is_none() => "Not in range",
        ConnectedState::Disconnected if state.profile.is_some() => "Saved",
        ConnectedState::Disconnected => "",
    };
    summary.to_string()
}

/// The entry, connectivity manager and Wi-Fi manager for one SSID.
pub struct NmBackend {
    ssid: String,
    captive_portal_url: String,
    state: RefCell<NmState>,
    listener: RefCell<Option<EventSink>>,
    network_callback: RefCell<Option<EventSink>>,
}

impl NmBackend {
    pub fn new(ssid: &str, settings: &DetailsSettings, initial: NmState) -> Self {
        Self {
            ssid: ssid.to_string(),
            captive_portal_url: settings.captive_portal_url.clone(),
            state: RefCell::new(initial),
            listener: RefCell::new(None),
            network_callback: RefCell::new(None),
        }
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Replaces the cached state and posts what changed. A lost network is
    /// reported before the entry update that clears it, and link changes
    /// for a new network after the update that picks it up.
    pub fn apply(&self, next: NmState) {
        let prev = self.state.replace(next);
        let next = self.state.borrow();
        let callback = self.network_callback.borrow();
        let next_active = next.active.as_ref();

        if let (Some(sink), Some(lost)) = (callback.as_ref(), prev.active.as_ref()) {
            if next_active.map(|a| a.network) != Some(lost.network) {
                sink.post(DetailEvent::Lost(lost.network));
            }
        }

        if prev.entry_differs(&next) {
            debug!(
                "{}: {:?} -> {:?}, level {}",
                self.ssid,
                prev.connected_state,
                next.connected_state,
                next.level()
            );
            if let Some(sink) = self.listener.borrow().as_ref() {
                sink.post(DetailEvent::EntryUpdated);
            }
        }

        let (Some(sink), Some(active)) = (callback.as_ref(), next_active) else {
            return;
        };
        let previous = prev.active.as_ref().filter(|p| p.network == active.network);
        if previous.map(|p| &p.link_properties) != Some(&active.link_properties) {
            sink.post(DetailEvent::LinkPropertiesChanged(
                active.network,
                active.link_properties.clone(),
            ));
        }
        if previous.map(|p| p.capabilities) != Some(active.capabilities) {
            sink.post(DetailEvent::CapabilitiesChanged(
                active.network,
                active.capabilities,
            ));
        }
    }

    fn profile_uuid(&self) -> Option<Uuid> {
        self.state.borrow().profile.as_ref().map(|p| p.uuid)
    }
}

impl WifiEntry for NmBackend {
    fn title(&self) -> String {
        self.ssid.clone()
    }

    fn summary(&self) -> String {
        entry_summary(&self.state.borrow())
    }

    fn security_string(&self, concise: bool) -> String {
        let (short, full) = security_labels(&self.state.borrow().security_raw());
        let label = if concise { short } else { full };
        label.to_string()
    }

    fn connected_state(&self) -> ConnectedState {
        self.state.borrow().connected_state
    }

    fn connected_info(&self) -> Option<ConnectedInfo> {
        let state = self.state.borrow();
        if state.connected_state == ConnectedState::Disconnected {
            return None;
        }
        state.access_point.as_ref().map(|ap| ConnectedInfo {
            frequency_mhz: ap.frequency_mhz,
        })
    }

    fn level(&self) -> i32 {
        self.state.borrow().level()
    }

    fn is_saved(&self) -> bool {
        self.state.borrow().profile.is_some()
    }

    fn is_passpoint(&self) -> bool {
        false
    }

    fn is_osu_provider(&self) -> bool {
        false
    }

    fn passpoint_fqdn(&self) -> Option<String> {
        None
    }

    fn is_locked_down(&self) -> bool {
        self.state
            .borrow()
            .profile
            .as_ref()
            .is_some_and(|p| !p.permissions.is_empty())
    }

    fn privacy(&self) -> Privacy {
        match self.state.borrow().profile.as_ref() {
            Some(p) if matches!(p.cloned_mac.as_str(), "random" | "stable") => {
                Privacy::RandomizedMac
            }
            _ => Privacy::DeviceMac,
        }
    }

    fn mac_address(&self) -> Option<String> {
        self.state.borrow().hw_address.clone()
    }

    fn can_connect(&self) -> bool {
        let state = self.state.borrow();
        state.connected_state == ConnectedState::Disconnected
            && state.access_point.as_ref().is_some_and(|ap| {
                state.profile.is_some() || share_security(&ap.security) == Some(ShareSecurity::Open)
            })
    }

    fn can_forget(&self) -> bool {
        self.is_saved()
    }

    fn can_sign_in(&self) -> bool {
        let state = self.state.borrow();
        state.connected_state == ConnectedState::Connected
            && state.capabilities().is_some_and(|c| c.captive_portal)
    }

    fn can_share(&self) -> bool {
        self.is_saved() && share_security(&self.state.borrow().security_raw()).is_some()
    }

    fn set_listener(&self, sink: EventSink) {
        *self.listener.borrow_mut() = Some(sink);
    }

    fn connect(&self, sink: EventSink) {
        let ssid = self.ssid.clone();
        let profile = self.profile_uuid();
        tokio::spawn(async move {
            let result = match profile {
                Some(uuid) => activate_saved_connection(&uuid.to_string()).await,
                None => connect_open_network(&ssid).await,
            };
            let status = match result {
                Ok(()) => ConnectStatus::Success,
                Err(e) => {
                    warn!("Connect to {} failed: {}", ssid, e);
                    ConnectStatus::FailureUnknown
                }
            };
            sink.post(DetailEvent::ConnectResult(status));
        });
    }

    fn forget(&self, sink: EventSink) -> Result<()> {
        let uuid = self
            .profile_uuid()
            .ok_or_else(|| anyhow!("{} has no saved profile", self.ssid))?;
        tokio::spawn(async move {
            let status = match delete_connection(&uuid.to_string()).await {
                Ok(()) => ForgetStatus::Success,
                Err(e) => {
                    warn!("{}", e);
                    ForgetStatus::FailureUnknown
                }
            };
            sink.post(DetailEvent::ForgetResult(status));
        });
        Ok(())
    }

    fn sign_in(&self, sink: EventSink) {
        let url = self.captive_portal_url.clone();
        tokio::spawn(async move {
            let status = match open_url(&url).await {
                Ok(()) => SignInStatus::Success,
                Err(e) => {
                    warn!("Failed to open captive portal: {}", e);
                    SignInStatus::FailureUnknown
                }
            };
            sink.post(DetailEvent::SignInResult(status));
        });
    }

    fn share(&self, sink: EventSink) {
        let ssid = self.ssid.clone();
        let (uuid, hidden) = match self.state.borrow().profile.as_ref() {
            Some(p) => (p.uuid, p.hidden),
            None => {
                sink.post(DetailEvent::ShareResult(None));
                return;
            }
        };
        let Some(security) = share_security(&self.state.borrow().security_raw()) else {
            sink.post(DetailEvent::ShareResult(None));
            return;
        };
        tokio::spawn(async move {
            let password = if security == ShareSecurity::Open {
                Ok(String::new())
            } else {
                get_saved_secret(&uuid.to_string(), security).await
            };
            let config = match password {
                Ok(password) => Some(ShareConfig {
                    ssid,
                    security,
                    password,
                    hidden,
                }),
                Err(e) => {
                    warn!("Failed to read saved password: {}", e);
                    None
                }
            };
            sink.post(DetailEvent::ShareResult(config));
        });
    }
}

impl ConnectivityManager for NmBackend {
    fn register_network_callback(&self, request: &NetworkRequest, sink: EventSink) {
        if !request.matches(Transport::Wifi) {
            debug!("Ignoring callback request without Wi-Fi transport");
            return;
        }
        *self.network_callback.borrow_mut() = Some(sink);
    }

    fn unregister_network_callback(&self) {
        self.network_callback.borrow_mut().take();
    }

    fn link_properties(&self, network: &Network) -> Option<LinkProperties> {
        let state = self.state.borrow();
        state
            .active
            .as_ref()
            .filter(|a| a.network == *network)
            .map(|a| a.link_properties.clone())
    }

    fn network_capabilities(&self, network: &Network) -> Option<NetworkCapabilities> {
        let state = self.state.borrow();
        state
            .active
            .as_ref()
            .filter(|a| a.network == *network)
            .map(|a| a.capabilities)
    }

    fn network_info(&self, network: &Network) -> Option<NetworkInfo> {
        let state = self.state.borrow();
        state
            .active
            .as_ref()
            .filter(|a| a.network == *network)
            .map(|_| NetworkInfo {
                state: NetworkState::Connected,
                extra_info: Some(self.ssid.clone()),
            })
    }
}

impl WifiManager for NmBackend {
    fn current_network(&self) -> Option<Network> {
        self.state.borrow().active.as_ref().map(|a| a.network)
    }

    fn connection_info(&self) -> Option<WifiInfo> {
        self.state.borrow().active.as_ref().map(|a| a.wifi_info.clone())
    }

    fn factory_mac_addresses(&self) -> Vec<String> {
        self.state.borrow().factory_mac.iter().cloned().collect()
    }

    fn save(&self, config: WifiConfig, sink: EventSink) {
        let state = self.state.borrow();
        let profile = state.profile.as_ref().map(|p| p.uuid);
        let interface = state.interface.clone();
        tokio::spawn(async move {
            let status = match save_profile(&config, profile, interface.as_deref()).await {
                Ok(()) => SaveStatus::Success,
                Err(e) => SaveStatus::Failure(e.to_string()),
            };
            sink.post(DetailEvent::SaveResult(status));
        });
    }
}

/// Polls `ssid` every `interval` until the receiver goes away.
pub async fn watch(
    ssid: String,
    interface: Option<String>,
    interval: Duration,
    tx: mpsc::UnboundedSender<NmState>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match poll_state(&ssid, interface.as_deref()).await {
            Ok(state) => {
                if tx.send(state).is_err() {
                    break;
                }
            }
            Err(e) => warn!("Polling {} failed: {}", ssid, e),
        }
    }
}

pub async fn poll_state(ssid: &str, interface: Option<&str>) -> Result<NmState> {
    let interface = match interface {
        Some(iface) => iface.to_string(),
        None => get_wifi_device().await?,
    };

    let access_point = match scan_access_point(ssid, &interface).await {
        Ok(ap) => ap,
        Err(e) => {
            warn!("Scan list unavailable: {}", e);
            None
        }
    };

    let profile = match find_saved_profile(ssid).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!("Saved profile lookup failed: {}", e);
            None
        }
    };

    let device = nmcli_key_value_map(&["-t", "-f", "GENERAL,IP4,IP6", "device", "show", &interface])
        .await
        .with_context(|| format!("Failed to read device {}", interface))?;

    let state_code = device
        .get("GENERAL.STATE")
        .and_then(|v| parse_device_state(v))
        .unwrap_or(0);
    let device_connection = non_empty(device.get("GENERAL.CONNECTION"));
    let ours = access_point.as_ref().is_some_and(|ap| ap.active)
        || device_connection.as_deref() == Some(ssid);

    let connected_state = if !ours {
        ConnectedState::Disconnected
    } else if state_code == CONNECTED_STATE_CODE {
        ConnectedState::Connected
    } else if (40..CONNECTED_STATE_CODE).contains(&state_code) {
        ConnectedState::Connecting
    } else {
        ConnectedState::Disconnected
    };

    let hw_address = non_empty(device.get("GENERAL.HWADDR"));
    let factory_mac = permanent_mac(&interface).await;

    let active = if connected_state == ConnectedState::Connected {
        let network = non_empty(device.get("GENERAL.CON-UUID"))
            .and_then(|v| Uuid::parse_str(&v).ok())
            .or_else(|| profile.as_ref().map(|p| p.uuid))
            .map(Network::new);
        match network {
            Some(network) => {
                let (tx, rx, rssi) = iw_link(&interface).await;
                let tx = if tx == LINK_SPEED_UNKNOWN {
                    access_point
                        .as_ref()
                        .and_then(|ap| ap.rate_mbps)
                        .map(|r| r as i32)
                        .unwrap_or(LINK_SPEED_UNKNOWN)
                } else {
                    tx
                };
                Some(ActiveLink {
                    network,
                    link_properties: link_properties_from_device(&device),
                    capabilities: connectivity_capabilities().await,
                    wifi_info: WifiInfo {
                        tx_link_speed_mbps: tx,
                        rx_link_speed_mbps: rx,
                        rssi,
                        frequency_mhz: access_point.as_ref().map(|ap| ap.frequency_mhz).unwrap_or(0),
                        mac_address: hw_address.clone().unwrap_or_default(),
                    },
                })
            }
            None => {
                debug!("Connected to {} without a connection UUID", ssid);
                None
            }
        }
    } else {
        None
    };

    Ok(NmState {
        interface: Some(interface),
        connected_state,
        access_point,
        profile,
        active,
        hw_address,
        factory_mac,
    })
}

async fn get_wifi_device() -> Result<String> {
    let output = Command::new("nmcli")
        .args(["-t", "-f", "DEVICE,TYPE,STATE", "device"])
        .output()
        .await?;

    if !output.status.success() {
        let err = nmcli_error_text(&output);
        return Err(anyhow!("Failed to list devices: {}", err));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        let parts = split_terse(line);
        if parts.len() < 3 {
            continue;
        }
        if parts[1] == "wifi" && parts[2] != "unavailable" {
            return Ok(parts[0].clone());
        }
    }

    Err(anyhow!("No available Wi-Fi device found"))
}

async fn scan_access_point(ssid: &str, interface: &str) -> Result<Option<AccessPoint>> {
    let output = Command::new("nmcli")
        .args([
            "-t",
            "-f", "ACTIVE,SSID,SIGNAL,FREQ,SECURITY,RATE",
            "dev", "wifi", "list",
            "ifname", interface,
        ])
        .output()
        .await?;

    if !output.status.success() {
        return Err(anyhow!("Failed to scan networks: {}", nmcli_error_text(&output)));
    }

    Ok(parse_scan_list(&String::from_utf8_lossy(&output.stdout), ssid))
}

/// Picks the active BSS for `ssid`, else the strongest one.
pub fn parse_scan_list(stdout: &str, ssid: &str) -> Option<AccessPoint> {
    let mut best: Option<AccessPoint> = None;

    for line in stdout.lines() {
        let parts = split_terse(line);
        if parts.len() < 6 || parts[1] != ssid {
            continue;
        }

        let ap = AccessPoint {
            active: parts[0] == "yes",
            signal: parts[2].parse().unwrap_or(0),
            frequency_mhz: parse_u32_from_str(&parts[3]),
            security: parts[4].clone(),
            rate_mbps: Some(parse_u32_from_str(&parts[5])).filter(|r| *r > 0),
        };

        best = match best {
            None => Some(ap),
            Some(existing) => {
                if ap.active && !existing.active {
                    Some(ap)
                } else if ap.active == existing.active && ap.signal > existing.signal {
                    Some(ap)
                } else {
                    Some(existing)
                }
            }
        };
    }

    best
}

async fn find_saved_profile(ssid: &str) -> Result<Option<SavedProfile>> {
    let output = Command::new("nmcli")
        .args(["-t", "-f", "NAME,UUID,TYPE", "connection", "show"])
        .output()
        .await?;

    if !output.status.success() {
        return Err(anyhow!("Failed to list connections: {}", nmcli_error_text(&output)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let uuid = stdout.lines().find_map(|line| {
        let parts = split_terse(line);
        if parts.len() == 3 && parts[2] == "802-11-wireless" && parts[0] == ssid {
            Uuid::parse_str(&parts[1]).ok()
        } else {
            None
        }
    });
    let Some(uuid) = uuid else {
        return Ok(None);
    };

    let map = nmcli_key_value_map(&["-t", "connection", "show", &uuid.to_string()]).await?;
    Ok(Some(saved_profile_from_map(uuid, &map)))
}

pub fn saved_profile_from_map(uuid: Uuid, map: &HashMap<String, String>) -> SavedProfile {
    SavedProfile {
        uuid,
        cloned_mac: non_empty(map.get("802-11-wireless.cloned-mac-address")).unwrap_or_default(),
        key_mgmt: non_empty(map.get("802-11-wireless-security.key-mgmt")).unwrap_or_default(),
        permissions: non_empty(map.get("connection.permissions")).unwrap_or_default(),
        hidden: map
            .get("802-11-wireless.hidden")
            .is_some_and(|v| v == "yes" || v == "true"),
    }
}

pub fn link_properties_from_device(map: &HashMap<String, String>) -> LinkProperties {
    let mut link_addresses: Vec<LinkAddress> = collect_indexed_values(map, "IP4.ADDRESS")
        .iter()
        .filter_map(|v| LinkAddress::parse(v))
        .collect();
    link_addresses.extend(
        collect_indexed_values(map, "IP6.ADDRESS")
            .iter()
            .filter_map(|v| LinkAddress::parse(v)),
    );

    let mut routes: Vec<RouteInfo> = collect_indexed_values(map, "IP4.ROUTE")
        .iter()
        .chain(collect_indexed_values(map, "IP6.ROUTE").iter())
        .filter_map(|v| parse_route(v))
        .collect();

    // Older nmcli only lists the gateway, not the default route.
    if !routes.iter().any(|r| r.is_ipv4_default() && r.has_gateway()) {
        if let Some(gw) = non_empty(map.get("IP4.GATEWAY")).and_then(|v| v.parse().ok()) {
            routes.push(RouteInfo::ipv4_default(gw));
        }
    }

    let dns_servers: Vec<IpAddr> = collect_indexed_values(map, "IP4.DNS")
        .iter()
        .chain(collect_indexed_values(map, "IP6.DNS").iter())
        .filter_map(|v| v.parse().ok())
        .collect();

    LinkProperties {
        interface_name: non_empty(map.get("GENERAL.DEVICE")),
        link_addresses,
        routes,
        dns_servers,
    }
}

/// `dst = 0.0.0.0/0, nh = 192.168.1.1, mt = 600`
pub fn parse_route(value: &str) -> Option<RouteInfo> {
    let mut destination = None;
    let mut gateway = None;
    for part in value.split(',') {
        let Some((key, val)) = part.split_once('=') else {
            continue;
        };
        match key.trim() {
            "dst" => destination = LinkAddress::parse(val),
            "nh" => gateway = val.trim().parse::<IpAddr>().ok(),
            _ => {}
        }
    }
    let destination = destination?;
    Some(RouteInfo::new(
        destination.address,
        destination.prefix_len,
        gateway.filter(|gw| !gw.is_unspecified()),
    ))
}

/// `100 (connected)` -> 100
pub fn parse_device_state(value: &str) -> Option<u32> {
    value.split_whitespace().next()?.parse().ok()
}

pub fn capabilities_from_connectivity(value: &str) -> NetworkCapabilities {
    match value.trim() {
        "full" | "unknown" => NetworkCapabilities {
            validated: true,
            ..Default::default()
        },
        "portal" => NetworkCapabilities {
            captive_portal: true,
            ..Default::default()
        },
        "limited" => NetworkCapabilities {
            partial_connectivity: true,
            ..Default::default()
        },
        _ => NetworkCapabilities::default(),
    }
}

async fn connectivity_capabilities() -> NetworkCapabilities {
    let output = Command::new("nmcli")
        .args(["-t", "-f", "CONNECTIVITY", "general"])
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            capabilities_from_connectivity(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            warn!("Failed to read connectivity: {}", nmcli_error_text(&output));
            NetworkCapabilities::default()
        }
        Err(e) => {
            warn!("Failed to read connectivity: {}", e);
            NetworkCapabilities::default()
        }
    }
}

/// `(tx, rx, rssi)`; speeds are [`LINK_SPEED_UNKNOWN`] when `iw` can't tell.
async fn iw_link(interface: &str) -> (i32, i32, i32) {
    match Command::new("iw").args(["dev", interface, "link"]).output().await {
        Ok(output) if output.status.success() => {
            parse_iw_link(&String::from_utf8_lossy(&output.stdout))
        }
        _ => {
            debug!("iw link unavailable for {}", interface);
            (LINK_SPEED_UNKNOWN, LINK_SPEED_UNKNOWN, 0)
        }
    }
}

pub fn parse_iw_link(stdout: &str) -> (i32, i32, i32) {
    let mut tx = LINK_SPEED_UNKNOWN;
    let mut rx = LINK_SPEED_UNKNOWN;
    let mut rssi = 0;

    for line in stdout.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let number = value
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<f64>().ok());
        match (key.trim(), number) {
            ("tx bitrate", Some(n)) => tx = n as i32,
            ("rx bitrate", Some(n)) => rx = n as i32,
            ("signal", Some(n)) => rssi = n as i32,
            _ => {}
        }
    }

    (tx, rx, rssi)
}

async fn permanent_mac(interface: &str) -> Option<String> {
    if let Ok(output) = Command::new("ethtool").args(["-P", interface]).output().await {
        if output.status.success() {
            if let Some(mac) = parse_ethtool_permanent(&String::from_utf8_lossy(&output.stdout)) {
                return Some(mac);
            }
        }
    }

    debug!("ethtool unavailable, reading MAC of {} from sysfs", interface);
    tokio::fs::read_to_string(format!("/sys/class/net/{}/address", interface))
        .await
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn parse_ethtool_permanent(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("Permanent address:"))
        .map(|mac| mac.trim().to_string())
        .filter(|mac| !mac.is_empty())
}

async fn activate_saved_connection(uuid: &str) -> Result<()> {
    let output = Command::new("nmcli")
        .args(["connection", "up", "uuid", uuid])
        .output()
        .await?;

    if !output.status.success() {
        let err = nmcli_error_text(&output);
        if is_activation_queued(&err) {
            info!("Activation of {} queued", uuid);
            return Ok(());
        }
        return Err(anyhow!("Failed to activate connection: {}", err));
    }
    Ok(())
}

async fn connect_open_network(ssid: &str) -> Result<()> {
    let output = Command::new("nmcli")
        .args(["dev", "wifi", "connect", ssid])
        .output()
        .await?;

    if output.status.success() {
        return Ok(());
    }
    let err = nmcli_error_text(&output);
    if is_activation_queued(&err) {
        return Ok(());
    }
    Err(anyhow!("Failed to connect: {}", err))
}

async fn delete_connection(uuid: &str) -> Result<()> {
    let output = Command::new("nmcli")
        .args(["connection", "delete", "uuid", uuid])
        .output()
        .await?;

    if !output.status.success() {
        return Err(anyhow!("Failed to delete connection: {}", nmcli_error_text(&output)));
    }
    Ok(())
}

async fn get_saved_secret(uuid: &str, security: ShareSecurity) -> Result<String> {
    let field = if security == ShareSecurity::Wep {
        "802-11-wireless-security.wep-key0"
    } else {
        "802-11-wireless-security.psk"
    };
    let output = Command::new("nmcli")
        .args(["--show-secrets", "-g", field, "connection", "show", "uuid", uuid])
        .output()
        .await?;

    if !output.status.success() {
        return Err(anyhow!("Failed to get password: {}", nmcli_error_text(&output)));
    }

    let password = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if password.is_empty() {
        return Err(anyhow!("Empty password returned"));
    }
    Ok(password)
}

async fn open_url(url: &str) -> Result<()> {
    let status = Command::new("xdg-open").arg(url).status().await?;
    if !status.success() {
        return Err(anyhow!("xdg-open exited with {}", status));
    }
    Ok(())
}

/// `nmcli` arguments that write `config` to `profile`, or create a new
/// profile when there is none.
pub fn save_args(config: &WifiConfig, profile: Option<Uuid>, interface: Option<&str>) -> Vec<String> {
    let mut args: Vec<String> = match profile {
        Some(uuid) => vec!["connection".into(), "modify".into(), "uuid".into(), uuid.to_string()],
        None => vec![
            "connection".into(),
            "add".into(),
            "type".into(),
            "wifi".into(),
            "ifname".into(),
            interface.unwrap_or("*").to_string(),
            "con-name".into(),
            config.ssid.clone(),
            "ssid".into(),
            config.ssid.clone(),
        ],
    };

    args.push("802-11-wireless.hidden".into());
    args.push(if config.hidden { "yes" } else { "no" }.into());

    match config.security {
        WifiSecurity::Open => {}
        WifiSecurity::Wep => {
            args.extend(["wifi-sec.key-mgmt".into(), "none".into()]);
            args.extend(["wifi-sec.wep-key0".into(), config.password.clone()]);
        }
        WifiSecurity::Wpa => {
            args.extend(["wifi-sec.key-mgmt".into(), "wpa-psk".into()]);
            args.extend(["wifi-sec.psk".into(), config.password.clone()]);
        }
        WifiSecurity::Sae => {
            args.extend(["wifi-sec.key-mgmt".into(), "sae".into()]);
            args.extend(["wifi-sec.psk".into(), config.password.clone()]);
        }
    }

    args
}

async fn save_profile(config: &WifiConfig, profile: Option<Uuid>, interface: Option<&str>) -> Result<()> {
    config.validate()?;
    let output = Command::new("nmcli")
        .args(save_args(config, profile, interface))
        .output()
        .await?;

    if !output.status.success() {
        return Err(anyhow!("Failed to save {}: {}", config.ssid, nmcli_error_text(&output)));
    }
    info!("Saved configuration for {}", config.ssid);
    Ok(())
}

fn nmcli_error_text(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn is_activation_queued(stderr: &str) -> bool {
    stderr.to_lowercase().contains("enqueued")
}

fn parse_u32_from_str(value: &str) -> u32 {
    let digits: String = value
        .chars()
        .take_while(|ch| ch.is_ascii_digit() || ch.is_whitespace())
        .filter(|ch| ch.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "--")
}

/// Splits one line of `nmcli -t` output on unescaped colons.
pub fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

async fn nmcli_key_value_map(args: &[&str]) -> Result<HashMap<String, String>> {
    let output = Command::new("nmcli").args(args).output().await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("nmcli failed: {}", stderr.trim()));
    }

    Ok(parse_key_value_output(&output.stdout))
}

pub fn parse_key_value_output(stdout: &[u8]) -> HashMap<String, String> {
    let text = String::from_utf8_lossy(stdout);
    let mut map = HashMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        map.insert(key.trim().to_string(), value.trim().replace("\\:", ":"));
    }

    map
}

fn collect_indexed_values(map: &HashMap<String, String>, prefix: &str) -> Vec<String> {
    let mut items: Vec<(u32, String)> = map
        .iter()
        .filter_map(|(k, v)| {
            let rest = k.strip_prefix(prefix)?;
            if !(rest.is_empty() || rest.starts_with('[')) {
                return None;
            }
            let idx = rest
                .strip_prefix('[')
                .and_then(|rest| rest.split_once(']'))
                .and_then(|(num, _)| num.parse::<u32>().ok())
                .unwrap_or(0);
            let value = v.trim();
            if value.is_empty() || value == "--" {
                return None;
            }
            Some((idx, value.to_string()))
        })
        .collect();

    items.sort_by_key(|(idx, _)| *idx);
    items.into_iter().map(|(_, v)| v).collect()
}
