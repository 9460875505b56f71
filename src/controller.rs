// File: controller.rs
// Location: /src/controller.rs

use std::net::IpAddr;
use std::rc::Rc;

use log::{debug, error, info, warn};

use crate::config::WifiConfig;
use crate::entry::{
    ConnectCallback, ConnectStatus, ConnectedState, ForgetCallback, ForgetStatus, NetworkCallback,
    Privacy, SaveStatus, ShareConfig, SignInCallback, SignInStatus, WIFI_LEVEL_UNREACHABLE,
    WifiEntry, WifiEntryCallback,
};
use crate::events::EventSink;
use crate::net::{
    LinkProperties, NetCapability, Network, NetworkCapabilities, NetworkRequest,
    ipv4_prefix_to_subnet_mask,
};
use crate::platform::{ConnectivityManager, DetailsHost, IconInjector, WifiManager};
use crate::qr;
use crate::screen::{DetailButton, PreferenceScreen, strings};
use crate::snapshot::NetworkSnapshot;

pub const LOWER_FREQ_24GHZ: u32 = 2400;
pub const HIGHER_FREQ_24GHZ: u32 = 2500;
pub const LOWER_FREQ_5GHZ: u32 = 5000;
pub const HIGHER_FREQ_5GHZ: u32 = 6000;

pub const DEFAULT_MAC_ADDRESS: &str = "02:00:00:00:00:00";
const ZERO_MAC_ADDRESS: &str = "00:00:00:00:00:00";

/// Collaborators of the detail screen.
pub struct Collaborators {
    pub entry: Rc<dyn WifiEntry>,
    pub connectivity: Rc<dyn ConnectivityManager>,
    pub wifi_manager: Rc<dyn WifiManager>,
    pub host: Rc<dyn DetailsHost>,
    pub icons: Box<dyn IconInjector>,
}

/// Keeps the Wi-Fi detail screen in sync with one entry and the network
/// it is connected to.
///
/// Everything runs on the thread that owns the controller: collaborators
/// post [`crate::events::DetailEvent`]s and the owner dispatches them here.
pub struct WifiDetailController {
    entry: Rc<dyn WifiEntry>,
    connectivity: Rc<dyn ConnectivityManager>,
    wifi_manager: Rc<dyn WifiManager>,
    host: Rc<dyn DetailsHost>,
    icons: Box<dyn IconInjector>,
    sink: EventSink,
    screen: PreferenceScreen,
    snapshot: Option<NetworkSnapshot>,
    snapshot_state: ConnectedState,
    rssi_signal_level: i32,
    started: bool,
}

impl WifiDetailController {
    pub fn new(collaborators: Collaborators, sink: EventSink) -> Self {
        let Collaborators {
            entry,
            connectivity,
            wifi_manager,
            host,
            icons,
        } = collaborators;

        entry.set_listener(sink.clone());
        let snapshot_state = entry.connected_state();

        let mut controller = Self {
            entry,
            connectivity,
            wifi_manager,
            host,
            icons,
            sink,
            screen: PreferenceScreen::default(),
            snapshot: None,
            snapshot_state,
            rssi_signal_level: WIFI_LEVEL_UNREACHABLE,
            started: false,
        };
        controller.display_preference();
        controller
    }

    pub fn screen(&self) -> &PreferenceScreen {
        &self.screen
    }

    pub fn snapshot(&self) -> Option<&NetworkSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    fn display_preference(&mut self) {
        self.screen.header.label = self.entry.title();

        let forget_text = if self.entry.is_saved() {
            strings::FORGET
        } else {
            strings::DISCONNECT
        };
        self.screen
            .buttons
            .set_text(DetailButton::Forget, forget_text)
            .set_text(DetailButton::SignIn, strings::SIGN_IN)
            .set_text(DetailButton::Connect, strings::CONNECT)
            .set_enabled(DetailButton::Connect, true)
            .set_text(DetailButton::Share, strings::SHARE);

        let security = self.entry.security_string(false);
        self.screen.security.set_summary(security);
    }

    /// Snapshots network state, refreshes every row and starts listening to
    /// Wi-Fi network callbacks. The snapshot is in place before any callback
    /// can arrive.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.update_network_info();
        self.refresh_page();
        self.connectivity
            .register_network_callback(&NetworkRequest::wifi(), self.sink.clone());
        self.started = true;
    }

    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        self.connectivity.unregister_network_callback();
        self.started = false;
    }

    fn update_network_info(&mut self) {
        self.snapshot_state = self.entry.connected_state();
        self.snapshot = if self.snapshot_state == ConnectedState::Connected {
            NetworkSnapshot::capture(self.wifi_manager.as_ref(), self.connectivity.as_ref())
        } else {
            None
        };
    }

    fn current_network(&self) -> Option<Network> {
        self.snapshot.as_ref().map(NetworkSnapshot::network)
    }

    pub fn refresh_page(&mut self) {
        debug!("Update UI for {}", self.screen.header.label);

        self.refresh_entity_header();
        self.refresh_buttons();
        self.refresh_rssi_views();
        self.refresh_frequency();
        self.refresh_tx_speed();
        self.refresh_rx_speed();
        self.refresh_ip_layer_info();
        self.refresh_ssid();
        self.refresh_mac_address();
    }

    fn refresh_entity_header(&mut self) {
        self.screen.header.summary = self.entry.summary();
    }

    fn refresh_buttons(&mut self) {
        let connecting = self.entry.connected_state() == ConnectedState::Connecting;
        let can_forget = self.entry.can_forget();
        let can_sign_in = self.entry.can_sign_in();
        let show_connect = self.entry.can_connect() || connecting;
        let can_share = self.entry.can_share();

        let buttons = &mut self.screen.buttons;
        buttons
            .set_visible(DetailButton::Forget, can_forget)
            .set_visible(DetailButton::SignIn, can_sign_in)
            .set_visible(DetailButton::Connect, show_connect);
        if show_connect {
            if connecting {
                buttons
                    .set_text(DetailButton::Connect, strings::CONNECTING)
                    .set_enabled(DetailButton::Connect, false);
            } else {
                buttons
                    .set_text(DetailButton::Connect, strings::CONNECT)
                    .set_enabled(DetailButton::Connect, true);
            }
        }
        buttons.set_visible(DetailButton::Share, can_share);
        buttons.visible = can_forget || can_sign_in || show_connect || can_share;
    }

    fn refresh_rssi_views(&mut self) {
        let level = self.entry.level();

        // Saved networks out of range have no signal to show.
        if level == WIFI_LEVEL_UNREACHABLE {
            self.screen.signal_strength.set_visible(false);
            self.rssi_signal_level = WIFI_LEVEL_UNREACHABLE;
            return;
        }

        if self.rssi_signal_level == level {
            return;
        }
        self.rssi_signal_level = level;

        let icon = self.icons.icon(level);
        self.screen.header.icon = Some(icon.clone());
        self.screen.signal_strength.set_icon(icon);

        let label = usize::try_from(level)
            .ok()
            .and_then(|idx| strings::SIGNAL_LEVELS.get(idx))
            .copied()
            .unwrap_or(strings::SIGNAL_LEVELS[strings::SIGNAL_LEVELS.len() - 1]);
        self.screen.signal_strength.set_summary(label);
        self.screen.signal_strength.set_visible(true);
    }

    fn refresh_frequency(&mut self) {
        let Some(info) = self.entry.connected_info() else {
            self.screen.frequency.set_visible(false);
            return;
        };

        let frequency = info.frequency_mhz;
        let band = if (LOWER_FREQ_24GHZ..HIGHER_FREQ_24GHZ).contains(&frequency) {
            strings::BAND_24GHZ
        } else if (LOWER_FREQ_5GHZ..HIGHER_FREQ_5GHZ).contains(&frequency) {
            strings::BAND_5GHZ
        } else {
            // Connecting reports transient frequencies.
            if self.entry.connected_state() != ConnectedState::Connecting {
                error!("Unexpected frequency {}", frequency);
            }
            self.screen.frequency.set_visible(false);
            return;
        };

        self.screen.frequency.set_summary(band);
        self.screen.frequency.set_visible(true);
    }

    fn refresh_tx_speed(&mut self) {
        let speed = self
            .snapshot
            .as_ref()
            .and_then(NetworkSnapshot::wifi_info)
            .map(|info| info.tx_link_speed_mbps);
        let row = &mut self.screen.tx_link_speed;
        match speed {
            Some(mbps) => {
                row.set_visible(mbps >= 0);
                row.set_summary(strings::link_speed(mbps));
            }
            None => row.set_visible(false),
        }
    }

    fn refresh_rx_speed(&mut self) {
        let speed = self
            .snapshot
            .as_ref()
            .and_then(NetworkSnapshot::wifi_info)
            .map(|info| info.rx_link_speed_mbps);
        let row = &mut self.screen.rx_link_speed;
        match speed {
            Some(mbps) => {
                row.set_visible(mbps >= 0);
                row.set_summary(strings::link_speed(mbps));
            }
            None => row.set_visible(false),
        }
    }

    fn refresh_ip_layer_info(&mut self) {
        let link_properties = match &self.snapshot {
            Some(snapshot) if self.entry.connected_state() == ConnectedState::Connected => {
                snapshot.link_properties()
            }
            _ => None,
        };
        let Some(lp) = link_properties else {
            self.screen.hide_ip_layer();
            return;
        };

        let details = IpLayerDetails::from_link_properties(lp);

        self.screen.ip_address.update(details.ipv4_address.as_deref());
        self.screen.subnet_mask.update(details.subnet_mask.as_deref());
        self.screen.gateway.update(details.gateway.as_deref());
        self.screen.dns.update(Some(&details.dns_servers));

        if details.ipv6_addresses.is_empty() {
            self.screen.ipv6_category.visible = false;
        } else {
            self.screen.ipv6_addresses.set_summary(details.ipv6_addresses);
            self.screen.ipv6_category.visible = true;
        }
    }

    fn refresh_ssid(&mut self) {
        if self.entry.is_passpoint() || self.entry.is_osu_provider() {
            self.screen.ssid.set_summary(self.entry.title());
            self.screen.ssid.set_visible(true);
        } else {
            self.screen.ssid.set_visible(false);
        }
    }

    fn refresh_mac_address(&mut self) {
        let Some(mac) = self.mac_address() else {
            self.screen.mac_address.set_visible(false);
            return;
        };

        self.screen.mac_address.set_visible(true);
        if mac.eq_ignore_ascii_case(DEFAULT_MAC_ADDRESS) || mac == ZERO_MAC_ADDRESS {
            self.screen.mac_address.set_summary(strings::NOT_AVAILABLE);
        } else {
            self.screen.mac_address.set_summary(mac);
        }

        self.refresh_mac_title();
    }

    fn mac_address(&self) -> Option<String> {
        if self.entry.is_saved() && self.entry.privacy() == Privacy::RandomizedMac {
            return self.entry.mac_address();
        }

        let factory = self.wifi_manager.factory_mac_addresses();
        if let Some(mac) = factory.into_iter().next() {
            return Some(mac);
        }

        error!("Can't get device MAC address!");
        None
    }

    fn refresh_mac_title(&mut self) {
        if !self.entry.is_saved() {
            return;
        }

        // Passpoint always uses a randomized address; the title stays generic.
        if self.entry.is_passpoint() {
            return;
        }

        let title = if self.entry.privacy() == Privacy::RandomizedMac {
            strings::RANDOMIZED_MAC_TITLE
        } else {
            strings::DEVICE_MAC_TITLE
        };
        self.screen.mac_address.set_title(title);
    }

    pub fn can_modify_network(&self) -> bool {
        self.entry.is_saved() && !self.entry.is_locked_down()
    }

    pub fn on_button_clicked(&mut self, button: DetailButton) {
        let state = self.screen.buttons.get(button);
        if !self.screen.buttons.visible || !state.visible || !state.enabled {
            debug!("Ignoring click on inactive {:?} button", button);
            return;
        }
        match button {
            DetailButton::Forget => self.forget_network(),
            DetailButton::SignIn => self.sign_into_network(),
            DetailButton::Connect => self.connect_network(),
            DetailButton::Share => self.share_network(),
        }
    }

    pub fn connect_network(&mut self) {
        info!("Connecting to {}", self.entry.title());
        self.entry.connect(self.sink.clone());
    }

    pub fn forget_network(&mut self) {
        if self.entry.is_passpoint() {
            self.host
                .confirm_forget_passpoint(&self.entry.title(), self.sink.clone());
            return;
        }

        if let Err(e) = self.entry.forget(self.sink.clone()) {
            warn!("Failed to forget {}: {}", self.entry.title(), e);
        }
        self.host.finish();
    }

    /// The user confirmed removal of a passpoint profile.
    pub fn forget_confirmed(&mut self) {
        if let Err(e) = self.entry.forget(self.sink.clone()) {
            error!(
                "Failed to remove Passpoint configuration for {}: {}",
                self.entry.passpoint_fqdn().unwrap_or_default(),
                e
            );
        }
        self.host.finish();
    }

    pub fn sign_into_network(&mut self) {
        info!("Signing in to {}", self.entry.title());
        self.entry.sign_in(self.sink.clone());
    }

    pub fn share_network(&mut self) {
        self.host.show_lock_screen(self.sink.clone());
    }

    /// Lock screen passed; fetch credentials from the entry.
    pub fn launch_share(&mut self) {
        self.entry.share(self.sink.clone());
    }

    pub fn on_share_result(&mut self, config: Option<ShareConfig>) {
        match config {
            Some(config) => {
                let payload = qr::wifi_payload(&config);
                self.host.show_share_qr(&config.ssid, &payload);
            }
            None => error!("Launch Wi-Fi QR code generator with a wrong Wi-Fi network!"),
        }
    }

    pub fn on_submit(&mut self, config: WifiConfig) {
        if let Err(e) = config.validate() {
            warn!("Rejected configuration for {}: {}", config.ssid, e);
            self.host.show_toast(strings::FAILED_SAVE);
            return;
        }
        self.wifi_manager.save(config, self.sink.clone());
    }

    pub fn on_save_result(&mut self, status: SaveStatus) {
        if let SaveStatus::Failure(reason) = status {
            warn!("Saving network failed: {}", reason);
            self.host.show_toast(strings::FAILED_SAVE);
        }
    }
}

impl WifiEntryCallback for WifiDetailController {
    fn on_updated(&mut self) {
        let state = self.entry.connected_state();
        // Still connected, but to a different network handle.
        let moved = state == ConnectedState::Connected
            && self.wifi_manager.current_network() != self.current_network();
        if state != self.snapshot_state || moved {
            self.update_network_info();
        }
        self.refresh_page();
    }
}

impl ConnectCallback for WifiDetailController {
    fn on_connect_result(&mut self, status: ConnectStatus) {
        let message = if status == ConnectStatus::Success {
            strings::connected_to(&self.entry.title())
        } else if self.entry.level() == WIFI_LEVEL_UNREACHABLE {
            strings::NOT_IN_RANGE.to_string()
        } else {
            strings::FAILED_CONNECT.to_string()
        };
        self.host.show_toast(&message);

        self.screen
            .buttons
            .set_text(DetailButton::Connect, strings::CONNECT)
            .set_enabled(DetailButton::Connect, true)
            .set_visible(DetailButton::Connect, true);
    }
}

impl ForgetCallback for WifiDetailController {
    fn on_forget_result(&mut self, status: ForgetStatus) {
        if status != ForgetStatus::Success {
            error!("Forget Wi-Fi network failed");
        }
        self.host.finish();
    }
}

impl SignInCallback for WifiDetailController {
    fn on_sign_in_result(&mut self, status: SignInStatus) {
        if status != SignInStatus::Success {
            warn!("Sign in to {} failed", self.entry.title());
        }
        self.refresh_page();
    }
}

impl NetworkCallback for WifiDetailController {
    fn on_link_properties_changed(&mut self, network: Network, link_properties: LinkProperties) {
        let next = match &self.snapshot {
            Some(snapshot)
                if snapshot.network() == network
                    && snapshot.link_properties() != Some(&link_properties) =>
            {
                snapshot.with_link_properties(link_properties)
            }
            _ => return,
        };
        self.snapshot = Some(next);
        self.refresh_ip_layer_info();
    }

    fn on_capabilities_changed(&mut self, network: Network, capabilities: NetworkCapabilities) {
        let (refresh_header, next) = match &self.snapshot {
            Some(snapshot)
                if snapshot.network() == network
                    && snapshot.capabilities() != Some(&capabilities) =>
            {
                (
                    header_relevant_change(snapshot.capabilities(), &capabilities),
                    snapshot.with_capabilities(capabilities),
                )
            }
            _ => return,
        };

        // Header summary only on flips the user can see.
        if refresh_header {
            self.refresh_entity_header();
        }
        self.snapshot = Some(next);
        self.refresh_buttons();
        self.refresh_ip_layer_info();
    }

    fn on_lost(&mut self, network: Network) {
        // An unsaved network has nothing left to show once it is gone.
        if !self.entry.is_saved() && self.current_network() == Some(network) {
            debug!("Network {} lost, leaving details", network);
            self.host.finish();
        }
    }
}

fn header_relevant_change(
    previous: Option<&NetworkCapabilities>,
    next: &NetworkCapabilities,
) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    previous.private_dns_broken != next.private_dns_broken
        || [
            NetCapability::Validated,
            NetCapability::CaptivePortal,
            NetCapability::PartialConnectivity,
        ]
        .into_iter()
        .any(|cap| previous.has_capability(cap) != next.has_capability(cap))
}

/// Display strings for the IP rows.
#[derive(Debug, Default, PartialEq, Eq)]
struct IpLayerDetails {
    ipv4_address: Option<String>,
    subnet_mask: Option<String>,
    gateway: Option<String>,
    dns_servers: String,
    ipv6_addresses: String,
}

impl IpLayerDetails {
    fn from_link_properties(lp: &LinkProperties) -> Self {
        let first_ipv4 = lp.link_addresses.iter().find(|la| la.address.is_ipv4());

        let ipv6_addresses: Vec<String> = lp
            .link_addresses
            .iter()
            .filter(|la| la.address.is_ipv6())
            .map(|la| la.address.to_string())
            .collect();

        let gateway = lp
            .routes
            .iter()
            .find(|route| route.is_ipv4_default() && route.has_gateway())
            .and_then(|route| route.gateway)
            .map(|gw| gw.to_string());

        let dns_servers: Vec<String> = lp.dns_servers.iter().map(IpAddr::to_string).collect();

        Self {
            ipv4_address: first_ipv4.map(|la| la.address.to_string()),
            subnet_mask: first_ipv4
                .and_then(|la| ipv4_prefix_to_subnet_mask(la.prefix_len))
                .map(|mask| mask.to_string()),
            gateway,
            dns_servers: dns_servers.join("\n"),
            ipv6_addresses: ipv6_addresses.join("\n"),
        }
    }
}
