// File: screen.rs
// Location: /src/screen.rs
//
// Headless model of the detail screen. Each field is one row; a renderer
// reads it, the controller writes it.

pub const KEY_HEADER: &str = "connection_header";
pub const KEY_BUTTONS_PREF: &str = "buttons";
pub const KEY_SIGNAL_STRENGTH_PREF: &str = "signal_strength";
pub const KEY_TX_LINK_SPEED: &str = "tx_link_speed";
pub const KEY_RX_LINK_SPEED: &str = "rx_link_speed";
pub const KEY_FREQUENCY_PREF: &str = "frequency";
pub const KEY_SECURITY_PREF: &str = "security";
pub const KEY_SSID_PREF: &str = "ssid";
pub const KEY_MAC_ADDRESS_PREF: &str = "mac_address";
pub const KEY_IP_ADDRESS_PREF: &str = "ip_address";
pub const KEY_GATEWAY_PREF: &str = "gateway";
pub const KEY_SUBNET_MASK_PREF: &str = "subnet_mask";
pub const KEY_DNS_PREF: &str = "dns";
pub const KEY_IPV6_CATEGORY: &str = "ipv6_category";
pub const KEY_IPV6_ADDRESSES_PREF: &str = "ipv6_addresses";

pub mod strings {
    pub const SIGNAL_LEVELS: [&str; 5] = ["No signal", "Poor", "Fair", "Good", "Excellent"];

    pub const BAND_24GHZ: &str = "2.4 GHz";
    pub const BAND_5GHZ: &str = "5 GHz";

    pub const NOT_AVAILABLE: &str = "Not available";
    pub const RANDOMIZED_MAC_TITLE: &str = "Randomized MAC address";
    pub const DEVICE_MAC_TITLE: &str = "Device MAC address";

    pub const FORGET: &str = "Forget";
    pub const DISCONNECT: &str = "Disconnect";
    pub const SIGN_IN: &str = "Sign in";
    pub const CONNECT: &str = "Connect";
    pub const CONNECTING: &str = "Connecting…";
    pub const SHARE: &str = "Share";

    pub const NOT_IN_RANGE: &str = "Network not in range";
    pub const FAILED_CONNECT: &str = "Couldn't connect to network";
    pub const FAILED_SAVE: &str = "Couldn't save network";

    pub fn connected_to(title: &str) -> String {
        format!("Connected to {}", title)
    }

    pub fn link_speed(mbps: i32) -> String {
        format!("{} Mbps", mbps)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preference {
    pub key: &'static str,
    pub title: String,
    pub summary: Option<String>,
    pub icon: Option<String>,
    pub visible: bool,
}

impl Preference {
    pub fn new(key: &'static str, title: &str) -> Self {
        Self {
            key,
            title: title.to_string(),
            summary: None,
            icon: None,
            visible: true,
        }
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = Some(summary.into());
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn set_icon(&mut self, icon: String) {
        self.icon = Some(icon);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Shows the row with `text`, or hides it when there is nothing to show.
    pub fn update(&mut self, text: Option<&str>) {
        match text {
            Some(text) if !text.is_empty() => {
                self.set_summary(text);
                self.visible = true;
            }
            _ => self.visible = false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityHeader {
    pub label: String,
    pub summary: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailButton {
    Forget,
    SignIn,
    Connect,
    Share,
}

impl DetailButton {
    pub const ALL: [DetailButton; 4] = [
        DetailButton::Forget,
        DetailButton::SignIn,
        DetailButton::Connect,
        DetailButton::Share,
    ];

    fn index(self) -> usize {
        match self {
            DetailButton::Forget => 0,
            DetailButton::SignIn => 1,
            DetailButton::Connect => 2,
            DetailButton::Share => 3,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            DetailButton::Forget => "user-trash-symbolic",
            DetailButton::SignIn => "system-log-out-symbolic",
            DetailButton::Connect => "network-wireless-symbolic",
            DetailButton::Share => "qr-code-symbolic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub text: String,
    pub icon: &'static str,
    pub visible: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButtons {
    pub visible: bool,
    buttons: [ActionButton; 4],
}

impl Default for ActionButtons {
    fn default() -> Self {
        let button = |b: DetailButton| ActionButton {
            text: String::new(),
            icon: b.icon(),
            visible: true,
            enabled: true,
        };
        Self {
            visible: true,
            buttons: DetailButton::ALL.map(button),
        }
    }
}

impl ActionButtons {
    pub fn get(&self, button: DetailButton) -> &ActionButton {
        &self.buttons[button.index()]
    }

    pub fn get_mut(&mut self, button: DetailButton) -> &mut ActionButton {
        &mut self.buttons[button.index()]
    }

    pub fn set_text(&mut self, button: DetailButton, text: &str) -> &mut Self {
        self.get_mut(button).text = text.to_string();
        self
    }

    pub fn set_visible(&mut self, button: DetailButton, visible: bool) -> &mut Self {
        self.get_mut(button).visible = visible;
        self
    }

    pub fn set_enabled(&mut self, button: DetailButton, enabled: bool) -> &mut Self {
        self.get_mut(button).enabled = enabled;
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (DetailButton, &ActionButton)> {
        DetailButton::ALL.into_iter().map(move |b| (b, self.get(b)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceCategory {
    pub key: &'static str,
    pub title: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceScreen {
    pub header: EntityHeader,
    pub buttons: ActionButtons,
    pub signal_strength: Preference,
    pub tx_link_speed: Preference,
    pub rx_link_speed: Preference,
    pub frequency: Preference,
    pub security: Preference,
    pub ssid: Preference,
    pub mac_address: Preference,
    pub ip_address: Preference,
    pub gateway: Preference,
    pub subnet_mask: Preference,
    pub dns: Preference,
    pub ipv6_category: PreferenceCategory,
    pub ipv6_addresses: Preference,
}

impl Default for PreferenceScreen {
    fn default() -> Self {
        Self {
            header: EntityHeader::default(),
            buttons: ActionButtons::default(),
            signal_strength: Preference::new(KEY_SIGNAL_STRENGTH_PREF, "Signal strength"),
            tx_link_speed: Preference::new(KEY_TX_LINK_SPEED, "Transmit link speed"),
            rx_link_speed: Preference::new(KEY_RX_LINK_SPEED, "Receive link speed"),
            frequency: Preference::new(KEY_FREQUENCY_PREF, "Frequency"),
            security: Preference::new(KEY_SECURITY_PREF, "Security"),
            ssid: Preference::new(KEY_SSID_PREF, "Network name"),
            mac_address: Preference::new(KEY_MAC_ADDRESS_PREF, "MAC address"),
            ip_address: Preference::new(KEY_IP_ADDRESS_PREF, "IP address"),
            gateway: Preference::new(KEY_GATEWAY_PREF, "Gateway"),
            subnet_mask: Preference::new(KEY_SUBNET_MASK_PREF, "Subnet mask"),
            dns: Preference::new(KEY_DNS_PREF, "DNS"),
            ipv6_category: PreferenceCategory {
                key: KEY_IPV6_CATEGORY,
                title: "IPv6".to_string(),
                visible: true,
            },
            ipv6_addresses: Preference::new(KEY_IPV6_ADDRESSES_PREF, "IPv6 addresses"),
        }
    }
}

impl PreferenceScreen {
    /// Rows in display order, header and buttons excluded.
    pub fn rows(&self) -> [&Preference; 12] {
        [
            &self.signal_strength,
            &self.tx_link_speed,
            &self.rx_link_speed,
            &self.frequency,
            &self.security,
            &self.ssid,
            &self.mac_address,
            &self.ip_address,
            &self.gateway,
            &self.subnet_mask,
            &self.dns,
            &self.ipv6_addresses,
        ]
    }

    pub fn find(&self, key: &str) -> Option<&Preference> {
        self.rows().into_iter().find(|p| p.key == key)
    }

    pub fn hide_ip_layer(&mut self) {
        self.ip_address.set_visible(false);
        self.subnet_mask.set_visible(false);
        self.gateway.set_visible(false);
        self.dns.set_visible(false);
        self.ipv6_category.visible = false;
    }
}
