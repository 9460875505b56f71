// File: net.rs
// Location: /src/net.rs

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use uuid::Uuid;

/// Handle of one active network. Two handles are equal only when they
/// refer to the same activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Network(Uuid);

impl Network {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkAddress {
    pub address: IpAddr,
    pub prefix_len: u8,
}

impl LinkAddress {
    /// Parses `192.168.1.5/24` or `fe80::1/64`. A missing prefix means a
    /// host address.
    pub fn parse(cidr: &str) -> Option<Self> {
        let cidr = cidr.trim();
        let (ip, prefix) = match cidr.split_once('/') {
            Some((ip, prefix)) => (ip, Some(prefix)),
            None => (cidr, None),
        };
        let address: IpAddr = ip.trim().parse().ok()?;
        let max = if address.is_ipv4() { 32 } else { 128 };
        let prefix_len = match prefix {
            Some(p) => p.trim().parse::<u8>().ok()?,
            None => max,
        };
        if prefix_len > max {
            return None;
        }
        Some(Self { address, prefix_len })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteInfo {
    pub destination: IpAddr,
    pub prefix_len: u8,
    pub gateway: Option<IpAddr>,
}

impl RouteInfo {
    pub fn new(destination: IpAddr, prefix_len: u8, gateway: Option<IpAddr>) -> Self {
        Self {
            destination,
            prefix_len,
            gateway,
        }
    }

    pub fn ipv4_default(gateway: Ipv4Addr) -> Self {
        Self::new(
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            0,
            Some(IpAddr::V4(gateway)),
        )
    }

    pub fn is_ipv4_default(&self) -> bool {
        self.destination.is_ipv4() && self.prefix_len == 0
    }

    pub fn has_gateway(&self) -> bool {
        self.gateway.is_some_and(|gw| !gw.is_unspecified())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkProperties {
    pub interface_name: Option<String>,
    pub link_addresses: Vec<LinkAddress>,
    pub routes: Vec<RouteInfo>,
    pub dns_servers: Vec<IpAddr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Wifi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetCapability {
    Validated,
    CaptivePortal,
    PartialConnectivity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkCapabilities {
    pub validated: bool,
    pub captive_portal: bool,
    pub partial_connectivity: bool,
    pub private_dns_broken: bool,
}

impl NetworkCapabilities {
    pub fn has_capability(&self, capability: NetCapability) -> bool {
        match capability {
            NetCapability::Validated => self.validated,
            NetCapability::CaptivePortal => self.captive_portal,
            NetCapability::PartialConnectivity => self.partial_connectivity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Connected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub state: NetworkState,
    pub extra_info: Option<String>,
}

/// Link layer details of the current Wi-Fi association. Speeds of `-1`
/// are unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiInfo {
    pub tx_link_speed_mbps: i32,
    pub rx_link_speed_mbps: i32,
    pub rssi: i32,
    pub frequency_mhz: u32,
    pub mac_address: String,
}

pub const LINK_SPEED_UNKNOWN: i32 = -1;

/// Filter for network callback registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRequest {
    pub transports: Vec<Transport>,
}

impl NetworkRequest {
    /// No capability requirements, Wi-Fi transport only.
    pub fn wifi() -> Self {
        Self {
            transports: vec![Transport::Wifi],
        }
    }

    pub fn matches(&self, transport: Transport) -> bool {
        self.transports.contains(&transport)
    }
}

pub fn ipv4_prefix_to_subnet_mask(prefix_len: u8) -> Option<Ipv4Addr> {
    if prefix_len > 32 {
        return None;
    }
    let mask: u32 = if prefix_len == 0 {
        0
    } else {
        (!0u32) << (32 - prefix_len)
    };
    Some(Ipv4Addr::from(mask))
}
