use std::net::{IpAddr, Ipv4Addr};

/// Non-loopback IPv4 addresses of this machine, skipping link-local ones.
pub fn local_ipv4_addrs() -> Vec<Ipv4Addr> {
    let Ok(interfaces) = if_addrs::get_if_addrs() else {
        return Vec::new();
    };

    interfaces
        .into_iter()
        .filter(|iface| !iface.is_loopback())
        .filter_map(|iface| match iface.ip() {
            IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_link_local() => Some(ip),
            _ => None,
        })
        .collect()
}

/// First address whose dotted form starts with `prefix`.
pub fn pick_lan_ip(addrs: &[Ipv4Addr], prefix: &str) -> Option<Ipv4Addr> {
    addrs
        .iter()
        .copied()
        .find(|ip| ip.to_string().starts_with(prefix))
}

pub fn detect_lan_ip(prefix: &str) -> Option<Ipv4Addr> {
    pick_lan_ip(&local_ipv4_addrs(), prefix)
}
