//! IPv4 address arithmetic for static interface stanzas.

use std::net::Ipv4Addr;

use crate::error::{Error, Result};

/// Parse a dotted-quad IPv4 address.
pub fn parse_ipv4(value: &str) -> Result<Ipv4Addr> {
    value
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|e| Error::invalid_address(value, e.to_string()))
}

/// Compute `(network, broadcast)` for `ip` within `netmask`.
///
/// network = ip & mask, broadcast = network | !mask. Non-contiguous masks
/// produce a well-defined result and are only reported in the log.
pub fn compute_network_and_broadcast(ip: &str, netmask: &str) -> Result<(Ipv4Addr, Ipv4Addr)> {
    let addr = u32::from(parse_ipv4(ip)?);
    let mask_addr = parse_ipv4(netmask)?;
    if !is_contiguous_netmask(mask_addr) {
        log::warn!("Netmask {netmask} is not contiguous; computing {ip} bitwise anyway");
    }
    let mask = u32::from(mask_addr);

    let network = addr & mask;
    let broadcast = network | !mask;
    Ok((Ipv4Addr::from(network), Ipv4Addr::from(broadcast)))
}

/// A contiguous mask is some number of one bits followed only by zero bits.
pub fn is_contiguous_netmask(mask: Ipv4Addr) -> bool {
    let bits = u32::from(mask);
    bits.leading_ones() + bits.trailing_zeros() == 32
}
