//! Number parsing and address formatting utilities.

use anyhow::Result;

/// Parse a number given either in decimal or as 0x-prefixed hex.
pub fn parse_number(s: &str) -> Result<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map_err(|e| anyhow::anyhow!("Invalid hex number: {}", e));
    }
    s.parse::<u64>()
        .map_err(|e| anyhow::anyhow!("Invalid number: {}", e))
}

/// Format an address as a hex string with 0x prefix.
pub fn format_hex_address(addr: u64) -> String {
    format!("0x{:X}", addr)
}
