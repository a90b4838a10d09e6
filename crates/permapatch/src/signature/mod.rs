mod profile;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::patch::{Direction, SiteState};

pub use profile::*;

/// Size of every patch payload
pub const PAYLOAD_LEN: usize = 4;

pub type Payload = [u8; PAYLOAD_LEN];

/// Exact byte sequence identifying a code location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    name: String,
    bytes: Vec<u8>,
}

impl Signature {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        if bytes.is_empty() {
            return Err(Error::InvalidSignature(format!(
                "Signature '{}' is empty",
                name
            )));
        }
        Ok(Self { name, bytes })
    }

    /// Build a signature from a space separated hex string (e.g. `"80 83 00 58"`)
    pub fn from_hex(name: impl Into<String>, pattern: &str) -> Result<Self> {
        Self::new(name, parse_pattern(pattern)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Where and what to write relative to a signature match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatchDescriptor {
    /// Distance from the match position to the patch site
    pub delta: u64,
    pub patched: Payload,
    pub unpatched: Payload,
}

impl PatchDescriptor {
    pub fn new(delta: u64, patched: Payload, unpatched: Payload) -> Result<Self> {
        if patched == unpatched {
            return Err(Error::InvalidSignature(format!(
                "Patched and unpatched payloads are identical ({})",
                format_pattern(&patched)
            )));
        }
        Ok(Self {
            delta,
            patched,
            unpatched,
        })
    }

    /// Patch site address for a match at `match_offset`
    pub fn site(&self, match_offset: u64) -> u64 {
        match_offset + self.delta
    }

    /// Payload written for `direction`
    pub fn payload(&self, direction: Direction) -> Payload {
        match direction {
            Direction::Install => self.patched,
            Direction::Remove => self.unpatched,
        }
    }

    pub fn classify(&self, found: Payload) -> SiteState {
        if found == self.patched {
            SiteState::Patched
        } else if found == self.unpatched {
            SiteState::Unpatched
        } else {
            SiteState::Unrecognized { found }
        }
    }
}

/// A signature and the patch toggled at each of its matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchGroup {
    pub id: String,
    pub display_name: String,
    pub signature: Signature,
    pub descriptor: PatchDescriptor,
    /// Human-readable meaning of the patched state
    pub modded_label: String,
    /// Human-readable meaning of the unpatched state
    pub vanilla_label: String,
}

impl PatchGroup {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        signature: Signature,
        descriptor: PatchDescriptor,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            signature,
            descriptor,
            modded_label: "Modded".to_string(),
            vanilla_label: "Vanilla".to_string(),
        }
    }

    pub fn with_labels(mut self, modded: impl Into<String>, vanilla: impl Into<String>) -> Self {
        self.modded_label = modded.into();
        self.vanilla_label = vanilla.into();
        self
    }
}

pub fn parse_pattern(pattern: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        let value = u8::from_str_radix(token, 16).map_err(|e| {
            Error::InvalidSignature(format!("Invalid signature token '{}': {}", token, e))
        })?;
        bytes.push(value);
    }

    if bytes.is_empty() {
        return Err(Error::InvalidSignature(
            "Signature pattern is empty".to_string(),
        ));
    }

    Ok(bytes)
}

pub fn format_pattern(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern() {
        let bytes = parse_pattern("80 83 00 58").unwrap();
        assert_eq!(bytes, vec![0x80, 0x83, 0x00, 0x58]);
    }

    #[test]
    fn test_parse_pattern_rejects_wildcards() {
        assert!(parse_pattern("80 ?? 00").is_err());
        assert!(parse_pattern("   ").is_err());
    }

    #[test]
    fn test_format_pattern() {
        assert_eq!(format_pattern(&[0x48, 0x00, 0x03, 0x6C]), "48 00 03 6C");
    }

    #[test]
    fn test_empty_signature_rejected() {
        assert!(Signature::new("empty", Vec::new()).is_err());
    }

    #[test]
    fn test_descriptor_rejects_identical_payloads() {
        assert!(PatchDescriptor::new(4, [1, 2, 3, 4], [1, 2, 3, 4]).is_err());
    }

    #[test]
    fn test_descriptor_classify() {
        let descriptor =
            PatchDescriptor::new(0xC, [0x48, 0x00, 0x03, 0x6C], [0x41, 0x81, 0x03, 0x78]).unwrap();
        assert_eq!(descriptor.classify([0x48, 0x00, 0x03, 0x6C]), SiteState::Patched);
        assert_eq!(descriptor.classify([0x41, 0x81, 0x03, 0x78]), SiteState::Unpatched);
        assert_eq!(
            descriptor.classify([0xFF; 4]),
            SiteState::Unrecognized { found: [0xFF; 4] }
        );
        assert_eq!(descriptor.site(0x304050), 0x30405C);
        assert_eq!(descriptor.payload(Direction::Remove), [0x41, 0x81, 0x03, 0x78]);
    }
}
