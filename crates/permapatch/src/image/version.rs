//! Disc header version detection
//!
//! The disc header carries a 6-byte game code at `0x00` and a revision byte at
//! `0x07`. Revision bytes are checked first because they separate revisions
//! that share a game code; the game code is the fallback discriminator.

use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::debug;

use crate::error::Result;
use crate::image::ImageHandle;

/// Address of the game code in the disc header
pub const GAME_CODE_ADDRESS: u64 = 0x00;
/// Address of the revision byte in the disc header
pub const VERSION_BYTE_ADDRESS: u64 = 0x07;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr, EnumIter,
)]
pub enum ImageVersion {
    #[strum(serialize = "USA v1.0")]
    UsaV1_0,
    #[strum(serialize = "USA v1.1")]
    UsaV1_1,
    #[strum(serialize = "USA v1.2")]
    UsaV1_2,
    #[strum(serialize = "Europe")]
    Europe,
    #[strum(serialize = "Japan")]
    Japan,
    #[strum(serialize = "Korea")]
    Korea,
}

/// A single header test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRule {
    VersionByte(u8),
    GameCode([u8; 6]),
}

/// Detection table, in priority order
pub const VERSION_RULES: &[(HeaderRule, ImageVersion)] = &[
    (HeaderRule::VersionByte(0x30), ImageVersion::Korea),
    (HeaderRule::VersionByte(0x01), ImageVersion::UsaV1_1),
    (HeaderRule::VersionByte(0x02), ImageVersion::UsaV1_2),
    (HeaderRule::GameCode(*b"GM8E01"), ImageVersion::UsaV1_0),
    (HeaderRule::GameCode(*b"GM8P01"), ImageVersion::Europe),
    (HeaderRule::GameCode(*b"GM8J01"), ImageVersion::Japan),
];

/// Detect the image variant from its header.
///
/// Returns `Ok(None)` for a readable header that matches no rule. A header
/// too short to read is an error, not an unrecognized image.
pub fn detect_version<H: ImageHandle>(image: &mut H) -> Result<Option<ImageVersion>> {
    detect_version_with(image, VERSION_RULES)
}

/// Detect the image variant using a custom rule table
pub fn detect_version_with<H: ImageHandle>(
    image: &mut H,
    rules: &[(HeaderRule, ImageVersion)],
) -> Result<Option<ImageVersion>> {
    let mut version_byte: Option<u8> = None;
    let mut game_code: Option<[u8; 6]> = None;

    for (rule, version) in rules {
        let matched = match rule {
            HeaderRule::VersionByte(expected) => {
                let value = match version_byte {
                    Some(value) => value,
                    None => {
                        let [value] = image.read_array::<1>(VERSION_BYTE_ADDRESS)?;
                        version_byte = Some(value);
                        value
                    }
                };
                value == *expected
            }
            HeaderRule::GameCode(expected) => {
                let code = match game_code {
                    Some(code) => code,
                    None => {
                        let code = image.read_array::<6>(GAME_CODE_ADDRESS)?;
                        game_code = Some(code);
                        code
                    }
                };
                code == *expected
            }
        };

        if matched {
            debug!("Header matched {:?} -> {}", rule, version);
            return Ok(Some(*version));
        }
    }

    debug!(
        "No header rule matched (version byte {:?}, game code {:?})",
        version_byte, game_code
    );
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(game_code: &[u8; 6], version_byte: u8) -> Cursor<Vec<u8>> {
        let mut data = vec![0u8; 0x20];
        data[..6].copy_from_slice(game_code);
        data[VERSION_BYTE_ADDRESS as usize] = version_byte;
        Cursor::new(data)
    }

    #[test]
    fn test_detect_usa_v1_0_by_game_code() {
        let mut image = header(b"GM8E01", 0x00);
        assert_eq!(detect_version(&mut image).unwrap(), Some(ImageVersion::UsaV1_0));
    }

    #[test]
    fn test_version_byte_takes_priority_over_game_code() {
        let mut image = header(b"GM8E01", 0x01);
        assert_eq!(detect_version(&mut image).unwrap(), Some(ImageVersion::UsaV1_1));

        let mut image = header(b"GM8E01", 0x02);
        assert_eq!(detect_version(&mut image).unwrap(), Some(ImageVersion::UsaV1_2));

        let mut image = header(b"GM8K01", 0x30);
        assert_eq!(detect_version(&mut image).unwrap(), Some(ImageVersion::Korea));
    }

    #[test]
    fn test_detect_regional_game_codes() {
        let mut image = header(b"GM8P01", 0x00);
        assert_eq!(detect_version(&mut image).unwrap(), Some(ImageVersion::Europe));

        let mut image = header(b"GM8J01", 0x00);
        assert_eq!(detect_version(&mut image).unwrap(), Some(ImageVersion::Japan));
    }

    #[test]
    fn test_unknown_header_is_unrecognized() {
        let mut image = header(b"GALE01", 0x00);
        assert_eq!(detect_version(&mut image).unwrap(), None);
    }

    #[test]
    fn test_truncated_header_is_read_error() {
        let mut image = Cursor::new(b"GM8E".to_vec());
        let err = detect_version(&mut image).unwrap_err();
        assert!(err.is_short_read());
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = [(HeaderRule::GameCode(*b"GALE01"), ImageVersion::Europe)];
        let mut image = header(b"GALE01", 0x00);
        assert_eq!(
            detect_version_with(&mut image, &rules).unwrap(),
            Some(ImageVersion::Europe)
        );
    }

    #[test]
    fn test_version_display_names() {
        assert_eq!(ImageVersion::UsaV1_0.to_string(), "USA v1.0");
        assert_eq!(ImageVersion::Korea.to_string(), "Korea");
        let name: &'static str = ImageVersion::Europe.into();
        assert_eq!(name, "Europe");
    }
}
