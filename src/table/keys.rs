//! Key namespacing for the shared table
//!
//! An asset ID and a token value may be the same string, so each record kind
//! gets its own constant prefix before it becomes a primary key.

use crate::{Error, Result};

/// Prefix for asset metadata keys
pub const ASSET_KEY_PREFIX: &str = "ASSET_";
/// Prefix for token keys
pub const TOKEN_KEY_PREFIX: &str = "TOKEN_";

pub const ATTR_ASSET_NAME: &str = "AssetName";
pub const ATTR_SIZE: &str = "Size";
pub const ATTR_ASSET_ID: &str = "AssetID";

/// The two record kinds multiplexed into the table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    Asset,
    Token,
}

impl KeyKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            KeyKind::Asset => ASSET_KEY_PREFIX,
            KeyKind::Token => TOKEN_KEY_PREFIX,
        }
    }

    /// Namespace a logical identifier
    pub fn encode(&self, id: &str) -> String {
        let prefix = self.prefix();
        let mut key = String::with_capacity(prefix.len() + id.len());
        key.push_str(prefix);
        key.push_str(id);
        key
    }

    /// Strip exactly one leading prefix from a stored key
    ///
    /// Prefix text elsewhere in the identifier, including a second copy right
    /// after the first, is left alone.
    pub fn decode<'a>(&self, key: &'a str) -> Result<&'a str> {
        key.strip_prefix(self.prefix()).ok_or_else(|| {
            Error::Decode(format!(
                "key {:?} is missing the {:?} prefix",
                key,
                self.prefix()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_separate_equal_identifiers() {
        let asset = KeyKind::Asset.encode("same");
        let token = KeyKind::Token.encode("same");

        assert_eq!(asset, "ASSET_same");
        assert_eq!(token, "TOKEN_same");
        assert_ne!(asset, token);
    }

    #[test]
    fn test_decode_strips_single_leading_prefix() {
        let key = KeyKind::Asset.encode("ASSET_nested");
        assert_eq!(key, "ASSET_ASSET_nested");
        assert_eq!(KeyKind::Asset.decode(&key).unwrap(), "ASSET_nested");

        let key = KeyKind::Token.encode("a-TOKEN_-b");
        assert_eq!(KeyKind::Token.decode(&key).unwrap(), "a-TOKEN_-b");
    }

    #[test]
    fn test_decode_rejects_wrong_kind() {
        let key = KeyKind::Token.encode("t1");
        assert!(matches!(KeyKind::Asset.decode(&key), Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_empty_identifier() {
        assert_eq!(KeyKind::Asset.decode("ASSET_").unwrap(), "");
    }
}
