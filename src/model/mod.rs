//! Core data model types for asset_store

mod asset;
mod token;

pub use asset::AssetMeta;
pub use token::AssetToken;
