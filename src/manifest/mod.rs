//! Manifest building broken into the leaf policy and the rich content HTML pass.

mod convert;
mod html;

pub use convert::{AssetLocalizer, convert_asset_references};
pub use html::{RichContentAsset, rewrite_rich_content};
