//! Read-only asset records supplied by the external asset store.

use serde::{Deserialize, Serialize};

/// Kind of asset.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssetType {
    /// A character with a visual identity
    Character,
    /// A place
    Location,
    /// An object
    Prop,
    /// Anything else
    #[serde(other)]
    Other,
}

/// Visual attributes of an asset. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualAttributes {
    /// Apparent age
    #[serde(default)]
    pub age: Option<String>,
    /// Body build
    #[serde(default)]
    pub build: Option<String>,
    /// Hair
    #[serde(default)]
    pub hair: Option<String>,
    /// Facial hair
    #[serde(default)]
    pub beard: Option<String>,
    /// Skin tone
    #[serde(default)]
    pub skin: Option<String>,
    /// Complexion, used when `skin` is not set
    #[serde(default)]
    pub complexion: Option<String>,
    /// Eyes
    #[serde(default)]
    pub eyes: Option<String>,
    /// Height
    #[serde(default)]
    pub height: Option<String>,
    /// Clothing / wardrobe
    #[serde(default)]
    pub clothing: Option<String>,
}

/// An asset record. Never mutated by this workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Asset id
    pub id: String,
    /// Display name, used as the character identity
    pub name: String,
    /// Asset kind
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Visual attributes
    #[serde(default)]
    pub visual_attributes: VisualAttributes,
}

impl Asset {
    /// Creates a character asset with the given attributes.
    pub fn character(
        id: impl Into<String>,
        name: impl Into<String>,
        visual_attributes: VisualAttributes,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            asset_type: AssetType::Character,
            description: None,
            visual_attributes,
        }
    }
}
