//! Character profiles built from asset visual attributes.

use continuum_core::{
    AppearanceState, Asset, AssetType, CharacterProfile, DEFAULT_STATE_ID, VisualAttributes,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Forbidden-trait keyword categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraitCategory {
    /// Age terms
    Age,
    /// Eye terms
    Eyes,
    /// Hair terms
    Hair,
    /// Facial hair terms
    Beard,
    /// Skin terms
    Skin,
    /// Body build terms
    Build,
    /// Height terms
    Height,
    /// Clothing terms
    Clothing,
}

impl TraitCategory {
    /// Categories in the order their keywords are emitted.
    pub const ALL: [TraitCategory; 8] = [
        TraitCategory::Age,
        TraitCategory::Eyes,
        TraitCategory::Hair,
        TraitCategory::Beard,
        TraitCategory::Skin,
        TraitCategory::Build,
        TraitCategory::Height,
        TraitCategory::Clothing,
    ];

    /// Keywords that restate a fixed trait of this category.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            TraitCategory::Age => &[
                "years old",
                "year-old",
                "elderly",
                "middle-aged",
                "teenage",
                "youthful",
                "wrinkled",
            ],
            TraitCategory::Eyes => &["eyes", "eye color", "blue-eyed", "brown-eyed", "green-eyed"],
            TraitCategory::Hair => &["hair", "haired", "bald", "ponytail", "braids", "curls"],
            TraitCategory::Beard => &[
                "beard",
                "bearded",
                "mustache",
                "moustache",
                "stubble",
                "goatee",
                "clean-shaven",
            ],
            TraitCategory::Skin => &["skin", "complexion", "freckles", "freckled", "tanned"],
            TraitCategory::Build => &[
                "build",
                "muscular",
                "slender",
                "stocky",
                "broad-shouldered",
                "athletic",
            ],
            TraitCategory::Height => &["tall", "towering", "petite", "height"],
            TraitCategory::Clothing => &[
                "wearing",
                "dressed in",
                "outfit",
                "clothes",
                "jacket",
                "coat",
                "shirt",
                "uniform",
            ],
        }
    }

    fn is_defined(self, attrs: &VisualAttributes) -> bool {
        let field = match self {
            TraitCategory::Age => &attrs.age,
            TraitCategory::Eyes => &attrs.eyes,
            TraitCategory::Hair => &attrs.hair,
            TraitCategory::Beard => &attrs.beard,
            TraitCategory::Skin => {
                return non_blank(&attrs.skin).is_some() || non_blank(&attrs.complexion).is_some();
            }
            TraitCategory::Build => &attrs.build,
            TraitCategory::Height => &attrs.height,
            TraitCategory::Clothing => &attrs.clothing,
        };
        non_blank(field).is_some()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Builds character profiles from assets.
pub struct CharacterProfileLoader;

impl CharacterProfileLoader {
    /// Builds a profile for every character asset, keyed by asset name.
    ///
    /// Non-character assets are skipped. An asset without visual attributes
    /// still yields a profile, with an empty summary and no forbidden traits.
    pub fn load(assets: &[Asset]) -> BTreeMap<String, CharacterProfile> {
        let profiles: BTreeMap<String, CharacterProfile> = assets
            .iter()
            .filter(|asset| asset.asset_type == AssetType::Character)
            .map(|asset| (asset.name.clone(), Self::profile_for(asset)))
            .collect();
        debug!(
            assets = assets.len(),
            profiles = profiles.len(),
            "Loaded character profiles"
        );
        profiles
    }

    /// Builds the profile of a single asset.
    pub fn profile_for(asset: &Asset) -> CharacterProfile {
        let state = AppearanceState {
            id: DEFAULT_STATE_ID.to_string(),
            summary: Self::summary(&asset.visual_attributes),
            forbidden_traits: Self::forbidden_traits(&asset.visual_attributes),
        };
        CharacterProfile::with_default_state(asset.name.clone(), state)
    }

    /// Non-empty attributes in the order age, build, hair, beard, skin, clothing.
    pub fn summary(attrs: &VisualAttributes) -> String {
        let skin = non_blank(&attrs.skin).or_else(|| non_blank(&attrs.complexion));
        [
            non_blank(&attrs.age),
            non_blank(&attrs.build),
            non_blank(&attrs.hair),
            non_blank(&attrs.beard),
            skin,
            non_blank(&attrs.clothing),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// Keywords of every category the attributes define.
    pub fn forbidden_traits(attrs: &VisualAttributes) -> Vec<String> {
        let mut traits: Vec<String> = Vec::new();
        for category in TraitCategory::ALL {
            if !category.is_defined(attrs) {
                continue;
            }
            for keyword in category.keywords() {
                if !traits.iter().any(|t| t == keyword) {
                    traits.push((*keyword).to_string());
                }
            }
        }
        traits
    }
}
