//! Narrative segments, the unit of prompt generation.

use serde::{Deserialize, Serialize};

/// One narrative segment of a story.
///
/// Ordering by `index` is total and immutable within a story.
///
/// # Examples
///
/// ```
/// use continuum_core::Segment;
///
/// let segment = Segment::new("s1", 0)
///     .with_character_names(vec!["John".to_string()])
///     .with_location_name("Harbor");
///
/// assert_eq!(segment.index, 0);
/// assert_eq!(segment.location_name.as_deref(), Some("Harbor"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters)]
#[serde(rename_all = "camelCase")]
#[setters(prefix = "with_", into, strip_option)]
pub struct Segment {
    /// Stable segment id
    #[setters(skip)]
    pub id: String,
    /// Position within the story
    #[setters(skip)]
    pub index: u32,
    /// Storyline the segment belongs to, when the story interleaves several
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storyline_id: Option<String>,
    /// Characters appearing in the segment, in narrative order
    #[serde(default)]
    pub character_names: Vec<String>,
    /// Location of the segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    /// Narrative text the backend visualizes
    #[serde(default)]
    pub text: String,
}

impl Segment {
    /// Creates a segment with no characters, location or text.
    pub fn new(id: impl Into<String>, index: u32) -> Self {
        Self {
            id: id.into(),
            index,
            storyline_id: None,
            character_names: Vec::new(),
            location_name: None,
            text: String::new(),
        }
    }

    /// True when the segment carries neither characters nor a location.
    pub fn is_ambient(&self) -> bool {
        self.character_names.is_empty() && self.location_name.is_none()
    }
}
