//! Display board settings singleton.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Content shown on the public display next to the called ticket.
///
/// Stored as a single row with a fixed identity and always overwritten
/// wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DisplaySettings {
    /// Video played in the idle area of the display.
    #[serde(default)]
    pub video_url: String,
    /// Headline text.
    #[serde(default)]
    pub title: String,
    /// Secondary text under the headline.
    #[serde(default)]
    pub subtitle: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            video_url: String::new(),
            title: "Hand Washing Matters".to_string(),
            subtitle: "Daily Health Tips".to_string(),
        }
    }
}
