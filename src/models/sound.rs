// Nature sound catalog
// Path: nature_sounds/{sound_id}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatureSound {
    #[serde(default)]
    pub id: String,
    pub title: String,
    /// e.g. "rain", "forest", "ocean"
    pub category: String,
    pub audio_url: String,
    #[serde(default)]
    pub duration_secs: Option<u32>,
    #[serde(default = "default_loopable")]
    pub loopable: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_loopable() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListSoundsQuery {
    #[serde(default)]
    pub category: Option<String>,
}
