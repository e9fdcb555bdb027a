use serde::{Deserialize, Serialize};

use crate::ir::Gender;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: Option<String>,
    pub male_color: String,
    pub female_color: String,
    pub unknown_color: String,
    pub fade_color: String,
    pub text_color: String,
    pub marriage_line_color: String,
    pub descent_line_color: String,
    pub era_line_color: String,
    pub background: String,
}

impl Theme {
    /// Palette of the published family site.
    pub fn classic() -> Self {
        Self {
            font_family: None,
            male_color: "lightblue".to_string(),
            female_color: "pink".to_string(),
            unknown_color: "LightYellow".to_string(),
            fade_color: "white".to_string(),
            text_color: "black".to_string(),
            marriage_line_color: "black".to_string(),
            descent_line_color: "gray".to_string(),
            era_line_color: "gray".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: Some("Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string()),
            male_color: "#CFE3F7".to_string(),
            female_color: "#F7D6E0".to_string(),
            unknown_color: "#F5F0D0".to_string(),
            fade_color: "#FFFFFF".to_string(),
            text_color: "#1C2430".to_string(),
            marriage_line_color: "#1C2430".to_string(),
            descent_line_color: "#7A8AA6".to_string(),
            era_line_color: "#C7D2E5".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn gender_color(&self, gender: Gender) -> &str {
        match gender {
            Gender::Male => &self.male_color,
            Gender::Female => &self.female_color,
            Gender::Unknown => &self.unknown_color,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
