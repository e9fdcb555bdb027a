use crate::theme::Theme;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the base URL of the published person pages.
pub const SITE_URL_ENV: &str = "SITEURL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EraLabel {
    /// Print the marker's year.
    Year,
    Text(String),
    Hidden,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EraMarker {
    pub date: NaiveDate,
    pub label: EraLabel,
}

impl EraMarker {
    fn year(year: i32) -> Self {
        Self {
            date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default(),
            label: EraLabel::Year,
        }
    }

    fn text(year: i32, month: u32, day: u32, label: &str) -> Self {
        Self {
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
            label: if label.is_empty() {
                EraLabel::Hidden
            } else {
                EraLabel::Text(label.to_string())
            },
        }
    }
}

fn default_era_markers() -> Vec<EraMarker> {
    vec![
        EraMarker::year(1700),
        EraMarker::year(1800),
        EraMarker::year(1900),
        EraMarker::text(1941, 6, 22, "ВОВ"),
        EraMarker::text(1945, 5, 9, ""),
        EraMarker::year(2000),
    ]
}

/// Geometry of the full-tree timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub font_size: f32,
    pub row_height: f32,
    pub y_spacing: f32,
    /// Pixels per day.
    pub x_scale: f32,
    pub x_offset: f32,
    pub line_width: f32,
    pub marker_width: f32,
    pub marker_height: f32,
    pub dash_width: f32,
    pub era_label_char_width: f32,
    pub birth_uncertainty_years: u32,
    pub death_uncertainty_years: u32,
    pub era_markers: Vec<EraMarker>,
    pub present_label: String,
    /// Fixed "today" for reproducible output; `None` uses the local date.
    pub today: Option<NaiveDate>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        let font_size = 12.0;
        let row_height = font_size * 1.2;
        Self {
            font_size,
            row_height,
            y_spacing: 6.0,
            x_scale: 0.01,
            x_offset: row_height,
            line_width: 0.8,
            marker_width: 4.0,
            marker_height: 4.0,
            dash_width: 20.0,
            era_label_char_width: 0.7,
            birth_uncertainty_years: 5,
            death_uncertainty_years: 10,
            era_markers: default_era_markers(),
            present_label: "н. в.".to_string(),
            today: None,
        }
    }
}

impl TimelineConfig {
    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn row_pitch(&self) -> f32 {
        self.row_height + self.y_spacing
    }
}

/// Grid of the ego-centered diagram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EgoConfig {
    pub person_width: f32,
    pub person_height: f32,
    pub x_spacing: f32,
    pub y_spacing: f32,
    pub font_size: f32,
    pub line_width: f32,
    pub label_char_width: f32,
}

impl Default for EgoConfig {
    fn default() -> Self {
        Self {
            person_width: 150.0,
            person_height: 50.0,
            x_spacing: 20.0,
            y_spacing: 50.0,
            font_size: 14.0,
            line_width: 0.8,
            label_char_width: 0.55,
        }
    }
}

impl EgoConfig {
    pub fn column_pitch(&self) -> f32 {
        self.person_width + self.x_spacing
    }

    pub fn generation_pitch(&self) -> f32 {
        self.person_height + self.y_spacing
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub timeline: TimelineConfig,
    pub ego: EgoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
    pub site_url: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
            site_url: None,
        }
    }
}

impl RenderConfig {
    /// Explicit setting first, then the `SITEURL` environment variable.
    pub fn resolve_site_url(&self) -> String {
        self.site_url
            .clone()
            .or_else(|| std::env::var(SITE_URL_ENV).ok())
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    male_color: Option<String>,
    female_color: Option<String>,
    unknown_color: Option<String>,
    fade_color: Option<String>,
    text_color: Option<String>,
    marriage_line_color: Option<String>,
    descent_line_color: Option<String>,
    era_line_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineConfigFile {
    font_size: Option<f32>,
    row_height: Option<f32>,
    y_spacing: Option<f32>,
    x_scale: Option<f32>,
    x_offset: Option<f32>,
    line_width: Option<f32>,
    marker_width: Option<f32>,
    marker_height: Option<f32>,
    dash_width: Option<f32>,
    era_label_char_width: Option<f32>,
    birth_uncertainty_years: Option<u32>,
    death_uncertainty_years: Option<u32>,
    era_markers: Option<Vec<EraMarker>>,
    present_label: Option<String>,
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EgoConfigFile {
    person_width: Option<f32>,
    person_height: Option<f32>,
    x_spacing: Option<f32>,
    y_spacing: Option<f32>,
    font_size: Option<f32>,
    line_width: Option<f32>,
    label_char_width: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    site_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    timeline: Option<TimelineConfigFile>,
    ego: Option<EgoConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => anyhow::bail!("unknown theme {other:?}"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if vars.font_family.is_some() {
            config.theme.font_family = vars.font_family;
        }
        if let Some(v) = vars.male_color {
            config.theme.male_color = v;
        }
        if let Some(v) = vars.female_color {
            config.theme.female_color = v;
        }
        if let Some(v) = vars.unknown_color {
            config.theme.unknown_color = v;
        }
        if let Some(v) = vars.fade_color {
            config.theme.fade_color = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.marriage_line_color {
            config.theme.marriage_line_color = v;
        }
        if let Some(v) = vars.descent_line_color {
            config.theme.descent_line_color = v;
        }
        if let Some(v) = vars.era_line_color {
            config.theme.era_line_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(timeline) = parsed.timeline {
        let target = &mut config.layout.timeline;
        if let Some(v) = timeline.font_size {
            target.font_size = v;
            // Row height and offset follow the font unless set explicitly.
            target.row_height = v * 1.2;
            target.x_offset = target.row_height;
        }
        if let Some(v) = timeline.row_height {
            target.row_height = v;
        }
        if let Some(v) = timeline.y_spacing {
            target.y_spacing = v;
        }
        if let Some(v) = timeline.x_scale {
            target.x_scale = v;
        }
        if let Some(v) = timeline.x_offset {
            target.x_offset = v;
        }
        if let Some(v) = timeline.line_width {
            target.line_width = v;
        }
        if let Some(v) = timeline.marker_width {
            target.marker_width = v;
        }
        if let Some(v) = timeline.marker_height {
            target.marker_height = v;
        }
        if let Some(v) = timeline.dash_width {
            target.dash_width = v;
        }
        if let Some(v) = timeline.era_label_char_width {
            target.era_label_char_width = v;
        }
        if let Some(v) = timeline.birth_uncertainty_years {
            target.birth_uncertainty_years = v;
        }
        if let Some(v) = timeline.death_uncertainty_years {
            target.death_uncertainty_years = v;
        }
        if let Some(v) = timeline.era_markers {
            target.era_markers = v;
        }
        if let Some(v) = timeline.present_label {
            target.present_label = v;
        }
        if timeline.today.is_some() {
            target.today = timeline.today;
        }
    }

    if let Some(ego) = parsed.ego {
        let target = &mut config.layout.ego;
        if let Some(v) = ego.person_width {
            target.person_width = v;
        }
        if let Some(v) = ego.person_height {
            target.person_height = v;
        }
        if let Some(v) = ego.x_spacing {
            target.x_spacing = v;
        }
        if let Some(v) = ego.y_spacing {
            target.y_spacing = v;
        }
        if let Some(v) = ego.font_size {
            target.font_size = v;
        }
        if let Some(v) = ego.line_width {
            target.line_width = v;
        }
        if let Some(v) = ego.label_char_width {
            target.label_char_width = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if render.site_url.is_some() {
            config.render.site_url = render.site_url;
        }
    }

    config.render.background = config.theme.background.clone();

    Ok(config)
}
