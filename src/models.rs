//! Data models for template configs (`data.json` / `template.json`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Frame delay used when a template does not declare one
pub const DEFAULT_DELAY_MS: u32 = 60;

/// Substitution token replaced by caller text in a [`TextSpec`]
pub const TEXT_TOKEN: &str = "$txt1";

/// Largest accepted text size in pixels
pub const MAX_FONT_SIZE: u32 = 4096;

/// Whether a template is a single still layout or an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TemplateType {
    Image,
    Animation,
}

impl FromStr for TemplateType {
    type Err = String;

    /// Accepts both the long names and the `IMG`/`GIF` shorthand used by
    /// upstream petpet templates.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" | "img" => Ok(TemplateType::Image),
            "animation" | "gif" => Ok(TemplateType::Animation),
            other => Err(format!("unknown template type '{}'", other)),
        }
    }
}

impl TryFrom<String> for TemplateType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TemplateType> for String {
    fn from(value: TemplateType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateType::Image => f.pad("Image"),
            TemplateType::Animation => f.pad("Animation"),
        }
    }
}

/// How a source image is scaled into its target rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum FitMode {
    /// Stretch to exactly the target size, ignoring aspect ratio
    Fill,
    /// Uniform scale covering the target, center-cropping the overflow
    Cover,
    /// Uniform scale fitting inside the target, centered on transparency
    Fit,
}

impl FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FILL" => Ok(FitMode::Fill),
            "COVER" => Ok(FitMode::Cover),
            "FIT" => Ok(FitMode::Fit),
            other => Err(format!("unknown fit mode '{}', expected FILL, COVER or FIT", other)),
        }
    }
}

impl TryFrom<String> for FitMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A placement rectangle in frame pixel space, written `[x, y, w, h]` on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "[i64; 4]")]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl TryFrom<[i64; 4]> for Rect {
    type Error = String;

    fn try_from([x, y, w, h]: [i64; 4]) -> Result<Self, Self::Error> {
        let coord = |v: i64, name: &str| {
            i32::try_from(v).map_err(|_| format!("rect {} {} is out of range", name, v))
        };
        let extent = |v: i64, name: &str| {
            u32::try_from(v).map_err(|_| format!("rect {} {} must be non-negative", name, v))
        };
        Ok(Rect {
            x: coord(x, "x")?,
            y: coord(y, "y")?,
            width: extent(w, "width")?,
            height: extent(h, "height")?,
        })
    }
}

/// Either one rectangle reused for every frame, or one rectangle per frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PositionSpec {
    Single(Rect),
    PerFrame(Vec<Rect>),
}

impl PositionSpec {
    pub fn as_slice(&self) -> &[Rect] {
        match self {
            PositionSpec::Single(rect) => std::slice::from_ref(rect),
            PositionSpec::PerFrame(rects) => rects,
        }
    }
}

impl Default for PositionSpec {
    fn default() -> Self {
        PositionSpec::PerFrame(Vec::new())
    }
}

/// Placement and transform rules for the avatar.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AvatarSpec {
    #[serde(default, rename = "pos")]
    pub positions: PositionSpec,
    /// Explicit fit; see [`AvatarSpec::fit_for`] for the default
    #[serde(default, rename = "fit")]
    pub fit_mode: Option<FitMode>,
    #[serde(default)]
    pub round: bool,
    #[serde(default, rename = "avatarOnTop")]
    pub on_top: bool,
}

impl AvatarSpec {
    /// Fit mode used for `kind` output.
    ///
    /// Without an explicit `fit`, static output center-crops (`COVER`) and
    /// animated output stretches (`FILL`).
    pub fn fit_for(&self, kind: OutputKind) -> FitMode {
        self.fit_mode.unwrap_or(match kind {
            OutputKind::Static => FitMode::Cover,
            OutputKind::Animated => FitMode::Fill,
        })
    }
}

/// A text overlay rule.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextSpec {
    #[serde(default = "default_text_template", rename = "text")]
    pub template: String,
    #[serde(default = "default_text_pos", rename = "pos")]
    pub pos: Vec<i32>,
    #[serde(default = "default_font", rename = "font")]
    pub font_name: String,
    #[serde(default = "default_font_size", rename = "size")]
    pub font_size: u32,
    #[serde(default = "default_color", rename = "color")]
    pub color_hex: String,
}

fn default_text_template() -> String {
    TEXT_TOKEN.to_string()
}

fn default_text_pos() -> Vec<i32> {
    vec![100, 100]
}

fn default_font() -> String {
    "MiSans".to_string()
}

fn default_font_size() -> u32 {
    40
}

fn default_color() -> String {
    "#000000".to_string()
}

fn default_delay() -> u32 {
    DEFAULT_DELAY_MS
}

impl TextSpec {
    /// Drawing origin; extra entries after `[x, y]` are ignored.
    pub fn position(&self) -> (i32, i32) {
        (self.pos.first().copied().unwrap_or(0), self.pos.get(1).copied().unwrap_or(0))
    }

    /// Substitute the caller text into the template string, once.
    pub fn render_text(&self, content: &str) -> String {
        self.template.replacen(TEXT_TOKEN, content, 1)
    }
}

impl Default for TextSpec {
    fn default() -> Self {
        Self {
            template: default_text_template(),
            pos: default_text_pos(),
            font_name: default_font(),
            font_size: default_font_size(),
            color_hex: default_color(),
        }
    }
}

/// Declarative configuration of one template directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateConfig {
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    #[serde(default, rename = "alias")]
    pub aliases: Vec<String>,
    #[serde(default, rename = "avatar")]
    pub avatar_specs: Vec<AvatarSpec>,
    #[serde(default, rename = "text")]
    pub text_specs: Vec<TextSpec>,
    #[serde(default = "default_delay", rename = "delay")]
    pub frame_delay_ms: u32,
}

impl TemplateConfig {
    /// Parse config text. JSON5 is accepted so hand-edited configs may carry
    /// comments and trailing commas.
    pub fn parse(content: &str) -> Result<Self, String> {
        let config: TemplateConfig = json5::from_str(content).map_err(|e| e.to_string())?;
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(errors.join("; "));
        }
        Ok(config)
    }

    /// Check field values serde cannot express.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (i, text) in self.text_specs.iter().enumerate() {
            if text.pos.len() < 2 {
                errors.push(format!("text[{}].pos must hold at least [x, y]", i));
            }
            if text.font_size == 0 || text.font_size > MAX_FONT_SIZE {
                errors.push(format!("text[{}].size must be between 1 and {}", i, MAX_FONT_SIZE));
            }
        }

        errors
    }

    /// The avatar rule honored by the compositor. Only the first is used.
    pub fn primary_avatar(&self) -> Option<&AvatarSpec> {
        self.avatar_specs.first()
    }

    pub fn primary_text(&self) -> Option<&TextSpec> {
        self.text_specs.first()
    }
}

/// Requested output serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// PNG of the first composed frame
    Static,
    /// Infinitely looping GIF of every composed frame
    Animated,
}

impl OutputKind {
    pub fn for_template_type(template_type: TemplateType) -> Self {
        match template_type {
            TemplateType::Image => OutputKind::Static,
            TemplateType::Animation => OutputKind::Animated,
        }
    }

    /// `.gif` means animated, anything else static.
    pub fn from_extension(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gif") => OutputKind::Animated,
            _ => OutputKind::Static,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Static => "png",
            OutputKind::Animated => "gif",
        }
    }
}
