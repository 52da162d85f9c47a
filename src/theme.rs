//! Theme and typography lookup tables
//!
//! Pure functions mapping a dark-mode flag and size tokens to colors and
//! dimensions. Nothing here holds state; [`ThemeSettings`] is only the
//! user's persisted preference.

use serde::{Deserialize, Serialize};

/// Smallest accepted font scale
pub const MIN_FONT_SCALE: f32 = 0.8;
/// Largest accepted font scale
pub const MAX_FONT_SCALE: f32 = 1.6;

/// Requested appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Always light
    Light,
    /// Always dark
    Dark,
    /// Follow the system preference
    #[default]
    System,
}

impl ThemeMode {
    /// Resolve to a dark-mode flag given the system preference
    pub fn is_dark(self, system_dark: bool) -> bool {
        match self {
            Self::Light => false,
            Self::Dark => true,
            Self::System => system_dark,
        }
    }
}

impl std::str::FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(format!(
                "unknown theme mode '{}'; expected light, dark or system",
                other
            )),
        }
    }
}

/// Persisted appearance preference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSettings {
    /// Light, dark or system
    #[serde(default)]
    pub mode: ThemeMode,
    /// Multiplier applied to every font size
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
}

fn default_font_scale() -> f32 {
    1.0
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            mode: ThemeMode::default(),
            font_scale: default_font_scale(),
        }
    }
}

impl ThemeSettings {
    /// Font scale clamped into the supported range
    pub fn clamped_scale(&self) -> f32 {
        if self.font_scale.is_finite() {
            self.font_scale.clamp(MIN_FONT_SCALE, MAX_FONT_SCALE)
        } else {
            default_font_scale()
        }
    }
}

/// Color table, as `#rrggbb` strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub surface: &'static str,
    pub primary: &'static str,
    pub on_primary: &'static str,
    pub text: &'static str,
    pub text_secondary: &'static str,
    pub border: &'static str,
    pub user_bubble: &'static str,
    pub assistant_bubble: &'static str,
    pub error: &'static str,
}

const LIGHT: Palette = Palette {
    background: "#ffffff",
    surface: "#f4f5f7",
    primary: "#4f46e5",
    on_primary: "#ffffff",
    text: "#111827",
    text_secondary: "#6b7280",
    border: "#e5e7eb",
    user_bubble: "#4f46e5",
    assistant_bubble: "#f3f4f6",
    error: "#dc2626",
};

const DARK: Palette = Palette {
    background: "#0b0f19",
    surface: "#161b26",
    primary: "#818cf8",
    on_primary: "#0b0f19",
    text: "#f9fafb",
    text_secondary: "#9ca3af",
    border: "#2a3140",
    user_bubble: "#6366f1",
    assistant_bubble: "#1f2633",
    error: "#f87171",
};

/// Colors for the given mode
///
/// # Examples
///
/// ```
/// use chatmate::theme::palette;
///
/// assert_ne!(palette(true).background, palette(false).background);
/// ```
pub fn palette(dark: bool) -> Palette {
    if dark {
        DARK
    } else {
        LIGHT
    }
}

/// Size tokens shared by spacing and typography
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Xs,
    Sm,
    Md,
    Lg,
    Xl,
}

/// Spacing in density-independent pixels
pub fn spacing(size: Size) -> u16 {
    match size {
        Size::Xs => 4,
        Size::Sm => 8,
        Size::Md => 16,
        Size::Lg => 24,
        Size::Xl => 32,
    }
}

/// Font sizes and line heights derived from one scale factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Typography {
    pub caption: f32,
    pub body: f32,
    pub subtitle: f32,
    pub title: f32,
    pub headline: f32,
    /// Line height multiplier applied to every size
    pub line_height: f32,
}

impl Typography {
    /// Line height in pixels for a font size
    pub fn line_height_for(&self, font_size: f32) -> f32 {
        (font_size * self.line_height).round()
    }
}

/// Typography for `scale`, clamped to the supported range and rounded to
/// half pixels
pub fn typography(scale: f32) -> Typography {
    let scale = ThemeSettings {
        mode: ThemeMode::System,
        font_scale: scale,
    }
    .clamped_scale();
    let size = |base: f32| (base * scale * 2.0).round() / 2.0;

    Typography {
        caption: size(12.0),
        body: size(15.0),
        subtitle: size(17.0),
        title: size(20.0),
        headline: size(28.0),
        line_height: 1.4,
    }
}
