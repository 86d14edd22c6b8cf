use ratatui::style::Color;
use std::sync::OnceLock;

/// Terminal theme colors, adapts to light/dark mode
pub struct Theme {
    /// Accent color (prompt, cursor, selected row, borders)
    pub accent: Color,
    /// Table header background
    pub header_bg: Color,
    /// Table header text
    pub header_fg: Color,
    /// Horizontal rule between question and answers
    pub rule_fg: Color,
    /// Placeholder text color
    pub placeholder_fg: Color,
    /// Dim text (status bar, metadata)
    pub dim_fg: Color,
    /// Keycap background in status bar
    pub keycap_bg: Color,
    /// Accepted answer marker
    pub accepted_fg: Color,
    /// Toast text
    pub toast_fg: Color,
    /// Toast background per severity
    pub info_bg: Color,
    pub warning_bg: Color,
    pub error_bg: Color,
    /// Fatal error text
    pub error_fg: Color,
}

/// Process-wide theme, detected once
pub fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(Theme::detect)
}

impl Theme {
    pub fn detect() -> Self {
        if detect_light_theme() {
            Self::light()
        } else {
            Self::dark()
        }
    }

    fn dark() -> Self {
        Self {
            accent: Color::Rgb(198, 160, 246),
            header_bg: Color::Rgb(198, 160, 246),
            header_fg: Color::Rgb(0, 0, 0),
            rule_fg: Color::Rgb(166, 218, 149),
            placeholder_fg: Color::Rgb(100, 100, 100),
            dim_fg: Color::Rgb(153, 153, 153),
            keycap_bg: Color::Rgb(60, 60, 65),
            accepted_fg: Color::Rgb(166, 218, 149),
            toast_fg: Color::Rgb(255, 255, 255),
            info_bg: Color::Rgb(64, 110, 58),
            warning_bg: Color::Rgb(128, 104, 50),
            error_bg: Color::Rgb(130, 52, 64),
            error_fg: Color::Rgb(237, 135, 150),
        }
    }

    fn light() -> Self {
        Self {
            accent: Color::Rgb(136, 57, 239),
            header_bg: Color::Rgb(136, 57, 239),
            header_fg: Color::Rgb(255, 255, 255),
            rule_fg: Color::Rgb(64, 160, 43),
            placeholder_fg: Color::Rgb(150, 150, 150),
            dim_fg: Color::Rgb(120, 120, 120),
            keycap_bg: Color::Rgb(200, 200, 205),
            accepted_fg: Color::Rgb(64, 160, 43),
            toast_fg: Color::Rgb(0, 0, 0),
            info_bg: Color::Rgb(166, 218, 149),
            warning_bg: Color::Rgb(238, 212, 159),
            error_bg: Color::Rgb(237, 135, 150),
            error_fg: Color::Rgb(210, 15, 57),
        }
    }
}

/// Detect if terminal has a light background
fn detect_light_theme() -> bool {
    // COLORFGBG is "fg;bg" where 15=white, 0=black
    if let Ok(val) = std::env::var("COLORFGBG") {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return bg_num >= 7;
            }
        }
    }

    // Default to dark theme (most common for developers)
    false
}
