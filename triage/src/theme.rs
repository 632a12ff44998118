//! Color themes for triage.
//!
//! A `Theme` names one `ratatui::style::Color` per UI surface. Two built-ins:
//!
//! - `dark`: ANSI 16 colors only, safe on any terminal.
//! - `catppuccin_mocha`: Catppuccin Mocha in RGB; needs truecolor.

use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Log panel
    /// Plain log text.
    pub log_text: Color,
    /// Text of lines from chunks flagged as containing errors.
    pub log_error: Color,
    /// Gutter line numbers.
    pub line_number: Color,
    /// Marker for line numbers that fell back to 1.
    pub line_number_defaulted: Color,
    /// Background of the selected line.
    pub selection_bg: Color,
    /// Search query highlight in the panel title.
    pub search_match: Color,

    // Chat panel
    pub chat_user: Color,
    pub chat_ai: Color,
    pub chat_error: Color,
    pub chat_pending: Color,

    // Header and analysis
    pub status_failure: Color,
    pub status_other: Color,
    pub root_cause: Color,
    pub suggested_fix: Color,
    pub muted: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,
    pub status_mode_search: Color,
}

impl Theme {
    /// Built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            log_text: Color::Gray,
            log_error: Color::LightRed,
            line_number: Color::DarkGray,
            line_number_defaulted: Color::Yellow,
            selection_bg: Color::DarkGray,
            search_match: Color::Yellow,

            chat_user: Color::Cyan,
            chat_ai: Color::Reset,
            chat_error: Color::Red,
            chat_pending: Color::DarkGray,

            status_failure: Color::Red,
            status_other: Color::Green,
            root_cause: Color::Red,
            suggested_fix: Color::Green,
            muted: Color::DarkGray,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
            status_mode_search: Color::Yellow,
        }
    }

    /// Catppuccin Mocha using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let sky = Color::Rgb(137, 220, 235); // #89dceb
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay0 = Color::Rgb(108, 112, 134); // #6c7086
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface0 = Color::Rgb(49, 50, 68); // #313244
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let subtext1 = Color::Rgb(186, 194, 222); // #bac2de
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let peach = Color::Rgb(250, 179, 135); // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            log_text: subtext1,
            log_error: red,
            line_number: overlay0,
            line_number_defaulted: peach,
            selection_bg: surface0,
            search_match: yellow,

            chat_user: sky,
            chat_ai: text,
            chat_error: red,
            chat_pending: overlay1,

            status_failure: red,
            status_other: green,
            root_cause: red,
            suggested_fix: green,
            muted: overlay1,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,
            status_mode_search: yellow,
        }
    }

    /// Resolves a configured theme name; unknown names fall back to `dark`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }
}
