//! UI colour presets.
//!
//! Colours are RGB565 values as consumed by the display driver.

use serde::{Deserialize, Serialize};

/// The five colours that make up the UI theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiColors {
    /// Foreground / text.
    pub fg: u16,
    /// Background.
    pub bg: u16,
    /// Alerts and highlights.
    pub alert: u16,
    /// Odd list rows.
    pub odd: u16,
    /// Even list rows.
    pub even: u16,
}

/// Named colour schemes offered by the settings menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Palette {
    Default,
    Red,
    Blue,
    Yellow,
    Purple,
    White,
    Black,
}

impl Palette {
    pub const ALL: [Palette; 7] = [
        Palette::Default,
        Palette::Red,
        Palette::Blue,
        Palette::Yellow,
        Palette::Purple,
        Palette::White,
        Palette::Black,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Palette::Default => "Default",
            Palette::Red => "Red",
            Palette::Blue => "Blue",
            Palette::Yellow => "Yellow",
            Palette::Purple => "Purple",
            Palette::White => "White",
            Palette::Black => "Black",
        }
    }

    /// Case-insensitive lookup by [`Palette::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn colors(self) -> UiColors {
        let (fg, bg, alert, odd, even) = match self {
            Palette::Default => (0x07E0, 0x0000, 0xF800, 0x30C5, 0x32E5),
            Palette::Red => (0xF800, 0x0000, 0xE3E0, 0xFBC0, 0xAAC0),
            Palette::Blue => (0x94BF, 0x0000, 0xD81F, 0xD69F, 0x079F),
            Palette::Yellow => (0xFFE0, 0x0000, 0xFB80, 0x9480, 0xBAE0),
            Palette::Purple => (0xE01F, 0x0000, 0xF800, 0xF57F, 0x89D3),
            Palette::White => (0xFFFF, 0x0000, 0x6B6D, 0x630C, 0x8410),
            // Inverted scheme: dark text on a white background.
            Palette::Black => (0x0000, 0xFFFF, 0x6B6D, 0x8C71, 0xB596),
        };
        UiColors {
            fg,
            bg,
            alert,
            odd,
            even,
        }
    }
}
