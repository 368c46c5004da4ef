//! Eight-bit terminal colors.
//!
//! Colors here are values in the 256-color palette, emitted as
//! `ESC[38;5;Nm` (foreground) or `ESC[48;5;Nm` (background) SGR
//! sequences. RGB values can be downsampled onto the palette's 6x6x6
//! color cube or grayscale ramp.

use std::fmt;

/// A color in the 256-color terminal palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Palette index (0-255).
    pub number: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0);
    pub const RED: Self = Self::new(1);
    pub const GREEN: Self = Self::new(2);
    pub const YELLOW: Self = Self::new(3);
    pub const BLUE: Self = Self::new(4);
    pub const MAGENTA: Self = Self::new(5);
    pub const CYAN: Self = Self::new(6);
    pub const WHITE: Self = Self::new(7);
    pub const BRIGHT_BLACK: Self = Self::new(8);
    pub const BRIGHT_RED: Self = Self::new(9);
    pub const BRIGHT_GREEN: Self = Self::new(10);
    pub const BRIGHT_YELLOW: Self = Self::new(11);
    pub const BRIGHT_BLUE: Self = Self::new(12);
    pub const BRIGHT_MAGENTA: Self = Self::new(13);
    pub const BRIGHT_CYAN: Self = Self::new(14);
    pub const BRIGHT_WHITE: Self = Self::new(15);
    pub const GRAY: Self = Self::new(245);

    /// Create a color from a palette index.
    #[must_use]
    pub const fn new(number: u8) -> Self {
        Self { number }
    }

    /// Map an RGB value to the nearest 256-color palette entry.
    ///
    /// Low-saturation colors land on the grayscale ramp (232-255), the
    /// rest on the 6x6x6 color cube (16-231).
    #[must_use]
    pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        let max = red.max(green).max(blue);
        let min = red.min(green).min(blue);
        let lightness = (f64::from(max) + f64::from(min)) / 2.0 / 255.0;
        let saturation = if max == min {
            0.0
        } else {
            let spread = f64::from(max - min) / 255.0;
            if lightness <= 0.5 {
                spread / (2.0 * lightness)
            } else {
                spread / (2.0 - 2.0 * lightness)
            }
        };

        // Grayscale detection
        if saturation < 0.15 {
            if lightness < 0.04 {
                return Self::new(16); // near black
            }
            if lightness > 0.96 {
                return Self::new(231); // near white
            }
            #[expect(clippy::cast_possible_truncation, reason = "result is 0-24 range")]
            #[expect(clippy::cast_sign_loss, reason = "lightness is positive")]
            let gray_index = ((lightness - 0.04) / 0.92 * 24.0).round() as u8;
            return Self::new(232 + gray_index.min(23));
        }

        // Color cube mapping
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "values are in 0-5 range"
        )]
        let quantize = |v: u8| -> usize {
            if v < 95 {
                (f64::from(v) / 95.0).round() as usize
            } else {
                1 + ((f64::from(v) - 95.0) / 40.0).round() as usize
            }
            .min(5)
        };

        #[expect(clippy::cast_possible_truncation, reason = "result is in 16-231 range")]
        let index = (16 + quantize(red) * 36 + quantize(green) * 6 + quantize(blue)) as u8;
        Self::new(index)
    }

    /// SGR parameters for this color (without the ESC framing).
    #[must_use]
    pub fn sgr_params(&self, foreground: bool) -> String {
        let plane = if foreground { 38 } else { 48 };
        format!("{plane};5;{}", self.number)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "color({})", self.number)
    }
}

/// A foreground/background pair carried by styled spans and pushed onto
/// the color stack while their subtree renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Paint {
    /// Foreground color, if set.
    pub foreground: Option<Color>,
    /// Background color, if set.
    pub background: Option<Color>,
}

impl Paint {
    /// A paint with neither color set.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            foreground: None,
            background: None,
        }
    }

    /// Foreground-only paint.
    #[must_use]
    pub const fn fg(color: Color) -> Self {
        Self {
            foreground: Some(color),
            background: None,
        }
    }

    /// Background-only paint.
    #[must_use]
    pub const fn bg(color: Color) -> Self {
        Self {
            foreground: None,
            background: Some(color),
        }
    }

    /// Set the background on an existing paint.
    #[must_use]
    pub const fn on(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Whether neither color is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.foreground.is_none() && self.background.is_none()
    }

    /// The SGR escape sequence that applies this paint, or an empty
    /// string if nothing is set.
    #[must_use]
    pub fn sgr_sequence(&self) -> String {
        let mut params = Vec::with_capacity(2);
        if let Some(fg) = self.foreground {
            params.push(fg.sgr_params(true));
        }
        if let Some(bg) = self.background {
            params.push(bg.sgr_params(false));
        }
        if params.is_empty() {
            String::new()
        } else {
            format!("\x1b[{}m", params.join(";"))
        }
    }
}
