use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::app::models::{ColorPreferences, ColorSource};

/// Luminance band (exclusive) considered readable on both light and dark backgrounds.
const READABLE_BAND: (f64, f64) = (50.0, 200.0);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("color value cannot be empty")]
    Empty,
    #[error("color '{0}' must be in the format #RRGGBB")]
    BadLength(String),
    #[error("color '{0}' is not a valid hex code")]
    NotHex(String),
    #[error("color list cannot be empty when color-source is 'list'")]
    EmptyList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceptual luminance on a 0-255 scale.
    pub fn luminance(self) -> f64 {
        0.2126 * f64::from(self.r) + 0.7152 * f64::from(self.g) + 0.0722 * f64::from(self.b)
    }

    /// The color as a single 24-bit number, so `#010000 > #00FFFF`.
    pub fn value(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    fn from_value(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ColorError::Empty);
        }
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 {
            return Err(ColorError::BadLength(s.to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::NotHex(s.to_string()));
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| ColorError::NotHex(s.to_string()))?;
        Ok(Self::from_value(value))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Produces a color for every heading and entry in the rendered index.
pub struct ColorGenerator {
    prefs: ColorPreferences,
    rng: StdRng,
    cursor: usize,
    low: Rgb,
    high: Rgb,
    warned: bool,
}

impl ColorGenerator {
    /// Seeds from `prefs.seed` when set, otherwise from OS entropy.
    pub fn new(prefs: &ColorPreferences) -> Result<Self, ColorError> {
        let rng = match prefs.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(prefs, rng)
    }

    pub fn with_rng(prefs: &ColorPreferences, rng: StdRng) -> Result<Self, ColorError> {
        if prefs.source == ColorSource::List && prefs.colors.is_empty() {
            return Err(ColorError::EmptyList);
        }
        let (a, b) = prefs.range;
        Ok(Self {
            prefs: prefs.clone(),
            rng,
            cursor: 0,
            low: Rgb::new(a.r.min(b.r), a.g.min(b.g), a.b.min(b.b)),
            high: Rgb::new(a.r.max(b.r), a.g.max(b.g), a.b.max(b.b)),
            warned: false,
        })
    }

    pub fn next_color(&mut self) -> Rgb {
        if self.prefs.source == ColorSource::List {
            let color = self.prefs.colors[self.cursor % self.prefs.colors.len()];
            self.cursor = (self.cursor + 1) % self.prefs.colors.len();
            return color;
        }

        for _ in 0..self.prefs.max_attempts.max(1) {
            let candidate = Rgb::new(
                self.rng.gen_range(self.low.r..=self.high.r),
                self.rng.gen_range(self.low.g..=self.high.g),
                self.rng.gen_range(self.low.b..=self.high.b),
            );
            if !self.is_excluded(candidate) {
                return candidate;
            }
        }

        if self.warned {
            log::debug!("Color constraints exhausted again; using an unrestricted color");
        } else {
            log::warn!(
                "Failed to generate a color meeting the constraints after {} attempts; falling back to unrestricted colors",
                self.prefs.max_attempts
            );
            self.warned = true;
        }
        Rgb::from_value(self.rng.gen_range(0..=0xFF_FFFF))
    }

    /// True when any enabled exclusion rule rejects `color`.
    pub fn is_excluded(&self, color: Rgb) -> bool {
        let prefs = &self.prefs;
        let luminance = color.luminance();
        if prefs.exclude_dark && luminance < prefs.dark_luminance_threshold {
            return true;
        }
        if prefs.exclude_bright && luminance > prefs.bright_luminance_threshold {
            return true;
        }
        if prefs.exclude_blacks && color.value() <= prefs.exclude_blacks_threshold.value() {
            return true;
        }
        if prefs.ensure_readable && !(luminance > READABLE_BAND.0 && luminance < READABLE_BAND.1) {
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(source: ColorSource) -> ColorPreferences {
        ColorPreferences {
            source,
            colors: vec![Rgb::new(0x11, 0x22, 0x33), Rgb::new(0x44, 0x55, 0x66)],
            range: (Rgb::BLACK, Rgb::WHITE),
            max_attempts: 10_000,
            exclude_dark: false,
            exclude_bright: false,
            exclude_blacks: false,
            exclude_blacks_threshold: Rgb::new(0x22, 0x22, 0x22),
            ensure_readable: false,
            dark_luminance_threshold: 128.0,
            bright_luminance_threshold: 200.0,
            seed: Some(7),
        }
    }

    #[test]
    fn parses_and_normalizes_hex() {
        assert_eq!("  a1b2c3 ".parse::<Rgb>().unwrap().to_string(), "#A1B2C3");
        assert_eq!("#000000".parse::<Rgb>().unwrap(), Rgb::BLACK);
        assert_eq!("".parse::<Rgb>(), Err(ColorError::Empty));
        assert!(matches!("#FFF".parse::<Rgb>(), Err(ColorError::BadLength(_))));
        assert!(matches!("#GGGGGG".parse::<Rgb>(), Err(ColorError::NotHex(_))));
        assert!(matches!("#+12345".parse::<Rgb>(), Err(ColorError::NotHex(_))));
    }

    #[test]
    fn luminance_and_value() {
        assert_eq!(Rgb::BLACK.luminance(), 0.0);
        assert!((Rgb::WHITE.luminance() - 255.0).abs() < 1e-9);
        assert!(Rgb::new(0x01, 0, 0).value() > Rgb::new(0, 0xFF, 0xFF).value());
    }

    #[test]
    fn list_mode_cycles_with_period_two() {
        let mut prefs = prefs(ColorSource::List);
        prefs.exclude_dark = true;
        prefs.dark_luminance_threshold = 255.0;
        let mut colors = ColorGenerator::new(&prefs).unwrap();
        let drawn: Vec<String> = (0..6).map(|_| colors.next_color().to_string()).collect();
        assert_eq!(
            drawn,
            ["#112233", "#445566", "#112233", "#445566", "#112233", "#445566"]
        );
    }

    #[test]
    fn list_mode_requires_colors() {
        let mut prefs = prefs(ColorSource::List);
        prefs.colors.clear();
        assert_eq!(ColorGenerator::new(&prefs).err(), Some(ColorError::EmptyList));
    }

    #[test]
    fn range_mode_honors_exclusions() {
        let mut prefs = prefs(ColorSource::Random);
        prefs.exclude_dark = true;
        prefs.dark_luminance_threshold = 60.0;
        prefs.exclude_bright = true;
        prefs.bright_luminance_threshold = 190.0;
        prefs.exclude_blacks = true;
        prefs.ensure_readable = true;
        let mut colors = ColorGenerator::new(&prefs).unwrap();
        for _ in 0..2_000 {
            let color = colors.next_color();
            let luminance = color.luminance();
            assert!(luminance >= 60.0 && luminance <= 190.0, "{color} has luminance {luminance}");
            assert!(color.value() > 0x222222);
        }
        assert!(!colors.warned);
    }

    #[test]
    fn readable_band_alone_is_exclusive_of_its_bounds() {
        let mut prefs = prefs(ColorSource::Random);
        prefs.ensure_readable = true;
        let mut colors = ColorGenerator::new(&prefs).unwrap();
        for _ in 0..5_000 {
            let luminance = colors.next_color().luminance();
            assert!(50.0 < luminance && luminance < 200.0, "luminance {luminance}");
        }
        assert!(!colors.warned);

        // Pure white (255) and pure black (0) fall outside the band.
        assert!(colors.is_excluded(Rgb::WHITE));
        assert!(colors.is_excluded(Rgb::BLACK));
        // Pure blue sits at 0.0722 * 255, below the lower bound.
        assert!(colors.is_excluded(Rgb::new(0x00, 0x00, 0xFF)));
        // Pure green sits at 0.7152 * 255, roughly 182.4.
        assert!(!colors.is_excluded(Rgb::new(0x00, 0xFF, 0x00)));
    }

    #[test]
    fn range_bounds_are_swapped_per_channel() {
        let mut prefs = prefs(ColorSource::Random);
        prefs.range = (Rgb::new(0x00, 0xF0, 0x10), Rgb::new(0x20, 0xE0, 0x00));
        let mut colors = ColorGenerator::new(&prefs).unwrap();
        for _ in 0..500 {
            let color = colors.next_color();
            assert!(color.r <= 0x20);
            assert!((0xE0..=0xF0).contains(&color.g));
            assert!(color.b <= 0x10);
        }
    }

    #[test]
    fn collapsed_range_terminates_with_fallback() {
        let mut prefs = prefs(ColorSource::Random);
        prefs.range = (Rgb::WHITE, Rgb::WHITE);
        prefs.ensure_readable = true;
        prefs.max_attempts = 10;
        let mut colors = ColorGenerator::new(&prefs).unwrap();
        colors.next_color();
        colors.next_color();
        assert!(colors.warned);
    }

    #[test]
    fn same_seed_same_colors() {
        let prefs = prefs(ColorSource::Random);
        let mut a = ColorGenerator::new(&prefs).unwrap();
        let mut b = ColorGenerator::new(&prefs).unwrap();
        for _ in 0..20 {
            assert_eq!(a.next_color(), b.next_color());
        }
    }
}
