//! Color resolution for placeholder backgrounds and labels
//!
//! A color string is either a 6-digit hex triple (`#RRGGBB` or `RRGGBB`) or a
//! name looked up in a [`ColorTable`]. Resolution never fails: unknown names
//! degrade to grey and carry a [`ColorDiagnostic`] the caller may report.

use anyhow::{Context, Result};
use image::Rgba;
use serde::Deserialize;
use std::{collections::BTreeMap, fmt, path::Path, str::FromStr};

/// Color used when a name cannot be resolved.
pub const FALLBACK_COLOR: Rgba<u8> = Rgba([128, 128, 128, 255]);

/// Built-in named colors.
const BASIC_COLORS: [(&str, [u8; 3]); 7] = [
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("grey", [128, 128, 128]),
    ("gray", [128, 128, 128]),
];

/// Non-fatal problem found while resolving a color string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorDiagnostic {
    /// The input was neither valid hex nor a known name; grey was used instead
    Unrecognized(String),
}

impl fmt::Display for ColorDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorDiagnostic::Unrecognized(input) => {
                write!(f, "Color '{input}' not recognized, defaulting to grey.")
            }
        }
    }
}

/// Outcome of resolving a color string
#[derive(Debug, Clone, PartialEq)]
pub struct ColorResolution {
    pub color: Rgba<u8>,
    pub diagnostic: Option<ColorDiagnostic>,
}

impl ColorResolution {
    fn resolved(color: Rgba<u8>) -> Self {
        Self {
            color,
            diagnostic: None,
        }
    }
}

/// On-disk format for extra named colors
#[derive(Debug, Deserialize)]
struct ColorTableFile {
    colors: BTreeMap<String, String>,
}

/// Case-insensitive table of named colors
#[derive(Debug, Clone)]
pub struct ColorTable {
    entries: BTreeMap<String, Rgba<u8>>,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::basic()
    }
}

impl ColorTable {
    /// An empty table; every name falls back to grey
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The built-in table: black, white, red, green, blue and grey/gray
    pub fn basic() -> Self {
        let mut table = Self::empty();
        for (name, [r, g, b]) in BASIC_COLORS {
            table.insert(name, Rgba([r, g, b, 255]));
        }
        table
    }

    /// Add or replace a named color. Names are stored lower-cased.
    pub fn insert(&mut self, name: &str, color: Rgba<u8>) {
        self.entries.insert(normalize_name(name), color);
    }

    pub fn get(&self, name: &str) -> Option<Rgba<u8>> {
        self.entries.get(&normalize_name(name)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge the colors of a JSON table file (`{"colors": {"name": "#RRGGBB"}}`)
    /// over the current entries
    pub fn merge_json(&mut self, json: &str) -> Result<()> {
        let file: ColorTableFile =
            serde_json::from_str(json).context("Failed to parse color table")?;

        for (name, value) in &file.colors {
            let color = parse_hex_color(value).with_context(|| {
                format!("Color '{name}' has invalid value '{value}', expected RRGGBB hex")
            })?;
            self.insert(name, color);
        }

        Ok(())
    }

    /// Built-in table extended with the colors from the given JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read color table {}", path.display()))?;
        let mut table = Self::basic();
        table.merge_json(&json)?;
        Ok(table)
    }
}

/// Resolves color strings against a table, optionally falling back to CSS color syntax
#[derive(Debug, Clone, Default)]
pub struct ColorResolver {
    table: ColorTable,
    css_fallback: bool,
}

impl ColorResolver {
    pub fn new(table: ColorTable) -> Self {
        Self {
            table,
            css_fallback: false,
        }
    }

    /// Try CSS color syntax (`orange`, `rgb(1, 2, 3)`, `#abc`) for names missing from the table
    pub fn with_css_fallback(mut self, enabled: bool) -> Self {
        self.css_fallback = enabled;
        self
    }

    pub fn table(&self) -> &ColorTable {
        &self.table
    }

    pub fn resolve(&self, input: &str) -> ColorResolution {
        if let Some(color) = parse_hex_color(input) {
            return ColorResolution::resolved(color);
        }

        if let Some(color) = self.table.get(input) {
            return ColorResolution::resolved(color);
        }

        if self.css_fallback {
            if let Some(color) = parse_css_color(input) {
                return ColorResolution::resolved(color);
            }
        }

        ColorResolution {
            color: FALLBACK_COLOR,
            diagnostic: Some(ColorDiagnostic::Unrecognized(input.to_string())),
        }
    }
}

/// Resolve a color string against the built-in table
pub fn resolve_color(input: &str) -> ColorResolution {
    ColorResolver::default().resolve(input)
}

/// Parse `#RRGGBB` or `RRGGBB` into an opaque color
pub fn parse_hex_color(input: &str) -> Option<Rgba<u8>> {
    let hex = input.strip_prefix('#').unwrap_or(input);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))
}

fn parse_css_color(input: &str) -> Option<Rgba<u8>> {
    css_color::Srgb::from_str(input.trim())
        .map(|color| {
            Rgba([
                (color.red * 255.).round() as u8,
                (color.green * 255.).round() as u8,
                (color.blue * 255.).round() as u8,
                255,
            ])
        })
        .ok()
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
