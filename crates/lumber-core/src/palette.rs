//! Fixed color palette for log prefixes.

use std::collections::HashMap;

use colored::Color;

use crate::ContainerDescriptor;

/// Fixed, read-only mapping from color name to terminal color.
///
/// Built once and never mutated afterwards; the registry allocates one
/// entry per newly followed container, keeping usage as balanced as
/// possible across the palette.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: HashMap<&'static str, Color>,
}

impl Palette {
    /// Build the default twelve-entry palette.
    pub fn new() -> Self {
        let mut colors = HashMap::new();
        colors.insert("blue", Color::Blue);
        colors.insert("hiblue", Color::BrightBlue);
        colors.insert("green", Color::Green);
        colors.insert("higreen", Color::BrightGreen);
        colors.insert("red", Color::Red);
        colors.insert("hired", Color::BrightRed);
        colors.insert("magenta", Color::Magenta);
        colors.insert("himagenta", Color::BrightMagenta);
        colors.insert("yellow", Color::Yellow);
        colors.insert("hiyellow", Color::BrightYellow);
        colors.insert("cyan", Color::Cyan);
        colors.insert("hicyan", Color::BrightCyan);
        Self { colors }
    }

    /// Look up a palette entry by name.
    pub fn color(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }

    /// Pick the palette entry with the fewest active users.
    ///
    /// Ties are broken arbitrarily (map iteration order); callers may
    /// only rely on the result having minimal usage among all entries.
    pub fn pick_least_used(&self, active: &[ContainerDescriptor]) -> &'static str {
        let mut usage: HashMap<&'static str, usize> =
            self.colors.keys().map(|name| (*name, 0)).collect();
        for container in active {
            if let Some(count) = usage.get_mut(container.color_name.as_str()) {
                *count += 1;
            }
        }
        usage
            .into_iter()
            .min_by_key(|(_, count)| *count)
            .map(|(name, _)| name)
            .unwrap_or("blue")
    }

    /// Number of entries in the palette.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the palette is empty. Never true for [`Palette::new`].
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}
