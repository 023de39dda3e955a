//! Colour and shape scales for the category channel.

use crate::chart::error::RenderError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Neutral grey used for categories without a colour.
    pub const FALLBACK: Rgb = Rgb(128, 128, 128);

    /// Parses `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, RenderError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(RenderError::InvalidColor(hex.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| RenderError::InvalidColor(hex.to_string()))
        };
        Ok(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Marker glyphs, handed out to categories in sorted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerShape {
    Circle,
    Triangle,
    Square,
    Cross,
}

impl MarkerShape {
    const CYCLE: [MarkerShape; 4] = [
        MarkerShape::Circle,
        MarkerShape::Triangle,
        MarkerShape::Square,
        MarkerShape::Cross,
    ];

    pub fn for_index(index: usize) -> Self {
        Self::CYCLE[index % Self::CYCLE.len()]
    }
}

/// What to do with a category the colour scale does not name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCategoryPolicy {
    /// Draw it in [`Rgb::FALLBACK`] and log a warning.
    #[default]
    Fallback,
    /// Fail with [`RenderError::UnmappedCategory`].
    Reject,
}

/// A manual category → colour mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorScale {
    values: BTreeMap<String, Rgb>,
    policy: UnknownCategoryPolicy,
}

impl ColorScale {
    pub fn manual(values: impl IntoIterator<Item = (String, Rgb)>) -> Self {
        Self {
            values: values.into_iter().collect(),
            policy: UnknownCategoryPolicy::default(),
        }
    }

    /// Builds a scale from `name → "#RRGGBB"` pairs.
    pub fn from_hex_map(values: &BTreeMap<String, String>) -> Result<Self, RenderError> {
        let parsed = values
            .iter()
            .map(|(name, hex)| Ok((name.clone(), Rgb::from_hex(hex)?)))
            .collect::<Result<Vec<_>, RenderError>>()?;
        Ok(Self::manual(parsed))
    }

    pub fn with_policy(mut self, policy: UnknownCategoryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn color_for(&self, category: &str) -> Result<Rgb, RenderError> {
        match self.values.get(category) {
            Some(color) => Ok(*color),
            None => match self.policy {
                UnknownCategoryPolicy::Fallback => {
                    warn!(
                        "No colour for category '{}', using {}",
                        category,
                        Rgb::FALLBACK
                    );
                    Ok(Rgb::FALLBACK)
                }
                UnknownCategoryPolicy::Reject => {
                    Err(RenderError::UnmappedCategory(category.to_string()))
                }
            },
        }
    }
}
