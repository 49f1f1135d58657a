//! Value Objects for the catalog

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// SKU (Stock Keeping Unit) value object
///
/// Generated codes have the shape `{base}-{color}-{size}`, always uppercase.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > 50 { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }

    /// Derives the code for one (variant color, size) combination.
    ///
    /// No collision handling: two colors sharing a derived color code map to
    /// the same SKU.
    pub fn generate(base: &str, color: &str, size: SizeLabel) -> Self {
        Self(format!("{}-{}-{}", base.trim(), color_code(color), size.sku_code()).to_uppercase())
    }

    pub fn as_str(&self) -> &str { &self.0 }

    /// Base code is everything before the first hyphen.
    pub fn base(&self) -> &str { self.0.split('-').next().unwrap_or_default() }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SkuError { Empty, TooLong }
impl std::error::Error for SkuError {}
impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "SKU empty"), Self::TooLong => write!(f, "SKU too long") }
    }
}

/// Color part of a SKU.
///
/// Two or more space separated words give the first letter of the first word
/// plus the first two letters of the second; a single word gives its first
/// three letters. Splitting is on single spaces, so doubled spaces produce an
/// empty second word.
pub fn color_code(color: &str) -> String {
    let words: Vec<&str> = color.split(' ').collect();
    let code: String = if words.len() > 1 {
        words[0].chars().take(1).chain(words[1].chars().take(2)).collect()
    } else {
        color.chars().take(3).collect()
    };
    code.to_uppercase()
}

/// Offered size labels, clothing first, then storage capacities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeLabel {
    #[serde(rename = "s")] S,
    #[serde(rename = "m")] M,
    #[serde(rename = "l")] L,
    #[serde(rename = "xl")] Xl,
    #[serde(rename = "xxl")] Xxl,
    #[serde(rename = "64GB")] Gb64,
    #[serde(rename = "128GB")] Gb128,
    #[serde(rename = "256GB")] Gb256,
    #[serde(rename = "512GB")] Gb512,
    #[serde(rename = "1TB")] Tb1,
}

impl SizeLabel {
    pub const ALL: [SizeLabel; 10] = [
        Self::S, Self::M, Self::L, Self::Xl, Self::Xxl,
        Self::Gb64, Self::Gb128, Self::Gb256, Self::Gb512, Self::Tb1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S => "s", Self::M => "m", Self::L => "l", Self::Xl => "xl", Self::Xxl => "xxl",
            Self::Gb64 => "64GB", Self::Gb128 => "128GB", Self::Gb256 => "256GB",
            Self::Gb512 => "512GB", Self::Tb1 => "1TB",
        }
    }

    pub fn sku_code(&self) -> &'static str {
        match self {
            Self::S => "sm", Self::M => "md", Self::L => "lg", Self::Xl => "xl", Self::Xxl => "xx",
            Self::Gb64 => "64", Self::Gb128 => "128", Self::Gb256 => "256",
            Self::Gb512 => "512", Self::Tb1 => "1TB",
        }
    }

    pub fn parse(value: &str) -> Option<Self> { Self::ALL.into_iter().find(|s| s.as_str() == value) }
}

impl fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Which sizes a product is offered in. Every variant shares the selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeSelection(BTreeMap<SizeLabel, bool>);

impl SizeSelection {
    /// Full map with every label present and nothing offered.
    pub fn none() -> Self { Self(SizeLabel::ALL.into_iter().map(|s| (s, false)).collect()) }

    pub fn from_selected(sizes: impl IntoIterator<Item = SizeLabel>) -> Self {
        let mut selection = Self::none();
        for size in sizes { selection.0.insert(size, true); }
        selection
    }

    pub fn set(&mut self, size: SizeLabel, offered: bool) { self.0.insert(size, offered); }
    pub fn is_offered(&self, size: SizeLabel) -> bool { self.0.get(&size).copied().unwrap_or(false) }

    /// Selected labels in enumeration order.
    pub fn selected(&self) -> Vec<SizeLabel> {
        self.0.iter().filter(|(_, offered)| **offered).map(|(size, _)| *size).collect()
    }
}

/// Collapses whitespace runs, trims and lowercases free text.
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Joins the parts with spaces, then hyphenates every space and lowercases.
pub fn slugify(parts: &[&str]) -> String {
    parts.join(" ").replace(' ', "-").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku() { let sku = Sku::new(" prod-001 ").unwrap(); assert_eq!(sku.as_str(), "PROD-001"); }

    #[test]
    fn test_sku_rejects_empty() { assert_eq!(Sku::new("   "), Err(SkuError::Empty)); }

    #[test]
    fn two_word_color_takes_one_plus_two_letters() {
        assert_eq!(color_code("Space Gray"), "SGR");
        assert_eq!(color_code("rose gold pink"), "RGO");
    }

    #[test]
    fn single_word_color_takes_three_letters() {
        assert_eq!(color_code("black"), "BLA");
        assert_eq!(color_code("Re"), "RE");
    }

    #[test]
    fn generated_sku_matches_catalog_format() {
        assert_eq!(Sku::generate("PHX", "Space Gray", SizeLabel::Gb128).as_str(), "PHX-SGR-128");
        assert_eq!(Sku::generate("tee", "white", SizeLabel::Xxl).as_str(), "TEE-WHI-XX");
        assert_eq!(Sku::generate("PH", "Blue", SizeLabel::Tb1).as_str(), "PH-BLU-1TB");
    }

    #[test]
    fn generation_is_deterministic() {
        for size in SizeLabel::ALL {
            assert_eq!(Sku::generate("AB", "Midnight Green", size), Sku::generate("AB", "Midnight Green", size));
        }
    }

    #[test]
    fn colliding_colors_share_a_code() {
        assert_eq!(Sku::generate("X", "Space Gray", SizeLabel::M), Sku::generate("X", "Silver Green", SizeLabel::M));
    }

    #[test]
    fn sku_base_is_first_segment() { assert_eq!(Sku::generate("PHX", "red", SizeLabel::S).base(), "PHX"); }

    #[test]
    fn size_selection_keeps_enumeration_order() {
        let mut sel = SizeSelection::none();
        sel.set(SizeLabel::Gb256, true);
        sel.set(SizeLabel::Gb64, true);
        assert_eq!(sel.selected(), vec![SizeLabel::Gb64, SizeLabel::Gb256]);
        assert!(!sel.is_offered(SizeLabel::S));
    }

    #[test]
    fn size_selection_serializes_as_label_map() {
        let sel = SizeSelection::from_selected([SizeLabel::Xl]);
        let json = serde_json::to_value(&sel).unwrap();
        assert_eq!(json["xl"], true);
        assert_eq!(json["1TB"], false);
        let back: SizeSelection = serde_json::from_value(json).unwrap();
        assert_eq!(back, sel);
    }

    #[test]
    fn text_and_slugs() {
        assert_eq!(normalize_text("  Phone \t  X  "), "phone x");
        assert_eq!(slugify(&["smartphone", "phone x", "Space Gray"]), "smartphone-phone-x-space-gray");
    }
}
