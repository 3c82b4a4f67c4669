//! Platform branding.
//!
//! This module provides:
//! - `BrandingConfig` - name, copy, logo, colors, fonts, spacing, social links
//! - `BrandingPatch` - partial update, shallow-merged into a new config
//! - `BrandingHandle` - the current immutable snapshot plus persistence

mod handle;

use serde::{Deserialize, Serialize};

pub use handle::{BrandingHandle, BRANDING_KEY};

// =============================================================================
// Config Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logo {
    pub src: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// HSL triplets, e.g. `"221.2 83.2% 53.3%"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fonts {
    pub family: String,
    pub weights: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spacing {
    pub base: String,
    pub sections: String,
    pub components: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Social {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
}

// =============================================================================
// Branding Config
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandingConfig {
    pub name: String,
    pub tagline: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<Logo>,
    pub colors: Colors,
    pub fonts: Fonts,
    pub spacing: Spacing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social: Option<Social>,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            name: "Platform".to_string(),
            tagline: "Build amazing experiences".to_string(),
            description: "A powerful platform for building modern applications with ease"
                .to_string(),
            logo: None,
            colors: Colors {
                primary: "221.2 83.2% 53.3%".to_string(),
                secondary: "210 40% 98%".to_string(),
                accent: "210 40% 90%".to_string(),
            },
            fonts: Fonts {
                family: "Inter, system-ui, sans-serif".to_string(),
                weights: vec![400, 500, 600, 700],
            },
            spacing: Spacing {
                base: "1rem".to_string(),
                sections: "3rem".to_string(),
                components: "1.5rem".to_string(),
            },
            social: None,
        }
    }
}

/// Partial update. Each present field replaces the whole top-level field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<Logo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Colors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonts: Option<Fonts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<Spacing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social: Option<Social>,
}

impl BrandingPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl BrandingConfig {
    /// A new config with `patch` shallow-merged over `self`.
    pub fn merged(&self, patch: &BrandingPatch) -> Self {
        let patch = patch.clone();
        Self {
            name: patch.name.unwrap_or_else(|| self.name.clone()),
            tagline: patch.tagline.unwrap_or_else(|| self.tagline.clone()),
            description: patch.description.unwrap_or_else(|| self.description.clone()),
            logo: patch.logo.or_else(|| self.logo.clone()),
            colors: patch.colors.unwrap_or_else(|| self.colors.clone()),
            fonts: patch.fonts.unwrap_or_else(|| self.fonts.clone()),
            spacing: patch.spacing.unwrap_or_else(|| self.spacing.clone()),
            social: patch.social.or_else(|| self.social.clone()),
        }
    }

    /// The `--brand-*` custom properties, in declaration order.
    pub fn css_variables(&self) -> Vec<(&'static str, String)> {
        vec![
            ("--brand-primary", self.colors.primary.clone()),
            ("--brand-secondary", self.colors.secondary.clone()),
            ("--brand-accent", self.colors.accent.clone()),
            ("--brand-font-family", self.fonts.family.clone()),
            ("--brand-spacing", self.spacing.base.clone()),
            ("--brand-spacing-sections", self.spacing.sections.clone()),
            ("--brand-spacing-components", self.spacing.components.clone()),
        ]
    }

    /// Render the custom properties as a `:root` block.
    pub fn css_root_block(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, value) in self.css_variables() {
            css.push_str(&format!("  {name}: {};\n", css_value(&value)));
        }
        css.push_str("}\n");
        css
    }
}

/// Strip characters that would end the declaration or the block.
fn css_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>' | '\n' | '\r'))
        .collect::<String>()
        .trim()
        .to_string()
}
