//! Market directory: the served locations and the provider lead-form mapping.
//!
//! Loaded once at startup from a YAML file (`DOORLEAD_LOCATIONS_PATH`). The
//! directory answers two questions for the request handlers: which mailbox is
//! notified for a location slug, and which `{location, lead_type}` a
//! provider-specific form id resolves to.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadType {
    Door,
    Cabinet,
}

impl std::fmt::Display for LeadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadType::Door => write!(f, "door"),
            LeadType::Cabinet => write!(f, "cabinet"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    pub slug: String,
    pub name: String,
    pub state: String,
    pub notify_email: Option<String>,
}

/// Resolution of a provider form id: which market it belongs to and what
/// kind of work the form advertises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    pub location: String,
    pub lead_type: LeadType,
}

#[derive(Debug, Deserialize)]
struct MarketsFile {
    locations: Vec<LocationConfig>,
    #[serde(default)]
    lead_forms: HashMap<String, FormConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct MarketDirectory {
    locations: HashMap<String, LocationConfig>,
    lead_forms: HashMap<String, FormConfig>,
}

impl MarketDirectory {
    #[must_use]
    pub fn location(&self, slug: &str) -> Option<&LocationConfig> {
        self.locations.get(slug)
    }

    /// The configured notification mailbox for a location slug, if any.
    #[must_use]
    pub fn notify_email(&self, slug: &str) -> Option<&str> {
        self.locations
            .get(slug)
            .and_then(|l| l.notify_email.as_deref())
    }

    /// Resolve a provider form id to its `{location, lead_type}` pair.
    #[must_use]
    pub fn form(&self, form_id: &str) -> Option<&FormConfig> {
        self.lead_forms.get(form_id)
    }

    #[must_use]
    pub fn location_count(&self) -> usize {
        self.locations.len()
    }
}

/// Load and validate the market directory from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_markets(path: &Path) -> Result<MarketDirectory, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::MarketsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_markets(&content)
}

/// Parse a market directory from YAML content.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML cannot be parsed or fails validation.
pub fn parse_markets(content: &str) -> Result<MarketDirectory, ConfigError> {
    let file: MarketsFile = serde_yaml::from_str(content)?;
    validate_markets(&file)?;

    let locations = file
        .locations
        .into_iter()
        .map(|l| (l.slug.clone(), l))
        .collect();

    Ok(MarketDirectory {
        locations,
        lead_forms: file.lead_forms,
    })
}

fn validate_markets(file: &MarketsFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for location in &file.locations {
        if location.slug.trim().is_empty() {
            return Err(ConfigError::Validation(
                "location slug must be non-empty".to_string(),
            ));
        }
        if !seen_slugs.insert(location.slug.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate location slug: '{}'",
                location.slug
            )));
        }
    }

    for (form_id, form) in &file.lead_forms {
        if !seen_slugs.contains(form.location.as_str()) {
            return Err(ConfigError::Validation(format!(
                "lead form '{}' references unknown location '{}'",
                form_id, form.location
            )));
        }
    }

    Ok(())
}
