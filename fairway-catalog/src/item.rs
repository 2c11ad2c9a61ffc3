use serde::{Deserialize, Serialize};

/// The bookable item kinds a visitor can put in their pack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Course,
    Experience,
}

impl CatalogKind {
    /// Catalog collection the kind is stored in.
    pub fn collection(&self) -> &'static str {
        match self {
            CatalogKind::Course => "courses",
            CatalogKind::Experience => "experiences",
        }
    }
}

/// Display summary of a catalog item, captured at selection time.
///
/// This is the only shape the session layer accepts; raw selection
/// payloads are normalized into it first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub id: String,
    pub kind: CatalogKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CatalogSummary {
    pub fn new(id: impl Into<String>, kind: CatalogKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            image_url: None,
            location: None,
            description: None,
        }
    }
}

/// Raw add-to-pack payload as it arrives from older catalog pages.
///
/// Historically a selection was sometimes just the item's id and sometimes
/// a full display object. Both shapes are accepted here and nowhere else.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSelection {
    Id(String),
    Summary {
        id: String,
        name: Option<String>,
        #[serde(default, alias = "imageUrl")]
        image_url: Option<String>,
        #[serde(default)]
        location: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

impl RawSelection {
    /// Normalize into a well-formed summary. A bare id carries no display
    /// fields; the name falls back to the id so downstream rendering never
    /// sees an empty title.
    pub fn normalize(self, kind: CatalogKind) -> CatalogSummary {
        match self {
            RawSelection::Id(id) => {
                let name = id.clone();
                CatalogSummary {
                    id,
                    kind,
                    name,
                    image_url: None,
                    location: None,
                    description: None,
                }
            }
            RawSelection::Summary {
                id,
                name,
                image_url,
                location,
                description,
            } => {
                let name = name.unwrap_or_else(|| id.clone());
                CatalogSummary {
                    id,
                    kind,
                    name,
                    image_url,
                    location,
                    description,
                }
            }
        }
    }
}
