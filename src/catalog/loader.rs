//! Read-only JSON documents shipped next to the binary. Every call reads
//! the file again so edits show up without a restart.

use std::{io::ErrorKind, path::PathBuf};

use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{error::AppError, itineraries::dto::Activity};

const PLACES_FILE: &str = "places.json";
const RESTAURANTS_FILE: &str = "restaurants.json";
const TEMPLATE_FILE: &str = "itinerary_template.json";

/// A place or restaurant, served exactly as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Listing(pub Map<String, Value>);

impl Listing {
    /// String value of `key`; empty when absent, null or not a string.
    pub fn text(&self, key: &str) -> &str {
        self.0.get(key).and_then(Value::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct TemplateDocument {
    #[serde(default)]
    activities: Vec<Activity>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    data_dir: PathBuf,
}

impl Catalog {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    async fn load<T: DeserializeOwned>(&self, file: &str, what: &str) -> Result<T, AppError> {
        let path = self.data_dir.join(file);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "catalog document missing");
                return Err(AppError::not_found(what));
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read {}", path.display()))
                    .into())
            }
        };
        let doc = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse {}", path.display()))?;
        debug!(path = %path.display(), "catalog document loaded");
        Ok(doc)
    }

    pub async fn load_places(&self) -> Result<Vec<Listing>, AppError> {
        self.load(PLACES_FILE, "Places data").await
    }

    pub async fn load_restaurants(&self) -> Result<Vec<Listing>, AppError> {
        self.load(RESTAURANTS_FILE, "Restaurants data").await
    }

    /// Activities of the generation template.
    pub async fn load_template(&self) -> Result<Vec<Activity>, AppError> {
        let doc: TemplateDocument = self.load(TEMPLATE_FILE, "Itinerary template").await?;
        Ok(doc.activities)
    }
}
