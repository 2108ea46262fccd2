use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub type ObjectId = String;
pub type JobKey = String;

/// Property key holding the persisted classification of an object.
pub const KIND_PROPERTY: &str = "kind";
/// Optional property a generated BOM may carry to name the job that produced it.
pub const JOB_ID_PROPERTY: &str = "job_id";

/// Metadata record in the external store describing one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub id: ObjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: ObjectContent,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: BTreeMap<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Unparseable timestamps read as absent rather than rejecting the record.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

impl StoredObject {
    pub fn kind(&self) -> Option<ObjectKind> {
        self.properties
            .get(KIND_PROPERTY)
            .and_then(Value::as_str)
            .and_then(ObjectKind::parse)
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectContent {
    #[serde(default)]
    pub source: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub name: String,
}

/// Classification stored in `properties.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Spec,
    CatalogItem,
    Bom,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Spec => "spec",
            ObjectKind::CatalogItem => "catalog_item",
            ObjectKind::Bom => "bom",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "spec" => Some(ObjectKind::Spec),
            "catalog_item" => Some(ObjectKind::CatalogItem),
            "bom" => Some(ObjectKind::Bom),
            _ => None,
        }
    }

    /// Properties attached to an object created with this kind.
    pub fn properties(self) -> BTreeMap<String, Value> {
        let mut props = BTreeMap::new();
        props.insert(
            KIND_PROPERTY.to_string(),
            Value::String(self.as_str().to_string()),
        );
        props
    }
}

/// The two panels the reconciler keeps in sync with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListKind {
    Catalog,
    Bom,
}

impl ListKind {
    pub fn object_kind(self) -> ObjectKind {
        match self {
            ListKind::Catalog => ObjectKind::CatalogItem,
            ListKind::Bom => ObjectKind::Bom,
        }
    }

    /// Opaque key/value filter passed through to the list endpoint.
    pub fn filter(self) -> Vec<(String, String)> {
        vec![(
            format!("properties.{KIND_PROPERTY}"),
            self.object_kind().as_str().to_string(),
        )]
    }

    pub fn label(self) -> &'static str {
        match self {
            ListKind::Catalog => "catalogue",
            ListKind::Bom => "BOM list",
        }
    }
}

/// A local file picked by the user, not yet read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub path: PathBuf,
    pub name: String,
}

impl FileSelection {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, name }
    }
}
