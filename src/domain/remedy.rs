//! Static remedy knowledge base keyed by (crop, disease)

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Reference photo for one severity stage of a disease
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceImage {
    pub stage: String,
    pub path: String,
}

impl ReferenceImage {
    pub fn new(stage: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            path: path.into(),
        }
    }
}

/// Guidance attached to a diagnosis. The default value is the empty soft miss.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemedyInfo {
    #[serde(default)]
    pub remedy: String,
    #[serde(default)]
    pub identification: String,
    #[serde(default)]
    pub preventive_measures: Vec<String>,
    #[serde(default, rename = "Ref_images", with = "stage_map")]
    pub reference_images: Vec<ReferenceImage>,
}

impl RemedyInfo {
    pub fn is_empty(&self) -> bool {
        self.remedy.is_empty()
            && self.identification.is_empty()
            && self.preventive_measures.is_empty()
            && self.reference_images.is_empty()
    }
}

/// `Ref_images` as a `{stage: path}` object whose key order is the stage order.
/// A list of `{stage, path}` records is accepted on input as well.
pub mod stage_map {
    use std::fmt;

    use serde::de::{MapAccess, SeqAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::ReferenceImage;

    pub fn serialize<S: Serializer>(
        images: &[ReferenceImage],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(images.len()))?;
        for image in images {
            map.serialize_entry(&image.stage, &image.path)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<ReferenceImage>, D::Error> {
        deserializer.deserialize_any(StageMapVisitor)
    }

    struct StageMapVisitor;

    impl<'de> Visitor<'de> for StageMapVisitor {
        type Value = Vec<ReferenceImage>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a stage -> image path object")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut images = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((stage, path)) = map.next_entry::<String, String>()? {
                images.push(ReferenceImage { stage, path });
            }
            Ok(images)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut images = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(image) = seq.next_element::<ReferenceImage>()? {
                images.push(image);
            }
            Ok(images)
        }
    }
}

/// One catalog record as stored in a remedy file
#[derive(Debug, Clone, Deserialize)]
struct RemedyRecord {
    crop: String,
    disease: String,
    #[serde(flatten)]
    info: RemedyInfo,
}

/// Read-only (crop, disease) -> remedy lookup
#[derive(Debug, Clone, Default)]
pub struct RemedyCatalog {
    entries: HashMap<(String, String), RemedyInfo>,
}

impl RemedyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(
        mut self,
        crop: impl Into<String>,
        disease: impl Into<String>,
        info: RemedyInfo,
    ) -> Self {
        self.entries.insert((crop.into(), disease.into()), info);
        self
    }

    /// Builtin knowledge base; only corn common rust is documented so far
    pub fn builtin() -> Self {
        Self::new().with_entry(
            "Corn",
            "Common Rust",
            RemedyInfo {
                remedy: "Use fungicides like azoxystrobin or propiconazole.".to_string(),
                identification: "Reddish-brown pustules on leaves arranged in rows.".to_string(),
                preventive_measures: vec![
                    "Use resistant corn varieties.".to_string(),
                    "Rotate crops to reduce spore buildup.".to_string(),
                    "Avoid overhead irrigation.".to_string(),
                ],
                reference_images: vec![
                    ReferenceImage::new("healthy", "/src/images/corn_healthy.jpg"),
                    ReferenceImage::new("early", "/src/images/rust_early.jpg"),
                    ReferenceImage::new("moderate", "/src/images/corn_rust2.jpg"),
                    ReferenceImage::new("severe", "/src/images/rust_severe.png"),
                ],
            },
        )
    }

    /// Parse a JSON array of `{crop, disease, remedy, identification, ...}` records
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let records: Vec<RemedyRecord> = serde_json::from_str(json)
            .map_err(|e| DomainError::configuration(format!("invalid remedy catalog: {}", e)))?;

        let mut entries = HashMap::with_capacity(records.len());
        for record in records {
            let key = (record.crop, record.disease);
            if entries.contains_key(&key) {
                return Err(DomainError::configuration(format!(
                    "remedy for crop '{}' disease '{}' defined more than once",
                    key.0, key.1
                )));
            }
            entries.insert(key, record.info);
        }

        Ok(Self { entries })
    }

    pub fn from_file(path: &Path) -> Result<Self, DomainError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!(
                "failed to read remedy catalog '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&json)
    }

    /// Total lookup: unknown pairs yield the empty default
    pub fn lookup(&self, crop: &str, disease: &str) -> RemedyInfo {
        self.entries
            .get(&(crop.to_string(), disease.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
