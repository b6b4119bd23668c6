use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::{LabelError, LabelResult};

/// One classification class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ClassDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            description: description.into(),
            examples: Vec::new(),
            metadata: serde_json::Map::new(),
        }
    }
}

/// A named, ordered collection of classes.
///
/// Class order carries no ranking meaning but is the tie-break order used by the ranker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelSet {
    id: String,
    classes: Vec<ClassDefinition>,
}

impl LabelSet {
    /// Builds a label set, rejecting duplicate class names.
    pub fn new(id: impl Into<String>, classes: Vec<ClassDefinition>) -> LabelResult<Self> {
        let id = id.into();
        let mut seen = HashSet::with_capacity(classes.len());
        for class in &classes {
            if !seen.insert(class.name.as_str()) {
                return Err(LabelError::DuplicateClass {
                    label_set: id,
                    name: class.name.clone(),
                });
            }
        }
        Ok(Self { id, classes })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn classes(&self) -> &[ClassDefinition] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Per-class embedding vectors for one label set.
///
/// Rows are stored in the label set's class order so that row `i` always belongs to
/// class `i`. Construct with [`EmbeddingTable::aligned`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    rows: Vec<Vec<f32>>,
    dim: usize,
    model_name: Option<String>,
}

impl EmbeddingTable {
    /// Aligns `vectors` (keyed by class name) to the class order of `label_set`.
    ///
    /// Every class needs exactly one vector and all vectors must share one dimension.
    /// Vectors for names the label set does not know are dropped with a warning.
    pub fn aligned(
        label_set: &LabelSet,
        mut vectors: HashMap<String, Vec<f32>>,
        model_name: Option<String>,
    ) -> LabelResult<Self> {
        if label_set.is_empty() {
            return Err(LabelError::EmptyLabelSet {
                label_set: label_set.id().to_string(),
            });
        }

        let mut rows = Vec::with_capacity(label_set.len());
        let mut dim = None;

        for class in label_set.classes() {
            let vector = vectors
                .remove(&class.name)
                .ok_or_else(|| LabelError::MissingEmbedding {
                    label_set: label_set.id().to_string(),
                    class: class.name.clone(),
                })?;

            let expected = *dim.get_or_insert(vector.len());
            if vector.len() != expected || expected == 0 {
                return Err(LabelError::DimensionMismatch {
                    label_set: label_set.id().to_string(),
                    class: class.name.clone(),
                    expected,
                    actual: vector.len(),
                });
            }
            rows.push(vector);
        }

        for orphan in vectors.keys() {
            warn!(
                label_set = label_set.id(),
                class = %orphan,
                "Embedding references unknown class, skipping"
            );
        }

        Ok(Self {
            rows,
            dim: dim.unwrap_or(0),
            model_name,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    /// Re-keys the rows by class name (for persistence).
    pub fn to_named(&self, label_set: &LabelSet) -> Vec<(String, Vec<f32>)> {
        label_set
            .classes()
            .iter()
            .zip(&self.rows)
            .map(|(class, row)| (class.name.clone(), row.clone()))
            .collect()
    }
}

/// Required-condition specifications, keyed by class name.
///
/// The specification is free-form JSON (boolean-combinable conditions) and is only ever
/// interpreted by the external validation provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    by_class: HashMap<String, serde_json::Value>,
}

impl AttributeSet {
    /// Keeps only entries for classes known to `label_set`.
    pub fn for_label_set(
        label_set: &LabelSet,
        entries: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) -> Self {
        let mut by_class = HashMap::new();
        for (class_name, spec) in entries {
            if !label_set.contains(&class_name) {
                warn!(
                    label_set = label_set.id(),
                    class = %class_name,
                    "Attribute entry references unknown class, skipping"
                );
                continue;
            }
            by_class.insert(class_name, spec);
        }
        Self { by_class }
    }

    /// Returns the spec for `class_name` if one exists and declares anything.
    pub fn get(&self, class_name: &str) -> Option<&serde_json::Value> {
        self.by_class
            .get(class_name)
            .filter(|spec| !is_empty_spec(spec))
    }

    pub fn len(&self) -> usize {
        self.by_class.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_class.is_empty()
    }
}

fn is_empty_spec(spec: &serde_json::Value) -> bool {
    match spec {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
