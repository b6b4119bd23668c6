//! JSON file formats for label sets, embedding tables and attribute sets.
//!
//! File naming per label-set id: `{id}.json`, `{id}_embeddings.json`,
//! `{id}_attributes.json`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{LabelError, LabelResult};
use super::model::{AttributeSet, ClassDefinition, EmbeddingTable, LabelSet};
use super::registry::{LabelRegistry, LoadedLabelSet};

#[derive(Debug, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    classes: Vec<ClassDefinition>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EmbeddingFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    class_names: Vec<String>,
    embeddings: HashMap<String, Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct AttributeFile {
    #[serde(default)]
    classes: Vec<AttributeEntry>,
}

#[derive(Debug, Deserialize)]
struct AttributeEntry {
    class_name: String,
    #[serde(default)]
    required_attributes: serde_json::Value,
}

pub fn dataset_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.json"))
}

pub fn embeddings_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}_embeddings.json"))
}

pub fn attributes_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}_attributes.json"))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> LabelResult<T> {
    let bytes = std::fs::read(path).map_err(|source| LabelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| LabelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a label set definition.
pub fn load_label_set(id: &str, path: &Path) -> LabelResult<LabelSet> {
    let file: DatasetFile = read_json(path)?;
    let classes = file
        .classes
        .into_iter()
        .enumerate()
        .map(|(idx, mut class)| {
            if class.id.is_empty() {
                class.id = idx.to_string();
            }
            class
        })
        .collect();
    LabelSet::new(id, classes)
}

/// Reads raw per-class vectors plus the model that produced them.
pub fn load_embedding_vectors(
    path: &Path,
) -> LabelResult<(HashMap<String, Vec<f32>>, Option<String>)> {
    let file: EmbeddingFile = read_json(path)?;
    Ok((file.embeddings, file.model_name))
}

/// Reads attribute specs as `(class_name, spec)` pairs.
pub fn load_attribute_entries(path: &Path) -> LabelResult<Vec<(String, serde_json::Value)>> {
    let file: AttributeFile = read_json(path)?;
    Ok(file
        .classes
        .into_iter()
        .map(|e| (e.class_name, e.required_attributes))
        .collect())
}

/// Writes an embedding table in the format [`load_embedding_vectors`] reads.
pub fn save_embedding_table(
    path: &Path,
    label_set: &LabelSet,
    table: &EmbeddingTable,
) -> LabelResult<()> {
    let named = table.to_named(label_set);
    let file = EmbeddingFile {
        model_name: table.model_name().map(str::to_string),
        class_names: named.iter().map(|(name, _)| name.clone()).collect(),
        embeddings: named.into_iter().collect(),
    };

    let io_err = |source: std::io::Error| LabelError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_vec_pretty(&file).map_err(|source| LabelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(io_err)
}

/// Reads `{id}.json` plus whatever embedding/attribute files exist next to it into an
/// unregistered [`LoadedLabelSet`].
///
/// A missing embeddings file is not an error: the value comes back without a table
/// (not ready) so the caller can generate one before registering it.
pub fn load_from_dirs(
    id: &str,
    datasets_dir: &Path,
    embeddings_dir: &Path,
) -> LabelResult<LoadedLabelSet> {
    let label_set = load_label_set(id, &dataset_path(datasets_dir, id))?;
    info!(label_set = id, classes = label_set.len(), "Loaded label set definition");

    let mut loaded = LoadedLabelSet::new(label_set);

    let emb_path = embeddings_path(embeddings_dir, id);
    if emb_path.exists() {
        let (vectors, model_name) = load_embedding_vectors(&emb_path)?;
        loaded.embeddings = Some(EmbeddingTable::aligned(
            &loaded.label_set,
            vectors,
            model_name,
        )?);
    } else {
        warn!(label_set = id, path = %emb_path.display(), "Embeddings file not found");
    }

    let attr_path = attributes_path(datasets_dir, id);
    if attr_path.exists() {
        let entries = load_attribute_entries(&attr_path)?;
        loaded.attributes = Some(AttributeSet::for_label_set(
            &loaded.label_set,
            entries,
        ));
    }

    Ok(loaded)
}

/// [`load_from_dirs`] followed by a single swap into `registry`.
pub fn load_into_registry(
    registry: &LabelRegistry,
    id: &str,
    datasets_dir: &Path,
    embeddings_dir: &Path,
) -> LabelResult<std::sync::Arc<LoadedLabelSet>> {
    let loaded = load_from_dirs(id, datasets_dir, embeddings_dir)?;
    Ok(registry.insert(loaded))
}
