// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

use crate::config::layer::LayerDescriptor;
use crate::config::stack::LayerStack;
use crate::observability::messages::config::DocumentLoaded;
use crate::observability::messages::StructuredLog;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Declarative description of a whole layer stack.
///
/// Layers appear highest priority first; each may name a backing document
/// that is merged in at load time.
///
/// # Example
/// ```yaml
/// layers:
///   - name: runtime
///     settable: true
///   - name: account
///     loadable: true
///     settable: true
///     persistable: true
///     document: account.yaml
///   - name: defaults
///     loadable: true
///     document: defaults.yaml
/// ```
#[derive(Debug, Deserialize)]
pub struct StackConfig {
    pub layers: Vec<LayerEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LayerEntry {
    #[serde(flatten)]
    pub descriptor: LayerDescriptor,
    pub document: Option<PathBuf>,
}

/// Build a layer stack from a YAML stack description, loading each backing
/// document relative to the description file's directory.
pub fn load_stack<P: AsRef<Path>>(path: P) -> Result<LayerStack> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading stack description {}", path.display()))?;
    let config: StackConfig =
        serde_yaml::from_str(&content).context("parsing stack description")?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut stack = LayerStack::new(
        config
            .layers
            .iter()
            .map(|entry| entry.descriptor.clone())
            .collect(),
    );

    for entry in &config.layers {
        let Some(document) = &entry.document else {
            continue;
        };
        let document = base.join(document);
        let loaded = load_document(&document)?;
        let layer = stack
            .layer_mut(&entry.descriptor.name)
            .expect("layer was just constructed");
        if !layer.merge_document(&loaded) {
            bail!(
                "layer '{}' names a document but is not loadable",
                entry.descriptor.name
            );
        }
        DocumentLoaded {
            layer: &entry.descriptor.name,
            path: &document.display().to_string(),
        }
        .log();
    }

    Ok(stack)
}

/// Load one layer document: a YAML mapping of sections to attribute
/// mappings. Scalar sections are rejected so a malformed document cannot
/// shadow a whole section in a lower layer.
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading layer document {}", path.display()))?;
    let parsed: serde_yaml::Value =
        serde_yaml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    let document: Value = serde_json::to_value(parsed)
        .with_context(|| format!("converting {} to a value tree", path.display()))?;

    let Some(sections) = document.as_object() else {
        bail!("{}: top level must be a mapping of sections", path.display());
    };
    for (section, attrs) in sections {
        if !attrs.is_object() {
            bail!(
                "{}: section '{}' must be a mapping of attributes",
                path.display(),
                section
            );
        }
    }
    Ok(document)
}

/// Serialize a persistable layer's store back out as YAML.
pub fn save_document<P: AsRef<Path>>(stack: &LayerStack, name: &str, path: P) -> Result<()> {
    let path = path.as_ref();
    let Some(layer) = stack.layer(name) else {
        bail!("no layer named '{name}'");
    };
    if !layer.is_persistable() {
        bail!("layer '{name}' is not persistable");
    }
    let rendered =
        serde_yaml::to_string(layer.store()).with_context(|| format!("serializing '{name}'"))?;
    fs::write(path, rendered)
        .with_context(|| format!("writing layer document {}", path.display()))?;
    Ok(())
}
