//! Persistence boundary: whole-project snapshots in and out of a [`Canvas`], plus the JSON file
//! helpers the CLI uses.

use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::canvas::{Canvas, CanvasEvent};
use crate::error::ProjectError;
use crate::model::PlotGraph;

pub fn export_project(canvas: &Canvas) -> PlotGraph {
    canvas.graph().clone()
}

/// Replaces the canvas content after structural validation. A rejected snapshot leaves the
/// canvas untouched.
pub fn import_project(canvas: &mut Canvas, snapshot: PlotGraph) -> Result<(), ProjectError> {
    if let Err(err) = snapshot.validate() {
        tracing::warn!(%err, "project import rejected");
        return Err(err);
    }
    tracing::debug!(
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        "project imported"
    );
    canvas.replace_graph(snapshot);
    Ok(())
}

pub fn clear_project(canvas: &mut Canvas) {
    canvas.replace_graph(PlotGraph::default());
}

/// Strict JSON first, JSON5 as a fallback for hand-edited files.
fn parse_lenient<T: DeserializeOwned>(contents: &str) -> Result<T> {
    match serde_json::from_str(contents) {
        Ok(value) => Ok(value),
        Err(json_err) => json5::from_str(contents).map_err(|_| anyhow::anyhow!(json_err)),
    }
}

pub fn parse_project(contents: &str) -> Result<PlotGraph> {
    parse_lenient(contents).context("invalid project file")
}

pub fn parse_events(contents: &str) -> Result<Vec<CanvasEvent>> {
    parse_lenient(contents).context("invalid event script")
}

/// Reads a file, or stdin when `path` is `None` or `-`.
pub fn read_source(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

pub fn read_project(path: Option<&Path>) -> Result<PlotGraph> {
    parse_project(&read_source(path)?)
}

pub fn read_events(path: &Path) -> Result<Vec<CanvasEvent>> {
    parse_events(&read_source(Some(path))?)
}

/// Pretty JSON to `path`, or stdout when omitted.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(path) = path {
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    } else {
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
    }
    Ok(())
}
