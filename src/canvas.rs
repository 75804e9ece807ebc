//! Interactive session over a [`PlotGraph`].
//!
//! The canvas owns the current snapshot plus the transient state the rendering collaborator
//! needs between events: the drag in progress, the highlighted edge, the selection and the last
//! reported height of every node. Every event either swaps in a complete new snapshot or leaves
//! the current one untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::layout::geometry::effective_size;
use crate::layout::{
    self, ConnectionRequest, DropOutcome, find_intersecting_edge, resolve_drop,
};
use crate::model::{AttributeField, NodeKind, PlotGraph, Position, Size};

/// Events emitted by the rendering collaborator and the editing UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CanvasEvent {
    #[serde(rename_all = "camelCase")]
    DragMove { node_id: String, position: Position },
    #[serde(rename_all = "camelCase")]
    DragEnd { node_id: String, position: Position },
    DragCancel,
    ConnectAttempt(ConnectionRequest),
    #[serde(rename_all = "camelCase")]
    SizeChange { node_id: String, height: f32 },
    #[serde(rename_all = "camelCase")]
    SelectionChange {
        #[serde(default)]
        node_ids: Vec<String>,
        #[serde(default)]
        edge_ids: Vec<String>,
    },
    GroupSelection,
    #[serde(rename_all = "camelCase")]
    Ungroup { group_id: String },
    #[serde(rename_all = "camelCase")]
    DetachStatus { host_id: String, index: usize },
    DeleteSelection,
    #[serde(rename_all = "camelCase")]
    DeleteNode { node_id: String },
    #[serde(rename_all = "camelCase")]
    DeleteEdge { edge_id: String },
    #[serde(rename_all = "camelCase")]
    UpdateAttribute {
        node_id: String,
        field: AttributeField,
        value: String,
    },
    AddStory {
        position: Position,
        #[serde(default)]
        label: String,
    },
    AddStatus {
        position: Position,
        name: String,
        #[serde(default)]
        color: Option<String>,
    },
    CreateEntity {
        kind: NodeKind,
        name: String,
        #[serde(default)]
        color: Option<String>,
        position: Position,
    },
    #[serde(rename_all = "camelCase")]
    AddInstance {
        kind: NodeKind,
        definition_id: String,
        position: Position,
    },
}

/// What an event did, reported back to the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventOutcome {
    Ignored,
    #[serde(rename_all = "camelCase")]
    DragUpdated { highlighted_edge_id: Option<String> },
    DragCancelled,
    Dropped { outcome: DropOutcome },
    #[serde(rename_all = "camelCase")]
    Connected { edge_id: String },
    Resized { moved: Vec<String> },
    SelectionChanged,
    #[serde(rename_all = "camelCase")]
    Grouped { group_id: String },
    #[serde(rename_all = "camelCase")]
    Created { node_id: String },
    #[serde(rename_all = "camelCase")]
    EntityCreated {
        definition_id: String,
        node_id: String,
    },
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub node_ids: Vec<String>,
    pub edge_ids: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty() && self.edge_ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DragState {
    node_id: String,
    origin: Position,
    intersecting_edge: Option<String>,
}

/// Per-node edit operations handed to whatever triggers node edits (forms, node widgets).
pub trait NodeActions {
    fn update(&mut self, node_id: &str, field: AttributeField, value: &str) -> bool;
    fn delete(&mut self, node_id: &str) -> bool;
    /// Shifts what sits after `node_id` by `dy`. Returns the moved node ids.
    fn notify_resize(&mut self, node_id: &str, dy: f32) -> Vec<String>;
}

#[derive(Debug, Clone)]
pub struct Canvas {
    graph: PlotGraph,
    config: CanvasConfig,
    drag: Option<DragState>,
    selection: Selection,
    heights: HashMap<String, f32>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Canvas {
    pub fn new(config: CanvasConfig) -> Self {
        Self::with_graph(PlotGraph::default(), config)
    }

    pub fn with_graph(graph: PlotGraph, config: CanvasConfig) -> Self {
        Self {
            graph,
            config,
            drag: None,
            selection: Selection::default(),
            heights: HashMap::new(),
        }
    }

    pub fn graph(&self) -> &PlotGraph {
        &self.graph
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn into_graph(self) -> PlotGraph {
        self.graph
    }

    /// Edge currently highlighted as a splice target by the drag in progress.
    pub fn highlighted_edge(&self) -> Option<&str> {
        self.drag.as_ref()?.intersecting_edge.as_deref()
    }

    pub fn dragging(&self) -> Option<&str> {
        self.drag.as_ref().map(|drag| drag.node_id.as_str())
    }

    /// Swaps in a whole snapshot and drops all transient state.
    pub fn replace_graph(&mut self, graph: PlotGraph) {
        self.graph = graph;
        self.drag = None;
        self.selection = Selection::default();
        self.heights.clear();
    }

    pub fn apply(&mut self, event: CanvasEvent) -> EventOutcome {
        match event {
            CanvasEvent::DragMove { node_id, position } => self.drag_move(&node_id, position),
            CanvasEvent::DragEnd { node_id, position } => self.drag_end(&node_id, position),
            CanvasEvent::DragCancel => self.drag_cancel(),
            CanvasEvent::ConnectAttempt(request) => {
                match layout::connect(&self.graph, &request, &self.config.palette) {
                    Some((next, edge_id)) => {
                        self.graph = next;
                        EventOutcome::Connected { edge_id }
                    }
                    None => EventOutcome::Ignored,
                }
            }
            CanvasEvent::SizeChange { node_id, height } => self.size_change(&node_id, height),
            CanvasEvent::SelectionChange { node_ids, edge_ids } => {
                self.selection = Selection { node_ids, edge_ids };
                EventOutcome::SelectionChanged
            }
            CanvasEvent::GroupSelection => {
                match layout::group_nodes(&self.graph, &self.selection.node_ids, &self.config) {
                    Some((next, group_id)) => {
                        self.graph = next;
                        self.selection = Selection {
                            node_ids: vec![group_id.clone()],
                            edge_ids: Vec::new(),
                        };
                        EventOutcome::Grouped { group_id }
                    }
                    None => EventOutcome::Ignored,
                }
            }
            CanvasEvent::Ungroup { group_id } => match layout::ungroup(&self.graph, &group_id) {
                Some(next) => {
                    self.graph = next;
                    self.forget(&group_id);
                    EventOutcome::Deleted
                }
                None => EventOutcome::Ignored,
            },
            CanvasEvent::DetachStatus { host_id, index } => {
                match layout::detach(&self.graph, &host_id, index, &self.config) {
                    Some((next, node_id)) => {
                        self.graph = next;
                        EventOutcome::Created { node_id }
                    }
                    None => EventOutcome::Ignored,
                }
            }
            CanvasEvent::DeleteSelection => {
                if self.selection.is_empty() {
                    return EventOutcome::Ignored;
                }
                let selection = std::mem::take(&mut self.selection);
                let mut next = self.graph.clone();
                next.remove_selection(&selection.node_ids, &selection.edge_ids);
                self.graph = next;
                for id in &selection.node_ids {
                    self.forget(id);
                }
                EventOutcome::Deleted
            }
            CanvasEvent::DeleteNode { node_id } => {
                if self.delete(&node_id) {
                    EventOutcome::Deleted
                } else {
                    EventOutcome::Ignored
                }
            }
            CanvasEvent::DeleteEdge { edge_id } => {
                let mut next = self.graph.clone();
                if !next.remove_edge(&edge_id) {
                    return EventOutcome::Ignored;
                }
                self.graph = next;
                self.selection.edge_ids.retain(|id| id != &edge_id);
                EventOutcome::Deleted
            }
            CanvasEvent::UpdateAttribute {
                node_id,
                field,
                value,
            } => {
                if self.update(&node_id, field, &value) {
                    EventOutcome::Updated
                } else {
                    EventOutcome::Ignored
                }
            }
            CanvasEvent::AddStory { position, label } => {
                let mut next = self.graph.clone();
                let node_id = next.add_story(position, &label);
                self.graph = next;
                EventOutcome::Created { node_id }
            }
            CanvasEvent::AddStatus {
                position,
                name,
                color,
            } => {
                let mut next = self.graph.clone();
                let node_id = next.add_status(position, &name, color.as_deref());
                self.graph = next;
                EventOutcome::Created { node_id }
            }
            CanvasEvent::CreateEntity {
                kind,
                name,
                color,
                position,
            } => {
                let color = color.unwrap_or_else(|| self.config.palette.fallback_for(kind).to_string());
                let mut next = self.graph.clone();
                match next.create_entity(kind, &name, &color, position) {
                    Some((definition_id, node_id)) => {
                        self.graph = next;
                        EventOutcome::EntityCreated {
                            definition_id,
                            node_id,
                        }
                    }
                    None => EventOutcome::Ignored,
                }
            }
            CanvasEvent::AddInstance {
                kind,
                definition_id,
                position,
            } => {
                let mut next = self.graph.clone();
                match next.add_instance(kind, &definition_id, position) {
                    Some(node_id) => {
                        self.graph = next;
                        EventOutcome::Created { node_id }
                    }
                    None => EventOutcome::Ignored,
                }
            }
        }
    }

    fn drag_move(&mut self, node_id: &str, position: Position) -> EventOutcome {
        let Some(node) = self.graph.node_mut(node_id) else {
            return EventOutcome::Ignored;
        };
        let origin = node.position;
        node.position = position;
        let restarted = self
            .drag
            .as_ref()
            .map(|drag| drag.node_id != node_id)
            .unwrap_or(true);
        if restarted {
            self.drag = Some(DragState {
                node_id: node_id.to_string(),
                origin,
                intersecting_edge: None,
            });
        }

        let highlighted = find_intersecting_edge(&self.graph, node_id, &self.config)
            .map(|edge| edge.id.clone());
        if let Some(drag) = self.drag.as_mut() {
            if drag.intersecting_edge != highlighted {
                tracing::trace!(node = node_id, edge = ?highlighted, "highlight changed");
            }
            drag.intersecting_edge = highlighted.clone();
        }
        EventOutcome::DragUpdated {
            highlighted_edge_id: highlighted,
        }
    }

    fn drag_end(&mut self, node_id: &str, position: Position) -> EventOutcome {
        self.drag = None;
        let Some(node) = self.graph.node_mut(node_id) else {
            return EventOutcome::Ignored;
        };
        node.position = position;
        let outcome = match resolve_drop(&self.graph, node_id, &self.config) {
            Some((next, outcome)) => {
                self.graph = next;
                if let DropOutcome::StatusAttached { .. } = outcome {
                    self.forget(node_id);
                }
                outcome
            }
            None => DropOutcome::Unchanged,
        };
        EventOutcome::Dropped { outcome }
    }

    fn drag_cancel(&mut self) -> EventOutcome {
        let Some(drag) = self.drag.take() else {
            return EventOutcome::Ignored;
        };
        if let Some(node) = self.graph.node_mut(&drag.node_id) {
            node.position = drag.origin;
        }
        EventOutcome::DragCancelled
    }

    /// The first report for a node only records its height; later reports cascade the delta.
    fn size_change(&mut self, node_id: &str, height: f32) -> EventOutcome {
        let Some(node) = self.graph.node_mut(node_id) else {
            return EventOutcome::Ignored;
        };
        let width = effective_size(node, &self.config.sizes).width;
        node.measured_size = Some(Size::new(width, height));
        let Some(previous) = self.heights.get(node_id).copied() else {
            self.heights.insert(node_id.to_string(), height);
            return EventOutcome::Ignored;
        };
        let dy = height - previous;
        if dy.abs() <= self.config.resize_epsilon {
            return EventOutcome::Ignored;
        }
        self.heights.insert(node_id.to_string(), height);
        let moved = self.notify_resize(node_id, dy);
        if moved.is_empty() {
            EventOutcome::Ignored
        } else {
            EventOutcome::Resized { moved }
        }
    }

    fn forget(&mut self, node_id: &str) {
        self.heights.remove(node_id);
        self.selection.node_ids.retain(|id| id != node_id);
        if self.dragging() == Some(node_id) {
            self.drag = None;
        }
    }
}

impl NodeActions for Canvas {
    fn update(&mut self, node_id: &str, field: AttributeField, value: &str) -> bool {
        let mut next = self.graph.clone();
        if !next.update_attribute(node_id, field, value) {
            return false;
        }
        self.graph = next;
        true
    }

    fn delete(&mut self, node_id: &str) -> bool {
        let mut next = self.graph.clone();
        if !next.remove_node(node_id) {
            return false;
        }
        self.graph = next;
        self.forget(node_id);
        true
    }

    fn notify_resize(&mut self, node_id: &str, dy: f32) -> Vec<String> {
        match layout::height_cascade(&self.graph, node_id, dy, &self.config) {
            Some((next, moved)) => {
                self.graph = next;
                moved
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Node, NodeData, StoryData};

    fn story(id: &str, x: f32, y: f32) -> Node {
        Node::new(id, Position::new(x, y), NodeData::Story(StoryData::default())).with_size(100.0, 80.0)
    }

    fn canvas() -> Canvas {
        let mut graph = PlotGraph::new();
        graph.nodes.push(story("s1", 100.0, 0.0));
        graph.nodes.push(story("s2", 100.0, 300.0));
        graph.nodes.push(story("new", 600.0, 0.0));
        graph.edges.push(Edge::new("e", "s1", "s2"));
        Canvas::with_graph(graph, CanvasConfig::default())
    }

    #[test]
    fn drag_move_highlights_without_structural_change() {
        let mut canvas = canvas();
        let outcome = canvas.apply(CanvasEvent::DragMove {
            node_id: "new".to_string(),
            position: Position::new(100.0, 150.0),
        });
        assert_eq!(
            outcome,
            EventOutcome::DragUpdated {
                highlighted_edge_id: Some("e".to_string())
            }
        );
        assert_eq!(canvas.highlighted_edge(), Some("e"));
        assert_eq!(canvas.graph().edges.len(), 1);
    }

    #[test]
    fn drag_cancel_restores_origin() {
        let mut canvas = canvas();
        for y in [50.0, 100.0, 150.0] {
            canvas.apply(CanvasEvent::DragMove {
                node_id: "new".to_string(),
                position: Position::new(100.0, y),
            });
        }
        assert_eq!(canvas.apply(CanvasEvent::DragCancel), EventOutcome::DragCancelled);
        assert_eq!(canvas.graph().node("new").unwrap().position, Position::new(600.0, 0.0));
        assert_eq!(canvas.highlighted_edge(), None);
        assert_eq!(canvas.apply(CanvasEvent::DragCancel), EventOutcome::Ignored);
    }

    #[test]
    fn drag_end_commits_splice() {
        let mut canvas = canvas();
        canvas.apply(CanvasEvent::DragMove {
            node_id: "new".to_string(),
            position: Position::new(100.0, 150.0),
        });
        let outcome = canvas.apply(CanvasEvent::DragEnd {
            node_id: "new".to_string(),
            position: Position::new(100.0, 150.0),
        });
        assert!(matches!(
            outcome,
            EventOutcome::Dropped {
                outcome: DropOutcome::Spliced { .. }
            }
        ));
        assert_eq!(canvas.highlighted_edge(), None);
        assert_eq!(canvas.graph().node("s2").unwrap().position.y, 500.0);
        assert!(canvas.graph().edge("e").is_none());
    }

    #[test]
    fn first_size_report_only_records_height() {
        let mut canvas = canvas();
        let report = |height| CanvasEvent::SizeChange {
            node_id: "s1".to_string(),
            height,
        };
        assert_eq!(canvas.apply(report(80.0)), EventOutcome::Ignored);
        assert_eq!(canvas.graph().node("s2").unwrap().position.y, 300.0);

        let outcome = canvas.apply(report(120.0));
        assert_eq!(
            outcome,
            EventOutcome::Resized {
                moved: vec!["s2".to_string()]
            }
        );
        assert_eq!(canvas.graph().node("s2").unwrap().position.y, 340.0);
        assert_eq!(
            canvas.graph().node("s1").unwrap().measured_size,
            Some(Size::new(100.0, 120.0))
        );
        assert_eq!(canvas.apply(report(120.2)), EventOutcome::Ignored);
    }

    #[test]
    fn grouping_selects_the_new_group() {
        let mut canvas = canvas();
        canvas.apply(CanvasEvent::SelectionChange {
            node_ids: vec!["s1".to_string(), "s2".to_string()],
            edge_ids: Vec::new(),
        });
        let EventOutcome::Grouped { group_id } = canvas.apply(CanvasEvent::GroupSelection) else {
            panic!("grouping two nodes succeeds");
        };
        assert_eq!(canvas.selection().node_ids, vec![group_id.clone()]);
        assert_eq!(canvas.graph().nodes[0].id, group_id);
    }

    #[test]
    fn node_actions_route_through_snapshots() {
        let mut canvas = canvas();
        assert!(canvas.update("s1", AttributeField::Label, "Opening"));
        assert!(!canvas.update("s1", AttributeField::ImageRef, "x.png"));
        assert!(canvas.delete("s2"));
        assert!(canvas.graph().edges.is_empty());
        assert!(!canvas.delete("s2"));
    }

    #[test]
    fn events_parse_from_tagged_json() {
        let event: CanvasEvent = serde_json::from_str(
            r#"{"type":"connectAttempt","sourceId":"s1","sourceHandle":"story-source","targetId":"new","targetHandle":"story-target"}"#,
        )
        .unwrap();
        let mut canvas = canvas();
        assert!(matches!(canvas.apply(event), EventOutcome::Connected { .. }));

        let event: CanvasEvent =
            serde_json::from_str(r#"{"type":"dragEnd","nodeId":"new","position":{"x":1.0,"y":2.0}}"#)
                .unwrap();
        assert!(matches!(event, CanvasEvent::DragEnd { .. }));
    }
}
