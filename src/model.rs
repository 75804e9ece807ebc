use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ProjectError;
use crate::layout::geometry::to_absolute;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Story,
    Character,
    Item,
    Location,
    Status,
    Group,
}

impl NodeKind {
    /// Kinds backed by a shared definition record.
    pub fn is_entity(self) -> bool {
        matches!(self, Self::Character | Self::Item | Self::Location)
    }

    /// Kinds that can carry attached statuses.
    pub fn can_host_status(self) -> bool {
        !matches!(self, Self::Status | Self::Group)
    }

    pub(crate) fn id_prefix(self) -> &'static str {
        match self {
            Self::Story => "node",
            Self::Character | Self::Item | Self::Location => "inst",
            Self::Status => "inst-s",
            Self::Group => "group",
        }
    }

    fn definition_prefix(self) -> &'static str {
        match self {
            Self::Character => "char",
            Self::Item => "item",
            Self::Location => "loc",
            _ => "def",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoryLevel {
    Main,
    #[default]
    Secondary,
    Sub,
}

impl StoryLevel {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "main" => Some(Self::Main),
            "secondary" => Some(Self::Secondary),
            "sub" => Some(Self::Sub),
            _ => None,
        }
    }
}

/// Detached copy of a status tag merged into a host node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusAttribute {
    pub id: String,
    pub name: String,
    pub color: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryData {
    pub label: String,
    pub summary: String,
    pub level: StoryLevel,
    pub attached_statuses: Vec<StatusAttribute>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceData {
    pub definition_id: String,
    #[serde(default)]
    pub attached_statuses: Vec<StatusAttribute>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupData {
    pub label: String,
    pub size: Size,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeData {
    Story(StoryData),
    Character(InstanceData),
    Item(InstanceData),
    Location(InstanceData),
    Status(StatusData),
    Group(GroupData),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Story(_) => NodeKind::Story,
            Self::Character(_) => NodeKind::Character,
            Self::Item(_) => NodeKind::Item,
            Self::Location(_) => NodeKind::Location,
            Self::Status(_) => NodeKind::Status,
            Self::Group(_) => NodeKind::Group,
        }
    }

    pub fn instance(kind: NodeKind, definition_id: &str) -> Option<Self> {
        let data = InstanceData {
            definition_id: definition_id.to_string(),
            attached_statuses: Vec::new(),
        };
        match kind {
            NodeKind::Character => Some(Self::Character(data)),
            NodeKind::Item => Some(Self::Item(data)),
            NodeKind::Location => Some(Self::Location(data)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured_size: Option<Size>,
    pub data: NodeData,
}

impl Node {
    pub fn new(id: impl Into<String>, position: Position, data: NodeData) -> Self {
        Self {
            id: id.into(),
            position,
            parent_id: None,
            measured_size: None,
            data,
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.measured_size = Some(Size::new(width, height));
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn definition_id(&self) -> Option<&str> {
        match &self.data {
            NodeData::Character(data) | NodeData::Item(data) | NodeData::Location(data) => {
                Some(data.definition_id.as_str())
            }
            _ => None,
        }
    }

    pub fn attached_statuses(&self) -> &[StatusAttribute] {
        match &self.data {
            NodeData::Story(data) => &data.attached_statuses,
            NodeData::Character(data) | NodeData::Item(data) | NodeData::Location(data) => {
                &data.attached_statuses
            }
            NodeData::Status(_) | NodeData::Group(_) => &[],
        }
    }

    pub fn attached_statuses_mut(&mut self) -> Option<&mut Vec<StatusAttribute>> {
        match &mut self.data {
            NodeData::Story(data) => Some(&mut data.attached_statuses),
            NodeData::Character(data) | NodeData::Item(data) | NodeData::Location(data) => {
                Some(&mut data.attached_statuses)
            }
            NodeData::Status(_) | NodeData::Group(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            source_handle: None,
            target_handle: None,
            color: None,
        }
    }

    pub fn with_handles(mut self, source_handle: &str, target_handle: &str) -> Self {
        self.source_handle = Some(source_handle.to_string());
        self.target_handle = Some(target_handle.to_string());
        self
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source_id == node_id || self.target_id == node_id
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

/// Shared entity records, keyed by definition id separately per kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionTable {
    pub characters: BTreeMap<String, Definition>,
    pub items: BTreeMap<String, Definition>,
    pub locations: BTreeMap<String, Definition>,
}

impl DefinitionTable {
    pub fn table(&self, kind: NodeKind) -> Option<&BTreeMap<String, Definition>> {
        match kind {
            NodeKind::Character => Some(&self.characters),
            NodeKind::Item => Some(&self.items),
            NodeKind::Location => Some(&self.locations),
            _ => None,
        }
    }

    pub fn table_mut(&mut self, kind: NodeKind) -> Option<&mut BTreeMap<String, Definition>> {
        match kind {
            NodeKind::Character => Some(&mut self.characters),
            NodeKind::Item => Some(&mut self.items),
            NodeKind::Location => Some(&mut self.locations),
            _ => None,
        }
    }

    /// Definition an instance node points at; `None` for non-instances and dangling keys.
    pub fn resolve(&self, node: &Node) -> Option<&Definition> {
        let id = node.definition_id()?;
        self.table(node.kind())?.get(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeField {
    Label,
    Summary,
    Level,
    Name,
    Color,
    Description,
    ImageRef,
}

/// The canonical canvas state. Node order is draw order (first is drawn lowest).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub definitions: DefinitionTable,
}

impl PlotGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.source_id == id)
    }

    pub fn has_edges(&self, id: &str) -> bool {
        self.edges.iter().any(|edge| edge.touches(id))
    }

    pub fn parent_of(&self, id: &str) -> Option<&Node> {
        let parent_id = self.node(id)?.parent_id.as_deref()?;
        self.node(parent_id)
    }

    /// True when `ancestor` appears on the parent chain of `id`.
    /// The walk is bounded by the node count so a malformed chain cannot loop.
    pub fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut current = self.node(id).and_then(|node| node.parent_id.as_deref());
        for _ in 0..self.nodes.len() {
            let Some(parent_id) = current else {
                return false;
            };
            if parent_id == ancestor {
                return true;
            }
            current = self.node(parent_id).and_then(|node| node.parent_id.as_deref());
        }
        false
    }

    pub fn insert_node(&mut self, node: Node) -> Result<(), ProjectError> {
        if self.contains_node(&node.id) {
            return Err(ProjectError::DuplicateNodeId(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), ProjectError> {
        if self.edge(&edge.id).is_some() {
            return Err(ProjectError::DuplicateEdgeId(edge.id));
        }
        for endpoint in [&edge.source_id, &edge.target_id] {
            if !self.contains_node(endpoint) {
                return Err(ProjectError::DanglingEdge {
                    edge: edge.id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn fresh_node_id(&self, prefix: &str) -> String {
        fresh_id(prefix, self.nodes.len(), |candidate| self.contains_node(candidate))
    }

    pub fn fresh_edge_id(&self, prefix: &str) -> String {
        fresh_id(prefix, self.edges.len(), |candidate| self.edge(candidate).is_some())
    }

    pub fn fresh_attachment_id(&self) -> String {
        let taken: HashSet<&str> = self
            .nodes
            .iter()
            .flat_map(|node| node.attached_statuses().iter().map(|st| st.id.as_str()))
            .collect();
        fresh_id("attached", taken.len(), |candidate| taken.contains(candidate))
    }

    fn fresh_definition_id(&self, kind: NodeKind) -> String {
        let table = self.definitions.table(kind);
        let len = table.map(|t| t.len()).unwrap_or(0);
        fresh_id(kind.definition_prefix(), len, |candidate| {
            table.map(|t| t.contains_key(candidate)).unwrap_or(false)
        })
    }

    pub fn add_story(&mut self, position: Position, label: &str) -> String {
        let id = self.fresh_node_id(NodeKind::Story.id_prefix());
        let data = NodeData::Story(StoryData {
            label: label.to_string(),
            ..StoryData::default()
        });
        self.nodes.push(Node::new(id.clone(), position, data));
        id
    }

    pub fn add_status(&mut self, position: Position, name: &str, color: Option<&str>) -> String {
        let id = self.fresh_node_id(NodeKind::Status.id_prefix());
        let data = NodeData::Status(StatusData {
            name: Some(name.to_string()),
            color: color.map(str::to_string),
            description: None,
        });
        self.nodes.push(Node::new(id.clone(), position, data));
        id
    }

    /// Creates a new shared definition and a first canvas instance of it.
    pub fn create_entity(
        &mut self,
        kind: NodeKind,
        name: &str,
        color: &str,
        position: Position,
    ) -> Option<(String, String)> {
        if !kind.is_entity() {
            return None;
        }
        let definition_id = self.fresh_definition_id(kind);
        let definition = Definition {
            id: definition_id.clone(),
            name: name.to_string(),
            color: color.to_string(),
            description: String::new(),
            image_ref: None,
        };
        self.definitions
            .table_mut(kind)?
            .insert(definition_id.clone(), definition);
        let node_id = self.add_instance(kind, &definition_id, position)?;
        Some((definition_id, node_id))
    }

    /// Places another instance of an existing definition.
    pub fn add_instance(
        &mut self,
        kind: NodeKind,
        definition_id: &str,
        position: Position,
    ) -> Option<String> {
        let known = self
            .definitions
            .table(kind)
            .map(|table| table.contains_key(definition_id))
            .unwrap_or(false);
        if !known {
            return None;
        }
        let data = NodeData::instance(kind, definition_id)?;
        let id = self.fresh_node_id(kind.id_prefix());
        self.nodes.push(Node::new(id.clone(), position, data));
        Some(id)
    }

    /// Applies a form edit. Instance edits write through to the shared definition, so every
    /// instance of it reflects the change. Returns false when the field does not apply.
    pub fn update_attribute(&mut self, id: &str, field: AttributeField, value: &str) -> bool {
        let Some(index) = self.nodes.iter().position(|node| node.id == id) else {
            return false;
        };
        let kind = self.nodes[index].kind();
        if kind.is_entity() {
            let Some(definition_id) = self.nodes[index].definition_id().map(str::to_string) else {
                return false;
            };
            let Some(definition) = self
                .definitions
                .table_mut(kind)
                .and_then(|table| table.get_mut(&definition_id))
            else {
                return false;
            };
            return match field {
                AttributeField::Name => {
                    definition.name = value.to_string();
                    true
                }
                AttributeField::Color => {
                    definition.color = value.to_string();
                    true
                }
                AttributeField::Description => {
                    definition.description = value.to_string();
                    true
                }
                AttributeField::ImageRef => {
                    definition.image_ref = Some(value.to_string()).filter(|v| !v.is_empty());
                    true
                }
                _ => false,
            };
        }

        match (&mut self.nodes[index].data, field) {
            (NodeData::Story(data), AttributeField::Label) => data.label = value.to_string(),
            (NodeData::Story(data), AttributeField::Summary) => data.summary = value.to_string(),
            (NodeData::Story(data), AttributeField::Level) => match StoryLevel::from_token(value) {
                Some(level) => data.level = level,
                None => return false,
            },
            (NodeData::Status(data), AttributeField::Name) => data.name = Some(value.to_string()),
            (NodeData::Status(data), AttributeField::Color) => data.color = Some(value.to_string()),
            (NodeData::Status(data), AttributeField::Description) => {
                data.description = Some(value.to_string())
            }
            (NodeData::Group(data), AttributeField::Label) => data.label = value.to_string(),
            _ => return false,
        }
        true
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|edge| edge.id != id);
        self.edges.len() != before
    }

    /// Deletes a node and every edge touching it. Children of a deleted group keep their
    /// on-canvas location: they become unparented with absolute positions.
    pub fn remove_node(&mut self, id: &str) -> bool {
        if !self.contains_node(id) {
            return false;
        }
        self.release_children(id);
        self.nodes.retain(|node| node.id != id);
        self.edges.retain(|edge| !edge.touches(id));
        true
    }

    pub fn remove_selection(&mut self, node_ids: &[String], edge_ids: &[String]) {
        self.edges.retain(|edge| !edge_ids.contains(&edge.id));
        for id in node_ids {
            self.remove_node(id);
        }
    }

    pub(crate) fn release_children(&mut self, parent_id: &str) {
        let released: Vec<(usize, Position)> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent_id.as_deref() == Some(parent_id))
            .map(|(idx, node)| (idx, to_absolute(node, self)))
            .collect();
        for (idx, absolute) in released {
            let node = &mut self.nodes[idx];
            node.parent_id = None;
            node.position = absolute;
        }
    }

    /// Structural validation used at the import boundary.
    pub fn validate(&self) -> Result<(), ProjectError> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(ProjectError::DuplicateNodeId(node.id.clone()));
            }
        }
        for node in &self.nodes {
            let Some(parent_id) = node.parent_id.as_deref() else {
                continue;
            };
            let Some(parent) = self.node(parent_id) else {
                return Err(ProjectError::MissingParent {
                    node: node.id.clone(),
                    parent: parent_id.to_string(),
                });
            };
            if parent.kind() != NodeKind::Group {
                return Err(ProjectError::ParentNotGroup {
                    node: node.id.clone(),
                    parent: parent_id.to_string(),
                });
            }
            if self.has_parent_cycle(&node.id) {
                return Err(ProjectError::ParentCycle(node.id.clone()));
            }
        }
        let mut edge_ids = HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(ProjectError::DuplicateEdgeId(edge.id.clone()));
            }
            for endpoint in [&edge.source_id, &edge.target_id] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(ProjectError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn has_parent_cycle(&self, id: &str) -> bool {
        let mut seen = HashSet::new();
        seen.insert(id);
        let mut current = self.node(id).and_then(|node| node.parent_id.as_deref());
        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                return true;
            }
            current = self.node(parent_id).and_then(|node| node.parent_id.as_deref());
        }
        false
    }
}

fn fresh_id(prefix: &str, start: usize, taken: impl Fn(&str) -> bool) -> String {
    let mut counter = start + 1;
    loop {
        let candidate = format!("{prefix}-{counter}");
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
