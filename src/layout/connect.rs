// Connection validation: which handle pairings may become an edge, and the edge color.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{Edge, Node, NodeData, NodeKind, PlotGraph};
use crate::theme::Palette;

static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(story|char|item|loc|status)-(source|target)").unwrap());

pub const STORY_SOURCE_HANDLE: &str = "story-source";
pub const STORY_TARGET_HANDLE: &str = "story-target";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortFamily {
    Story,
    Character,
    Item,
    Location,
    Status,
}

impl PortFamily {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "story" => Some(Self::Story),
            "char" => Some(Self::Character),
            "item" => Some(Self::Item),
            "loc" => Some(Self::Location),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    fn node_kind(self) -> NodeKind {
        match self {
            Self::Story => NodeKind::Story,
            Self::Character => NodeKind::Character,
            Self::Item => NodeKind::Item,
            Self::Location => NodeKind::Location,
            Self::Status => NodeKind::Status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Source,
    Target,
}

/// Semantic reading of a handle id such as `char-target-L` or `status-source-T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    pub family: PortFamily,
    pub direction: PortDirection,
}

impl Port {
    pub fn parse(handle: &str) -> Option<Self> {
        let caps = HANDLE_RE.captures(handle)?;
        let family = PortFamily::from_token(caps.get(1)?.as_str())?;
        let direction = match caps.get(2)?.as_str() {
            "source" => PortDirection::Source,
            _ => PortDirection::Target,
        };
        Some(Self { family, direction })
    }
}

/// A proposed edge as emitted by the renderer's connect gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    pub source_id: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    pub target_id: String,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl ConnectionRequest {
    pub fn new(source_id: &str, source_handle: &str, target_id: &str, target_handle: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            source_handle: Some(source_handle.to_string()),
            target_id: target_id.to_string(),
            target_handle: Some(target_handle.to_string()),
        }
    }
}

fn is_port(handle: Option<&str>, family: PortFamily, direction: PortDirection) -> bool {
    handle
        .and_then(Port::parse)
        .map(|port| port.family == family && port.direction == direction)
        .unwrap_or(false)
}

fn is_family_source(handle: Option<&str>, node: &Node, family: PortFamily) -> bool {
    is_port(handle, family, PortDirection::Source) || node.kind() == family.node_kind()
}

/// Decides whether the request may become an edge. `Some(color)` accepts it.
/// Rejection is silent: the caller simply creates nothing.
pub fn validate_connection(
    graph: &PlotGraph,
    request: &ConnectionRequest,
    palette: &Palette,
) -> Option<String> {
    if request.source_id == request.target_id {
        return None;
    }
    let source = graph.node(&request.source_id)?;
    let target = graph.node(&request.target_id)?;
    let source_handle = request.source_handle.as_deref();
    let target_handle = request.target_handle.as_deref();

    let duplicate = graph.edges.iter().any(|edge| {
        edge.source_id == request.source_id
            && edge.target_id == request.target_id
            && edge.source_handle.as_deref() == source_handle
            && edge.target_handle.as_deref() == target_handle
    });
    if duplicate {
        return None;
    }

    let story_flow = source.kind() == NodeKind::Story
        && target.kind() == NodeKind::Story
        && source_handle == Some(STORY_SOURCE_HANDLE)
        && target_handle == Some(STORY_TARGET_HANDLE);

    let mut entity_family = None;
    for family in [PortFamily::Character, PortFamily::Item, PortFamily::Location] {
        if is_family_source(source_handle, source, family)
            && is_port(target_handle, family, PortDirection::Target)
        {
            entity_family = Some(family);
            break;
        }
    }

    let status_link = is_family_source(source_handle, source, PortFamily::Status)
        && target.kind().can_host_status();

    if !story_flow && entity_family.is_none() && !status_link {
        return None;
    }

    Some(edge_color(graph, source, source_handle, palette))
}

/// Color of an edge leaving `source`: the entity's shared color, the status node's own color,
/// or the kind default.
fn edge_color(graph: &PlotGraph, source: &Node, handle: Option<&str>, palette: &Palette) -> String {
    let families = [
        PortFamily::Character,
        PortFamily::Item,
        PortFamily::Location,
        PortFamily::Status,
    ];
    let Some(family) = families
        .into_iter()
        .find(|family| is_family_source(handle, source, *family))
    else {
        return palette.story_edge.clone();
    };
    let kind = family.node_kind();
    let own = match &source.data {
        NodeData::Status(data) if kind == NodeKind::Status => data.color.clone(),
        _ if source.kind() == kind => graph
            .definitions
            .resolve(source)
            .map(|definition| definition.color.clone()),
        _ => None,
    };
    own.filter(|color| !color.is_empty())
        .unwrap_or_else(|| palette.fallback_for(kind).to_string())
}

/// Returns the next snapshot with the accepted edge appended, or `None` when rejected.
pub fn connect(
    graph: &PlotGraph,
    request: &ConnectionRequest,
    palette: &Palette,
) -> Option<(PlotGraph, String)> {
    let color = validate_connection(graph, request, palette)?;
    let mut next = graph.clone();
    let id = next.fresh_edge_id(&format!("e-{}-{}", request.source_id, request.target_id));
    next.edges.push(Edge {
        id: id.clone(),
        source_id: request.source_id.clone(),
        target_id: request.target_id.clone(),
        source_handle: request.source_handle.clone(),
        target_handle: request.target_handle.clone(),
        color: Some(color),
    });
    tracing::debug!(edge = %id, "connection accepted");
    Some((next, id))
}
