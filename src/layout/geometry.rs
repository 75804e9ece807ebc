// Pure spatial helpers shared by the collision, cascade and grouping passes.

use crate::config::NodeSizes;
use crate::model::{Node, NodeData, NodeKind, PlotGraph, Position, Size};

use super::Rect;

/// Size assumed for a node the renderer has not measured yet.
pub fn default_size(node: &Node, sizes: &NodeSizes) -> Size {
    match &node.data {
        NodeData::Story(data) => sizes.story_for_level(data.level),
        NodeData::Character(_) => sizes.character,
        NodeData::Item(_) => sizes.item,
        NodeData::Location(_) => sizes.location,
        NodeData::Status(_) => sizes.status,
        NodeData::Group(data) => {
            if data.size.width > 0.0 && data.size.height > 0.0 {
                data.size
            } else {
                sizes.group
            }
        }
    }
}

pub fn effective_size(node: &Node, sizes: &NodeSizes) -> Size {
    node.measured_size
        .filter(|size| size.width > 0.0 && size.height > 0.0)
        .unwrap_or_else(|| default_size(node, sizes))
}

/// Rectangle of a node in its own coordinate frame (relative to its parent, if any).
pub fn node_rect(node: &Node, sizes: &NodeSizes) -> Rect {
    let size = effective_size(node, sizes);
    Rect::new(node.position.x, node.position.y, size.width, size.height)
}

pub fn point_in_rect(point: Position, node: &Node, sizes: &NodeSizes) -> bool {
    node_rect(node, sizes).contains(point)
}

pub fn rects_overlap(a: &Node, b: &Node, sizes: &NodeSizes) -> bool {
    node_rect(a, sizes).overlaps(&node_rect(b, sizes))
}

pub fn distance_point_to_segment(point: Position, a: Position, b: Position) -> f32 {
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let len2 = vx * vx + vy * vy;
    if len2 == 0.0 {
        let dx = point.x - a.x;
        let dy = point.y - a.y;
        return (dx * dx + dy * dy).sqrt();
    }
    let t = ((point.x - a.x) * vx + (point.y - a.y) * vy) / len2;
    let t = t.clamp(0.0, 1.0);
    let dx = point.x - (a.x + vx * t);
    let dy = point.y - (a.y + vy * t);
    (dx * dx + dy * dy).sqrt()
}

/// Resolves a node position through its parent chain to canvas coordinates.
///
/// A parent id that cannot be found ends the walk, so the last resolvable ancestor is treated as
/// unparented. The walk is bounded by the node count; a chain that exceeds it is a cycle and the
/// node is treated as unparented.
pub fn to_absolute(node: &Node, graph: &PlotGraph) -> Position {
    let mut absolute = node.position;
    let mut current = node.parent_id.as_deref();
    let mut steps = 0usize;
    while let Some(parent_id) = current {
        if steps >= graph.nodes.len() {
            tracing::warn!(node = %node.id, "parent chain does not terminate");
            return node.position;
        }
        let Some(parent) = graph.node(parent_id) else {
            break;
        };
        absolute = absolute.offset(parent.position.x, parent.position.y);
        current = parent.parent_id.as_deref();
        steps += 1;
    }
    absolute
}

/// Inverse of [`to_absolute`] for a point that should live inside `parent`.
pub fn to_relative(point: Position, parent: &Node, graph: &PlotGraph) -> Position {
    let origin = to_absolute(parent, graph);
    Position::new(point.x - origin.x, point.y - origin.y)
}

pub fn absolute_rect(node: &Node, graph: &PlotGraph, sizes: &NodeSizes) -> Rect {
    let origin = to_absolute(node, graph);
    let size = effective_size(node, sizes);
    Rect::new(origin.x, origin.y, size.width, size.height)
}

pub fn absolute_center(node: &Node, graph: &PlotGraph, sizes: &NodeSizes) -> Position {
    absolute_rect(node, graph, sizes).center()
}

/// True for kinds that may become the parent of another node.
pub fn can_parent(node: &Node) -> bool {
    node.kind() == NodeKind::Group
}
