// Group containers: creating one around a selection, moving nodes in and out on drop, and
// dissolving a group.

use crate::config::CanvasConfig;
use crate::model::{GroupData, Node, NodeData, PlotGraph, Position, Size};

use super::geometry::{absolute_center, absolute_rect, can_parent, to_absolute, to_relative};
use super::{DropOutcome, Rect};

pub const DEFAULT_GROUP_LABEL: &str = "New group";

/// Wraps the selection in a new padded group. Needs at least two distinct existing nodes.
/// Returns the next snapshot and the new group's id.
pub fn group_nodes(
    graph: &PlotGraph,
    selected: &[String],
    config: &CanvasConfig,
) -> Option<(PlotGraph, String)> {
    let mut members: Vec<&Node> = Vec::new();
    for id in selected {
        if members.iter().any(|member| &member.id == id) {
            continue;
        }
        if let Some(node) = graph.node(id) {
            members.push(node);
        }
    }
    if members.len() < 2 {
        return None;
    }

    let bounds = members
        .iter()
        .map(|node| absolute_rect(node, graph, &config.sizes))
        .reduce(|acc, rect| acc.union(&rect))?;
    let frame = bounds.inflate(config.group_padding);
    let origin = Position::new(frame.x, frame.y);

    // Members nested under another selected node stay where they are.
    let reparent: Vec<(String, Position)> = members
        .iter()
        .filter(|node| {
            !members
                .iter()
                .any(|other| other.id != node.id && graph.is_ancestor(&other.id, &node.id))
        })
        .map(|node| {
            let absolute = to_absolute(node, graph);
            (
                node.id.clone(),
                Position::new(absolute.x - origin.x, absolute.y - origin.y),
            )
        })
        .collect();

    let mut next = graph.clone();
    let group_id = next.fresh_node_id("group");
    let group = Node::new(
        group_id.clone(),
        origin,
        NodeData::Group(GroupData {
            label: DEFAULT_GROUP_LABEL.to_string(),
            size: Size::new(frame.width, frame.height),
        }),
    );
    for (id, relative) in &reparent {
        if let Some(node) = next.node_mut(id) {
            node.parent_id = Some(group_id.clone());
            node.position = *relative;
        }
    }
    // Drawn first, so it sits beneath its members.
    next.nodes.insert(0, group);
    tracing::debug!(group = %group_id, members = reparent.len(), "grouped selection");
    Some((next, group_id))
}

/// Dissolves a group: its children become unparented at their absolute positions.
pub fn ungroup(graph: &PlotGraph, group_id: &str) -> Option<PlotGraph> {
    let group = graph.node(group_id)?;
    if !can_parent(group) {
        return None;
    }
    let mut next = graph.clone();
    next.remove_node(group_id);
    Some(next)
}

/// Group-membership update for a released node. The drop point is the node's absolute center.
/// Entering a group outside the current parent chain wins over leaving the current parent. A node
/// that leaves its parent but still lies inside an enclosing group moves up to the innermost one.
pub fn reparent_on_drop(
    graph: &PlotGraph,
    node_id: &str,
    config: &CanvasConfig,
) -> Option<(PlotGraph, DropOutcome)> {
    let node = graph.node(node_id)?;
    let drop_point = absolute_center(node, graph, &config.sizes);
    let absolute = to_absolute(node, graph);
    let current_parent = node.parent_id.as_deref();

    let target = graph.nodes.iter().find(|candidate| {
        can_parent(candidate)
            && candidate.id != node_id
            && Some(candidate.id.as_str()) != current_parent
            && !graph.is_ancestor(node_id, &candidate.id)
            && !graph.is_ancestor(&candidate.id, node_id)
            && absolute_rect(candidate, graph, &config.sizes).contains(drop_point)
    });

    if let Some(group) = target {
        let relative = to_relative(absolute, group, graph);
        let group_id = group.id.clone();
        let mut next = graph.clone();
        let moved = next.node_mut(node_id)?;
        moved.parent_id = Some(group_id.clone());
        moved.position = relative;
        tracing::debug!(node = node_id, group = %group_id, "moved into group");
        return Some((next, DropOutcome::Reparented { group_id }));
    }

    let parent = graph.node(current_parent?)?;
    let parent_rect: Rect = absolute_rect(parent, graph, &config.sizes);
    if parent_rect.contains(drop_point) {
        return None;
    }

    let enclosing = enclosing_group(graph, parent, drop_point, config);
    let mut next = graph.clone();
    if let Some(outer) = enclosing {
        let relative = to_relative(absolute, outer, graph);
        let group_id = outer.id.clone();
        let moved = next.node_mut(node_id)?;
        moved.parent_id = Some(group_id.clone());
        moved.position = relative;
        tracing::debug!(node = node_id, group = %group_id, "moved up to enclosing group");
        return Some((next, DropOutcome::Reparented { group_id }));
    }

    let former_parent_id = parent.id.clone();
    let moved = next.node_mut(node_id)?;
    moved.parent_id = None;
    moved.position = absolute;
    tracing::debug!(node = node_id, group = %former_parent_id, "left group");
    Some((next, DropOutcome::Unparented { former_parent_id }))
}

/// Innermost ancestor of `parent` whose frame still contains `point`.
fn enclosing_group<'a>(
    graph: &'a PlotGraph,
    parent: &Node,
    point: Position,
    config: &CanvasConfig,
) -> Option<&'a Node> {
    let mut current = parent.parent_id.as_deref();
    for _ in 0..graph.nodes.len() {
        let ancestor = graph.node(current?)?;
        if absolute_rect(ancestor, graph, &config.sizes).contains(point) {
            return Some(ancestor);
        }
        current = ancestor.parent_id.as_deref();
    }
    None
}
