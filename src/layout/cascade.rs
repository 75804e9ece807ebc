// Downstream repositioning: BFS over outgoing edges plus the "physically below" heuristic used
// when a node grows.

use std::collections::{HashSet, VecDeque};

use crate::config::CanvasConfig;
use crate::model::PlotGraph;

use super::geometry::to_absolute;

/// Nodes reachable from `start` over outgoing edges, `start` included, in BFS order.
/// The visited set keeps cyclic edge sets finite.
pub fn downstream_set(graph: &PlotGraph, start: &str) -> Vec<String> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(start.to_string());
    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        for edge in graph.outgoing(&current) {
            if !visited.contains(&edge.target_id) {
                queue.push_back(edge.target_id.clone());
            }
        }
        order.push(current);
    }
    order
}

/// Translates the listed nodes. A node whose ancestor is also listed is skipped, since its
/// position is relative to that ancestor and already moves with it. Returns the moved ids.
pub(super) fn translate(graph: &mut PlotGraph, ids: &[String], dx: f32, dy: f32) -> Vec<String> {
    let listed: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let movable: Vec<String> = ids
        .iter()
        .filter(|id| graph.contains_node(id))
        .filter(|id| !listed.iter().any(|other| graph.is_ancestor(other, id)))
        .cloned()
        .collect();
    for id in &movable {
        if let Some(node) = graph.node_mut(id) {
            node.position = node.position.offset(dx, dy);
        }
    }
    movable
}

/// Moves `start` and everything downstream of it by `(dx, dy)`.
pub fn push_downstream(graph: &PlotGraph, start: &str, dx: f32, dy: f32) -> (PlotGraph, Vec<String>) {
    let reach = downstream_set(graph, start);
    let mut next = graph.clone();
    let moved = translate(&mut next, &reach, dx, dy);
    tracing::debug!(start, dx, dy, moved = moved.len(), "pushed downstream");
    (next, moved)
}

/// Shifts what sits after a node whose rendered height changed by `dy`: its downstream set
/// and every node strictly below it within the horizontal band. `None` when the change is
/// below the resize epsilon or the node is unknown.
pub fn height_cascade(
    graph: &PlotGraph,
    node_id: &str,
    dy: f32,
    config: &CanvasConfig,
) -> Option<(PlotGraph, Vec<String>)> {
    if dy.abs() <= config.resize_epsilon {
        return None;
    }
    let growing = graph.node(node_id)?;
    let origin = to_absolute(growing, graph);

    let mut targets: Vec<String> = downstream_set(graph, node_id)
        .into_iter()
        .filter(|id| id != node_id)
        .collect();
    let mut seen: HashSet<String> = targets.iter().cloned().collect();

    for node in &graph.nodes {
        if node.id == node_id || seen.contains(&node.id) {
            continue;
        }
        if graph.is_ancestor(node_id, &node.id) || graph.is_ancestor(&node.id, node_id) {
            continue;
        }
        let position = to_absolute(node, graph);
        if position.y > origin.y && (position.x - origin.x).abs() < config.below_band {
            seen.insert(node.id.clone());
            targets.push(node.id.clone());
        }
    }

    let mut next = graph.clone();
    let moved = translate(&mut next, &targets, 0.0, dy);
    tracing::debug!(node = node_id, dy, moved = moved.len(), "height cascade");
    Some((next, moved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, GroupData, Node, NodeData, Position, StoryData};

    fn story(id: &str, x: f32, y: f32) -> Node {
        Node::new(id, Position::new(x, y), NodeData::Story(StoryData::default()))
    }

    fn chain() -> PlotGraph {
        let mut graph = PlotGraph::new();
        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            graph.nodes.push(story(id, 0.0, i as f32 * 300.0));
        }
        graph.edges.push(Edge::new("ab", "a", "b"));
        graph.edges.push(Edge::new("bc", "b", "c"));
        graph
    }

    #[test]
    fn downstream_follows_outgoing_edges_only() {
        let graph = chain();
        assert_eq!(downstream_set(&graph, "b"), vec!["b", "c"]);
        assert_eq!(downstream_set(&graph, "d"), vec!["d"]);
    }

    #[test]
    fn cycles_terminate() {
        let mut graph = chain();
        graph.edges.push(Edge::new("ca", "c", "a"));
        let reach = downstream_set(&graph, "a");
        assert_eq!(reach.len(), 3);
    }

    #[test]
    fn isolated_push_moves_only_start() {
        let graph = chain();
        let (next, moved) = push_downstream(&graph, "d", 0.0, 200.0);
        assert_eq!(moved, vec!["d".to_string()]);
        for node in &graph.nodes {
            let after = next.node(&node.id).unwrap();
            if node.id == "d" {
                assert_eq!(after.position.y, node.position.y + 200.0);
            } else {
                assert_eq!(after.position, node.position);
            }
        }
    }

    #[test]
    fn push_leaves_input_snapshot_untouched() {
        let graph = chain();
        let (next, _) = push_downstream(&graph, "a", 10.0, 20.0);
        assert_eq!(graph.node("a").unwrap().position, Position::new(0.0, 0.0));
        assert_eq!(next.node("c").unwrap().position, Position::new(10.0, 620.0));
    }

    #[test]
    fn height_cascade_unions_graph_and_spatial_neighbours() {
        let mut graph = chain();
        // Unconnected, directly below "a" within the band.
        graph.nodes.push(story("under", 150.0, 100.0));
        // Below but far to the right.
        graph.nodes.push(story("far", 900.0, 100.0));
        // Above the growing node.
        graph.nodes.push(story("above", 0.0, -400.0));

        let config = CanvasConfig::default();
        let (next, moved) = height_cascade(&graph, "a", 40.0, &config).expect("cascade applies");

        assert_eq!(next.node("a").unwrap().position.y, 0.0);
        assert_eq!(next.node("b").unwrap().position.y, 340.0);
        assert_eq!(next.node("under").unwrap().position.y, 140.0);
        assert_eq!(next.node("far").unwrap().position.y, 100.0);
        assert_eq!(next.node("above").unwrap().position.y, -400.0);
        assert!(moved.contains(&"d".to_string()));
    }

    #[test]
    fn tiny_height_changes_are_ignored() {
        let graph = chain();
        assert!(height_cascade(&graph, "a", 0.3, &CanvasConfig::default()).is_none());
        assert!(height_cascade(&graph, "ghost", 30.0, &CanvasConfig::default()).is_none());
    }

    #[test]
    fn grouped_children_move_with_their_group_once() {
        let mut graph = PlotGraph::new();
        graph.nodes.push(Node::new(
            "g",
            Position::new(0.0, 0.0),
            NodeData::Group(GroupData::default()),
        ));
        graph.nodes.push(story("child", 40.0, 40.0).with_parent("g"));
        graph.edges.push(Edge::new("gc", "g", "child"));

        let (next, moved) = push_downstream(&graph, "g", 0.0, 100.0);
        assert_eq!(moved, vec!["g".to_string()]);
        assert_eq!(next.node("child").unwrap().position, Position::new(40.0, 40.0));
    }
}
