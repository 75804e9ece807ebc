// Drag-time detection (edge proximity, node overlap) and the priority chain that decides what a
// released drag commits.

use crate::config::{CanvasConfig, NodeSizes};
use crate::model::{Edge, Node, NodeKind, PlotGraph, Position};

use super::DropOutcome;
use super::cascade::push_downstream;
use super::geometry::{absolute_center, absolute_rect, distance_point_to_segment};
use super::grouping::reparent_on_drop;
use super::status::{attach, find_status_host};

/// Drawn segment of an edge: source bottom-center to target top-center, in canvas coordinates.
pub fn edge_segment(edge: &Edge, graph: &PlotGraph, sizes: &NodeSizes) -> Option<(Position, Position)> {
    let source = graph.node(&edge.source_id)?;
    let target = graph.node(&edge.target_id)?;
    Some((
        absolute_rect(source, graph, sizes).bottom_center(),
        absolute_rect(target, graph, sizes).top_center(),
    ))
}

/// First edge (collection order) not touching `node_id` or any of its descendants whose segment
/// passes closer than `edge_proximity` to the node's center.
pub fn find_intersecting_edge<'a>(
    graph: &'a PlotGraph,
    node_id: &str,
    config: &CanvasConfig,
) -> Option<&'a Edge> {
    let node = graph.node(node_id)?;
    let center = absolute_center(node, graph, &config.sizes);
    graph.edges.iter().find(|edge| {
        if edge.touches(node_id)
            || graph.is_ancestor(node_id, &edge.source_id)
            || graph.is_ancestor(node_id, &edge.target_id)
        {
            return false;
        }
        edge_segment(edge, graph, &config.sizes)
            .map(|(a, b)| distance_point_to_segment(center, a, b) < config.edge_proximity)
            .unwrap_or(false)
    })
}

/// First other node (collection order) whose rectangle strictly overlaps the node's. Nodes on
/// the same parent chain never count.
pub fn find_overlapping_node<'a>(
    graph: &'a PlotGraph,
    node_id: &str,
    config: &CanvasConfig,
) -> Option<&'a Node> {
    let node = graph.node(node_id)?;
    let rect = absolute_rect(node, graph, &config.sizes);
    graph.nodes.iter().find(|other| {
        other.id != node_id
            && !graph.is_ancestor(&other.id, node_id)
            && !graph.is_ancestor(node_id, &other.id)
            && rect.overlaps(&absolute_rect(other, graph, &config.sizes))
    })
}

/// Inserts `node_id` into `edge_id`: the edge is replaced by `source -> node` and
/// `node -> target`, and the old target's downstream set is pushed down first.
pub fn splice(
    graph: &PlotGraph,
    node_id: &str,
    edge_id: &str,
    config: &CanvasConfig,
) -> Option<(PlotGraph, DropOutcome)> {
    let edge = graph.edge(edge_id)?.clone();
    if !graph.contains_node(node_id) || edge.touches(node_id) {
        return None;
    }

    let (mut next, moved) = push_downstream(graph, &edge.target_id, 0.0, config.splice_push);
    next.remove_edge(&edge.id);

    let incoming_id = next.fresh_edge_id(&format!("e-{}-{}", edge.source_id, node_id));
    next.edges.push(Edge {
        id: incoming_id.clone(),
        source_id: edge.source_id.clone(),
        target_id: node_id.to_string(),
        source_handle: edge.source_handle.clone(),
        target_handle: edge.target_handle.clone(),
        color: edge.color.clone(),
    });
    let outgoing_id = next.fresh_edge_id(&format!("e-{}-{}", node_id, edge.target_id));
    next.edges.push(Edge {
        id: outgoing_id.clone(),
        source_id: node_id.to_string(),
        target_id: edge.target_id.clone(),
        source_handle: edge.source_handle,
        target_handle: edge.target_handle,
        color: edge.color,
    });

    tracing::debug!(node = node_id, edge = %edge.id, moved = moved.len(), "spliced into edge");
    Some((
        next,
        DropOutcome::Spliced {
            removed_edge_id: edge.id,
            new_edge_ids: [incoming_id, outgoing_id],
            moved,
        },
    ))
}

/// Decides what a released drag commits, first applicable rule wins:
/// status attach, group membership, edge splice, overlap push.
/// `None` means the drop leaves the graph structurally unchanged.
pub fn resolve_drop(
    graph: &PlotGraph,
    node_id: &str,
    config: &CanvasConfig,
) -> Option<(PlotGraph, DropOutcome)> {
    let node = graph.node(node_id)?;

    if node.kind() == NodeKind::Status {
        // A status that lands on nothing simply stays free.
        let host_id = find_status_host(graph, node_id, config)?.id.clone();
        let next = attach(graph, node_id, &host_id, &config.palette)?;
        return Some((next, DropOutcome::StatusAttached { host_id }));
    }

    if let Some(committed) = reparent_on_drop(graph, node_id, config) {
        return Some(committed);
    }

    if let Some(edge) = find_intersecting_edge(graph, node_id, config) {
        return splice(graph, node_id, &edge.id, config);
    }

    let overlapped = find_overlapping_node(graph, node_id, config)?;
    if !graph.has_edges(&overlapped.id) {
        return None;
    }
    let overlapped_id = overlapped.id.clone();
    let (next, moved) = push_downstream(graph, &overlapped_id, 0.0, config.overlap_push);
    Some((
        next,
        DropOutcome::PushedOverlap {
            overlapped_id,
            moved,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupData, NodeData, Size, StatusData, StoryData};

    fn story(id: &str, x: f32, y: f32) -> Node {
        Node::new(id, Position::new(x, y), NodeData::Story(StoryData::default())).with_size(100.0, 80.0)
    }

    fn splice_fixture() -> PlotGraph {
        let mut graph = PlotGraph::new();
        graph.nodes.push(story("s1", 100.0, 0.0));
        graph.nodes.push(story("s2", 100.0, 300.0));
        graph.nodes.push(story("s3", 100.0, 600.0));
        graph.nodes.push(story("new", 100.0, 150.0));
        graph.edges.push(
            Edge::new("e", "s1", "s2").with_handles("story-source", "story-target"),
        );
        graph.edges.push(Edge::new("e23", "s2", "s3"));
        graph
    }

    #[test]
    fn edge_segment_runs_bottom_to_top_center() {
        let graph = splice_fixture();
        let (a, b) = edge_segment(graph.edge("e").unwrap(), &graph, &NodeSizes::default()).unwrap();
        assert_eq!(a, Position::new(150.0, 80.0));
        assert_eq!(b, Position::new(150.0, 300.0));
    }

    #[test]
    fn node_on_segment_intersects_but_touching_edges_are_skipped() {
        let graph = splice_fixture();
        let config = CanvasConfig::default();
        assert_eq!(
            find_intersecting_edge(&graph, "new", &config).map(|e| e.id.as_str()),
            Some("e")
        );
        // Both edges touch s2.
        assert!(find_intersecting_edge(&graph, "s2", &config).is_none());
    }

    #[test]
    fn proximity_is_strict() {
        let mut graph = splice_fixture();
        // Center at x = 150 + 35 lies exactly at the threshold.
        graph.node_mut("new").unwrap().position.x = 135.0;
        assert!(find_intersecting_edge(&graph, "new", &CanvasConfig::default()).is_none());
        graph.node_mut("new").unwrap().position.x = 134.0;
        assert!(find_intersecting_edge(&graph, "new", &CanvasConfig::default()).is_some());
    }

    #[test]
    fn dropping_on_edge_splices_and_pushes_downstream() {
        let graph = splice_fixture();
        let config = CanvasConfig::default();
        let (next, outcome) = resolve_drop(&graph, "new", &config).expect("splice applies");

        let DropOutcome::Spliced {
            removed_edge_id,
            new_edge_ids,
            moved,
        } = outcome
        else {
            panic!("expected splice, got {outcome:?}");
        };
        assert_eq!(removed_edge_id, "e");
        assert!(next.edge("e").is_none());
        let incoming = next.edge(&new_edge_ids[0]).unwrap();
        assert_eq!((incoming.source_id.as_str(), incoming.target_id.as_str()), ("s1", "new"));
        assert_eq!(incoming.source_handle.as_deref(), Some("story-source"));
        let outgoing = next.edge(&new_edge_ids[1]).unwrap();
        assert_eq!((outgoing.source_id.as_str(), outgoing.target_id.as_str()), ("new", "s2"));

        assert_eq!(moved, vec!["s2".to_string(), "s3".to_string()]);
        assert_eq!(next.node("s2").unwrap().position.y, 500.0);
        assert_eq!(next.node("s3").unwrap().position.y, 800.0);
        assert_eq!(next.node("s1").unwrap().position.y, 0.0);
        assert_eq!(next.node("new").unwrap().position.y, 150.0);
    }

    #[test]
    fn overlap_pushes_only_connected_nodes() {
        let mut graph = PlotGraph::new();
        graph.nodes.push(story("a", 0.0, 0.0));
        graph.nodes.push(story("b", 0.0, 300.0));
        graph.nodes.push(story("dragged", 1000.0, 40.0));
        graph.nodes.push(story("lonely", 1000.0, 0.0));
        let config = CanvasConfig::default();

        // Overlaps an unconnected node: nothing happens.
        assert!(resolve_drop(&graph, "dragged", &config).is_none());

        graph.edges.push(Edge::new("ab", "a", "b"));
        graph.node_mut("dragged").unwrap().position = Position::new(50.0, 20.0);
        let (next, outcome) = resolve_drop(&graph, "dragged", &config).unwrap();
        assert_eq!(
            outcome,
            DropOutcome::PushedOverlap {
                overlapped_id: "a".to_string(),
                moved: vec!["a".to_string(), "b".to_string()],
            }
        );
        assert_eq!(next.node("b").unwrap().position.y, 550.0);
    }

    #[test]
    fn status_drop_attaches_or_stays_free() {
        let mut graph = splice_fixture();
        graph.nodes.push(Node::new(
            "st",
            Position::new(110.0, 20.0),
            NodeData::Status(StatusData {
                name: Some("Poisoned".to_string()),
                color: Some("#f00".to_string()),
                description: None,
            }),
        ));
        graph.node_mut("st").unwrap().measured_size = Some(Size::new(40.0, 20.0));
        let config = CanvasConfig::default();

        let (next, outcome) = resolve_drop(&graph, "st", &config).unwrap();
        assert_eq!(
            outcome,
            DropOutcome::StatusAttached {
                host_id: "s1".to_string()
            }
        );
        assert_eq!(next.node("s1").unwrap().attached_statuses().len(), 1);

        graph.node_mut("st").unwrap().position = Position::new(5000.0, 5000.0);
        assert!(resolve_drop(&graph, "st", &config).is_none());
    }

    #[test]
    fn group_entry_takes_priority_over_splice() {
        let mut graph = splice_fixture();
        graph.nodes.insert(
            0,
            Node::new(
                "g",
                Position::new(0.0, 100.0),
                NodeData::Group(GroupData {
                    label: String::new(),
                    size: Size::new(400.0, 180.0),
                }),
            ),
        );
        let (next, outcome) = resolve_drop(&graph, "new", &CanvasConfig::default()).unwrap();
        assert_eq!(
            outcome,
            DropOutcome::Reparented {
                group_id: "g".to_string()
            }
        );
        assert!(next.edge("e").is_some());
    }

    #[test]
    fn group_release_ignores_edges_between_its_members() {
        let mut graph = PlotGraph::new();
        graph.nodes.push(story("s1", 0.0, 0.0));
        graph.nodes.push(story("s2", 0.0, 300.0));
        graph.edges.push(Edge::new("e", "s1", "s2"));
        let config = CanvasConfig::default();
        let (grouped, group_id) = crate::layout::group_nodes(
            &graph,
            &["s1".to_string(), "s2".to_string()],
            &config,
        )
        .unwrap();

        assert!(find_intersecting_edge(&grouped, &group_id, &config).is_none());
        assert!(resolve_drop(&grouped, &group_id, &config).is_none());
        assert!(grouped.edge("e").is_some());
    }

    #[test]
    fn children_never_overlap_their_own_group() {
        let mut graph = PlotGraph::new();
        graph.nodes.push(Node::new(
            "g",
            Position::new(0.0, 0.0),
            NodeData::Group(GroupData {
                label: String::new(),
                size: Size::new(400.0, 400.0),
            }),
        ));
        graph.nodes.push(story("child", 10.0, 10.0).with_parent("g"));
        let config = CanvasConfig::default();
        assert!(find_overlapping_node(&graph, "child", &config).is_none());
        assert!(find_overlapping_node(&graph, "g", &config).is_none());
    }
}
