// Status tags: a free Status node dropped onto a host merges into the host's attribute list, and
// can later be split back out as a free node.

use crate::config::CanvasConfig;
use crate::model::{Node, NodeData, NodeKind, PlotGraph, StatusAttribute, StatusData};
use crate::theme::Palette;

use super::geometry::{absolute_center, absolute_rect, effective_size};

pub const DEFAULT_STATUS_NAME: &str = "Status";

/// First node (collection order) that can host a status and whose absolute rectangle contains
/// the status node's center.
pub fn find_status_host<'a>(
    graph: &'a PlotGraph,
    status_id: &str,
    config: &CanvasConfig,
) -> Option<&'a Node> {
    let status = graph.node(status_id)?;
    if status.kind() != NodeKind::Status {
        return None;
    }
    let center = absolute_center(status, graph, &config.sizes);
    graph.nodes.iter().find(|node| {
        node.id != status_id
            && node.kind().can_host_status()
            && absolute_rect(node, graph, &config.sizes).contains(center)
    })
}

/// Merges a free status node into `host_id`. The status node and its edges disappear; the host
/// gains one attribute entry with a fresh id. `None` when either side is not eligible.
pub fn attach(
    graph: &PlotGraph,
    status_id: &str,
    host_id: &str,
    palette: &Palette,
) -> Option<PlotGraph> {
    let NodeData::Status(data) = &graph.node(status_id)?.data else {
        return None;
    };
    if !graph.node(host_id)?.kind().can_host_status() {
        return None;
    }

    let attribute = StatusAttribute {
        id: graph.fresh_attachment_id(),
        name: data
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_STATUS_NAME.to_string()),
        color: data
            .color
            .clone()
            .filter(|color| !color.is_empty())
            .unwrap_or_else(|| palette.status.clone()),
        description: data.description.clone().unwrap_or_default(),
    };

    let mut next = graph.clone();
    next.node_mut(host_id)?.attached_statuses_mut()?.push(attribute);
    next.remove_node(status_id);
    tracing::debug!(status = status_id, host = host_id, "status attached");
    Some(next)
}

/// Splits attribute `index` of `host_id` back out into a free Status node placed beside the host,
/// in the host's parent frame. Returns the next snapshot and the new node's id.
pub fn detach(
    graph: &PlotGraph,
    host_id: &str,
    index: usize,
    config: &CanvasConfig,
) -> Option<(PlotGraph, String)> {
    let host = graph.node(host_id)?;
    if index >= host.attached_statuses().len() {
        return None;
    }
    let host_width = effective_size(host, &config.sizes).width;
    let position = host.position.offset(
        host_width + config.detach_offset_x,
        index as f32 * config.detach_spacing_y,
    );
    let parent_id = host.parent_id.clone();

    let mut next = graph.clone();
    let attribute = next.node_mut(host_id)?.attached_statuses_mut()?.remove(index);
    let id = next.fresh_node_id(NodeKind::Status.id_prefix());
    let mut node = Node::new(
        id.clone(),
        position,
        NodeData::Status(StatusData {
            name: Some(attribute.name),
            color: Some(attribute.color),
            description: Some(attribute.description),
        }),
    );
    node.parent_id = parent_id;
    next.nodes.push(node);
    tracing::debug!(host = host_id, index, status = %id, "status detached");
    Some((next, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, GroupData, Position, StoryData};

    fn host_graph() -> PlotGraph {
        let mut graph = PlotGraph::new();
        graph.nodes.push(
            Node::new("h", Position::new(100.0, 100.0), NodeData::Story(StoryData::default()))
                .with_size(280.0, 150.0),
        );
        graph.nodes.push(Node::new(
            "st",
            Position::new(150.0, 150.0),
            NodeData::Status(StatusData {
                name: Some("Poisoned".to_string()),
                color: Some("#f00".to_string()),
                description: None,
            }),
        ));
        graph.edges.push(Edge::new("e-st-h", "st", "h"));
        graph
    }

    #[test]
    fn attach_merges_status_into_host() {
        let graph = host_graph();
        let next = attach(&graph, "st", "h", &Palette::default()).expect("host accepts status");

        assert!(next.node("st").is_none());
        assert!(next.edges.is_empty());
        let statuses = next.node("h").unwrap().attached_statuses();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].name, "Poisoned");
        assert_eq!(statuses[0].color, "#f00");
        assert_eq!(statuses[0].description, "");
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn attach_fills_defaults() {
        let mut graph = host_graph();
        if let NodeData::Status(data) = &mut graph.node_mut("st").unwrap().data {
            *data = StatusData::default();
        }
        let next = attach(&graph, "st", "h", &Palette::default()).unwrap();
        let entry = &next.node("h").unwrap().attached_statuses()[0];
        assert_eq!(entry.name, DEFAULT_STATUS_NAME);
        assert_eq!(entry.color, "#f472b6");
    }

    #[test]
    fn attach_rejects_ineligible_hosts() {
        let mut graph = host_graph();
        graph.nodes.push(Node::new(
            "g",
            Position::default(),
            NodeData::Group(GroupData::default()),
        ));
        graph.nodes.push(Node::new(
            "other",
            Position::default(),
            NodeData::Status(StatusData::default()),
        ));
        let palette = Palette::default();
        assert!(attach(&graph, "st", "g", &palette).is_none());
        assert!(attach(&graph, "st", "other", &palette).is_none());
        assert!(attach(&graph, "st", "missing", &palette).is_none());
        assert!(attach(&graph, "h", "st", &palette).is_none());
    }

    #[test]
    fn host_is_found_under_status_center() {
        let graph = host_graph();
        let config = CanvasConfig::default();
        assert_eq!(find_status_host(&graph, "st", &config).map(|n| n.id.as_str()), Some("h"));
        assert!(find_status_host(&graph, "h", &config).is_none());
    }

    #[test]
    fn detach_places_node_beside_host_and_round_trips() {
        let graph = host_graph();
        let config = CanvasConfig::default();
        let attached = attach(&graph, "st", "h", &config.palette).unwrap();
        let old_entry = attached.node("h").unwrap().attached_statuses()[0].clone();

        let (detached, id) = detach(&attached, "h", 0, &config).expect("entry exists");
        assert!(detached.node("h").unwrap().attached_statuses().is_empty());
        let node = detached.node(&id).unwrap();
        assert_eq!(node.position, Position::new(410.0, 100.0));

        let back = attach(&detached, &id, "h", &config.palette).unwrap();
        let entry = &back.node("h").unwrap().attached_statuses()[0];
        assert_eq!(entry.name, old_entry.name);
        assert_eq!(entry.color, old_entry.color);
        assert_eq!(entry.description, old_entry.description);
    }

    #[test]
    fn detach_spaces_by_index_and_keeps_parent_frame() {
        let mut graph = host_graph();
        graph.nodes.insert(
            0,
            Node::new("g", Position::new(0.0, 0.0), NodeData::Group(GroupData::default())),
        );
        graph.node_mut("h").unwrap().parent_id = Some("g".to_string());
        let host = graph.node_mut("h").unwrap();
        let statuses = host.attached_statuses_mut().unwrap();
        for name in ["a", "b"] {
            statuses.push(StatusAttribute {
                id: format!("attached-{name}"),
                name: name.to_string(),
                color: "#fff".to_string(),
                description: String::new(),
            });
        }

        let config = CanvasConfig::default();
        let (next, id) = detach(&graph, "h", 1, &config).unwrap();
        let node = next.node(&id).unwrap();
        assert_eq!(node.position, Position::new(410.0, 160.0));
        assert_eq!(node.parent_id.as_deref(), Some("g"));
        assert!(detach(&next, "h", 5, &config).is_none());
    }
}
