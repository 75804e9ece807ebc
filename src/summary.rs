// Story outline derived from the canvas: story beats in flow order with the entities feeding
// into each one.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::model::{Definition, NodeData, NodeKind, PlotGraph, StoryLevel};

pub const UNTITLED_BEAT: &str = "Untitled";

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatusSummary {
    pub name: String,
    pub color: String,
    pub description: String,
}

/// Definitions of the Character/Item/Location nodes with an edge into a story node.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConnectedEntities {
    pub characters: Vec<Definition>,
    pub items: Vec<Definition>,
    pub locations: Vec<Definition>,
    pub statuses: Vec<StatusSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryBeat {
    pub id: String,
    pub label: String,
    pub summary: String,
    pub level: StoryLevel,
    #[serde(flatten)]
    pub entities: ConnectedEntities,
}

fn push_unique(list: &mut Vec<Definition>, definition: &Definition) {
    if !list.iter().any(|known| known.id == definition.id) {
        list.push(definition.clone());
    }
}

fn push_status(list: &mut Vec<StatusSummary>, status: StatusSummary) {
    if !list.iter().any(|known| known.name == status.name) {
        list.push(status);
    }
}

/// Statuses carried by an entity node: free status nodes linked into it plus its attached tags.
fn entity_statuses(graph: &PlotGraph, entity_id: &str, out: &mut Vec<StatusSummary>) {
    for edge in graph.edges.iter().filter(|edge| edge.target_id == entity_id) {
        let Some(NodeData::Status(data)) = graph.node(&edge.source_id).map(|node| &node.data) else {
            continue;
        };
        push_status(
            out,
            StatusSummary {
                name: data.name.clone().unwrap_or_default(),
                color: data.color.clone().unwrap_or_default(),
                description: data.description.clone().unwrap_or_default(),
            },
        );
    }
    let Some(entity) = graph.node(entity_id) else {
        return;
    };
    for attached in entity.attached_statuses() {
        push_status(
            out,
            StatusSummary {
                name: attached.name.clone(),
                color: attached.color.clone(),
                description: attached.description.clone(),
            },
        );
    }
}

pub fn connected_entities(graph: &PlotGraph, story_id: &str) -> ConnectedEntities {
    let mut entities = ConnectedEntities::default();
    for edge in graph.edges.iter().filter(|edge| edge.target_id == story_id) {
        let Some(source) = graph.node(&edge.source_id) else {
            continue;
        };
        let Some(definition) = graph.definitions.resolve(source) else {
            continue;
        };
        let list = match source.kind() {
            NodeKind::Character => &mut entities.characters,
            NodeKind::Item => &mut entities.items,
            NodeKind::Location => &mut entities.locations,
            _ => continue,
        };
        push_unique(list, definition);
        entity_statuses(graph, &source.id, &mut entities.statuses);
    }
    entities
}

fn beat(graph: &PlotGraph, id: &str, with_entities: bool) -> Option<StoryBeat> {
    let NodeData::Story(data) = &graph.node(id)?.data else {
        return None;
    };
    let label = if data.label.trim().is_empty() {
        UNTITLED_BEAT.to_string()
    } else {
        data.label.clone()
    };
    let entities = if with_entities {
        connected_entities(graph, id)
    } else {
        ConnectedEntities::default()
    };
    Some(StoryBeat {
        id: id.to_string(),
        label,
        summary: data.summary.clone(),
        level: data.level,
        entities,
    })
}

/// Story nodes in reading order: BFS over story-to-story edges from every root (a story node
/// with no incoming story edge), then the story nodes the walk never reached.
pub fn story_flow(graph: &PlotGraph) -> Vec<StoryBeat> {
    let stories: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|node| node.kind() == NodeKind::Story)
        .map(|node| node.id.as_str())
        .collect();
    let Some(first) = stories.first() else {
        return Vec::new();
    };

    let story_edges: Vec<(&str, &str)> = graph
        .edges
        .iter()
        .filter(|edge| {
            stories.contains(&edge.source_id.as_str()) && stories.contains(&edge.target_id.as_str())
        })
        .map(|edge| (edge.source_id.as_str(), edge.target_id.as_str()))
        .collect();
    let targets: HashSet<&str> = story_edges.iter().map(|(_, target)| *target).collect();

    let mut queue: VecDeque<&str> = stories
        .iter()
        .copied()
        .filter(|id| !targets.contains(id))
        .collect();
    if queue.is_empty() {
        queue.push_back(*first);
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::new();
    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        ordered.extend(beat(graph, id, true));
        queue.extend(
            story_edges
                .iter()
                .filter(|(source, _)| *source == id)
                .map(|(_, target)| *target),
        );
    }

    for id in stories {
        if !visited.contains(id) {
            ordered.extend(beat(graph, id, false));
        }
    }
    ordered
}
