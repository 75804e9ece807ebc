use crate::model::{Size, StoryLevel};
use crate::theme::Palette;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSizes {
    pub story: Size,
    pub story_main_width: f32,
    pub story_sub_width: f32,
    pub character: Size,
    pub item: Size,
    pub location: Size,
    pub status: Size,
    pub group: Size,
}

impl NodeSizes {
    pub fn story_for_level(&self, level: StoryLevel) -> Size {
        match level {
            StoryLevel::Main => Size::new(self.story_main_width, self.story.height),
            StoryLevel::Secondary => self.story,
            StoryLevel::Sub => Size::new(self.story_sub_width, self.story.height),
        }
    }
}

impl Default for NodeSizes {
    fn default() -> Self {
        Self {
            story: Size::new(280.0, 150.0),
            story_main_width: 340.0,
            story_sub_width: 240.0,
            character: Size::new(260.0, 150.0),
            item: Size::new(260.0, 150.0),
            location: Size::new(260.0, 150.0),
            status: Size::new(200.0, 40.0),
            group: Size::new(280.0, 150.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Max distance from a node center to an edge segment for the edge to count as intersected.
    pub edge_proximity: f32,
    /// Downstream shift applied when a node is spliced into an edge.
    pub splice_push: f32,
    /// Downstream shift applied when a dropped node overlaps a connected node.
    pub overlap_push: f32,
    /// Horizontal band used to find nodes physically below a growing node.
    pub below_band: f32,
    pub group_padding: f32,
    pub detach_offset_x: f32,
    pub detach_spacing_y: f32,
    pub resize_epsilon: f32,
    pub sizes: NodeSizes,
    pub palette: Palette,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            edge_proximity: 35.0,
            splice_push: 200.0,
            overlap_push: 250.0,
            below_band: 200.0,
            group_padding: 40.0,
            detach_offset_x: 30.0,
            detach_spacing_y: 60.0,
            resize_epsilon: 0.5,
            sizes: NodeSizes::default(),
            palette: Palette::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SizeFile {
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct NodeSizesFile {
    story: Option<SizeFile>,
    story_main_width: Option<f32>,
    story_sub_width: Option<f32>,
    character: Option<SizeFile>,
    item: Option<SizeFile>,
    location: Option<SizeFile>,
    status: Option<SizeFile>,
    group: Option<SizeFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PaletteFile {
    story_edge: Option<String>,
    character: Option<String>,
    item: Option<String>,
    location: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    edge_proximity: Option<f32>,
    splice_push: Option<f32>,
    overlap_push: Option<f32>,
    below_band: Option<f32>,
    group_padding: Option<f32>,
    detach_offset_x: Option<f32>,
    detach_spacing_y: Option<f32>,
    resize_epsilon: Option<f32>,
    sizes: Option<NodeSizesFile>,
    palette: Option<PaletteFile>,
}

fn merge_size(target: &mut Size, file: Option<SizeFile>) {
    let Some(file) = file else {
        return;
    };
    if let Some(v) = file.width {
        target.width = v.max(1.0);
    }
    if let Some(v) = file.height {
        target.height = v.max(1.0);
    }
}

fn merge_config(mut config: CanvasConfig, parsed: ConfigFile) -> CanvasConfig {
    if let Some(v) = parsed.edge_proximity {
        config.edge_proximity = v.max(0.0);
    }
    if let Some(v) = parsed.splice_push {
        config.splice_push = v;
    }
    if let Some(v) = parsed.overlap_push {
        config.overlap_push = v;
    }
    if let Some(v) = parsed.below_band {
        config.below_band = v.max(0.0);
    }
    if let Some(v) = parsed.group_padding {
        config.group_padding = v.max(0.0);
    }
    if let Some(v) = parsed.detach_offset_x {
        config.detach_offset_x = v;
    }
    if let Some(v) = parsed.detach_spacing_y {
        config.detach_spacing_y = v;
    }
    if let Some(v) = parsed.resize_epsilon {
        config.resize_epsilon = v.max(0.0);
    }

    if let Some(sizes) = parsed.sizes {
        merge_size(&mut config.sizes.story, sizes.story);
        merge_size(&mut config.sizes.character, sizes.character);
        merge_size(&mut config.sizes.item, sizes.item);
        merge_size(&mut config.sizes.location, sizes.location);
        merge_size(&mut config.sizes.status, sizes.status);
        merge_size(&mut config.sizes.group, sizes.group);
        if let Some(v) = sizes.story_main_width {
            config.sizes.story_main_width = v.max(1.0);
        }
        if let Some(v) = sizes.story_sub_width {
            config.sizes.story_sub_width = v.max(1.0);
        }
    }

    if let Some(palette) = parsed.palette {
        if let Some(v) = palette.story_edge {
            config.palette.story_edge = v;
        }
        if let Some(v) = palette.character {
            config.palette.character = v;
        }
        if let Some(v) = palette.item {
            config.palette.item = v;
        }
        if let Some(v) = palette.location {
            config.palette.location = v;
        }
        if let Some(v) = palette.status {
            config.palette.status = v;
        }
    }

    config
}

/// Parses a config document of optional overrides. Strict JSON is tried first, then JSON5.
pub fn parse_config(contents: &str) -> anyhow::Result<CanvasConfig> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|_| anyhow::anyhow!("invalid config file: {json_err}"))?,
    };
    Ok(merge_config(CanvasConfig::default(), parsed))
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<CanvasConfig> {
    let Some(path) = path else {
        return Ok(CanvasConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}
