pub mod canvas;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod project;
pub mod summary;
pub mod theme;

pub use canvas::{Canvas, CanvasEvent, EventOutcome, NodeActions, Selection};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{CanvasConfig, NodeSizes, load_config, parse_config};
pub use error::ProjectError;
pub use layout::{ConnectionRequest, DropOutcome, Rect};
pub use model::{
    AttributeField, Definition, Edge, Node, NodeData, NodeKind, PlotGraph, Position, Size,
    StoryLevel,
};
pub use project::{clear_project, export_project, import_project};
pub use summary::{StoryBeat, story_flow};
pub use theme::Palette;
