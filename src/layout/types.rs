use serde::Serialize;

use crate::model::Position;

/// Axis-aligned rectangle in canvas units. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn top_center(&self) -> Position {
        Position::new(self.x + self.width / 2.0, self.y)
    }

    pub fn bottom_center(&self) -> Position {
        Position::new(self.x + self.width / 2.0, self.bottom())
    }

    /// Inclusive containment: points on the border are inside.
    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Overlap requires a positive intersection area; touching borders do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn inflate(&self, pad: f32) -> Rect {
        if pad <= 0.0 {
            return *self;
        }
        Rect::new(
            self.x - pad,
            self.y - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }
}

/// Structural change committed when a drag gesture is released.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DropOutcome {
    #[serde(rename_all = "camelCase")]
    StatusAttached { host_id: String },
    #[serde(rename_all = "camelCase")]
    Reparented { group_id: String },
    #[serde(rename_all = "camelCase")]
    Unparented { former_parent_id: String },
    #[serde(rename_all = "camelCase")]
    Spliced {
        removed_edge_id: String,
        new_edge_ids: [String; 2],
        moved: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    PushedOverlap { overlapped_id: String, moved: Vec<String> },
    Unchanged,
}
