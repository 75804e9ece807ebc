use plotweave::{Canvas, CanvasEvent, EventOutcome, PlotGraph, parse_config, story_flow};
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn to_js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|error| error.to_string())
}

fn build_canvas(project_json: Option<&str>, config_json: Option<&str>) -> Result<Canvas, String> {
    let config = match config_json {
        Some(raw) => parse_config(raw).map_err(|error| error.to_string())?,
        None => Default::default(),
    };
    let mut canvas = Canvas::new(config);
    if let Some(raw) = project_json {
        let project: PlotGraph = serde_json::from_str(raw).map_err(|error| error.to_string())?;
        plotweave::import_project(&mut canvas, project).map_err(|error| error.to_string())?;
    }
    Ok(canvas)
}

fn apply_json(canvas: &mut Canvas, event_json: &str) -> Result<String, String> {
    let event: CanvasEvent = serde_json::from_str(event_json).map_err(|error| error.to_string())?;
    let outcome: EventOutcome = canvas.apply(event);
    to_json(&outcome)
}

/// Canvas session driven by the browser renderer through JSON events.
#[wasm_bindgen]
pub struct CanvasHandle {
    canvas: Canvas,
}

#[wasm_bindgen]
impl CanvasHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(project_json: Option<String>, config_json: Option<String>) -> Result<CanvasHandle, JsValue> {
        let canvas = build_canvas(project_json.as_deref(), config_json.as_deref()).map_err(to_js_error)?;
        Ok(CanvasHandle { canvas })
    }

    /// Applies one tagged event (`{"type": "dragEnd", ...}`) and returns the outcome as JSON.
    pub fn apply(&mut self, event_json: &str) -> Result<String, JsValue> {
        apply_json(&mut self.canvas, event_json).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = highlightedEdge)]
    pub fn highlighted_edge(&self) -> Option<String> {
        self.canvas.highlighted_edge().map(str::to_string)
    }

    #[wasm_bindgen(js_name = exportProject)]
    pub fn export_project(&self) -> Result<String, JsValue> {
        to_json(&plotweave::export_project(&self.canvas)).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = importProject)]
    pub fn import_project(&mut self, project_json: &str) -> Result<(), JsValue> {
        let project: PlotGraph = serde_json::from_str(project_json).map_err(to_js_error)?;
        plotweave::import_project(&mut self.canvas, project).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = clearProject)]
    pub fn clear_project(&mut self) {
        plotweave::clear_project(&mut self.canvas);
    }

    #[wasm_bindgen(js_name = storySummary)]
    pub fn story_summary(&self) -> Result<String, JsValue> {
        to_json(&story_flow(self.canvas.graph())).map_err(to_js_error)
    }
}
