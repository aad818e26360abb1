use std::collections::HashMap;
use std::sync::Once;

use log::warn;
use wasm_bindgen::prelude::*;

use crate::{
    decode_collection, encode, snap_query, ClickOutcome, Config, LatLng, PendingClick,
    RecordingSurface, RouteResponse, Session,
};

static START: Once = Once::new();

/// The browser side does the HTTP requests and persistence, and draws whatever
/// `renderGeojson` returns. Everything else lives here.
#[wasm_bindgen]
pub struct JsCheckpointSession {
    session: Session<RecordingSurface>,
    // Clicks waiting on a snap lookup, by the token handed to JS
    pending: HashMap<u32, PendingClick>,
    next_token: u32,
}

#[wasm_bindgen]
impl JsCheckpointSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsCheckpointSession {
        START.call_once(|| {
            // Panics shouldn't happen, but if they do, console.log them.
            console_error_panic_hook::set_once();
            // Only fails if some other logger got there first
            let _ = console_log::init_with_level(log::Level::Info);
        });

        Self {
            session: Session::new(RecordingSurface::new(), Config::default()),
            pending: HashMap::new(),
            next_token: 0,
        }
    }

    /// Updates configuration. Existing checkpoints and connectors are left alone.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, input: JsValue) {
        match serde_wasm_bindgen::from_value::<Config>(input) {
            Ok(config) => self.session.set_config(config),
            Err(err) => warn!("Bad input to setConfig: {}", err),
        }
    }

    /// Places a checkpoint and returns a token for its pending snap lookup, or nothing if the
    /// position is invalid.
    #[wasm_bindgen(js_name = beginClick)]
    pub fn begin_click(&mut self, lng: f64, lat: f64) -> Option<u32> {
        let pending = self.session.begin_click(LatLng::new(lat, lng))?;
        self.next_token += 1;
        self.pending.insert(self.next_token, pending);
        Some(self.next_token)
    }

    /// The waypoints to request for a pending click, as `[{lat, lng}, {lat, lng}]`
    #[wasm_bindgen(js_name = snapQuery)]
    pub fn snap_query(&self, token: u32) -> Result<JsValue, JsValue> {
        let pending = self
            .pending
            .get(&token)
            .ok_or_else(|| JsValue::from_str("unknown click token"))?;
        serde_wasm_bindgen::to_value(&snap_query(pending.position)).map_err(err_to_js)
    }

    /// Hands over the provider's response for a pending click, or nothing if the request failed.
    /// Returns "on-road", "off-road" or "discarded".
    #[wasm_bindgen(js_name = completeClick)]
    pub fn complete_click(&mut self, token: u32, response_json: Option<String>) -> String {
        let Some(pending) = self.pending.remove(&token) else {
            return "discarded".to_string();
        };
        let response = match response_json {
            Some(raw) => serde_json::from_str(&raw)
                .map(RouteResponse::from_geojson)
                .map_err(anyhow::Error::from),
            None => Err(anyhow::anyhow!("snap request failed")),
        };
        match self.session.complete_click(pending, response) {
            ClickOutcome::OnRoad => "on-road",
            ClickOutcome::OffRoad { .. } => "off-road",
            ClickOutcome::Discarded => "discarded",
        }
        .to_string()
    }

    #[wasm_bindgen(js_name = removeCheckpoint)]
    pub fn remove_checkpoint(&mut self, lng: f64, lat: f64) -> bool {
        self.session.remove_checkpoint_at(LatLng::new(lat, lng))
    }

    #[wasm_bindgen(js_name = clearState)]
    pub fn clear_state(&mut self) {
        self.pending.clear();
        self.session.reset();
    }

    /// Restores a saved collection. Unreadable input restores nothing. Returns how many off-road
    /// checkpoints couldn't be connected.
    #[wasm_bindgen(js_name = restoreAll)]
    pub fn restore_all(&mut self, saved_json: &str) -> usize {
        let routes = match decode_collection(saved_json) {
            Ok(routes) => routes,
            Err(err) => {
                warn!("Saved routes are unreadable, starting empty: {}", err);
                Vec::new()
            }
        };
        self.session.restore_all(&routes).unresolved.len()
    }

    #[wasm_bindgen(js_name = drawRoute)]
    pub fn draw_route(&mut self, response_json: &str, label: &str) -> Result<bool, JsValue> {
        let raw: serde_json::Value = serde_json::from_str(response_json).map_err(err_to_js)?;
        Ok(self
            .session
            .draw_route(&RouteResponse::from_geojson(raw), label.trim()))
    }

    /// The record to append to storage for the current checkpoints
    #[wasm_bindgen(js_name = buildRoute)]
    pub fn build_route(&self, label: &str, response_json: &str) -> Result<String, JsValue> {
        let raw: serde_json::Value = serde_json::from_str(response_json).map_err(err_to_js)?;
        let record = encode(&self.session.build_route(label.trim(), raw));
        serde_json::to_string(&record).map_err(err_to_js)
    }

    #[wasm_bindgen(js_name = pairwiseDistances)]
    pub fn pairwise_distances(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.pairwise_distances()).map_err(err_to_js)
    }

    #[wasm_bindgen(js_name = renderGeojson)]
    pub fn render_geojson(&self) -> String {
        self.session.surface().render_geojson()
    }
}

fn err_to_js<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}
