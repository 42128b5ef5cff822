#![cfg(target_arch = "wasm32")]
//! Browser binding. JS owns `requestAnimationFrame` and the canvas; this side
//! owns the simulation and hands back packed instance data each frame.
//!
//! Catalogue rows are plain objects:
//! - songs / tags: `{ id, name, relatedCount }`
//! - persons: `{ id, name, roles: ["lyricist" | "composer" | "arranger"], relatedCount }`

use bubble_core::{
    BubbleInstance, BubbleSimulator, Catalogue, CatalogueEntry, EntityType, Person,
    SimulatorConfig,
};
use js_sys::{Array, Float32Array, Reflect};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("bubble-web starting");
    Ok(())
}

fn to_js(e: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", e))
}

fn field(obj: &JsValue, key: &str) -> anyhow::Result<JsValue> {
    Reflect::get(obj, &JsValue::from_str(key))
        .map_err(|e| anyhow::anyhow!("cannot read '{}': {:?}", key, e))
}

/// Ids may arrive as strings or numbers.
fn id_field(obj: &JsValue) -> anyhow::Result<String> {
    let v = field(obj, "id")?;
    if let Some(s) = v.as_string() {
        return Ok(s);
    }
    v.as_f64()
        .map(|n| n.to_string())
        .ok_or_else(|| anyhow::anyhow!("row without a usable id"))
}

fn name_field(obj: &JsValue) -> anyhow::Result<String> {
    Ok(field(obj, "name")?.as_string().unwrap_or_default())
}

fn related_field(obj: &JsValue) -> anyhow::Result<u32> {
    let n = field(obj, "relatedCount")?.as_f64().unwrap_or(0.0);
    Ok(n.max(0.0).min(u32::MAX as f64) as u32)
}

fn rows(list: &JsValue, what: &str) -> anyhow::Result<Array> {
    if list.is_undefined() || list.is_null() {
        return Ok(Array::new());
    }
    if !Array::is_array(list) {
        anyhow::bail!("{} must be an array", what);
    }
    Ok(Array::from(list))
}

fn parse_entries(list: &JsValue, what: &str) -> anyhow::Result<Vec<CatalogueEntry>> {
    rows(list, what)?
        .iter()
        .map(|row| -> anyhow::Result<CatalogueEntry> {
            Ok(CatalogueEntry::new(
                id_field(&row)?,
                name_field(&row)?,
                related_field(&row)?,
            ))
        })
        .collect()
}

fn parse_persons(list: &JsValue) -> anyhow::Result<Vec<Person>> {
    rows(list, "persons")?
        .iter()
        .map(|row| -> anyhow::Result<Person> {
            let id = id_field(&row)?;
            let roles_js = field(&row, "roles")?;
            let roles: Vec<EntityType> = if Array::is_array(&roles_js) {
                Array::from(&roles_js)
                    .iter()
                    .filter_map(|r| r.as_string())
                    .filter_map(|r| r.parse::<EntityType>().ok())
                    .collect()
            } else {
                Vec::new()
            };
            if roles.is_empty() {
                log::warn!("[web] person {} has no known roles; shown as lyricist", id);
            }
            Ok(Person::new(id, name_field(&row)?, &roles, related_field(&row)?))
        })
        .collect()
}

#[wasm_bindgen]
pub struct BubbleField {
    sim: BubbleSimulator,
    instances: Vec<BubbleInstance>,
}

#[wasm_bindgen]
impl BubbleField {
    /// Empty field; call `load_catalogue` before the first `update`.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, seed: u32) -> BubbleField {
        let config = SimulatorConfig {
            canvas_width: width,
            canvas_height: height,
            seed: seed as u64,
            ..SimulatorConfig::default()
        };
        let max = config.max_bubbles;
        BubbleField {
            sim: BubbleSimulator::new(config, Catalogue::default()),
            instances: Vec::with_capacity(max),
        }
    }

    /// Replace the music database. Clears every bubble on screen.
    pub fn load_catalogue(
        &mut self,
        songs: &JsValue,
        persons: &JsValue,
        tags: &JsValue,
    ) -> Result<(), JsValue> {
        let catalogue = Catalogue::new(
            parse_entries(songs, "songs").map_err(to_js)?,
            parse_persons(persons).map_err(to_js)?,
            parse_entries(tags, "tags").map_err(to_js)?,
        );
        self.sim.update_music_database(catalogue);
        Ok(())
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.sim.set_canvas_size(width, height);
    }

    /// Advance to `now_ms` and return 8 floats per bubble, back to front:
    /// center x, center y, radius, rotation (degrees), r, g, b, a.
    pub fn update(&mut self, now_ms: f64) -> Float32Array {
        _ = self.sim.update_frame_at(now_ms);
        self.sim.write_instances(&mut self.instances);
        let floats: &[f32] = bytemuck::cast_slice(&self.instances);
        Float32Array::from(floats)
    }

    /// Id of the topmost bubble under the pointer.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<f64> {
        self.sim.find_bubble_at_position(x, y).map(|b| b.id as f64)
    }

    pub fn click(&mut self, id: f64) -> bool {
        self.sim.trigger_click_animation(id as u64)
    }

    /// Catalogue id shown by a bubble, for navigation on click.
    pub fn content_id(&self, id: f64) -> Option<String> {
        self.sim.bubble(id as u64).map(|b| b.content_id.clone())
    }

    pub fn reduce_quality(&self) -> bool {
        self.sim.animations().should_reduce_quality()
    }

    pub fn stats(&self) -> String {
        let s = self.sim.get_stats();
        let p = self.sim.get_animation_performance_stats();
        format!(
            "bubbles={}/{} generated={} removed={} halted={} rotations={} fps={:.1} dropped={} reduce_quality={}",
            s.active_bubbles,
            s.max_bubbles,
            s.generated,
            s.removed,
            s.generation_halted,
            s.tracker.rotation_cycles,
            p.fps,
            p.dropped_frames,
            p.reduce_quality
        )
    }
}
