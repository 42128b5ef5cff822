//! Catalogue display bookkeeping and next-item scheduling.
//!
//! Every catalogue item is in exactly one of three places:
//! - `available`: may be offered by `select_next_content`
//! - `displayed`: bound to a live bubble
//! - `cooling`: recently displayed, waiting out the cooldown window
//!
//! Nothing here fails loudly. "Already displayed", "not tracked" and "nothing
//! to offer" come back as `false` / `None` and the simulator decides what to
//! do about it. Timestamps are host milliseconds passed in by the caller.

use crate::bubble::BubbleId;
use crate::catalogue::{CatalogueEntry, ContentKind, EntityType, Person};
use crate::config::TrackerConfig;
use crate::constants::*;
use fnv::{FnvHashMap, FnvHashSet};
use rand::prelude::*;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// A catalogue item as seen by the scheduler.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentItem {
    pub id: String,
    pub entity_type: EntityType,
    pub name: String,
    pub related_count: u32,
    pub display_count: u32,
    pub last_displayed: Option<f64>,
}

impl ContentItem {
    #[inline]
    pub fn kind(&self) -> ContentKind {
        self.entity_type.kind()
    }
}

/// The binding between a visible bubble and the content it shows.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayedBubbleInfo {
    pub content_id: String,
    pub bubble_id: BubbleId,
    pub displayed_at: f64,
    pub entity_type: EntityType,
}

/// One finished display, kept in a bounded history.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayRecord {
    pub content_id: String,
    pub entity_type: EntityType,
    pub duration_ms: f64,
    pub ended_at: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackerStats {
    pub available: usize,
    pub displayed: usize,
    pub cooling: usize,
    pub total: usize,
    pub rotation_cycles: u32,
    pub cycle_progress: f32,
    pub average_display_ms: f64,
    pub displayed_songs: usize,
    pub displayed_persons: usize,
    pub displayed_tags: usize,
}

struct DisplayedEntry {
    item: ContentItem,
    info: DisplayedBubbleInfo,
}

pub struct ContentTracker {
    config: TrackerConfig,
    available: FnvHashMap<String, ContentItem>,
    displayed: FnvHashMap<String, DisplayedEntry>,
    cooling: FnvHashMap<String, ContentItem>,
    bubble_index: FnvHashMap<BubbleId, String>,
    history: VecDeque<DisplayRecord>,
    type_queue: VecDeque<ContentKind>,
    shown_this_cycle: FnvHashSet<String>,
    rotation_cycles: u32,
    total_items: usize,
    max_related: u32,
    evicted: Vec<BubbleId>,
    rng: StdRng,
}

impl ContentTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            available: FnvHashMap::default(),
            displayed: FnvHashMap::default(),
            cooling: FnvHashMap::default(),
            bubble_index: FnvHashMap::default(),
            history: VecDeque::new(),
            type_queue: ContentKind::ROUND_ROBIN.into_iter().collect(),
            shown_this_cycle: FnvHashSet::default(),
            rotation_cycles: 0,
            total_items: 0,
            max_related: 0,
            evicted: Vec::new(),
            rng,
        }
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Rebuild the pool from a fresh catalogue, discarding all prior state.
    pub fn initialize_content_pool(
        &mut self,
        songs: &[CatalogueEntry],
        persons: &[Person],
        tags: &[CatalogueEntry],
    ) {
        self.reset();
        let entries = songs
            .iter()
            .map(|s| (s.id.as_str(), s.name.as_str(), s.related_count, EntityType::Song))
            .chain(
                persons
                    .iter()
                    .map(|p| (p.id.as_str(), p.name.as_str(), p.related_count, p.primary_role())),
            )
            .chain(
                tags.iter()
                    .map(|t| (t.id.as_str(), t.name.as_str(), t.related_count, EntityType::Tag)),
            );
        for (id, name, related_count, entity_type) in entries {
            if self.available.contains_key(id) {
                log::warn!("[tracker] duplicate content id {} ignored", id);
                continue;
            }
            self.max_related = self.max_related.max(related_count);
            _ = self.available.insert(
                id.to_owned(),
                ContentItem {
                    id: id.to_owned(),
                    entity_type,
                    name: name.to_owned(),
                    related_count,
                    display_count: 0,
                    last_displayed: None,
                },
            );
        }
        self.total_items = self.available.len();
        log::info!(
            "[tracker] content pool ready: {} songs, {} persons, {} tags",
            songs.len(),
            persons.len(),
            tags.len()
        );
    }

    /// Forget everything: items, bindings, history and cycle state.
    pub fn reset(&mut self) {
        self.available.clear();
        self.displayed.clear();
        self.cooling.clear();
        self.bubble_index.clear();
        self.history.clear();
        self.type_queue = ContentKind::ROUND_ROBIN.into_iter().collect();
        self.shown_this_cycle.clear();
        self.rotation_cycles = 0;
        self.total_items = 0;
        self.max_related = 0;
        self.evicted.clear();
    }

    /// Bind `content_id` to `bubble_id`. Returns `false` without touching
    /// anything if the item is already shown, unknown, or the display set is
    /// full.
    pub fn track_displayed_item(
        &mut self,
        content_id: &str,
        bubble_id: BubbleId,
        entity_type: EntityType,
        now: f64,
    ) -> bool {
        if self.displayed.contains_key(content_id)
            || self.displayed.len() >= self.config.max_displayed
            || self.bubble_index.contains_key(&bubble_id)
        {
            return false;
        }
        let item = match self.available.remove(content_id) {
            Some(item) => Some(item),
            None => self.cooling.remove(content_id),
        };
        let Some(mut item) = item else {
            return false;
        };
        item.display_count += 1;
        item.last_displayed = Some(now);
        _ = self.shown_this_cycle.insert(item.id.clone());
        _ = self.bubble_index.insert(bubble_id, item.id.clone());
        let info = DisplayedBubbleInfo {
            content_id: item.id.clone(),
            bubble_id,
            displayed_at: now,
            entity_type,
        };
        _ = self.displayed.insert(item.id.clone(), DisplayedEntry { item, info });
        true
    }

    /// Release whatever `bubble_id` was showing. The item returns to the
    /// available set once its cooldown has elapsed. Returns `false` if the
    /// bubble was not bound to anything.
    pub fn untrack_displayed_item(&mut self, bubble_id: BubbleId, now: f64) -> bool {
        let Some(content_id) = self.bubble_index.remove(&bubble_id) else {
            return false;
        };
        let Some(DisplayedEntry { mut item, info }) = self.displayed.remove(&content_id) else {
            return false;
        };
        self.push_history(DisplayRecord {
            content_id: info.content_id,
            entity_type: info.entity_type,
            duration_ms: (now - info.displayed_at).max(0.0),
            ended_at: now,
        });
        // cooldown runs from the end of the display
        item.last_displayed = Some(now);
        if self.config.cooldown_ms <= 0.0 {
            _ = self.available.insert(content_id, item);
        } else {
            _ = self.cooling.insert(content_id, item);
        }
        true
    }

    /// Pick the next item to show, or `None` if nothing can be offered.
    ///
    /// Selection is weighted when anything is available. Otherwise, once the
    /// current cycle has shown at least `rotation_threshold` of the catalogue,
    /// the longest-displayed item is forcibly released and handed back; its
    /// bubble id is queued for `drain_evicted`.
    pub fn select_next_content(&mut self, now: f64) -> Option<ContentItem> {
        self.promote_cooled(now);
        if !self.available.is_empty() {
            return self.weighted_select(now);
        }
        self.force_rotation(now)
    }

    /// Bubble ids whose content was reclaimed by forced rotation since the
    /// last call.
    pub fn drain_evicted(&mut self) -> Vec<BubbleId> {
        std::mem::take(&mut self.evicted)
    }

    #[inline]
    pub fn is_displayed(&self, content_id: &str) -> bool {
        self.displayed.contains_key(content_id)
    }

    #[inline]
    pub fn is_available(&self, content_id: &str) -> bool {
        self.available.contains_key(content_id)
    }

    pub fn content_for_bubble(&self, bubble_id: BubbleId) -> Option<&str> {
        self.bubble_index.get(&bubble_id).map(String::as_str)
    }

    pub fn displayed_info(&self, content_id: &str) -> Option<&DisplayedBubbleInfo> {
        self.displayed.get(content_id).map(|e| &e.info)
    }

    #[inline]
    pub fn available_len(&self) -> usize {
        self.available.len()
    }

    #[inline]
    pub fn displayed_len(&self) -> usize {
        self.displayed.len()
    }

    #[inline]
    pub fn rotation_cycles(&self) -> u32 {
        self.rotation_cycles
    }

    pub fn history(&self) -> impl Iterator<Item = &DisplayRecord> {
        self.history.iter()
    }

    pub fn statistics(&self) -> TrackerStats {
        let average_display_ms = if self.history.is_empty() {
            0.0
        } else {
            self.history.iter().map(|r| r.duration_ms).sum::<f64>() / self.history.len() as f64
        };
        let mut by_kind = [0usize; 3];
        for e in self.displayed.values() {
            by_kind[kind_index(e.item.kind())] += 1;
        }
        TrackerStats {
            available: self.available.len(),
            displayed: self.displayed.len(),
            cooling: self.cooling.len(),
            total: self.total_items,
            rotation_cycles: self.rotation_cycles,
            cycle_progress: self.cycle_progress(),
            average_display_ms,
            displayed_songs: by_kind[0],
            displayed_persons: by_kind[1],
            displayed_tags: by_kind[2],
        }
    }

    /// Share of the catalogue shown at least once in the current cycle.
    pub fn cycle_progress(&self) -> f32 {
        if self.total_items == 0 {
            0.0
        } else {
            self.shown_this_cycle.len() as f32 / self.total_items as f32
        }
    }

    fn promote_cooled(&mut self, now: f64) {
        if self.cooling.is_empty() {
            return;
        }
        let cooldown = self.config.cooldown_ms;
        let ready: SmallVec<[String; 8]> = self
            .cooling
            .iter()
            .filter(|(_, item)| item.last_displayed.map_or(true, |t| now - t >= cooldown))
            .map(|(id, _)| id.clone())
            .collect();
        for id in ready {
            if let Some(item) = self.cooling.remove(&id) {
                _ = self.available.insert(id, item);
            }
        }
    }

    fn weighted_select(&mut self, now: f64) -> Option<ContentItem> {
        let preferred = self.next_preferred_kind();
        let mut candidates: Vec<&ContentItem> = self
            .available
            .values()
            .filter(|item| item.kind() == preferred)
            .collect();
        if candidates.is_empty() {
            candidates = self.available.values().collect();
        }
        // hash map order is not part of the contract; sort for reproducible draws
        candidates.sort_by(|a, b| a.id.cmp(&b.id));

        let displayed_total = self.displayed.len();
        let mut displayed_by_kind = [0usize; 3];
        for e in self.displayed.values() {
            displayed_by_kind[kind_index(e.item.kind())] += 1;
        }

        let w = self.config.weights;
        let cooldown = self.config.cooldown_ms.max(1.0);
        let popularity_norm = (1.0 + self.max_related as f32).ln().max(f32::EPSILON);

        let mut scored: Vec<(usize, f32)> = Vec::with_capacity(candidates.len());
        let mut total = 0.0f32;
        for (i, item) in candidates.iter().enumerate() {
            let recency = match item.last_displayed {
                None => 1.0,
                Some(t) => recency_since(now - t, cooldown),
            } / (1.0 + DISPLAY_COUNT_PENALTY * item.display_count as f32);
            let popularity = (1.0 + item.related_count as f32).ln() / popularity_norm;
            let type_balance = if displayed_total == 0 {
                1.0
            } else {
                1.0 - displayed_by_kind[kind_index(item.kind())] as f32 / displayed_total as f32
            };
            let freshness = if self.shown_this_cycle.contains(&item.id) {
                SEEN_THIS_CYCLE_FRESHNESS
            } else {
                1.0
            };
            let jitter: f32 = self.rng.gen();
            let score = (w.recency * recency
                + w.popularity * popularity
                + w.type_balance * type_balance
                + w.freshness * freshness
                + w.jitter * jitter)
                .max(MIN_CANDIDATE_WEIGHT);
            total += score;
            scored.push((i, score));
        }

        let mut pick = self.rng.gen::<f32>() * total;
        let mut chosen = scored.last().map(|(i, _)| *i)?;
        for (i, score) in &scored {
            if pick < *score {
                chosen = *i;
                break;
            }
            pick -= score;
        }
        Some(candidates[chosen].clone())
    }

    fn force_rotation(&mut self, now: f64) -> Option<ContentItem> {
        if self.displayed.is_empty() || self.total_items == 0 {
            return None;
        }
        if self.cycle_progress() < self.config.rotation_threshold {
            return None;
        }
        let oldest = self
            .displayed
            .values()
            .min_by(|a, b| {
                a.info
                    .displayed_at
                    .total_cmp(&b.info.displayed_at)
                    .then_with(|| a.item.id.cmp(&b.item.id))
            })
            .map(|e| (e.info.bubble_id, e.item.id.clone()))?;
        let (bubble_id, content_id) = oldest;
        _ = self.bubble_index.remove(&bubble_id);
        let DisplayedEntry { mut item, info } = self.displayed.remove(&content_id)?;
        self.push_history(DisplayRecord {
            content_id: info.content_id,
            entity_type: info.entity_type,
            duration_ms: (now - info.displayed_at).max(0.0),
            ended_at: now,
        });
        self.rotation_cycles += 1;
        self.shown_this_cycle.clear();
        self.evicted.push(bubble_id);
        log::debug!(
            "[tracker] rotation cycle {} reclaimed {} from bubble {}",
            self.rotation_cycles,
            content_id,
            bubble_id
        );
        // handed back once; parked in cooling so it stays trackable without
        // being offered again before its cooldown
        item.last_displayed = Some(now);
        _ = self.cooling.insert(content_id, item.clone());
        Some(item)
    }

    fn next_preferred_kind(&mut self) -> ContentKind {
        let kind = self.type_queue.pop_front().unwrap_or(ContentKind::Song);
        self.type_queue.push_back(kind);
        kind
    }

    fn push_history(&mut self, record: DisplayRecord) {
        if self.config.history_len == 0 {
            return;
        }
        while self.history.len() >= self.config.history_len {
            _ = self.history.pop_front();
        }
        self.history.push_back(record);
    }
}

/// Log-scaled time an item has spent past its cooldown, in [0, 1].
/// Anything offered has already waited out one cooldown, so that part is
/// subtracted before scaling.
fn recency_since(elapsed_ms: f64, cooldown_ms: f64) -> f32 {
    let past = ((elapsed_ms / cooldown_ms) as f32 - 1.0).max(0.0);
    ((1.0 + past).ln() / (1.0 + RECENCY_HORIZON_COOLDOWNS).ln()).min(1.0)
}

#[inline]
fn kind_index(kind: ContentKind) -> usize {
    match kind {
        ContentKind::Song => 0,
        ContentKind::Person => 1,
        ContentKind::Tag => 2,
    }
}
