//! Read-only music catalogue snapshot consumed by the simulator.
//!
//! The catalogue is supplied by the host's data-loading service with relation
//! counts already computed. It is injected into `BubbleSimulator` at
//! construction and replaced wholesale through `update_music_database`.

use crate::constants::*;
use crate::error::UnknownName;
use rand::prelude::*;
use smallvec::SmallVec;
use std::str::FromStr;

/// Closed set of things a bubble can represent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    Song,
    Lyricist,
    Composer,
    Arranger,
    Tag,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Song,
        EntityType::Lyricist,
        EntityType::Composer,
        EntityType::Arranger,
        EntityType::Tag,
    ];

    /// Coarse grouping used by the scheduler's round-robin.
    #[inline]
    pub fn kind(self) -> ContentKind {
        match self {
            EntityType::Song => ContentKind::Song,
            EntityType::Lyricist | EntityType::Composer | EntityType::Arranger => {
                ContentKind::Person
            }
            EntityType::Tag => ContentKind::Tag,
        }
    }

    #[inline]
    pub fn base_color(self) -> [f32; 3] {
        match self {
            EntityType::Song => SONG_COLOR,
            EntityType::Lyricist => LYRICIST_COLOR,
            EntityType::Composer => COMPOSER_COLOR,
            EntityType::Arranger => ARRANGER_COLOR,
            EntityType::Tag => TAG_COLOR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Song => "song",
            EntityType::Lyricist => "lyricist",
            EntityType::Composer => "composer",
            EntityType::Arranger => "arranger",
            EntityType::Tag => "tag",
        }
    }
}

impl FromStr for EntityType {
    type Err = UnknownName;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "song" => Ok(EntityType::Song),
            "lyricist" => Ok(EntityType::Lyricist),
            "composer" => Ok(EntityType::Composer),
            "arranger" => Ok(EntityType::Arranger),
            "tag" => Ok(EntityType::Tag),
            _ => Err(UnknownName::new("entity type", s)),
        }
    }
}

/// Song / person / tag, the three catalogue tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Song,
    Person,
    Tag,
}

impl ContentKind {
    pub const ROUND_ROBIN: [ContentKind; 3] =
        [ContentKind::Song, ContentKind::Person, ContentKind::Tag];
}

/// A song or tag row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogueEntry {
    pub id: String,
    pub name: String,
    pub related_count: u32,
}

impl CatalogueEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, related_count: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            related_count,
        }
    }
}

/// A contributor. `roles` is a subset of lyricist/composer/arranger; the first
/// role is the one a bubble shows when the person is picked by the scheduler.
/// A person credited with no role shows as a lyricist everywhere.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub roles: SmallVec<[EntityType; 3]>,
    pub related_count: u32,
}

impl Person {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        roles: &[EntityType],
        related_count: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            roles: roles.iter().copied().filter(|r| r.kind() == ContentKind::Person).collect(),
            related_count,
        }
    }

    #[inline]
    pub fn has_role(&self, role: EntityType) -> bool {
        if self.roles.is_empty() {
            role == self.primary_role()
        } else {
            self.roles.contains(&role)
        }
    }

    #[inline]
    pub fn primary_role(&self) -> EntityType {
        self.roles.first().copied().unwrap_or(EntityType::Lyricist)
    }
}

/// One catalogue item resolved for a specific bubble type.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogueItem {
    pub id: String,
    pub name: String,
    pub entity_type: EntityType,
    pub related_count: u32,
    pub roles: SmallVec<[EntityType; 3]>,
}

#[derive(Clone, Debug, Default)]
pub struct Catalogue {
    pub songs: Vec<CatalogueEntry>,
    pub persons: Vec<Person>,
    pub tags: Vec<CatalogueEntry>,
}

impl Catalogue {
    pub fn new(songs: Vec<CatalogueEntry>, persons: Vec<Person>, tags: Vec<CatalogueEntry>) -> Self {
        Self {
            songs,
            persons,
            tags,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty() && self.persons.is_empty() && self.tags.is_empty()
    }

    /// Number of distinct items across the three tables.
    pub fn len(&self) -> usize {
        self.songs.len() + self.persons.len() + self.tags.len()
    }

    /// Number of instances a bubble of `entity_type` could show.
    pub fn count_of(&self, entity_type: EntityType) -> usize {
        match entity_type {
            EntityType::Song => self.songs.len(),
            EntityType::Tag => self.tags.len(),
            role => self.persons.iter().filter(|p| p.has_role(role)).count(),
        }
    }

    /// Pick a uniformly random instance of `entity_type`, if any exist.
    pub fn random_instance<R: Rng + ?Sized>(
        &self,
        entity_type: EntityType,
        rng: &mut R,
    ) -> Option<CatalogueItem> {
        match entity_type {
            EntityType::Song => self
                .songs
                .choose(rng)
                .map(|e| Self::entry_item(e, EntityType::Song)),
            EntityType::Tag => self
                .tags
                .choose(rng)
                .map(|e| Self::entry_item(e, EntityType::Tag)),
            role => {
                let n = self.count_of(role);
                if n == 0 {
                    return None;
                }
                let pick = rng.gen_range(0..n);
                self.persons
                    .iter()
                    .filter(|p| p.has_role(role))
                    .nth(pick)
                    .map(|p| Self::person_item(p, role))
            }
        }
    }

    /// Resolve a content id back to the item a bubble of its primary type shows.
    pub fn find(&self, content_id: &str) -> Option<CatalogueItem> {
        if let Some(e) = self.songs.iter().find(|e| e.id == content_id) {
            return Some(Self::entry_item(e, EntityType::Song));
        }
        if let Some(p) = self.persons.iter().find(|p| p.id == content_id) {
            return Some(Self::person_item(p, p.primary_role()));
        }
        self.tags
            .iter()
            .find(|e| e.id == content_id)
            .map(|e| Self::entry_item(e, EntityType::Tag))
    }

    fn entry_item(e: &CatalogueEntry, entity_type: EntityType) -> CatalogueItem {
        CatalogueItem {
            id: e.id.clone(),
            name: e.name.clone(),
            entity_type,
            related_count: e.related_count,
            roles: SmallVec::new(),
        }
    }

    fn person_item(p: &Person, role: EntityType) -> CatalogueItem {
        CatalogueItem {
            id: p.id.clone(),
            name: p.name.clone(),
            entity_type: role,
            related_count: p.related_count,
            roles: p.roles.clone(),
        }
    }
}
