//! Catalog aggregation - turns the `/api/sprites` document into gallery tabs

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Sprite path the server writes when a download never produced a file.
pub const INVALID_SPRITE_MARKER: &str = "undefined";

const GENERATIONS_KEY: &str = "generations";
const REGIONAL_KEY: &str = "regional_forms";
const OTHER_KEY: &str = "other_forms";

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("catalog exposes none of generations, regional_forms or other_forms as an object")]
    InvalidShape,
}

/// One sprite record in the catalog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Item {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub number: Option<String>,
    #[serde(default)]
    pub sprite_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub generation: Option<u32>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_shiny_lock: bool,
}

impl Item {
    pub fn generation(&self) -> u32 {
        self.generation.unwrap_or(1)
    }

    /// Sprite path when it points at a real file.
    pub fn sprite_path(&self) -> Option<&str> {
        self.sprite_url.as_deref().filter(|url| is_valid_sprite(url))
    }

    pub fn is_displayable(&self) -> bool {
        self.sprite_path().is_some()
    }
}

pub fn is_valid_sprite(url: &str) -> bool {
    !url.is_empty() && url != INVALID_SPRITE_MARKER
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum CategoryKind {
    Generation,
    Regional,
    Other,
}

impl CategoryKind {
    fn source_key(self) -> &'static str {
        match self {
            CategoryKind::Generation => GENERATIONS_KEY,
            CategoryKind::Regional => REGIONAL_KEY,
            CategoryKind::Other => OTHER_KEY,
        }
    }
}

/// Stable address of a tab. Labels may collide or contain each other; ids don't.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct CategoryId {
    pub kind: CategoryKind,
    pub key: String,
}

impl CategoryId {
    pub fn new(kind: CategoryKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Category {
    pub key: String,
    pub name: String,
    pub kind: CategoryKind,
    pub items: Vec<Item>,
}

impl Category {
    pub fn id(&self) -> CategoryId {
        CategoryId::new(self.kind, self.key.clone())
    }

    pub fn tab_label(&self) -> String {
        format!("{} ({})", self.name, self.items.len())
    }

    /// Items that get a cell in the grid. `items` itself is never filtered.
    pub fn visible_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.is_displayable())
    }

    pub fn visible_count(&self) -> usize {
        self.visible_items().count()
    }
}

#[derive(Deserialize)]
struct RawCategory {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sprites: Option<Vec<Value>>,
}

/// Build the ordered tab list from a catalog document.
///
/// Generations come first, sorted by numeric key, followed by regional and other
/// forms in document order. Entries without sprites are dropped.
pub fn aggregate(catalog: &Value) -> Result<Vec<Category>, CatalogError> {
    let Some(root) = catalog.as_object() else {
        return Err(CatalogError::InvalidShape);
    };

    let kinds = [
        CategoryKind::Generation,
        CategoryKind::Regional,
        CategoryKind::Other,
    ];
    let mappings: Vec<Option<&Value>> = kinds
        .iter()
        .map(|kind| root.get(kind.source_key()).filter(|value| !value.is_null()))
        .collect();

    let any_object = mappings.iter().flatten().any(|value| value.is_object());
    let any_present = mappings.iter().any(Option::is_some);
    if any_present && !any_object {
        return Err(CatalogError::InvalidShape);
    }

    let mut categories = Vec::new();
    for (kind, mapping) in kinds.into_iter().zip(mappings) {
        match mapping {
            Some(Value::Object(entries)) => {
                let mut built = categories_of(kind, entries);
                if kind == CategoryKind::Generation {
                    // Stable sort keeps non-numeric keys in document order at the end.
                    built.sort_by_key(|category| generation_order(&category.key));
                }
                categories.extend(built);
            }
            Some(other) => {
                warn!(mapping = kind.source_key(), value = %other, "ignoring non-object catalog mapping");
            }
            None => {}
        }
    }
    Ok(categories)
}

fn categories_of(kind: CategoryKind, entries: &Map<String, Value>) -> Vec<Category> {
    entries
        .iter()
        .filter_map(|(key, value)| {
            let raw = match RawCategory::deserialize(value) {
                Ok(raw) => raw,
                Err(error) => {
                    warn!(mapping = kind.source_key(), %key, %error, "skipping malformed catalog entry");
                    return None;
                }
            };
            let items: Vec<Item> = raw
                .sprites
                .unwrap_or_default()
                .into_iter()
                .filter_map(|sprite| match Item::deserialize(&sprite) {
                    Ok(item) => Some(item),
                    Err(error) => {
                        warn!(%key, %error, "skipping malformed sprite record");
                        None
                    }
                })
                .collect();
            if items.is_empty() {
                return None;
            }
            Some(Category {
                key: key.clone(),
                name: raw.name.unwrap_or_else(|| key.clone()),
                kind,
                items,
            })
        })
        .collect()
}

fn generation_order(key: &str) -> (bool, u64) {
    match key.trim().parse::<u64>() {
        Ok(number) => (false, number),
        Err(_) => (true, 0),
    }
}

/// Tabs plus the active selection. Only `load` and `select` move the selection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Gallery {
    categories: Vec<Category>,
    selected: Option<CategoryId>,
}

impl Gallery {
    /// Replace the tabs. The first generation becomes active only if nothing is yet.
    pub fn load(&mut self, categories: Vec<Category>) {
        self.categories = categories;
        if self.selected.is_none() {
            self.selected = self
                .categories
                .iter()
                .find(|category| category.kind == CategoryKind::Generation)
                .map(Category::id);
        }
    }

    pub fn select(&mut self, id: CategoryId) {
        self.selected = Some(id);
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn selected_id(&self) -> Option<&CategoryId> {
        self.selected.as_ref()
    }

    pub fn current(&self) -> Option<&Category> {
        let id = self.selected.as_ref()?;
        self.categories
            .iter()
            .find(|category| category.kind == id.kind && category.key == id.key)
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected.as_ref()?;
        self.categories
            .iter()
            .position(|category| category.kind == id.kind && category.key == id.key)
    }

    /// Id of the tab `delta` steps away from the active one, wrapping around.
    pub fn neighbour(&self, delta: isize) -> Option<CategoryId> {
        if self.categories.is_empty() {
            return None;
        }
        let len = self.categories.len() as isize;
        let current = self.selected_index().map(|idx| idx as isize).unwrap_or(-1);
        let next = if current < 0 && delta < 0 {
            len - 1
        } else {
            (current + delta).rem_euclid(len)
        };
        self.categories.get(next as usize).map(Category::id)
    }
}

// The server is backed by SQLite, so flags arrive as 0/1 and numbers sometimes as text.

pub(crate) fn flag_value(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => matches!(text.as_str(), "1" | "true"),
        _ => false,
    }
}

pub(crate) fn number_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub(crate) fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(flag_value(&Value::deserialize(deserializer)?))
}

pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_value(&Value::deserialize(deserializer)?))
}

pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_value(&Value::deserialize(deserializer)?))
}
