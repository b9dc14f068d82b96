//! Dashboard backend client

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{
    flag_value, is_valid_sprite, lenient_flag, lenient_number, lenient_text, number_value,
    text_value,
};
use crate::modal::{AcquisitionKind, MissingEntry, MissingReport};
use crate::state::{
    DashboardStats, FormEntry, GameEntry, GenerationStat, HuntMethod, LocationEntry,
    PokemonDetails, RecentPokemon,
};

const STATS_PATH: &str = "/api/stats";
const CATALOG_PATH: &str = "/api/sprites";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Server(String),

    #[error("{kind} acquisition for {name} is not yet available")]
    NotYetAvailable { kind: &'static str, name: String },
}

impl ApiError {
    fn decode(endpoint: &str, source: serde_json::Error) -> Self {
        ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pokedash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_stats(&self) -> Result<DashboardStats, ApiError> {
        let value = self.get_json(STATS_PATH).await?;
        parse_stats(value)
    }

    /// Raw catalog document. Shape checks happen in `catalog::aggregate`.
    pub async fn fetch_catalog(&self) -> Result<Value, ApiError> {
        self.get_json(CATALOG_PATH).await
    }

    pub async fn fetch_details(
        &self,
        name: &str,
        generation: u32,
    ) -> Result<PokemonDetails, ApiError> {
        let value = self.get_json(&details_path(name, generation)).await?;
        parse_details(value, generation)
    }

    pub async fn fetch_missing(&self, generation: u32) -> Result<MissingReport, ApiError> {
        let value = self.get_json(&missing_path(generation)).await?;
        parse_missing(value, generation)
    }

    /// On-demand sprite/details acquisition. The backend has no pipeline for it yet.
    pub async fn request_acquisition(
        &self,
        kind: AcquisitionKind,
        name: &str,
        generation: u32,
    ) -> Result<(), ApiError> {
        debug!(kind = kind.label(), name, generation, "acquisition requested");
        Err(ApiError::NotYetAvailable {
            kind: kind.label(),
            name: name.to_string(),
        })
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Network {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Network {
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            let message = error_message(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "request failed".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&body).map_err(|source| ApiError::decode(path, source))
    }
}

pub fn details_path(name: &str, generation: u32) -> String {
    format!(
        "/api/pokemon/details/{}/{generation}",
        urlencoding::encode(name)
    )
}

pub fn missing_path(generation: u32) -> String {
    format!("/api/missing/{generation}")
}

/// Image location for a sprite path stored by the server.
pub fn asset_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/assets/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Full page of a single Pokemon, outside the dashboard.
pub fn item_page_url(base_url: &str, name: &str) -> String {
    format!(
        "{}/poke/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(name)
    )
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    server_error(&value)
}

/// `{"error": ..., "message": ...}` bodies, which the server also sends with 200.
fn server_error(value: &Value) -> Option<String> {
    let error = value.get("error")?.as_str()?;
    match value.get("message").and_then(Value::as_str) {
        Some(message) if !message.is_empty() => Some(format!("{error}: {message}")),
        _ => Some(error.to_string()),
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct StatsResponse {
    total_pokemon: u32,
    sprites_downloaded: u32,
    download_percentage: f64,
    total_forms: u32,
    generation_stats: Vec<Vec<Value>>,
    top_forms: Vec<Vec<Value>>,
    recent_pokemon: Vec<Vec<Value>>,
}

pub fn parse_stats(value: Value) -> Result<DashboardStats, ApiError> {
    if let Some(message) = server_error(&value) {
        return Err(ApiError::Server(message));
    }
    let response: StatsResponse = from_value(STATS_PATH, value)?;

    let generation_stats = response
        .generation_stats
        .iter()
        .filter_map(|row| {
            Some(GenerationStat {
                generation: number_value(row.first()?)?,
                total: row.get(1).and_then(number_value).unwrap_or(0),
                with_sprites: row.get(2).and_then(number_value),
            })
        })
        .collect();
    let top_forms = response
        .top_forms
        .iter()
        .filter_map(|row| {
            Some(FormEntry {
                name: text_value(row.first()?)?,
                generation: row.get(1).and_then(number_value),
                sprite_path: row.get(2).and_then(text_value),
            })
        })
        .collect();
    let recent_pokemon = response
        .recent_pokemon
        .iter()
        .filter_map(|row| {
            Some(RecentPokemon {
                name: text_value(row.first()?)?,
                generation: row.get(1).and_then(number_value)?,
                sprite_path: row.get(2).and_then(text_value),
            })
        })
        .collect();

    Ok(DashboardStats {
        total_pokemon: response.total_pokemon,
        sprites_downloaded: response.sprites_downloaded,
        download_percentage: response.download_percentage,
        total_forms: response.total_forms,
        generation_stats,
        top_forms,
        recent_pokemon,
    })
}

#[derive(Deserialize)]
struct PokemonResponse {
    name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    number: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    generation: Option<u32>,
    #[serde(default, alias = "sprite_url")]
    sprite_path: Option<String>,
    #[serde(default)]
    high_quality_image: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    is_shiny_lock: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    forms: Vec<Option<String>>,
}

#[derive(Deserialize)]
struct GameResponse {
    name: String,
    #[serde(default, deserialize_with = "lenient_number")]
    generation: Option<u32>,
}

#[derive(Deserialize)]
struct HuntMethodResponse {
    name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    category: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    description: Option<String>,
    #[serde(default, alias = "game_name", deserialize_with = "lenient_text")]
    game: Option<String>,
    #[serde(default, alias = "location_name", deserialize_with = "lenient_text")]
    location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    probability: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    conditions: Option<String>,
}

#[derive(Deserialize)]
struct LocationResponse {
    name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    region: Option<String>,
    #[serde(default, alias = "game_name", deserialize_with = "lenient_text")]
    game: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    method: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    rarity: Option<String>,
}

/// `{ pokemon: {...}, games, hunt_methods, locations }`
#[derive(Deserialize)]
struct NestedDetailsResponse {
    pokemon: PokemonResponse,
    #[serde(default)]
    games: Vec<GameResponse>,
    #[serde(default)]
    hunt_methods: Vec<HuntMethodResponse>,
    #[serde(default)]
    locations: Vec<LocationResponse>,
}

/// Pokemon columns at the top level, methods split into general and specific.
#[derive(Deserialize)]
struct FlatDetailsResponse {
    #[serde(flatten)]
    pokemon: PokemonResponse,
    #[serde(default)]
    games: Vec<GameResponse>,
    #[serde(default)]
    general_methods: Vec<HuntMethodResponse>,
    #[serde(default)]
    specific_methods: Vec<HuntMethodResponse>,
    #[serde(default)]
    locations: Vec<LocationResponse>,
}

pub fn parse_details(value: Value, generation_hint: u32) -> Result<PokemonDetails, ApiError> {
    if let Some(message) = server_error(&value) {
        return Err(ApiError::Server(message));
    }
    let endpoint = "/api/pokemon/details";
    let (pokemon, games, hunt_methods, locations) =
        if value.get("pokemon").is_some_and(Value::is_object) {
            let nested: NestedDetailsResponse = from_value(endpoint, value)?;
            (
                nested.pokemon,
                nested.games,
                nested.hunt_methods,
                nested.locations,
            )
        } else {
            let flat: FlatDetailsResponse = from_value(endpoint, value)?;
            let mut methods = flat.general_methods;
            methods.extend(flat.specific_methods);
            (flat.pokemon, flat.games, methods, flat.locations)
        };

    Ok(PokemonDetails {
        name: pokemon.name,
        number: pokemon.number,
        generation: pokemon.generation.unwrap_or(generation_hint),
        sprite_path: pokemon.sprite_path.filter(|path| is_valid_sprite(path)),
        high_quality_image: pokemon
            .high_quality_image
            .filter(|path| is_valid_sprite(path)),
        is_shiny_lock: pokemon.is_shiny_lock,
        description: pokemon.description.filter(|text| !text.trim().is_empty()),
        forms: pokemon.forms.into_iter().flatten().collect(),
        games: games
            .into_iter()
            .map(|game| GameEntry {
                name: game.name,
                generation: game.generation,
            })
            .collect(),
        hunt_methods: hunt_methods
            .into_iter()
            .map(|method| HuntMethod {
                name: method.name,
                category: method.category,
                description: method.description,
                game: method.game,
                location: method.location,
                probability: method.probability,
                conditions: method.conditions,
            })
            .collect(),
        locations: locations
            .into_iter()
            .map(|location| LocationEntry {
                name: location.name,
                region: location.region,
                game: location.game,
                method: location.method,
                rarity: location.rarity,
            })
            .collect(),
    })
}

/// Accepts a bare list of flagged entries or the server's report object.
pub fn parse_missing(value: Value, generation: u32) -> Result<MissingReport, ApiError> {
    if let Some(message) = server_error(&value) {
        return Err(ApiError::Server(message));
    }
    match value {
        Value::Array(rows) => Ok(MissingReport {
            generation,
            entries: rows.iter().filter_map(|row| missing_entry(row, None)).collect(),
            total_pokemon: None,
        }),
        Value::Object(report) => {
            let rows = report
                .get("missing_pokemon")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            Ok(MissingReport {
                generation: report
                    .get("generation")
                    .and_then(number_value)
                    .unwrap_or(generation),
                // Listed entries are there because their sprite file is missing.
                entries: rows
                    .iter()
                    .filter_map(|row| missing_entry(row, Some(false)))
                    .collect(),
                total_pokemon: report.get("total_pokemon").and_then(number_value),
            })
        }
        other => Err(ApiError::Server(format!(
            "unexpected missing report for generation {generation}: {other}"
        ))),
    }
}

fn missing_entry(row: &Value, default_has_sprite: Option<bool>) -> Option<MissingEntry> {
    let name = row.get("name").and_then(text_value)?;
    let has_sprite = match row.get("has_sprite") {
        Some(flag) => flag_value(flag),
        None => default_has_sprite.unwrap_or_else(|| {
            row.get("sprite_url")
                .and_then(Value::as_str)
                .is_some_and(is_valid_sprite)
        }),
    };
    let has_details = row.get("has_details").map(flag_value).unwrap_or(true);
    Some(MissingEntry {
        name,
        number: row.get("number").and_then(text_value),
        has_sprite,
        has_details,
    })
}

fn from_value<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|source| ApiError::decode(endpoint, source))
}
