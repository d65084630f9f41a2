//! Cinema and film catalog

use super::client::Extractor;
use crate::models::{Cinema, CinemasResponse, Film, FilmsResponse, WorkItem};
use crate::utils::error::FetchError;
use std::collections::HashMap;
use tracing::info;

/// Cinemas (grouped by region upstream) and films currently listed
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cinemas: Vec<Cinema>,
    films: Vec<Film>,
}

impl Catalog {
    pub fn new(cinemas: CinemasResponse, films: FilmsResponse) -> Self {
        Self {
            cinemas: cinemas
                .result
                .into_iter()
                .flat_map(|region| region.cinemas)
                .collect(),
            films: films.result,
        }
    }

    /// Fetch both catalogs
    ///
    /// # Errors
    ///
    /// Propagates the first failing request
    pub async fn load(extractor: &dyn Extractor) -> Result<Self, FetchError> {
        let cinemas = extractor.get_cinemas().await?;
        let films = extractor.get_films().await?;
        let catalog = Self::new(cinemas, films);
        info!(
            cinemas = catalog.cinemas.len(),
            films = catalog.films.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Fetch cinemas only
    pub async fn load_cinemas(extractor: &dyn Extractor) -> Result<Self, FetchError> {
        let cinemas = extractor.get_cinemas().await?;
        Ok(Self::new(cinemas, FilmsResponse::default()))
    }

    pub fn cinema_ids(&self) -> Vec<String> {
        self.cinemas.iter().map(|c| c.cinema_id.clone()).collect()
    }

    pub fn film_ids(&self) -> Vec<String> {
        self.films.iter().map(|f| f.film_id.clone()).collect()
    }

    /// Display name of a cinema, if listed
    pub fn cinema_name(&self, cinema_id: &str) -> Option<&str> {
        self.cinemas
            .iter()
            .find(|c| c.cinema_id == cinema_id)
            .map(|c| c.cinema_name.as_str())
    }

    pub fn cinema_names(&self) -> HashMap<String, String> {
        self.cinemas
            .iter()
            .map(|c| (c.cinema_id.clone(), c.cinema_name.clone()))
            .collect()
    }

    /// Every (cinema, film) pair
    pub fn work_items(&self) -> Vec<WorkItem> {
        self.cinemas
            .iter()
            .flat_map(|cinema| {
                self.films
                    .iter()
                    .map(move |film| WorkItem::new(&cinema.cinema_id, &film.film_id))
            })
            .collect()
    }
}
