// src/modules/catalog.rs
//! Movie catalog read from a JSON file.
//!
//! ```json
//! { "movies": [ { "id": "tt0083658", "title": "Blade Runner", "year": 1982,
//!                 "genres": ["Sci-Fi"], "plot": "...", "rating": 8.1,
//!                 "poster": "https://...", "fanart": "https://..." } ] }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::Module;
use crate::browser::{Browser, Folder, FolderClass, ItemClass, PopulateFn, StyleId};
use crate::error::Result;
use crate::images::ImageRef;

const ROOT_URL: &str = "movies://";
const ALL_URL: &str = "movies://all";
const GENRES_URL: &str = "movies://genres";
const DECADES_URL: &str = "movies://decades";
const GENRE_PREFIX: &str = "movies://genre/";
const DECADE_PREFIX: &str = "movies://decade/";
const MOVIE_STYLES: [StyleId; 3] = [StyleId::PosterGrid, StyleId::List, StyleId::CoverGrid];
const MENU_STYLES: [StyleId; 1] = [StyleId::List];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub fanart: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    movies: Vec<Movie>,
}

#[derive(Debug, Default)]
pub struct Catalog {
    movies: Vec<Movie>,
}

impl Catalog {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        let movies = file
            .movies
            .into_iter()
            .filter(|m| !m.id.trim().is_empty())
            .unique_by(|m| m.id.clone())
            .collect();
        Ok(Self { movies })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&raw)?;
        info!("Loaded {} movies from {}", catalog.movies.len(), path.display());
        Ok(catalog)
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Genres with their movie counts, alphabetically.
    pub fn genres(&self) -> Vec<(String, usize)> {
        self.movies
            .iter()
            .flat_map(|m| m.genres.iter().map(|g| g.trim().to_string()))
            .filter(|g| !g.is_empty())
            .sorted()
            .dedup_with_count()
            .map(|(count, genre)| (genre, count))
            .collect()
    }

    /// Decades (1980, 1990, ...) with their movie counts, newest first.
    pub fn decades(&self) -> Vec<(i32, usize)> {
        self.movies
            .iter()
            .filter_map(|m| m.year)
            .map(|y| y - y.rem_euclid(10))
            .sorted_by(|a, b| b.cmp(a))
            .dedup_with_count()
            .map(|(count, decade)| (decade, count))
            .collect()
    }

    fn by_title(&self) -> Vec<&Movie> {
        self.movies
            .iter()
            .sorted_by_key(|m| m.title.to_lowercase())
            .collect()
    }

    fn in_genre(&self, genre: &str) -> Vec<&Movie> {
        self.by_title()
            .into_iter()
            .filter(|m| m.genres.iter().any(|g| g.trim() == genre))
            .collect()
    }

    fn in_decade(&self, decade: i32) -> Vec<&Movie> {
        self.movies
            .iter()
            .filter(|m| m.year.is_some_and(|y| y - y.rem_euclid(10) == decade))
            .sorted_by_key(|m| (m.year, m.title.to_lowercase()))
            .collect()
    }
}

fn initial(title: &str) -> String {
    title
        .chars()
        .next()
        .filter(|c| c.is_alphabetic())
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "#".to_string())
}

fn add_movies<'a>(browser: &mut Browser, movies: impl IntoIterator<Item = &'a Movie>, grouped: bool) {
    let class: Rc<dyn ItemClass> = Rc::new(MovieItem);
    let add = |browser: &mut Browser, movie: &Movie| {
        let data = serde_json::to_value(movie).unwrap_or(Value::Null);
        browser.item_add(Rc::clone(&class), &format!("movie://{}", movie.id), data);
    };
    if grouped {
        for (letter, chunk) in &movies.into_iter().chunk_by(|m| initial(&m.title)) {
            browser.group_add(&letter, None);
            for movie in chunk {
                add(browser, movie);
            }
        }
    } else {
        for movie in movies {
            add(browser, movie);
        }
    }
}

pub struct CatalogModule {
    path: PathBuf,
}

impl CatalogModule {
    pub fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(crate::config::resolve_relative_path(path)),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Module for CatalogModule {
    fn name(&self) -> &str {
        "movies"
    }

    fn label(&self) -> &str {
        "Movies"
    }

    fn icon(&self) -> &str {
        "icon/movie"
    }

    fn open(&self, browser: &mut Browser) {
        let catalog = match Catalog::load(&self.path) {
            Ok(catalog) => Rc::new(catalog),
            Err(e) => {
                warn!("catalog {} unreadable: {e}", self.path.display());
                browser.runtime().dialogs().info(
                    "Movies",
                    &format!("Cannot read the movie catalog {}: {e}", self.path.display()),
                );
                return;
            }
        };
        let menu = Rc::clone(&catalog);
        let populate: PopulateFn = Rc::new(move |browser: &mut Browser, _url: &str, _args: &[Value]| {
            let folder: Rc<dyn ItemClass> = Rc::new(Folder(CatalogFolder(Rc::clone(&menu))));
            let total = menu.movies().len();
            browser.item_add(Rc::clone(&folder), ALL_URL, folder_data("All movies", Some(total)));
            browser.item_add(Rc::clone(&folder), GENRES_URL, folder_data("By genre", None));
            browser.item_add(folder, DECADES_URL, folder_data("By decade", None));
        });
        browser.page_add(ROOT_URL, "Movies", &MENU_STYLES, populate, vec![]);
    }
}

/// User data of a navigation row: its label and how many movies it leads to.
fn folder_data(label: &str, count: Option<usize>) -> Value {
    json!({ "label": label, "count": count })
}

/// Navigation rows of the catalog; the label travels in the user data.
struct CatalogFolder(Rc<Catalog>);

impl CatalogFolder {
    fn populate(&self) -> PopulateFn {
        let catalog = Rc::clone(&self.0);
        Rc::new(move |browser: &mut Browser, url: &str, _args: &[Value]| {
            let folder: Rc<dyn ItemClass> = Rc::new(Folder(CatalogFolder(Rc::clone(&catalog))));
            match url {
                ALL_URL => add_movies(browser, catalog.by_title(), true),
                GENRES_URL => {
                    for (genre, count) in catalog.genres() {
                        browser.item_add(
                            Rc::clone(&folder),
                            &format!("{GENRE_PREFIX}{}", urlencoding::encode(&genre)),
                            folder_data(&genre, Some(count)),
                        );
                    }
                }
                DECADES_URL => {
                    for (decade, count) in catalog.decades() {
                        browser.item_add(
                            Rc::clone(&folder),
                            &format!("{DECADE_PREFIX}{decade}"),
                            folder_data(&format!("{decade}s"), Some(count)),
                        );
                    }
                }
                _ => {
                    if let Some(genre) = url.strip_prefix(GENRE_PREFIX) {
                        let genre = urlencoding::decode(genre)
                            .map(|g| g.into_owned())
                            .unwrap_or_else(|_| genre.to_string());
                        add_movies(browser, catalog.in_genre(&genre), true);
                    } else if let Some(decade) = url
                        .strip_prefix(DECADE_PREFIX)
                        .and_then(|d| d.parse::<i32>().ok())
                    {
                        add_movies(browser, catalog.in_decade(decade), false);
                    } else {
                        warn!("unknown catalog page {url}");
                    }
                }
            }
        })
    }
}

impl FolderClass for CatalogFolder {
    fn item_selected(&self, browser: &mut Browser, url: &str, data: &Value) {
        let title = self
            .label_get(url, data)
            .unwrap_or_else(|| crate::browser::item::folder_label(url));
        let styles: &[StyleId] = if url == GENRES_URL || url == DECADES_URL {
            &MENU_STYLES
        } else {
            &MOVIE_STYLES
        };
        browser.page_add(url, &title, styles, self.populate(), vec![]);
    }

    fn label_get(&self, url: &str, data: &Value) -> Option<String> {
        data["label"]
            .as_str()
            .map(str::to_string)
            .or_else(|| Some(crate::browser::item::folder_label(url)))
    }

    fn label_end_get(&self, _url: &str, data: &Value) -> Option<String> {
        data["count"].as_u64().map(|n| n.to_string())
    }
}

struct MovieItem;

impl MovieItem {
    fn movie(data: &Value) -> Option<Movie> {
        serde_json::from_value(data.clone()).ok()
    }
}

impl ItemClass for MovieItem {
    fn item_selected(&self, browser: &mut Browser, _url: &str, data: &Value) {
        let Some(movie) = Self::movie(data) else {
            return;
        };
        let text = movie
            .plot
            .clone()
            .unwrap_or_else(|| "No description available.".to_string());
        browser.runtime().dialogs().info(&movie.title, &text);
    }

    fn label_get(&self, url: &str, data: &Value) -> Option<String> {
        data["title"]
            .as_str()
            .map(str::to_string)
            .or_else(|| Some(url.to_string()))
    }

    fn label_end_get(&self, _url: &str, data: &Value) -> Option<String> {
        data["year"].as_i64().map(|y| y.to_string())
    }

    fn icon_end_get(&self, _url: &str, data: &Value) -> Option<String> {
        data["rating"]
            .as_f64()
            .filter(|r| *r >= 8.0)
            .map(|_| "icon/star".to_string())
    }

    fn info_get(&self, _url: &str, data: &Value) -> Option<String> {
        let movie = Self::movie(data)?;
        let mut info = format!("<b>{}</b>", movie.title);
        if let Some(year) = movie.year {
            info.push_str(&format!(" ({year})"));
        }
        if !movie.genres.is_empty() {
            info.push_str(&format!("<br><i>{}</i>", movie.genres.join(", ")));
        }
        if let Some(rating) = movie.rating {
            info.push_str(&format!("<br>Rating: {rating:.1}"));
        }
        if let Some(plot) = &movie.plot {
            info.push_str(&format!("<br><br>{plot}"));
        }
        Some(info)
    }

    fn poster_get(&self, _url: &str, data: &Value) -> ImageRef {
        data["poster"]
            .as_str()
            .map_or(ImageRef::None, ImageRef::from_str)
    }

    fn cover_get(&self, url: &str, data: &Value) -> ImageRef {
        self.poster_get(url, data)
    }

    fn fanart_get(&self, _url: &str, data: &Value) -> ImageRef {
        data["fanart"]
            .as_str()
            .map_or(ImageRef::None, ImageRef::from_str)
    }
}
