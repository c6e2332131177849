//! Theme loading.
//!
//! A theme is one CSS file; its file stem is the theme id. The store reads a
//! directory on first use and serves themes from an immutable map. Reloading
//! builds a new map and swaps it in whole.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Id of the fallback theme.
pub const DEFAULT_THEME_ID: &str = "default";

/// Environment variable naming the theme directory for [`ThemeStore::from_env`].
pub const THEMES_DIR_ENV: &str = "INKPRESS_THEMES_DIR";

/// Stylesheet used when the directory has no `default.css`.
pub const BUILTIN_DEFAULT_CSS: &str = include_str!("../../themes/default.css");

/// Human-readable names for known theme ids.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("default", "Default"),
    ("purple", "Purple"),
    ("lapis", "Lapis"),
    ("rainbow", "Rainbow"),
    ("maize", "Maize"),
    ("orangeheart", "Orange Heart"),
    ("phycat", "Phycat"),
    ("pie", "Pie"),
    ("juejin_default", "Juejin"),
    ("medium_default", "Medium"),
    ("toutiao_default", "Toutiao"),
    ("zhihu_default", "Zhihu"),
];

/// Display name for a theme id, falling back to the id itself.
pub fn display_name(id: &str) -> &str {
    DISPLAY_NAMES
        .iter()
        .find(|(known, _)| *known == id)
        .map_or(id, |&(_, name)| name)
}

/// A named stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub id: String,
    pub display_name: String,
    pub css_source: String,
}

impl Theme {
    /// Create a theme, taking the display name from the known-name table.
    pub fn new(id: impl Into<String>, css_source: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: display_name(&id).to_string(),
            id,
            css_source: css_source.into(),
        }
    }

    /// The built-in `default` theme.
    pub fn builtin_default() -> Self {
        Self::new(DEFAULT_THEME_ID, BUILTIN_DEFAULT_CSS)
    }

    pub fn info(&self) -> ThemeInfo {
        ThemeInfo {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Listing entry for a theme.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThemeInfo {
    pub id: String,
    pub display_name: String,
}

/// Loaded themes keyed by id.
pub type ThemeMap = BTreeMap<String, Arc<Theme>>;

/// Lazily loaded, shareable theme cache.
#[derive(Debug)]
pub struct ThemeStore {
    dir: Option<PathBuf>,
    themes: RwLock<Option<Arc<ThemeMap>>>,
}

impl ThemeStore {
    /// Create an unloaded store over `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            themes: RwLock::new(None),
        }
    }

    /// Create a store over `$INKPRESS_THEMES_DIR`, or the bundled `themes/`
    /// directory when the variable is unset.
    pub fn from_env() -> Self {
        match std::env::var_os(THEMES_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Self::new(dir),
            _ => Self::new(concat!(env!("CARGO_MANIFEST_DIR"), "/themes")),
        }
    }

    /// Create a loaded store from in-memory themes.
    ///
    /// The built-in default is added unless one of `themes` is `default`.
    pub fn from_themes(themes: impl IntoIterator<Item = Theme>) -> Self {
        let map = themes
            .into_iter()
            .map(|theme| (theme.id.clone(), Arc::new(theme)))
            .collect();
        Self {
            dir: None,
            themes: RwLock::new(Some(Arc::new(with_default(map)))),
        }
    }

    /// The directory themes are read from, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Load the themes unless already loaded.
    ///
    /// A missing or unreadable directory is logged and leaves the store with
    /// only the built-in default.
    pub fn load(&self) {
        if self.loaded().is_some() {
            return;
        }
        let map = Arc::new(self.scan_lenient());
        let mut guard = self.themes.write().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(map);
        }
    }

    /// Load the themes, reporting a directory that cannot be read.
    ///
    /// Returns the number of themes available afterwards. On error the store
    /// is left untouched.
    pub fn try_load(&self) -> Result<usize> {
        if let Some(map) = self.loaded() {
            return Ok(map.len());
        }
        let map = match &self.dir {
            Some(dir) => with_default(read_theme_dir(dir)?),
            None => with_default(ThemeMap::new()),
        };
        let count = map.len();
        self.publish(map);
        Ok(count)
    }

    /// Rebuild the map from the directory and swap it in.
    ///
    /// Readers holding themes from the previous map keep them. Returns the
    /// number of themes now loaded. Stores built with
    /// [`from_themes`](Self::from_themes) have no directory and keep their
    /// themes.
    pub fn reload(&self) -> usize {
        if self.dir.is_none() {
            return self.snapshot().len();
        }
        let map = self.scan_lenient();
        let count = map.len();
        self.publish(map);
        count
    }

    /// Theme by id, falling back to `default` for unknown ids.
    pub fn get(&self, theme_id: &str) -> Arc<Theme> {
        let themes = self.snapshot();
        if let Some(theme) = themes.get(theme_id) {
            return Arc::clone(theme);
        }
        debug!(theme_id, "unknown theme; using default");
        themes
            .get(DEFAULT_THEME_ID)
            .cloned()
            .unwrap_or_else(|| Arc::new(Theme::builtin_default()))
    }

    /// Check whether a theme with this id is loaded.
    pub fn contains(&self, theme_id: &str) -> bool {
        self.snapshot().contains_key(theme_id)
    }

    /// All themes, sorted by id.
    pub fn list(&self) -> Vec<ThemeInfo> {
        self.snapshot().values().map(|theme| theme.info()).collect()
    }

    /// The current map, loading it first if needed.
    pub fn snapshot(&self) -> Arc<ThemeMap> {
        if let Some(map) = self.loaded() {
            return map;
        }
        self.load();
        self.loaded()
            .unwrap_or_else(|| Arc::new(with_default(ThemeMap::new())))
    }

    fn loaded(&self) -> Option<Arc<ThemeMap>> {
        self.themes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, map: ThemeMap) {
        let map = Arc::new(map);
        *self.themes.write().unwrap_or_else(PoisonError::into_inner) = Some(map);
    }

    fn scan_lenient(&self) -> ThemeMap {
        let Some(dir) = &self.dir else {
            return with_default(ThemeMap::new());
        };
        match read_theme_dir(dir) {
            Ok(map) => {
                info!(dir = %dir.display(), count = map.len(), "loaded themes");
                with_default(map)
            }
            Err(err) => {
                warn!(error = %err, "using built-in default theme only");
                with_default(ThemeMap::new())
            }
        }
    }
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Read every `*.css` file of `dir` into a map.
///
/// Files that cannot be read as UTF-8 text are skipped with a warning.
pub fn read_theme_dir(dir: &Path) -> Result<ThemeMap> {
    let entries = fs::read_dir(dir).map_err(|source| Error::ThemeDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut map = ThemeMap::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !path.is_file() || path.extension().and_then(OsStr::to_str) != Some("css") {
            continue;
        }
        let Some(id) = path.file_stem().and_then(OsStr::to_str) else {
            warn!(path = %path.display(), "skipping theme with non-UTF-8 name");
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(css) => {
                map.insert(id.to_string(), Arc::new(Theme::new(id, css)));
            }
            Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable theme"),
        }
    }
    Ok(map)
}

fn with_default(mut map: ThemeMap) -> ThemeMap {
    map.entry(DEFAULT_THEME_ID.to_string())
        .or_insert_with(|| Arc::new(Theme::builtin_default()));
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(display_name("orangeheart"), "Orange Heart");
        assert_eq!(display_name("my-theme"), "my-theme");
        assert_eq!(Theme::new("purple", "").display_name, "Purple");
    }

    #[test]
    fn test_from_themes_adds_default() {
        let store = ThemeStore::from_themes([Theme::new("ink", "p { color: #111 }")]);
        let ids: Vec<_> = store.list().into_iter().map(|info| info.id).collect();
        assert_eq!(ids, ["default", "ink"]);
        assert_eq!(store.get("default").css_source, BUILTIN_DEFAULT_CSS);
    }

    #[test]
    fn test_custom_default_kept() {
        let store = ThemeStore::from_themes([Theme::new("default", "p {}")]);
        assert_eq!(store.get("missing").css_source, "p {}");
    }

    #[test]
    fn test_unknown_falls_back() {
        let store = ThemeStore::from_themes([Theme::new("ink", "a {}")]);
        assert!(Arc::ptr_eq(&store.get("nonexistent"), &store.get("default")));
        assert_eq!(store.get("ink").css_source, "a {}");
    }

    #[test]
    fn test_missing_directory_serves_builtin() {
        let store = ThemeStore::new("/nonexistent/inkpress/themes");
        assert_eq!(store.get("anything").id, DEFAULT_THEME_ID);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_try_load_reports_missing_directory() {
        let store = ThemeStore::new("/nonexistent/inkpress/themes");
        assert!(matches!(store.try_load(), Err(Error::ThemeDir { .. })));
    }

    #[test]
    fn test_bundled_themes() {
        let store = ThemeStore::new(concat!(env!("CARGO_MANIFEST_DIR"), "/themes"));
        assert!(store.contains("default"));
        assert!(store.contains("purple"));
        assert!(store.contains("lapis"));
    }

    #[test]
    fn test_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ThemeStore>();
    }
}
