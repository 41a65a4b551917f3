//! Template discovery and loading from a templates directory
//!
//! Layout under the templates root:
//!
//! | Path | Content |
//! |------|---------|
//! | `<name>/template.json` or `<name>/data.json` | template config (newer name wins) |
//! | `<name>/0.png`, `<name>/1.png`, ... | frames, densely numbered from 0 |
//! | `fonts/<font>-Bold.ttf` | optional fonts for text overlays |
//!
//! Frame discovery stops at the first missing number: with `0.png`, `1.png`
//! and `3.png` present the template has two frames.

use crate::cache::{Stamp, TemplateCache};
use crate::error::{PetpetError, Result};
use crate::models::{TemplateConfig, TemplateType};
use image::RgbaImage;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Config filenames, in resolution order
pub const CONFIG_FILES: [&str; 2] = ["template.json", "data.json"];

/// Directory under the root holding fonts; never a template
pub const FONTS_DIR: &str = "fonts";

/// A loaded template: config plus its frames, in order.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub config: TemplateConfig,
    pub frames: Vec<RgbaImage>,
}

/// Summary of a template for listings and help text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateInfo {
    pub template_type: TemplateType,
    pub aliases: Vec<String>,
    pub has_text: bool,
    pub is_animated: bool,
    pub frame_count: usize,
}

/// Reads templates from a root directory.
///
/// Without a cache every load re-reads config and frames from disk. With
/// [`TemplateStore::with_cache`] loads are served from memory while the
/// template directory and config file keep their modification times.
pub struct TemplateStore {
    root: PathBuf,
    cache: Option<TemplateCache>,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache: None }
    }

    /// Enable the read-through cache.
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(TemplateCache::default());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of templates currently cached (0 without a cache)
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, TemplateCache::len)
    }

    /// Path of `<root>/fonts/<font>-Bold.ttf`.
    pub fn font_path(&self, font_name: &str) -> PathBuf {
        self.root.join(FONTS_DIR).join(format!("{}-Bold.ttf", font_name))
    }

    /// Resolve and check the directory of template `name`.
    pub fn template_dir(&self, name: &str) -> Result<PathBuf> {
        let is_plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && name != FONTS_DIR;
        if !is_plain {
            return Err(PetpetError::not_found(name, "not a valid template name"));
        }

        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Err(PetpetError::not_found(
                name,
                format!("directory '{}' does not exist", dir.display()),
            ));
        }
        Ok(dir)
    }

    /// First existing config file for `name`.
    pub fn config_path(&self, name: &str) -> Result<PathBuf> {
        let dir = self.template_dir(name)?;
        CONFIG_FILES
            .iter()
            .map(|file| dir.join(file))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                PetpetError::not_found(name, format!("no {} in '{}'", CONFIG_FILES.join(" or "), dir.display()))
            })
    }

    pub fn load_config(&self, name: &str) -> Result<TemplateConfig> {
        let path = self.config_path(name)?;
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => {
                PetpetError::invalid_config(name, format!("'{}' is not UTF-8", path.display()))
            }
            _ => PetpetError::not_found(name, format!("cannot read '{}': {}", path.display(), e)),
        })?;

        TemplateConfig::parse(&content).map_err(|detail| PetpetError::invalid_config(name, detail))
    }

    /// Count densely numbered frame files without decoding them.
    pub fn count_frames(&self, name: &str) -> Result<usize> {
        let dir = self.template_dir(name)?;
        Ok(frame_paths(&dir).len())
    }

    pub fn load_frames(&self, name: &str) -> Result<Vec<RgbaImage>> {
        let dir = self.template_dir(name)?;
        let mut frames = Vec::new();

        loop {
            let path = frame_path(&dir, frames.len());
            if !path.is_file() {
                break;
            }
            let frame = image::open(&path).map_err(|e| {
                PetpetError::invalid_config(name, format!("frame '{}' could not be decoded: {}", path.display(), e))
            })?;
            frames.push(frame.to_rgba8());
        }

        if frames.is_empty() {
            return Err(PetpetError::not_found(name, format!("no frame 0.png in '{}'", dir.display())));
        }
        debug!(template = name, frames = frames.len(), "loaded frames");
        Ok(frames)
    }

    /// Load config and frames, through the cache when enabled.
    pub fn load(&self, name: &str) -> Result<Arc<Template>> {
        self.load_with(name, || {})
    }

    /// Like [`TemplateStore::load`], calling `on_config` once the config is
    /// known to be valid and before any frame is decoded.
    pub fn load_with(&self, name: &str, on_config: impl FnOnce()) -> Result<Arc<Template>> {
        let Some(cache) = &self.cache else {
            return self.load_uncached(name, on_config).map(Arc::new);
        };

        let dir = self.template_dir(name)?;
        let stamp = Stamp::capture(&dir, &self.config_path(name)?, &frame_paths(&dir));
        if let Some(template) = cache.get(name, &stamp) {
            debug!(template = name, "template cache hit");
            on_config();
            return Ok(template);
        }

        let template = Arc::new(self.load_uncached(name, on_config)?);
        cache.insert(name, stamp, Arc::clone(&template));
        Ok(template)
    }

    fn load_uncached(&self, name: &str, on_config: impl FnOnce()) -> Result<Template> {
        let config = self.load_config(name)?;
        on_config();
        let frames = self.load_frames(name)?;
        Ok(Template { name: name.to_string(), config, frames })
    }

    /// Names of candidate template directories, sorted.
    pub fn template_names(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name != FONTS_DIR)
            .collect();
        names.sort();
        names
    }

    /// Describe every usable template. Broken templates are skipped.
    pub fn list_templates(&self) -> BTreeMap<String, TemplateInfo> {
        let mut listing = BTreeMap::new();

        for name in self.template_names() {
            let info = self.load_config(&name).and_then(|config| {
                let frame_count = self.count_frames(&name)?;
                if frame_count == 0 {
                    return Err(PetpetError::not_found(&name, "no frame 0.png"));
                }
                Ok(TemplateInfo {
                    template_type: config.template_type,
                    has_text: !config.text_specs.is_empty(),
                    aliases: config.aliases,
                    is_animated: frame_count > 1,
                    frame_count,
                })
            });

            match info {
                Ok(info) => {
                    listing.insert(name, info);
                }
                Err(e) => debug!(template = %name, error = %e, "skipping template"),
            }
        }

        listing
    }

    /// Resolve a template directory name or one of its aliases.
    pub fn find_by_alias(&self, key: &str) -> Option<String> {
        if self.template_dir(key).is_ok() {
            return Some(key.to_string());
        }
        self.list_templates()
            .into_iter()
            .find(|(_, info)| info.aliases.iter().any(|alias| alias == key))
            .map(|(name, _)| name)
    }
}

fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{}.png", index))
}

/// Densely numbered frame files, stopping at the first gap.
fn frame_paths(dir: &Path) -> Vec<PathBuf> {
    (0..).map(|i| frame_path(dir, i)).take_while(|p| p.is_file()).collect()
}

/// List templates under `root`.
pub fn list_templates(root: impl Into<PathBuf>) -> BTreeMap<String, TemplateInfo> {
    TemplateStore::new(root).list_templates()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::Rgba;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    const IMAGE_CONFIG: &str = r#"{"type": "Image", "alias": ["pf"], "avatar": [{"pos": [0, 0, 4, 4]}]}"#;

    fn write_frame(dir: &Path, index: usize, size: u32) {
        RgbaImage::from_pixel(size, size, Rgba([index as u8, 0, 0, 255]))
            .save(dir.join(format!("{}.png", index)))
            .unwrap();
    }

    fn make_template(root: &Path, name: &str, config: &str, frames: &[usize]) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("data.json"), config).unwrap();
        for &i in frames {
            write_frame(&dir, i, 8);
        }
        dir
    }

    #[test]
    fn test_load_config_and_frames() {
        let root = TempDir::new().unwrap();
        make_template(root.path(), "perfect", IMAGE_CONFIG, &[0]);
        let store = TemplateStore::new(root.path());

        let template = store.load("perfect").unwrap();
        assert_eq!(template.config.template_type, TemplateType::Image);
        assert_eq!(template.frames.len(), 1);
        assert_eq!(template.frames[0].dimensions(), (8, 8));
    }

    #[test]
    fn test_frame_gap_ends_scan() {
        let root = TempDir::new().unwrap();
        make_template(root.path(), "gappy", IMAGE_CONFIG, &[0, 1, 3, 4]);
        let store = TemplateStore::new(root.path());

        let frames = store.load_frames("gappy").unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].get_pixel(0, 0)[0], 1);
        assert_eq!(store.count_frames("gappy").unwrap(), 2);
    }

    #[test]
    fn test_missing_frame_zero_is_not_found() {
        let root = TempDir::new().unwrap();
        make_template(root.path(), "noframes", IMAGE_CONFIG, &[1, 2]);
        let err = TemplateStore::new(root.path()).load("noframes").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemplateNotFound);
    }

    #[test]
    fn test_missing_directory_and_config_are_not_found() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("empty")).unwrap();
        let store = TemplateStore::new(root.path());

        assert_eq!(store.load("nonexistent").unwrap_err().kind(), ErrorKind::TemplateNotFound);
        assert_eq!(store.load_config("empty").unwrap_err().kind(), ErrorKind::TemplateNotFound);
    }

    #[test]
    fn test_bad_config_is_invalid_not_missing() {
        let root = TempDir::new().unwrap();
        make_template(root.path(), "broken", "{ this is not json", &[0]);
        let err = TemplateStore::new(root.path()).load("broken").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemplateConfigInvalid);
    }

    #[test]
    fn test_undecodable_frame_is_invalid() {
        let root = TempDir::new().unwrap();
        let dir = make_template(root.path(), "corrupt", IMAGE_CONFIG, &[]);
        fs::write(dir.join("0.png"), b"not a png").unwrap();
        let err = TemplateStore::new(root.path()).load_frames("corrupt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemplateConfigInvalid);
    }

    #[test]
    fn test_newer_config_name_wins() {
        let root = TempDir::new().unwrap();
        let dir = make_template(root.path(), "both", r#"{"type": "Image", "delay": 10}"#, &[0]);
        fs::write(dir.join("template.json"), r#"{"type": "Animation", "delay": 90}"#).unwrap();

        let config = TemplateStore::new(root.path()).load_config("both").unwrap();
        assert_eq!(config.template_type, TemplateType::Animation);
        assert_eq!(config.frame_delay_ms, 90);
    }

    #[test]
    fn test_path_like_names_rejected() {
        let root = TempDir::new().unwrap();
        let store = TemplateStore::new(root.path().join("templates"));
        for name in ["", "..", "../etc", "a/b", "fonts"] {
            assert_eq!(store.template_dir(name).unwrap_err().kind(), ErrorKind::TemplateNotFound);
        }
    }

    #[test]
    fn test_list_templates_skips_fonts_and_broken() {
        let root = TempDir::new().unwrap();
        make_template(root.path(), "perfect", IMAGE_CONFIG, &[0]);
        make_template(
            root.path(),
            "petpet",
            r#"{"type": "GIF", "text": [{"text": "$txt1"}]}"#,
            &[0, 1, 2],
        );
        make_template(root.path(), "broken", "nope", &[0]);
        fs::create_dir_all(root.path().join("fonts")).unwrap();

        let listing = list_templates(root.path());
        assert_eq!(listing.keys().collect::<Vec<_>>(), vec!["perfect", "petpet"]);

        let perfect = &listing["perfect"];
        assert_eq!(perfect.aliases, vec!["pf"]);
        assert!(!perfect.has_text);
        assert!(!perfect.is_animated);

        let petpet = &listing["petpet"];
        assert_eq!(petpet.template_type, TemplateType::Animation);
        assert!(petpet.has_text);
        assert!(petpet.is_animated);
        assert_eq!(petpet.frame_count, 3);
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let root = TempDir::new().unwrap();
        assert!(list_templates(root.path().join("absent")).is_empty());
    }

    #[test]
    fn test_find_by_alias() {
        let root = TempDir::new().unwrap();
        make_template(root.path(), "perfect", IMAGE_CONFIG, &[0]);
        let store = TemplateStore::new(root.path());

        assert_eq!(store.find_by_alias("perfect").as_deref(), Some("perfect"));
        assert_eq!(store.find_by_alias("pf").as_deref(), Some("perfect"));
        assert_eq!(store.find_by_alias("unknown"), None);
    }

    #[test]
    fn test_font_path() {
        let store = TemplateStore::new("/srv/templates");
        assert_eq!(store.font_path("MiSans"), PathBuf::from("/srv/templates/fonts/MiSans-Bold.ttf"));
    }

    #[test]
    fn test_uncached_store_rereads() {
        let root = TempDir::new().unwrap();
        let dir = make_template(root.path(), "perfect", IMAGE_CONFIG, &[0]);
        let store = TemplateStore::new(root.path());

        let first = store.load("perfect").unwrap();
        write_frame(&dir, 1, 8);
        let second = store.load("perfect").unwrap();
        assert_eq!(first.frames.len(), 1);
        assert_eq!(second.frames.len(), 2);
        assert_eq!(store.cached_len(), 0);
    }

    #[test]
    fn test_cache_hit_returns_same_template() {
        let root = TempDir::new().unwrap();
        make_template(root.path(), "perfect", IMAGE_CONFIG, &[0]);
        let store = TemplateStore::new(root.path()).with_cache();

        let first = store.load("perfect").unwrap();
        let second = store.load("perfect").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.cached_len(), 1);
    }

    #[test]
    fn test_cache_invalidated_by_config_mtime() {
        let root = TempDir::new().unwrap();
        let dir = make_template(root.path(), "perfect", IMAGE_CONFIG, &[0]);
        let store = TemplateStore::new(root.path()).with_cache();
        let first = store.load("perfect").unwrap();

        let config_path = dir.join("data.json");
        fs::write(&config_path, r#"{"type": "Image", "delay": 250}"#).unwrap();
        fs::File::options()
            .write(true)
            .open(&config_path)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();

        let second = store.load("perfect").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.config.frame_delay_ms, 250);
        assert_eq!(store.cached_len(), 1);
    }

    #[test]
    fn test_cache_invalidated_by_frame_rewrite() {
        let root = TempDir::new().unwrap();
        let dir = make_template(root.path(), "perfect", IMAGE_CONFIG, &[0]);
        let store = TemplateStore::new(root.path()).with_cache();
        let first = store.load("perfect").unwrap();
        assert_eq!(*first.frames[0].get_pixel(0, 0), Rgba([0, 0, 0, 255]));

        // Same name, new pixels: neither the directory nor the config changes
        let frame_path = dir.join("0.png");
        RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255])).save(&frame_path).unwrap();
        fs::File::options()
            .write(true)
            .open(&frame_path)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();

        let second = store.load("perfect").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*second.frames[0].get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(store.cached_len(), 1);
    }

    #[test]
    fn test_load_with_reports_config_before_frames() {
        let root = TempDir::new().unwrap();
        let dir = make_template(root.path(), "broken", IMAGE_CONFIG, &[]);
        fs::write(dir.join("0.png"), b"not a png").unwrap();

        for store in [TemplateStore::new(root.path()), TemplateStore::new(root.path()).with_cache()] {
            let mut config_seen = false;
            let err = store.load_with("broken", || config_seen = true).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::TemplateConfigInvalid);
            assert!(config_seen);
        }

        let mut config_seen = false;
        fs::write(dir.join("data.json"), "{ nope").unwrap();
        let store = TemplateStore::new(root.path());
        assert!(store.load_with("broken", || config_seen = true).is_err());
        assert!(!config_seen);
    }
}
