//! File-backed source (JSON or YAML).
//!
//! The whole file is one object. Loading a file that does not exist yields an
//! empty store, so a later `save` creates it.

use super::{Source, delegate_to_store};
use crate::error::{ConfigError, ConfigResult};
use crate::store::{Store, StoreOptions};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const BOM: char = '\u{feff}';

/// On-disk encoding of a [`File`] source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Json,
    Yaml,
}

impl FileFormat {
    /// `.yaml` and `.yml` are YAML, everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                FileFormat::Yaml
            }
            _ => FileFormat::Json,
        }
    }

    fn parse(self, content: &str) -> Result<Value, String> {
        match self {
            FileFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            FileFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    fn stringify(self, value: &Value) -> Result<String, String> {
        match self {
            FileFormat::Json => serde_json::to_string_pretty(value)
                .map(|s| s + "\n")
                .map_err(|e| e.to_string()),
            FileFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        }
    }
}

/// Options for a [`File`] source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileOptions {
    /// File name or path. Required.
    pub file: Option<PathBuf>,

    /// Directory the file is relative to (default: current directory).
    pub dir: Option<PathBuf>,

    /// Look for the file in `dir` and its ancestors, then the home directory.
    pub search: bool,

    /// Defaults to the format implied by the extension.
    pub format: Option<FileFormat>,

    #[serde(alias = "logicalSeparator")]
    pub logical_separator: Option<String>,

    #[serde(alias = "parseValues")]
    pub parse_values: bool,
}

impl FileOptions {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(file.into()),
            ..Default::default()
        }
    }

    /// Read options from a dynamic value. A bare string is the file path.
    pub fn from_value(options: &Value) -> ConfigResult<Self> {
        match options {
            Value::String(path) => Ok(Self::new(path)),
            Value::Object(_) => {
                Self::deserialize(options).map_err(|e| ConfigError::invalid_options("file", e))
            }
            _ => Err(ConfigError::invalid_options("file", "missing file option")),
        }
    }
}

/// Source persisted to a single file.
#[derive(Debug, Clone)]
pub struct File {
    store: Store,
    path: PathBuf,
    format: FileFormat,
}

impl File {
    pub fn new(options: FileOptions) -> ConfigResult<Self> {
        let Some(file) = options.file.filter(|f| !f.as_os_str().is_empty()) else {
            return Err(ConfigError::invalid_options("file", "missing file option"));
        };
        let dir = options.dir.unwrap_or_else(|| PathBuf::from("."));

        let path = if options.search {
            search(&file, &dir).unwrap_or_else(|| {
                warn!(file = %file.display(), dir = %dir.display(), "Config file not found by search");
                dir.join(&file)
            })
        } else {
            dir.join(&file)
        };

        let store = Store::with_options(StoreOptions {
            read_only: false,
            logical_separator: options.logical_separator.unwrap_or_default(),
            parse_values: options.parse_values,
        });

        Ok(Self {
            format: options.format.unwrap_or_else(|| FileFormat::from_path(&path)),
            store,
            path,
        })
    }

    /// File source for `path` with default options.
    pub fn open(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        Self::new(FileOptions::new(path))
    }

    pub fn from_options(options: &Value) -> ConfigResult<Self> {
        Self::new(FileOptions::from_value(options)?)
    }

    /// Resolved location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Write the current data to `path`, in the format its extension implies.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let format = if path == self.path {
            self.format
        } else {
            FileFormat::from_path(path)
        };
        let content = format
            .stringify(self.store.load_sync())
            .map_err(|e| ConfigError::serialize(path, e))?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::io(path, e))?;
        debug!(path = %path.display(), "Saved config file");
        Ok(())
    }

    fn read(&self) -> ConfigResult<Value> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Config file does not exist yet");
                return Ok(Value::Object(Default::default()));
            }
            Err(e) => return Err(ConfigError::io(&self.path, e)),
        };

        let content = content.strip_prefix(BOM).unwrap_or(&content);
        if content.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }

        let data = self
            .format
            .parse(content)
            .map_err(|e| ConfigError::parse(&self.path, e))?;
        match data {
            Value::Object(_) => Ok(data),
            // An empty YAML document
            Value::Null => Ok(Value::Object(Default::default())),
            _ => Err(ConfigError::parse(&self.path, "top level is not an object")),
        }
    }
}

impl Source for File {
    fn kind(&self) -> &str {
        "file"
    }

    delegate_to_store!();

    fn load(&mut self) -> ConfigResult<()> {
        let data = self.read()?;
        self.store.populate(|store| store.set((), &data));
        debug!(path = %self.path.display(), "Loaded config file");
        Ok(())
    }

    fn save(&self) -> ConfigResult<()> {
        self.save_to(&self.path)
    }
}

/// Find `file` in `dir` or one of its ancestors, then in the home directory.
fn search(file: &Path, dir: &Path) -> Option<PathBuf> {
    if file.is_absolute() {
        return file.exists().then(|| file.to_path_buf());
    }

    let start = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    for ancestor in start.ancestors() {
        let candidate = ancestor.join(file);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    dirs::home_dir()
        .map(|home| home.join(file))
        .filter(|candidate| candidate.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use serde_json::json;
    use tempfile::TempDir;

    fn data() -> Value {
        json!({
            "isNull": null,
            "literal": "bazz",
            "arr": ["one", 2, true, {"value": "foo"}],
            "obj": {
                "host": "localhost",
                "port": 5984,
                "array": ["one", 2, true, {"foo": "bar"}],
                "auth": {"username": "admin", "password": "password"}
            }
        })
    }

    fn get<'a>(file: &'a File, key: &str) -> Option<&'a Value> {
        Source::get(file, &Key::from(key))
    }

    #[test]
    fn test_load_valid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        std::fs::write(&path, serde_json::to_string_pretty(&data()).unwrap()).unwrap();

        let mut file = File::from_options(&json!({"file": path})).unwrap();
        file.load().unwrap();
        assert_eq!(file.store().load_sync(), &data());

        let mut file = File::from_options(&json!(path)).unwrap();
        file.load().unwrap();
        assert_eq!(file.store().load_sync(), &data());
    }

    #[test]
    fn test_malformed_json_names_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("malformed.json");
        std::fs::write(&path, "{\"literal\": \"bazz\",").unwrap();

        let mut file = File::open(&path).unwrap();
        let err = file.load().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Parse);
        assert!(err.to_string().contains("malformed.json"));
    }

    #[test]
    fn test_bom_is_ignored() {
        let temp = TempDir::new().unwrap();
        let bom = temp.path().join("bom.json");
        let no_bom = temp.path().join("no-bom.json");
        let body = "{\"port\": 78304, \"host\": \"weebls-stuff.com\"}";
        std::fs::write(&bom, format!("\u{feff}{}", body)).unwrap();
        std::fs::write(&no_bom, body).unwrap();

        for path in [bom, no_bom] {
            let mut file = File::open(&path).unwrap();
            file.load().unwrap();
            assert_eq!(get(&file, "port"), Some(&json!(78304)));
            assert_eq!(get(&file, "host"), Some(&json!("weebls-stuff.com")));
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let mut file = File::open(temp.path().join("nope.json")).unwrap();
        file.load().unwrap();
        assert_eq!(file.store().load_sync(), &json!({}));
    }

    #[test]
    fn test_top_level_must_be_object() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("list.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(File::open(&path).unwrap().load().is_err());
    }

    #[test]
    fn test_save_to_original_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tmp.json");
        let mut file = File::open(&path).unwrap();
        for (key, value) in data().as_object().unwrap() {
            assert!(Source::set(&mut file, &Key::from(key), value));
        }
        file.save().unwrap();

        let read: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, data());
    }

    #[test]
    fn test_save_to_other_file() {
        let temp = TempDir::new().unwrap();
        let mut file = File::open(temp.path().join("tmp.json")).unwrap();
        Source::set(&mut file, &Key::Root, &data());

        let other = temp.path().join("nested").join("tmp2.json");
        file.save_to(&other).unwrap();
        let read: Value = serde_json::from_str(&std::fs::read_to_string(&other).unwrap()).unwrap();
        assert_eq!(read, data());
        assert!(!file.path().exists());
    }

    #[test]
    fn test_yaml_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "server:\n  port: 8080\n  hosts:\n    - a\n    - b\n").unwrap();

        let mut file = File::open(&path).unwrap();
        assert_eq!(file.format(), FileFormat::Yaml);
        file.load().unwrap();
        assert_eq!(get(&file, "server:port"), Some(&json!(8080)));
        assert_eq!(get(&file, "server:hosts:1"), Some(&json!("b")));

        Source::set(&mut file, &Key::from("server:port"), &json!(9090));
        file.save().unwrap();
        let mut reloaded = File::open(&path).unwrap();
        reloaded.load().unwrap();
        assert_eq!(get(&reloaded, "server:port"), Some(&json!(9090)));
    }

    #[test]
    fn test_search_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("found.json"), "{\"found\": true}").unwrap();

        let mut file = File::new(FileOptions {
            file: Some("found.json".into()),
            dir: Some(nested),
            search: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(file.path(), std::path::absolute(temp.path().join("found.json")).unwrap());
        file.load().unwrap();
        assert_eq!(get(&file, "found"), Some(&json!(true)));
    }

    #[test]
    fn test_missing_file_option() {
        assert!(File::from_options(&Value::Null).is_err());
        assert!(File::from_options(&json!({"dir": "/tmp"})).is_err());
    }
}
