//! Saved server configurations and the file that stores them.
//!
//! The store maps an opaque identity (usually the server's URL) to its working
//! directory, command line and port set:
//!
//! ```toml
//! [servers."http://localhost:3000"]
//! directory = "/srv/app"
//! command = "npm run dev"
//! ports = [3000, 3001]
//! ```
//!
//! Port information may also arrive as a scalar `port`, or as `ports` /
//! `additional_ports` (`additionalPorts`) holding a scalar or a list. All of
//! it is normalized into one de-duplicated, order-preserving set on read.

use crate::error::{ConfigParseError, FileError};
use crate::{Result, env};
use indexmap::{IndexMap, IndexSet};
use miette::{WrapErr, ensure};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A port field as written by hand or by other tools.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    One(i64),
    Text(String),
    Many(Vec<PortValue>),
}

impl PortValue {
    fn collect_into(&self, out: &mut IndexSet<u16>) {
        match self {
            PortValue::One(n) => {
                if let Some(port) = valid_port(*n) {
                    out.insert(port);
                }
            }
            PortValue::Text(s) => {
                if let Some(port) = s.trim().parse::<i64>().ok().and_then(valid_port) {
                    out.insert(port);
                }
            }
            PortValue::Many(values) => {
                for value in values {
                    value.collect_into(out);
                }
            }
        }
    }
}

fn valid_port(n: i64) -> Option<u16> {
    u16::try_from(n).ok().filter(|p| *p > 0)
}

/// Merges every port source, in order, into a single set of valid ports.
pub fn normalize_ports<'a>(sources: impl IntoIterator<Item = Option<&'a PortValue>>) -> IndexSet<u16> {
    let mut ports = IndexSet::new();
    for value in sources.into_iter().flatten() {
        value.collect_into(&mut ports);
    }
    ports
}

/// On-disk shape of one server entry.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RawServerConfig {
    pub directory: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<PortValue>,
    #[serde(
        default,
        alias = "additionalPorts",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_ports: Option<PortValue>,
}

impl RawServerConfig {
    pub fn normalize(self) -> ServerConfig {
        let ports = normalize_ports([
            self.port.as_ref(),
            self.ports.as_ref(),
            self.additional_ports.as_ref(),
        ]);
        ServerConfig {
            directory: PathBuf::from(self.directory),
            command: self.command,
            ports,
        }
    }
}

/// A server's launch configuration with its port set already normalized.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ServerConfig {
    pub directory: PathBuf,
    pub command: String,
    pub ports: IndexSet<u16>,
}

impl ServerConfig {
    pub fn new(
        directory: impl Into<PathBuf>,
        command: impl Into<String>,
        ports: impl IntoIterator<Item = u16>,
    ) -> Self {
        Self {
            directory: directory.into(),
            command: command.into(),
            ports: ports.into_iter().filter(|p| *p > 0).collect(),
        }
    }

    /// The first configured port, used as the representative one in reports.
    pub fn primary_port(&self) -> Option<u16> {
        self.ports.first().copied()
    }

    fn to_raw(&self) -> RawServerConfig {
        RawServerConfig {
            directory: self.directory.display().to_string(),
            command: self.command.clone(),
            port: None,
            ports: Some(PortValue::Many(
                self.ports.iter().map(|p| PortValue::One(i64::from(*p))).collect(),
            )),
            additional_ports: None,
        }
    }
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct ServersFile {
    #[serde(default)]
    servers: IndexMap<String, RawServerConfig>,
}

/// File format of the store, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    Toml,
    Json,
}

impl StoreFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => StoreFormat::Json,
            _ => StoreFormat::Toml,
        }
    }
}

/// Durable mapping from identity to `ServerConfig`.
///
/// Reads take the file lock briefly. Writes hold both an in-process mutex and
/// the file lock across the whole read-merge-write so concurrent saves, from
/// threads or from other processes, never drop each other's entries.
#[derive(Debug)]
pub struct ServerStore {
    path: PathBuf,
    format: StoreFormat,
    write_lock: Mutex<()>,
}

impl ServerStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            format: StoreFormat::from_path(&path),
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// The store at `PORTWARDEN_SERVERS_FILE`.
    pub fn default_store() -> Self {
        Self::new(env::PORTWARDEN_SERVERS_FILE.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, id: &str) -> Result<Option<ServerConfig>> {
        Ok(self.list()?.shift_remove(id))
    }

    pub fn list(&self) -> Result<IndexMap<String, ServerConfig>> {
        if !self.path.exists() {
            return Ok(IndexMap::new());
        }
        let _lock = xx::fslock::get(&self.path, false)
            .wrap_err_with(|| format!("failed to acquire lock on {}", self.path.display()))?;
        let file = self.read_unlocked()?;
        Ok(file
            .servers
            .into_iter()
            .map(|(id, raw)| (id, raw.normalize()))
            .collect())
    }

    /// Replaces the whole entry for `id`.
    pub fn save(&self, id: &str, config: &ServerConfig) -> Result<()> {
        ensure!(!id.trim().is_empty(), "server identity cannot be empty");
        ensure!(
            !config.command.trim().is_empty(),
            "command for '{id}' cannot be empty"
        );
        self.update(|file| {
            file.servers.insert(id.to_string(), config.to_raw());
            true
        })?;
        info!("saved configuration for {id}");
        Ok(())
    }

    /// Removes the entry for `id`; returns whether one existed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let removed = self.update(|file| file.servers.shift_remove(id).is_some())?;
        if removed {
            info!("removed configuration for {id}");
        }
        Ok(removed)
    }

    fn update(&self, f: impl FnOnce(&mut ServersFile) -> bool) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            xx::file::mkdirp(parent).map_err(|e| FileError::WriteError {
                path: self.path.clone(),
                details: Some(e.to_string()),
            })?;
        }
        let _lock = xx::fslock::get(&self.path, false)
            .wrap_err_with(|| format!("failed to acquire lock on {}", self.path.display()))?;
        let mut file = if self.path.exists() {
            self.read_unlocked()?
        } else {
            ServersFile::default()
        };
        let changed = f(&mut file);
        if changed {
            for raw in file.servers.values_mut() {
                *raw = std::mem::take(raw).normalize().to_raw();
            }
            self.write_unlocked(&file)?;
        }
        Ok(changed)
    }

    fn read_unlocked(&self) -> Result<ServersFile> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| FileError::ReadError {
            path: self.path.clone(),
            source: e,
        })?;
        parse_servers(&self.path, self.format, raw)
    }

    fn write_unlocked(&self, file: &ServersFile) -> Result<()> {
        let raw = match self.format {
            StoreFormat::Toml => toml::to_string(file).map_err(|e| e.to_string()),
            StoreFormat::Json => serde_json::to_string_pretty(file).map_err(|e| e.to_string()),
        }
        .map_err(|details| FileError::SerializeError {
            path: self.path.clone(),
            details,
        })?;
        xx::file::write(&self.path, raw).map_err(|e| FileError::WriteError {
            path: self.path.clone(),
            details: Some(e.to_string()),
        })?;
        Ok(())
    }
}

fn parse_servers(path: &Path, format: StoreFormat, raw: String) -> Result<ServersFile> {
    if raw.trim().is_empty() {
        return Ok(ServersFile::default());
    }
    match format {
        StoreFormat::Toml => toml::from_str(&raw)
            .map_err(|e| ConfigParseError::from_toml_error(path, raw, e).into()),
        StoreFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|e| ConfigParseError::from_json_error(path, raw.clone(), e))?;
            // a bare identity -> server map is accepted as well as {"servers": {...}}
            let value = match value {
                serde_json::Value::Object(mut map) if map.contains_key("servers") => map
                    .remove("servers")
                    .unwrap_or(serde_json::Value::Object(Default::default())),
                other => other,
            };
            let servers = serde_json::from_value(value)
                .map_err(|e| ConfigParseError::from_json_error(path, raw, e))?;
            Ok(ServersFile { servers })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(port: Option<PortValue>, ports: Option<PortValue>, extra: Option<PortValue>) -> RawServerConfig {
        RawServerConfig {
            directory: "/tmp/app".to_string(),
            command: "sleep 100".to_string(),
            port,
            ports,
            additional_ports: extra,
        }
    }

    #[test]
    fn test_port_shapes_normalize_identically() {
        let a = raw(Some(PortValue::One(3000)), None, None).normalize();
        let b = raw(
            None,
            Some(PortValue::Many(vec![PortValue::One(3000), PortValue::One(3000)])),
            None,
        )
        .normalize();
        let c = raw(
            Some(PortValue::One(3000)),
            None,
            Some(PortValue::Many(vec![PortValue::One(3000)])),
        )
        .normalize();

        let expected: IndexSet<u16> = [3000].into_iter().collect();
        assert_eq!(a.ports, expected);
        assert_eq!(b.ports, expected);
        assert_eq!(c.ports, expected);
    }

    #[test]
    fn test_normalize_preserves_order_and_drops_invalid() {
        let config = raw(
            Some(PortValue::One(8080)),
            Some(PortValue::Many(vec![
                PortValue::One(0),
                PortValue::One(-1),
                PortValue::One(70000),
                PortValue::Text("3000".to_string()),
                PortValue::Text("nope".to_string()),
            ])),
            Some(PortValue::One(8080)),
        )
        .normalize();
        assert_eq!(config.ports.iter().copied().collect::<Vec<_>>(), vec![8080, 3000]);
        assert_eq!(config.primary_port(), Some(8080));
    }

    #[test]
    fn test_parse_toml_variants() {
        let raw = r#"
[servers."http://localhost:3000"]
directory = "/srv/app"
command = "npm run dev"
port = 3000
additionalPorts = [3001, 3000]

[servers.svc-b]
directory = "/srv/b"
command = "cargo run"
ports = 4000
"#;
        let file =
            parse_servers(Path::new("servers.toml"), StoreFormat::Toml, raw.to_string()).unwrap();
        let a = file.servers["http://localhost:3000"].clone().normalize();
        assert_eq!(a.ports.iter().copied().collect::<Vec<_>>(), vec![3000, 3001]);
        let b = file.servers["svc-b"].clone().normalize();
        assert_eq!(b.ports.iter().copied().collect::<Vec<_>>(), vec![4000]);
    }

    #[test]
    fn test_parse_bare_json_map() {
        let raw = r#"{"http://localhost:5173": {"directory": "/srv/web", "command": "vite", "port": "5173"}}"#;
        let file =
            parse_servers(Path::new("servers.json"), StoreFormat::Json, raw.to_string()).unwrap();
        let web = file.servers["http://localhost:5173"].clone().normalize();
        assert_eq!(web.primary_port(), Some(5173));
    }

    #[test]
    fn test_store_format_from_path() {
        assert_eq!(StoreFormat::from_path(Path::new("a/servers.json")), StoreFormat::Json);
        assert_eq!(StoreFormat::from_path(Path::new("a/servers.JSON")), StoreFormat::Json);
        assert_eq!(StoreFormat::from_path(Path::new("a/servers.toml")), StoreFormat::Toml);
    }

    #[test]
    fn test_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ServerStore::new(dir.path().join("servers.toml"));
        assert!(store.load("svc-a").unwrap().is_none());

        let config = ServerConfig::new("/tmp/app", "sleep 100", [5050]);
        store.save("svc-a", &config).unwrap();
        assert_eq!(store.load("svc-a").unwrap(), Some(config));

        // full replace per key
        let replaced = ServerConfig::new("/tmp/other", "sleep 5", [6000, 6001]);
        store.save("svc-a", &replaced).unwrap();
        assert_eq!(store.load("svc-a").unwrap(), Some(replaced));

        assert!(store.remove("svc-a").unwrap());
        assert!(!store.remove("svc-a").unwrap());
        assert!(store.load("svc-a").unwrap().is_none());
    }

    #[test]
    fn test_save_rejects_empty_command() {
        let dir = tempfile::tempdir().unwrap();
        let store = ServerStore::new(dir.path().join("servers.toml"));
        let config = ServerConfig::new("/tmp/app", "  ", [5050]);
        assert!(store.save("svc-a", &config).is_err());
        assert!(store.save("", &ServerConfig::new("/tmp", "true", [1])).is_err());
    }

    #[test]
    fn test_concurrent_saves_keep_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(ServerStore::new(dir.path().join("servers.toml")));
        let handles: Vec<_> = (0..8u16)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let config = ServerConfig::new("/tmp", "true", [4000 + i]);
                    store.save(&format!("svc-{i}"), &config).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.list().unwrap().len(), 8);
    }
}
