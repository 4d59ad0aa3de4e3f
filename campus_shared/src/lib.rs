pub mod event;
pub mod guild;
pub mod module;
pub mod stats;

pub use crate::{event::Event, guild::GuildConfig, module::Module, stats::UserStats};

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

const ADMINS_FILE: &str = "admins.json";
const MODULES_FILE: &str = "modules.json";
const EVENTS_FILE: &str = "events.json";
const GUILD_CONFIG_FILE: &str = "guild_config.json";
const USER_STATS_FILE: &str = "user_stats.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// File-backed JSON persistence for the bot.
///
/// Every logical record type lives in its own file under the data
/// directory. Loads self-heal: an absent or corrupt file is reset to the
/// supplied default instead of failing. Writes are whole-file overwrites,
/// last write wins.
#[derive(Debug)]
pub struct DataStore {
    dir: PathBuf,
    owner: String,
}

impl DataStore {
    /// Opens the store rooted at `dir`, creating the directory on first use.
    /// `owner` is the irremovable bot administrator.
    pub fn new(dir: impl Into<PathBuf>, owner: impl Into<String>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            owner: owner.into(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Returns the parsed content of `name`, or `default` if the file is
    /// absent or corrupt. An absent or corrupt file is rewritten with the
    /// default so the next load sees well-formed content.
    pub fn load<T>(&self, name: &str, default: T) -> T
    where
        T: Serialize + DeserializeOwned,
    {
        let path = self.path(name);
        if !path.exists() {
            if let Err(e) = self.save(name, &default) {
                warn!("Failed to seed {}: {}.", name, e);
            }
            return default;
        }

        match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Corrupt store file {}, resetting: {}.", name, e);
                    if let Err(e) = self.save(name, &default) {
                        warn!("Failed to reset {}: {}.", name, e);
                    }
                    default
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}.", name, e);
                default
            }
        }
    }

    /// Overwrites `name` with the serialized value.
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(value)?;
        fs::write(self.path(name), raw)?;
        Ok(())
    }

    // Admins

    pub fn admins(&self) -> Vec<String> {
        self.load(ADMINS_FILE, vec![self.owner.clone()])
    }

    pub fn is_admin(&self, tag: &str) -> bool {
        self.admins().iter().any(|a| a == tag)
    }

    pub fn add_admin(&self, tag: &str) -> bool {
        let mut admins = self.admins();
        if admins.iter().any(|a| a == tag) {
            return false;
        }
        admins.push(tag.to_string());
        self.save(ADMINS_FILE, &admins).is_ok()
    }

    /// Removes an admin. The owner cannot be removed.
    pub fn remove_admin(&self, tag: &str) -> bool {
        if tag == self.owner {
            return false;
        }
        let mut admins = self.admins();
        let before = admins.len();
        admins.retain(|a| a != tag);
        if admins.len() == before {
            return false;
        }
        self.save(ADMINS_FILE, &admins).is_ok()
    }

    // Modules

    pub fn modules(&self) -> BTreeMap<String, Module> {
        self.load(MODULES_FILE, BTreeMap::new())
    }

    pub fn module(&self, code: &str) -> Option<Module> {
        self.modules().remove(&code.to_uppercase())
    }

    pub fn module_exists(&self, code: &str) -> bool {
        self.modules().contains_key(&code.to_uppercase())
    }

    /// Adds a module under its uppercased code. Returns false if the code
    /// is already taken.
    pub fn add_module(&self, code: &str, module: Module) -> bool {
        let mut modules = self.modules();
        let code = code.to_uppercase();
        if modules.contains_key(&code) {
            return false;
        }
        modules.insert(code, module);
        self.save(MODULES_FILE, &modules).is_ok()
    }

    pub fn remove_module(&self, code: &str) -> bool {
        let mut modules = self.modules();
        if modules.remove(&code.to_uppercase()).is_none() {
            return false;
        }
        self.save(MODULES_FILE, &modules).is_ok()
    }

    /// Finds the module whose role matches `role_id`.
    pub fn module_by_role(&self, role_id: u64) -> Option<(String, Module)> {
        self.modules()
            .into_iter()
            .find(|(_, m)| m.get_role_id() == role_id)
    }

    // Events

    pub fn events(&self) -> BTreeMap<String, Event> {
        self.load(EVENTS_FILE, BTreeMap::new())
    }

    pub fn events_for(&self, module: &str) -> BTreeMap<String, Event> {
        let module = module.to_uppercase();
        self.events()
            .into_iter()
            .filter(|(_, e)| e.get_module() == module)
            .collect()
    }

    /// Adds an event and returns its key. Keys carry a monotonically
    /// increasing suffix so one module can hold several events on the same
    /// day, and removals never free a suffix for reuse.
    pub fn add_event(&self, module: &str, date: &str, description: &str) -> Option<String> {
        let mut events = self.events();
        let module = module.to_uppercase();
        let next = events
            .keys()
            .filter_map(|k| k.rsplit("::").next()?.parse::<u64>().ok())
            .max()
            .map_or(0, |n| n + 1);
        let key = format!("{}::{}::{}", module, date, next);
        events.insert(
            key.clone(),
            Event::new(module, date.to_string(), description.to_string()),
        );
        self.save(EVENTS_FILE, &events).ok()?;
        Some(key)
    }

    pub fn remove_event(&self, key: &str) -> bool {
        let mut events = self.events();
        if events.remove(key).is_none() {
            return false;
        }
        self.save(EVENTS_FILE, &events).is_ok()
    }

    pub fn find_event(&self, module: &str, date: &str) -> Option<String> {
        let module = module.to_uppercase();
        self.events()
            .into_iter()
            .find(|(_, e)| e.get_module() == module && e.get_date() == date)
            .map(|(key, _)| key)
    }

    // Guild config

    fn guild_configs(&self) -> BTreeMap<String, GuildConfig> {
        self.load(GUILD_CONFIG_FILE, BTreeMap::new())
    }

    pub fn guild_config(&self, guild_id: u64) -> GuildConfig {
        self.guild_configs()
            .remove(&guild_id.to_string())
            .unwrap_or_default()
    }

    /// Read-modify-write on one guild's config. Other guilds' entries are
    /// never touched.
    pub fn update_guild_config<F>(&self, guild_id: u64, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut GuildConfig),
    {
        let mut configs = self.guild_configs();
        let config = configs.entry(guild_id.to_string()).or_default();
        f(config);
        self.save(GUILD_CONFIG_FILE, &configs)
    }

    /// Every guild the store has configuration for.
    pub fn guild_ids(&self) -> Vec<u64> {
        self.guild_configs()
            .keys()
            .filter_map(|k| k.parse().ok())
            .collect()
    }

    // User stats

    fn all_user_stats(&self) -> BTreeMap<String, UserStats> {
        self.load(USER_STATS_FILE, BTreeMap::new())
    }

    pub fn user_stats(&self, user_id: u64) -> UserStats {
        self.all_user_stats()
            .remove(&user_id.to_string())
            .unwrap_or_default()
    }

    /// Records a module in the user's joined list. Returns false if it was
    /// already there.
    pub fn add_user_module(&self, user_id: u64, module: &str) -> bool {
        let mut stats = self.all_user_stats();
        let entry = stats.entry(user_id.to_string()).or_default();
        let module = module.to_uppercase();
        if entry.modules.contains(&module) {
            return false;
        }
        entry.modules.push(module);
        self.save(USER_STATS_FILE, &stats).is_ok()
    }

    pub fn remove_user_module(&self, user_id: u64, module: &str) -> bool {
        let mut stats = self.all_user_stats();
        let module = module.to_uppercase();
        let entry = match stats.get_mut(&user_id.to_string()) {
            Some(entry) => entry,
            None => return false,
        };
        let before = entry.modules.len();
        entry.modules.retain(|m| m != &module);
        if entry.modules.len() == before {
            return false;
        }
        self.save(USER_STATS_FILE, &stats).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn store(dir: &Path) -> DataStore {
        DataStore::new(dir, "owner#0001").unwrap()
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let value = vec!["a".to_string(), "b".to_string()];
        store.save("roundtrip.json", &value).unwrap();
        let loaded: Vec<String> = store.load("roundtrip.json", Vec::new());

        assert_eq!(value, loaded);
    }

    #[test]
    fn load_on_missing_file_persists_the_default() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let loaded: Vec<String> = store.load("missing.json", vec!["seed".to_string()]);
        assert_eq!(vec!["seed".to_string()], loaded);

        // The default must now be on disk.
        assert!(dir.path().join("missing.json").exists());
        let reloaded: Vec<String> = store.load("missing.json", Vec::new());
        assert_eq!(vec!["seed".to_string()], reloaded);
    }

    #[test]
    fn corrupt_file_resets_to_default() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        let loaded: Vec<String> = store.load("broken.json", Vec::new());
        assert!(loaded.is_empty());

        let raw = fs::read_to_string(dir.path().join("broken.json")).unwrap();
        assert_eq!("[]", raw);
    }

    #[test]
    fn admin_list_defaults_to_owner_and_protects_it() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        assert!(store.is_admin("owner#0001"));
        assert!(!store.remove_admin("owner#0001"));

        assert!(store.add_admin("helper#1234"));
        assert!(!store.add_admin("helper#1234"));
        assert!(store.is_admin("helper#1234"));
        assert!(store.remove_admin("helper#1234"));
        assert!(!store.is_admin("helper#1234"));
    }

    #[test]
    fn module_codes_are_unique_and_uppercased() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let module = Module::new("Theoretical CS".to_string(), 10, 20);
        assert!(store.add_module("cos1501", module.clone()));
        assert!(!store.add_module("COS1501", module));

        assert!(store.module_exists("Cos1501"));
        let (code, found) = store.module_by_role(10).unwrap();
        assert_eq!("COS1501", code);
        assert_eq!(20, found.get_category_id());

        assert!(store.remove_module("cos1501"));
        assert!(!store.remove_module("cos1501"));
    }

    #[test]
    fn event_keys_disambiguate_same_day_entries() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let first = store.add_event("cos1501", "2026-09-01", "Assignment 1").unwrap();
        let second = store.add_event("COS1501", "2026-09-01", "Assignment 2").unwrap();
        assert_ne!(first, second);
        assert_eq!(2, store.events_for("cos1501").len());

        let found = store.find_event("cos1501", "2026-09-01").unwrap();
        assert!(store.remove_event(&found));
        assert_eq!(1, store.events().len());
    }

    #[test]
    fn event_keys_are_not_reused_after_removal() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let first = store.add_event("cos1501", "2026-09-01", "Assignment 1").unwrap();
        let second = store.add_event("cos1501", "2026-09-01", "Assignment 2").unwrap();
        assert!(store.remove_event(&first));

        // The freed suffix must not come back and clobber the survivor.
        let third = store.add_event("cos1501", "2026-09-01", "Assignment 3").unwrap();
        assert_ne!(second, third);
        assert_eq!(2, store.events().len());
    }

    #[test]
    fn ticket_counter_is_monotonic_per_guild() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        for expected in 1..=3u64 {
            store
                .update_guild_config(42, |c| c.ticket_counter += 1)
                .unwrap();
            assert_eq!(expected, store.guild_config(42).ticket_counter);
        }

        // Closing a ticket never hands the number back.
        store
            .update_guild_config(42, |c| {
                c.open_tickets.clear();
            })
            .unwrap();
        assert_eq!(3, store.guild_config(42).ticket_counter);
    }

    #[test]
    fn guild_configs_do_not_leak_across_guilds() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        store
            .update_guild_config(1, |c| c.log_channel_id = Some(111))
            .unwrap();
        store
            .update_guild_config(2, |c| c.ticket_counter = 9)
            .unwrap();

        assert_eq!(Some(111), store.guild_config(1).log_channel_id);
        assert_eq!(0, store.guild_config(1).ticket_counter);
        assert_eq!(None, store.guild_config(2).log_channel_id);

        let mut ids = store.guild_ids();
        ids.sort_unstable();
        assert_eq!(vec![1, 2], ids);
    }

    #[test]
    fn user_module_list_has_no_duplicates() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        assert!(store.add_user_module(7, "cos1501"));
        assert!(!store.add_user_module(7, "COS1501"));
        assert_eq!(vec!["COS1501".to_string()], store.user_stats(7).modules);

        assert!(store.remove_user_module(7, "cos1501"));
        assert!(!store.remove_user_module(7, "cos1501"));
        assert!(store.user_stats(7).modules.is_empty());
    }

    #[test]
    fn ticket_owner_reverse_lookup() {
        let mut config = GuildConfig::default();
        config.open_tickets.insert("5".to_string(), 500);
        config.open_tickets.insert("6".to_string(), 600);

        assert_eq!(Some(5), config.ticket_owner(500));
        assert_eq!(None, config.ticket_owner(700));
    }

    #[test]
    fn forgetting_a_ticket_clears_both_maps() {
        let mut config = GuildConfig::default();
        config.open_tickets.insert("5".to_string(), 500);
        config.ticket_messages.insert("500".to_string(), 900);

        config.forget_ticket(5, 500);

        // The owner is free to open a new ticket again.
        assert_eq!(None, config.ticket_owner(500));
        assert!(config.open_tickets.is_empty());
        assert!(config.ticket_messages.is_empty());
    }
}
