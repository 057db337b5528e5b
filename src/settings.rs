use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::models::{GroupSize, Strategy};

pub const KEY_POSTS_PER_GROUP: &str = "posts_per_group";
pub const KEY_STRATEGY: &str = "strategy";
pub const KEY_THEME: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeChoice {
    #[default]
    Light,
    Dark,
}

impl ThemeChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeChoice::Light => "light",
            ThemeChoice::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ThemeChoice::Light => ThemeChoice::Dark,
            ThemeChoice::Dark => ThemeChoice::Light,
        }
    }
}

impl FromStr for ThemeChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemeChoice::Light),
            "dark" => Ok(ThemeChoice::Dark),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

/// Preferences that survive restarts.
///
/// | key               | values           | default    |
/// |-------------------|------------------|------------|
/// | `posts_per_group` | `1`..=`3`        | `2`        |
/// | `strategy`        | `relevant`/`new` | `relevant` |
/// | `theme`           | `light`/`dark`   | `light`    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub posts_per_group: GroupSize,
    pub strategy: Strategy,
    pub theme: ThemeChoice,
}

/// Key/value preference table in SQLite.
#[derive(Clone)]
pub struct SettingsStore {
    conn: Arc<Mutex<Connection>>,
}

impl SettingsStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened settings database");
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Reads every preference; missing or unreadable values fall back to the default.
    pub fn load(&self) -> Result<Settings> {
        let defaults = Settings::default();

        let posts_per_group = match self.get_raw(KEY_POSTS_PER_GROUP)? {
            Some(raw) => match raw.parse::<usize>().ok().and_then(GroupSize::new) {
                Some(size) => size,
                None => {
                    warn!(key = KEY_POSTS_PER_GROUP, value = %raw, "ignoring invalid setting");
                    defaults.posts_per_group
                }
            },
            None => defaults.posts_per_group,
        };

        Ok(Settings {
            posts_per_group,
            strategy: self.get_parsed(KEY_STRATEGY, defaults.strategy)?,
            theme: self.get_parsed(KEY_THEME, defaults.theme)?,
        })
    }

    pub fn set_posts_per_group(&self, size: GroupSize) -> Result<()> {
        self.put_raw(KEY_POSTS_PER_GROUP, &size.get().to_string())
    }

    pub fn set_strategy(&self, strategy: Strategy) -> Result<()> {
        self.put_raw(KEY_STRATEGY, strategy.as_str())
    }

    pub fn set_theme(&self, theme: ThemeChoice) -> Result<()> {
        self.put_raw(KEY_THEME, theme.as_str())
    }

    fn get_parsed<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr<Err = String>,
    {
        Ok(match self.get_raw(key)? {
            Some(raw) => raw.parse::<T>().unwrap_or_else(|e| {
                warn!(key, error = %e, "ignoring invalid setting");
                default
            }),
            None => default,
        })
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().map_err(|_| anyhow!("Failed to lock settings connection"))?;
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| anyhow!("Failed to lock settings connection"))?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}
