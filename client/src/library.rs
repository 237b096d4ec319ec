//! Local script library: recent history, favorites and named saves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use scriptboost_api::models::GeneratedScript;

use crate::store::{KeyValueStore, StoreError};

const HISTORY_KEY: &str = "scriptboost_history";
const SAVED_KEY: &str = "scriptboost_saved_scripts";

pub const MAX_RECENT: usize = 50;
pub const MAX_SAVED: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptHistory {
    /// Newest first
    #[serde(default)]
    pub scripts: Vec<GeneratedScript>,
    #[serde(default)]
    pub total_generated: u64,
    #[serde(default)]
    pub last_generated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub favorite_scripts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedScript {
    pub id: String,
    pub name: String,
    pub script: GeneratedScript,
    pub created_at: DateTime<Utc>,
}

pub struct ScriptLibrary {
    store: Arc<dyn KeyValueStore>,
}

impl ScriptLibrary {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn history(&self) -> ScriptHistory {
        self.store
            .get(HISTORY_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(history) => Some(history),
                Err(e) => {
                    tracing::warn!(error = %e, "script history unreadable, starting fresh");
                    None
                }
            })
            .unwrap_or_default()
    }

    fn write_history(&self, history: &ScriptHistory) -> Result<(), StoreError> {
        self.store.set(HISTORY_KEY, serde_json::to_string(history)?)
    }

    // ========================================================================
    // Recent scripts
    // ========================================================================

    pub fn save(&self, script: &GeneratedScript) -> Result<(), StoreError> {
        let mut history = self.history();
        history.scripts.insert(0, script.clone());
        history.scripts.truncate(MAX_RECENT);
        history.total_generated += 1;
        history.last_generated = Some(Utc::now());
        self.write_history(&history)
    }

    pub fn list(&self) -> Vec<GeneratedScript> {
        self.history().scripts
    }

    pub fn get(&self, id: &str) -> Option<GeneratedScript> {
        self.history().scripts.into_iter().find(|s| s.id == id)
    }

    /// Replace the stored script with the same id; false if there is none
    pub fn update(&self, script: &GeneratedScript) -> Result<bool, StoreError> {
        let mut history = self.history();
        let Some(slot) = history.scripts.iter_mut().find(|s| s.id == script.id) else {
            return Ok(false);
        };
        *slot = script.clone();
        self.write_history(&history)?;
        Ok(true)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut history = self.history();
        history.scripts.retain(|s| s.id != id);
        history.favorite_scripts.retain(|f| f != id);
        self.write_history(&history)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(HISTORY_KEY)
    }

    /// Flip the favorite flag; returns the new state
    pub fn toggle_favorite(&self, id: &str) -> Result<bool, StoreError> {
        let mut history = self.history();
        let now_favorite = if history.favorite_scripts.iter().any(|f| f == id) {
            history.favorite_scripts.retain(|f| f != id);
            false
        } else {
            history.favorite_scripts.push(id.to_string());
            true
        };
        self.write_history(&history)?;
        Ok(now_favorite)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.history().favorite_scripts.iter().any(|f| f == id)
    }

    // ========================================================================
    // Named saves
    // ========================================================================

    pub fn list_saved(&self) -> Vec<SavedScript> {
        self.store
            .get(SAVED_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn write_saved(&self, items: &[SavedScript]) -> Result<(), StoreError> {
        self.store.set(SAVED_KEY, serde_json::to_string(items)?)
    }

    pub fn save_named(&self, name: &str, script: &GeneratedScript) -> Result<SavedScript, StoreError> {
        let id = if script.id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            script.id.clone()
        };
        let item = SavedScript {
            id,
            name: name.trim().to_string(),
            script: script.clone(),
            created_at: Utc::now(),
        };
        let mut items = self.list_saved();
        items.insert(0, item.clone());
        items.truncate(MAX_SAVED);
        self.write_saved(&items)?;
        Ok(item)
    }

    pub fn get_saved(&self, id: &str) -> Option<SavedScript> {
        self.list_saved().into_iter().find(|s| s.id == id)
    }

    pub fn rename_saved(&self, id: &str, name: &str) -> Result<bool, StoreError> {
        let mut items = self.list_saved();
        let Some(item) = items.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        item.name = name.trim().to_string();
        self.write_saved(&items)?;
        Ok(true)
    }

    pub fn delete_saved(&self, id: &str) -> Result<(), StoreError> {
        let mut items = self.list_saved();
        items.retain(|s| s.id != id);
        self.write_saved(&items)
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Pretty JSON of one script, or of the whole recent list
    pub fn export_json(&self, id: Option<&str>) -> Result<Option<String>, StoreError> {
        let json = match id {
            Some(id) => match self.get(id) {
                Some(script) => serde_json::to_string_pretty(&script)?,
                None => return Ok(None),
            },
            None => serde_json::to_string_pretty(&self.list())?,
        };
        Ok(Some(json))
    }
}
