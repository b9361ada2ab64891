//! localStorage adapter for the save-list

use choks_core::{KeyValueStore, StoreError};

use crate::js_error_message;

/// `window.localStorage`, looked up on every call so a page that blocks
/// storage only fails the operation that needs it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStore;

impl LocalStore {
    fn storage(&self) -> Result<web_sys::Storage, StoreError> {
        let window =
            web_sys::window().ok_or_else(|| StoreError::Unavailable("No window".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(js_error_message(&e)))?
            .ok_or_else(|| StoreError::Unavailable("No localStorage".to_string()))
    }
}

impl KeyValueStore for LocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StoreError::Unavailable(js_error_message(&e)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::Write(js_error_message(&e)))
    }
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use choks_core::{SaveList, SavedAnalysisRecord};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_save_list_persists_in_local_storage() {
        let key = "choksTestSavedAnalyses";
        LocalStore.set_item(key, "[]").unwrap();

        let list = SaveList::new(&LocalStore, key);
        list.append(SavedAnalysisRecord::new("a1", "Main St", chrono::Utc::now()))
            .unwrap();
        list.append(SavedAnalysisRecord::new("a2", "Harbor", chrono::Utc::now()))
            .unwrap();

        let ids: Vec<String> = list.records().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a1".to_string(), "a2".to_string()]);
    }
}
