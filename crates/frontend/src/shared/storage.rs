//! Хранение черновика заказа в localStorage браузера.

use contracts::domain::a005_rental_order::{DraftResult, DraftStorage, OrderDraftError};
use web_sys::{window, Storage};

#[derive(Debug, Clone)]
pub struct LocalDraftStorage {
    key: String,
}

impl LocalDraftStorage {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> DraftResult<Storage> {
        window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or_else(|| OrderDraftError::Storage("localStorage is not available".to_string()))
    }
}

impl DraftStorage for LocalDraftStorage {
    fn load(&self) -> DraftResult<Option<String>> {
        Self::storage()?
            .get_item(&self.key)
            .map_err(|e| OrderDraftError::Storage(format!("{e:?}")))
    }

    fn save(&mut self, value: &str) -> DraftResult<()> {
        Self::storage()?
            .set_item(&self.key, value)
            .map_err(|e| OrderDraftError::Storage(format!("{e:?}")))
    }

    fn clear(&mut self) -> DraftResult<()> {
        Self::storage()?
            .remove_item(&self.key)
            .map_err(|e| OrderDraftError::Storage(format!("{e:?}")))
    }
}
