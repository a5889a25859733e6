use super::aggregate::WizardStep;
use crate::domain::a002_product::ProductId;
use crate::domain::a003_rental_asset::AssetId;
use thiserror::Error;

/// Ошибки операций над черновиком заказа.
///
/// Ошибки валидации полей сюда не попадают: валидаторы возвращают их как
/// данные (`FieldErrors`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderDraftError {
    #[error("Step {} has validation errors", .0.number())]
    StepInvalid(WizardStep),

    #[error("Step {} is not reachable yet", .0.number())]
    StepNotReachable(WizardStep),

    #[error("Already at the first step")]
    AtFirstStep,

    #[error("Already at the last step")]
    AtLastStep,

    #[error("Order can only be submitted from the confirmation step")]
    NotAtTerminalStep,

    #[error("Order submission is already in progress")]
    SubmissionInProgress,

    #[error("Product {0} is already in the order")]
    DuplicateLineItem(ProductId),

    #[error("Product {0} is not in the order")]
    LineItemNotFound(ProductId),

    #[error("Quantity of product {0} is defined by its selected assets")]
    QuantityDrivenByAssets(ProductId),

    #[error("Product {0} does not track individual assets")]
    AssetsNotTracked(ProductId),

    #[error("Asset {0} is not in the available pool for this product")]
    AssetNotInPool(AssetId),

    #[error("Asset {asset_id} is not available (status: {status})")]
    AssetUnavailable { asset_id: AssetId, status: String },

    #[error("Asset {asset_id} is already assigned to product {holder}")]
    AssetHeldByOtherLine { asset_id: AssetId, holder: ProductId },

    #[error("Asset {0} is not selected for this product")]
    AssetNotSelected(AssetId),

    #[error("Route {0} is not among the suggested routes")]
    UnknownRoute(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for OrderDraftError {
    fn from(err: serde_json::Error) -> Self {
        OrderDraftError::Serialization(err.to_string())
    }
}

/// Result type for draft operations.
pub type DraftResult<T> = Result<T, OrderDraftError>;
