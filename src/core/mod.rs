pub mod error;

pub use error::{
    InventoryError, ObjectiveError, PersistError, PurchaseError, TaskError, VerifyError,
};
