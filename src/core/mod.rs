pub mod error;
pub mod types;

pub use error::{GraphError, Result};
pub use types::{
    AuthorizationAction, ChangeAction, CollectionChange, Identity, UNASSIGNED_IDENTITY,
};
