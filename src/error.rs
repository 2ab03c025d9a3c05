use thiserror::Error;

use crate::alloc::AllocError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum OwnerError {
    /// The owner holds no value.
    #[error("invalid access: owner is empty")]
    InvalidAccess,

    #[error(transparent)]
    Alloc(#[from] AllocError),
}
