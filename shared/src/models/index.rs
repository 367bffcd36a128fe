//! Index description returned by `ensure_indexes`

use serde::{Deserialize, Serialize};

/// Secondary index defined on the product table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    /// Store-native definition statement
    pub definition: String,
}
