use hashbrown::HashMap;

use crate::types::RowId;

/// Row ids grouped under an index key.
pub type VecIndex<K> = HashMap<K, Vec<RowId>>;
