use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;
pub use std::collections::{BTreeMap, BTreeSet, hash_map, hash_set};

pub type HashMap<K, V> = std::collections::HashMap<K, V, BuildHasherDefault<FxHasher>>;
pub type HashSet<T> = std::collections::HashSet<T, BuildHasherDefault<FxHasher>>;
