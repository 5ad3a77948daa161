pub mod value_tree;

pub use value_tree::{deep_merge, exists_at, get_at, remove_at, set_at};
