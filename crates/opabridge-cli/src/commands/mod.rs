pub mod data_root;
pub mod format_ref;
pub mod parse;
pub mod version;
