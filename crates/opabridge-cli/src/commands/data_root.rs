use crate::support::{client, exit_for};
use std::path::PathBuf;

pub fn run(opa_path: Option<PathBuf>, dir: PathBuf) {
    let client = client(opa_path);
    let root = client.data_root(&dir).unwrap_or_else(|e| exit_for(&e));
    println!("{root}");
}
