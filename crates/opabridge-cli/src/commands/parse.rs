use crate::support::{client, exit_for};
use serde_json::json;
use std::path::PathBuf;

pub fn run(opa_path: Option<PathBuf>, file: PathBuf, json_output: bool) {
    let client = client(opa_path);
    let info = client.parse_module(&file).unwrap_or_else(|e| exit_for(&e));

    if json_output {
        let payload = json!({
            "file": file.display().to_string(),
            "package": info.package,
            "imports": info.imports,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!("opabridge parse {}", file.display());
        println!("  Package: {}", info.package);
        if info.imports.is_empty() {
            println!("  Imports: (none)");
        } else {
            println!("  Imports:");
            for import in &info.imports {
                println!("    {import}");
            }
        }
    }
}
