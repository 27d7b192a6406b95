use crate::support::{client, exit_for};
use opabridge_version::{BUNDLE_FLAGS_MIN_VERSION, supports_bundle_flags};
use serde_json::json;
use std::path::PathBuf;

pub fn run(opa_path: Option<PathBuf>, json_output: bool) {
    let client = client(opa_path);
    let installed = client.installed_version().unwrap_or_else(|e| exit_for(&e));
    let bundle = supports_bundle_flags(&installed);

    if json_output {
        let payload = json!({
            "installed": installed,
            "supportsBundleFlags": bundle,
            "bundleFlagsMinVersion": BUNDLE_FLAGS_MIN_VERSION,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!("opabridge version");
        println!(
            "  Installed: {}",
            if installed.is_empty() {
                "(unknown)"
            } else {
                installed.as_str()
            }
        );
        println!("  Bundle flags: {}", if bundle { "yes" } else { "no" });
    }
}
