use opabridge_invoke::{BinaryConfig, InstallPrompt, InvokeError, OpaClient};
use std::path::PathBuf;

const OPA_PATH_ENV: &str = "OPABRIDGE_OPA_PATH";

/// Override path resolved from the `--opa-path` flag or the environment,
/// re-read on every lookup.
#[derive(Debug, Clone)]
pub struct CliBinaryConfig {
    flag: Option<PathBuf>,
}

impl BinaryConfig for CliBinaryConfig {
    fn configured_path(&self) -> Option<PathBuf> {
        self.flag
            .clone()
            .or_else(|| std::env::var_os(OPA_PATH_ENV).map(PathBuf::from))
    }
}

/// Install hint printed to stderr when no binary can be found.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrPrompt;

impl InstallPrompt for StderrPrompt {
    fn binary_missing(&self, binary: &str) {
        eprintln!("`{binary}` was not found; see https://www.openpolicyagent.org/docs/ for install instructions");
    }
}

pub fn client(opa_path: Option<PathBuf>) -> OpaClient<CliBinaryConfig, StderrPrompt> {
    OpaClient::with_collaborators(CliBinaryConfig { flag: opa_path }, StderrPrompt)
}

pub fn exit_for(err: &InvokeError) -> ! {
    // A missing binary already printed its install hint; stay quiet then.
    if !matches!(err, InvokeError::BinaryNotFound(_)) {
        eprintln!("error: {err}");
    }
    std::process::exit(1);
}
