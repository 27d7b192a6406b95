//! Subprocess bridge to the OPA CLI.
//!
//! This crate is intentionally thin: it locates the `opa` binary, runs it
//! one blocking round trip at a time, classifies the outcome from exit
//! status, and layers the version-dependent invocation decisions on top.
//! Nothing is cached: the configured override path is re-read and the
//! installed version re-queried on every call, so an upgraded binary takes
//! effect on the next call without a restart.

use serde::Deserialize;
use serde_json::Value;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use opabridge_refs::{RefSegment, format_ref};
use opabridge_version::{BUNDLE_FLAGS_MIN_VERSION, same_or_newer};

/// Errors from locating or running the OPA binary.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// Neither PATH nor the configured override resolves to a real file.
    #[error("`{0}` executable is not available (not on PATH, no configured location)")]
    BinaryNotFound(String),

    /// Non-zero exit; the message is stdout when non-empty, else stderr.
    #[error("command failed: {message}")]
    CommandFailed { message: String },

    /// Exit zero but the output was not the expected JSON document.
    #[error("unable to decode tool output: {0}")]
    Decode(String),

    /// The child outlived the configured timeout and was killed.
    #[error("subprocess did not exit within {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },

    /// Spawn or pipe plumbing failure.
    #[error("subprocess i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-side configuration: where the user pinned the binary, if anywhere.
///
/// Queried on every call rather than captured once, matching the no-cache
/// contract.
pub trait BinaryConfig {
    fn configured_path(&self) -> Option<PathBuf>;
}

/// Collaborator notified when no usable binary can be found, typically a
/// UI prompt offering to install the tool.
pub trait InstallPrompt {
    fn binary_missing(&self, binary: &str);
}

/// `BinaryConfig` with no override set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverride;

impl BinaryConfig for NoOverride {
    fn configured_path(&self) -> Option<PathBuf> {
        None
    }
}

/// `InstallPrompt` that stays quiet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl InstallPrompt for NoPrompt {
    fn binary_missing(&self, _binary: &str) {}
}

/// Raw outcome of one subprocess round trip.
#[derive(Debug, Clone)]
pub struct RawRun {
    /// Exit code; `-1` when the child was killed by a signal.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RawRun {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Package and import projection of one parsed policy module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInfo {
    pub package: String,
    pub imports: Vec<String>,
}

/// Thin client around the OPA CLI.
#[derive(Debug, Clone)]
pub struct OpaClient<C = NoOverride, P = NoPrompt> {
    binary: String,
    config: C,
    prompt: P,
    timeout: Option<Duration>,
}

impl OpaClient {
    /// Client for the default `opa` binary with no override and no prompt.
    pub fn new() -> Self {
        Self::with_collaborators(NoOverride, NoPrompt)
    }
}

impl Default for OpaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: BinaryConfig, P: InstallPrompt> OpaClient<C, P> {
    /// Client wired to explicit config and install-prompt collaborators.
    pub fn with_collaborators(config: C, prompt: P) -> Self {
        Self {
            binary: "opa".to_string(),
            config,
            prompt,
            timeout: None,
        }
    }

    /// Use a different executable name for PATH discovery.
    pub fn with_binary(mut self, name: impl Into<String>) -> Self {
        self.binary = name.into();
        self
    }

    /// Kill the child and fail the call when it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve the executable to run.
    ///
    /// An override that exists as a file wins over PATH discovery. When
    /// neither resolves, the install-prompt collaborator is notified and a
    /// distinct `BinaryNotFound` error is returned, so callers are never
    /// left without an answer.
    pub fn locate(&self) -> Result<PathBuf, InvokeError> {
        if let Some(path) = self.config.configured_path() {
            if path.is_file() {
                return Ok(path);
            }
            debug!(path = %path.display(), "configured override is not a file, trying PATH");
        }
        match which::which(&self.binary) {
            Ok(path) => Ok(path),
            Err(_) => {
                self.prompt.binary_missing(&self.binary);
                Err(InvokeError::BinaryNotFound(self.binary.clone()))
            }
        }
    }

    /// One blocking round trip: spawn, deliver stdin, drain both output
    /// streams, wait for exit.
    ///
    /// Failure of the tool itself is conveyed via the exit code, never as
    /// an error from this call.
    pub fn run_with_status(&self, args: &[&str], stdin: &str) -> Result<RawRun, InvokeError> {
        let program = self.locate()?;
        debug!(program = %program.display(), ?args, "spawning");

        let mut child = Command::new(&program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Both output pipes must be draining before any stdin is written:
        // a child that fills its output pipe while the parent is still
        // blocked in `write_all` wedges both processes. The protocol is
        // strictly one-shot, never interactive, so input is delivered in
        // full from its own thread and the stream closed. A child that
        // exits without reading its input is classified by exit status,
        // not treated as a plumbing failure.
        let stdout = drain_on_thread(child.stdout.take());
        let stderr = drain_on_thread(child.stderr.take());
        let feeder = child.stdin.take().map(|mut sink| {
            let input = stdin.to_owned();
            thread::spawn(move || match sink.write_all(input.as_bytes()) {
                Err(err) if err.kind() != std::io::ErrorKind::BrokenPipe => Err(err),
                _ => Ok(()),
            })
        });

        let status = self.wait(&mut child)?;
        let stdout = join_drain(stdout)?;
        let stderr = join_drain(stderr)?;
        if let Some(feeder) = feeder {
            feeder
                .join()
                .map_err(|_| std::io::Error::other("stdin writer thread panicked"))??;
        }

        let code = status.code().unwrap_or(-1);
        debug!(code, "child exited");
        Ok(RawRun {
            code,
            stdout,
            stderr,
        })
    }

    /// Run and classify: exit zero decodes stdout as JSON; non-zero yields
    /// the failure message the tool reported — stdout when non-empty, else
    /// stderr (OPA writes structured error detail to stdout).
    pub fn run(&self, args: &[&str], stdin: &str) -> Result<Value, InvokeError> {
        let raw = self.run_with_status(args, stdin)?;
        if raw.success() {
            return serde_json::from_str(&raw.stdout).map_err(|e| InvokeError::Decode(e.to_string()));
        }
        let channel = if raw.stdout.is_empty() {
            &raw.stderr
        } else {
            &raw.stdout
        };
        Err(InvokeError::CommandFailed {
            message: channel.trim_end().to_string(),
        })
    }

    /// Version string reported by `opa version`, or empty when the query
    /// exits non-zero or reports no `Version` line.
    pub fn installed_version(&self) -> Result<String, InvokeError> {
        let raw = self.run_with_status(&["version"], "")?;
        if !raw.success() {
            return Ok(String::new());
        }
        Ok(version_from_output(&raw.stdout).unwrap_or_default())
    }

    /// Whether the installed binary accepts the bundle-style flags.
    ///
    /// Recomputed on every call; an unparseable installed version counts as
    /// new enough.
    pub fn supports_bundle_flags(&self) -> Result<bool, InvokeError> {
        let installed = self.installed_version()?;
        Ok(same_or_newer(&installed, BUNDLE_FLAGS_MIN_VERSION))
    }

    /// Canonical data-root representation for the installed version: the
    /// plain path for bundle-capable binaries, a `file://` URI otherwise.
    pub fn data_root(&self, dir: &Path) -> Result<String, InvokeError> {
        if self.supports_bundle_flags()? {
            Ok(dir.display().to_string())
        } else {
            Ok(format!("file://{}", dir.display()))
        }
    }

    /// Parse one policy module and project its declared package and import
    /// list.
    pub fn parse_module(&self, path: &Path) -> Result<ModuleInfo, InvokeError> {
        let file = path.display().to_string();
        let tree = self.run(&["parse", &file, "--format", "json"], "")?;
        module_info_from_tree(&tree)
    }

    // Block until exit; with a timeout configured, poll the child and kill
    // it once the deadline passes.
    fn wait(&self, child: &mut Child) -> Result<ExitStatus, InvokeError> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                child.kill()?;
                child.wait()?;
                return Err(InvokeError::TimedOut {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

type Drain = Option<thread::JoinHandle<std::io::Result<Vec<u8>>>>;

fn drain_on_thread<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn join_drain(handle: Drain) -> Result<String, InvokeError> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| std::io::Error::other("output reader thread panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// First `Version: <v>` pair in line-oriented `Key: Value` output.
fn version_from_output(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter_map(|line| line.split_once(": "))
        .find(|(key, _)| *key == "Version")
        .map(|(_, value)| value.to_string())
}

#[derive(Deserialize)]
struct ParsedModule {
    package: ParsedPackage,
    #[serde(default)]
    imports: Vec<ParsedImport>,
}

#[derive(Deserialize)]
struct ParsedPackage {
    path: Vec<RefSegment>,
}

#[derive(Deserialize)]
struct ParsedImport {
    path: ParsedRef,
}

#[derive(Deserialize)]
struct ParsedRef {
    value: Vec<RefSegment>,
}

// The package path always begins with the `data` root var; the display
// name drops it. Import paths render whole.
fn module_info_from_tree(tree: &Value) -> Result<ModuleInfo, InvokeError> {
    let module: ParsedModule =
        serde_json::from_value(tree.clone()).map_err(|e| InvokeError::Decode(e.to_string()))?;

    let package_path = match module.package.path.split_first() {
        Some((RefSegment::Var(root), rest)) if root == "data" => rest,
        _ => module.package.path.as_slice(),
    };
    let package = format_ref(package_path).map_err(|e| InvokeError::Decode(e.to_string()))?;

    let imports = module
        .imports
        .iter()
        .map(|import| format_ref(&import.path.value))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| InvokeError::Decode(e.to_string()))?;

    Ok(ModuleInfo { package, imports })
}
