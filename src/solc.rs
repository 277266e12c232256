use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::TempDir;

/// Directory under the output dir where compiled ASTs are kept.
const AST_DIR: &str = "input_json";

/// Result of one `solc` invocation.
#[derive(Debug)]
pub struct SolcOutput {
    /// Exit code returned by `solc` (if it exited normally).
    pub exit_code: Option<i32>,

    /// Did `solc` succeed (exit status 0)?
    pub success: bool,

    pub stdout: String,
    pub stderr: String,

    /// How long the command ran.
    pub duration: Duration,
}

impl SolcOutput {
    /// Whatever the compiler complained about, stderr first.
    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// How to invoke the Solidity compiler. Shared by every file of a run.
#[derive(Debug, Clone)]
pub struct Solc {
    /// Executable name or path.
    pub solc: String,
    basepath: Option<String>,
    allow_paths: Vec<String>,
    remappings: Vec<String>,
}

impl Solc {
    pub fn new(solc: impl Into<String>) -> Self {
        Self {
            solc: solc.into(),
            basepath: None,
            allow_paths: Vec::new(),
            remappings: Vec::new(),
        }
    }

    pub fn with_basepath(mut self, basepath: Option<String>) -> Self {
        self.basepath = basepath;
        self
    }

    pub fn with_allow_paths(mut self, allow_paths: Vec<String>) -> Self {
        self.allow_paths = allow_paths;
        self
    }

    pub fn with_remappings(mut self, remappings: Vec<String>) -> Self {
        self.remappings = remappings;
        self
    }

    /// Compile `file` to its compact JSON AST.
    ///
    /// The AST is written to `<outdir>/input_json/<file name>/<file name>_json.ast`
    /// and kept there for inspection.
    pub fn compile_ast(&self, file: &Path, outdir: &Path) -> Result<Value> {
        let ast_file =
            ast_path(file, outdir).with_context(|| format!("{:?} has no file name", file))?;
        let ast_dir = outdir.join(AST_DIR).join(file.file_name().unwrap_or_default());
        fs::create_dir_all(&ast_dir)
            .with_context(|| format!("failed to create AST dir {:?}", ast_dir))?;

        let output = self.invoke(file, &ast_dir)?;
        if !output.success {
            anyhow::bail!(
                "`{}` failed to compile {:?} (exit code: {:?}): {}",
                self.solc,
                file,
                output.exit_code,
                output.diagnostics()
            );
        }

        read_ast_json(&ast_file)
    }

    /// Compile `file` into a scratch directory and report the outcome.
    pub fn check(&self, file: &Path) -> Result<SolcOutput> {
        let scratch = TempDir::new().context("failed to create temporary directory")?;
        self.invoke(file, scratch.path())
    }

    /// Does `file` compile? Failures to run `solc` at all count as "no".
    pub fn is_valid(&self, file: &Path) -> bool {
        match self.check(file) {
            Ok(output) => {
                if !output.success {
                    log::debug!(
                        "{:?} rejected by solc in {:?} (exit code: {:?}): {}",
                        file,
                        output.duration,
                        output.exit_code,
                        output.diagnostics()
                    );
                }
                output.success
            }
            Err(e) => {
                log::warn!("could not validate {:?}: {e:#}", file);
                false
            }
        }
    }

    /// First line of `solc --version` output that mentions the version.
    pub fn version(&self) -> Result<String> {
        let out = Command::new(&self.solc)
            .arg("--version")
            .output()
            .with_context(|| format!("failed to execute `{} --version`", self.solc))?;

        let text = String::from_utf8_lossy(&out.stdout).to_string();
        if !out.status.success() {
            anyhow::bail!("`{} --version` failed: {}", self.solc, text.trim());
        }

        let line = text
            .lines()
            .find(|l| l.starts_with("Version:"))
            .map(|l| l.trim_start_matches("Version:"))
            .or_else(|| text.lines().find(|l| !l.trim().is_empty()))
            .unwrap_or_default();
        Ok(line.trim().to_string())
    }

    fn invoke(&self, file: &Path, out_dir: &Path) -> Result<SolcOutput> {
        let flags = self.flags(file, out_dir);
        log::info!(
            "invoking `{} {}`",
            self.solc,
            flags
                .iter()
                .map(|f| f.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let start = Instant::now();
        let output = Command::new(&self.solc)
            .args(&flags)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to run `{}` on {:?}", self.solc, file))?;

        Ok(SolcOutput {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        })
    }

    fn flags(&self, file: &Path, out_dir: &Path) -> Vec<OsString> {
        let mut flags: Vec<OsString> = vec![
            "--ast-compact-json".into(),
            file.into(),
            "--output-dir".into(),
            out_dir.into(),
            "--overwrite".into(),
        ];

        if let Some(basepath) = &self.basepath {
            flags.push("--base-path".into());
            flags.push(basepath.into());
        }

        if !self.allow_paths.is_empty() {
            flags.push("--allow-paths".into());
            flags.push(self.allow_paths.join(",").into());
        }

        flags.extend(self.remappings.iter().map(OsString::from));
        flags
    }
}

/// Parse a compact JSON AST file.
pub fn read_ast_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read AST {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse AST {:?}", path))
}

/// Path of the AST file `compile_ast` leaves behind for `file`.
pub fn ast_path(file: &Path, outdir: &Path) -> Option<PathBuf> {
    let file_name = file.file_name()?;
    let mut ast_name = file_name.to_os_string();
    ast_name.push("_json.ast");
    Some(outdir.join(AST_DIR).join(file_name).join(ast_name))
}
