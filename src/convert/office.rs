//! Headless LibreOffice integration for office and HTML documents

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Hard limit per conversion; large decks can take a while
const CONVERT_TIMEOUT: Duration = Duration::from_secs(120);

/// Executable names tried, in order.
#[cfg(target_os = "windows")]
const CANDIDATE_NAMES: &[&str] = &["soffice.exe", "libreoffice.exe", "soffice.com"];
#[cfg(not(target_os = "windows"))]
const CANDIDATE_NAMES: &[&str] = &["libreoffice", "soffice"];

/// Platform-specific install directories checked after PATH.
fn search_directories() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        for var in ["PROGRAMFILES", "PROGRAMFILES(X86)"] {
            if let Ok(base) = std::env::var(var) {
                dirs.push(PathBuf::from(base).join("LibreOffice").join("program"));
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/Applications/LibreOffice.app/Contents/MacOS"));
        dirs.push(PathBuf::from("/opt/homebrew/bin"));
        dirs.push(PathBuf::from("/usr/local/bin"));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        dirs.push(PathBuf::from("/usr/bin"));
        dirs.push(PathBuf::from("/usr/local/bin"));
        dirs.push(PathBuf::from("/opt/libreoffice/program"));
        dirs.push(PathBuf::from("/snap/bin"));
    }

    dirs
}

/// Search PATH for one of the candidate executables.
fn find_in_path() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        for name in CANDIDATE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// A located LibreOffice installation.
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    executable: PathBuf,
}

impl OfficeConverter {
    /// Locate LibreOffice: PATH first, then the usual install directories.
    pub fn locate() -> Result<Self> {
        if let Some(executable) = find_in_path() {
            debug!(path = %executable.display(), "found LibreOffice in PATH");
            return Ok(Self { executable });
        }

        for dir in search_directories() {
            if !dir.is_dir() {
                continue;
            }
            for name in CANDIDATE_NAMES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    debug!(path = %candidate.display(), "found LibreOffice install");
                    return Ok(Self { executable: candidate });
                }
            }
        }

        Err(Error::ConverterNotFound)
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// First line of `soffice --version`.
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.executable)
            .arg("--version")
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(Error::General(format!(
                "{} --version exited with {}",
                self.executable.display(),
                output.status
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or("unknown").trim().to_string())
    }

    /// Convert `input` to PDF, writing `<stem>.pdf` into `out_dir`.
    /// Returns the path of the produced PDF.
    pub fn convert_to_pdf(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        if !input.exists() {
            return Err(Error::FileNotFound(input.to_path_buf()));
        }
        std::fs::create_dir_all(out_dir)?;

        debug!(input = %input.display(), out_dir = %out_dir.display(), "invoking LibreOffice");

        let mut command = Command::new(&self.executable);
        command
            .arg("--headless")
            .arg("--invisible")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(input);

        let (status, stderr) = match run_with_timeout(command, CONVERT_TIMEOUT)? {
            Some(result) => result,
            None => {
                warn!(input = %input.display(), "conversion timed out, killing soffice");
                return Err(Error::ConversionTimeout {
                    path: input.to_path_buf(),
                    seconds: CONVERT_TIMEOUT.as_secs(),
                });
            }
        };

        if !status.success() {
            return Err(Error::Conversion {
                path: input.to_path_buf(),
                reason: format!("LibreOffice exited with {status}: {}", stderr.trim()),
            });
        }

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let produced = out_dir.join(format!("{stem}.pdf"));
        if !produced.exists() {
            return Err(Error::Conversion {
                path: input.to_path_buf(),
                reason: "LibreOffice reported success but produced no PDF".to_string(),
            });
        }

        Ok(produced)
    }
}

/// Run a command to completion with a hard timeout, returning its exit
/// status and captured stderr, or `None` if the child had to be killed.
///
/// Stderr is drained on a background thread while the poll loop runs; soffice
/// can emit more diagnostics than a pipe buffer holds, and an undrained pipe
/// would block the child forever. Stdout is discarded.
fn run_with_timeout(
    mut command: Command,
    timeout: Duration,
) -> Result<Option<(std::process::ExitStatus, String)>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    let stderr_reader = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            use std::io::Read;
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            buf
        })
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            None => std::thread::sleep(Duration::from_millis(100)),
        }
    };

    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    Ok(Some((status, stderr)))
}

/// Platform-specific install guidance for the `check` command.
pub fn install_instructions() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        "Download LibreOffice from https://www.libreoffice.org/download/ and run the installer."
    }
    #[cfg(target_os = "macos")]
    {
        "Install LibreOffice from https://www.libreoffice.org/download/ or `brew install --cask libreoffice`."
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        "Install LibreOffice with your package manager, e.g. `apt install libreoffice`, \
         `dnf install libreoffice`, or `snap install libreoffice`."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_directories_are_absolute() {
        for dir in search_directories() {
            assert!(dir.is_absolute(), "{}", dir.display());
        }
    }

    #[test]
    #[cfg(unix)]
    fn chatty_child_stderr_does_not_deadlock() {
        // Writes well past a pipe buffer's worth of stderr before exiting
        let mut cmd = Command::new("sh");
        cmd.args([
            "-c",
            "i=0; while [ $i -lt 300 ]; do printf '%01024d' 0 >&2; i=$((i+1)); done; exit 3",
        ]);
        let (status, stderr) = run_with_timeout(cmd, Duration::from_secs(60))
            .unwrap()
            .expect("child should finish, not time out");
        assert_eq!(status.code(), Some(3));
        assert!(stderr.len() >= 300 * 1024, "stderr was truncated: {}", stderr.len());
    }

    #[test]
    #[cfg(unix)]
    fn wedged_child_is_killed_on_timeout() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let result = run_with_timeout(cmd, Duration::from_millis(300)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn convert_missing_input_fails_fast() {
        // Only meaningful where LibreOffice is installed
        let Ok(converter) = OfficeConverter::locate() else {
            eprintln!("skipping: LibreOffice not installed");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let err = converter
            .convert_to_pdf(Path::new("/no/such/file.docx"), dir.path())
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
