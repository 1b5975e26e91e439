//! Running the external TeX toolchain.
//!
//! [`TexCompiler`] writes a rendered document to disk, runs the configured
//! compiler next to it, removes the transient build files and opens the
//! resulting PDF. Only a failing compiler is an error; a viewer that cannot
//! be started is logged and ignored.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::Command,
};

use log::{debug, info, warn};
use tempfile::NamedTempFile;

use crate::{config::CompilerConfig, error::PlotnetError};

#[cfg(target_os = "macos")]
const DEFAULT_VIEWER: &str = "open";
#[cfg(target_os = "windows")]
const DEFAULT_VIEWER: &str = "explorer";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const DEFAULT_VIEWER: &str = "xdg-open";

/// Drives the external TeX compiler for one document at a time.
#[derive(Debug, Clone, Default)]
pub struct TexCompiler {
    config: CompilerConfig,
}

impl TexCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Writes `content` to `path`.
    ///
    /// The text goes to a temporary file in the same directory first, which
    /// then replaces `path`, so a reader never sees a partial document.
    ///
    /// # Errors
    ///
    /// Returns [`PlotnetError::Io`] if the file cannot be written or moved.
    pub fn write_tex(&self, path: &Path, content: &str) -> Result<(), PlotnetError> {
        let mut file = NamedTempFile::new_in(directory_of(path))?;
        file.write_all(content.as_bytes())?;
        file.persist(path).map_err(|err| PlotnetError::Io(err.error))?;

        debug!(path:? = path, bytes = content.len(); "Document written");
        Ok(())
    }

    /// Runs the compiler on `tex` inside its directory and returns the path
    /// of the produced PDF.
    ///
    /// # Errors
    ///
    /// Returns [`PlotnetError::Tool`], carrying the compiler's combined
    /// output, when it exits unsuccessfully, or [`PlotnetError::Io`] when it
    /// cannot be started.
    pub fn compile(&self, tex: &Path) -> Result<PathBuf, PlotnetError> {
        let file_name = tex.file_name().ok_or_else(|| {
            PlotnetError::Config(format!("`{}` does not name a file", tex.display()))
        })?;
        let program = self.config.program();

        info!(program, file:? = tex; "Compiling document");
        let output = Command::new(program)
            .args(self.config.args())
            .arg(file_name)
            .current_dir(directory_of(tex))
            .output()?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(PlotnetError::Tool {
                program: program.to_string(),
                status: output.status,
                output: combined,
            });
        }

        Ok(tex.with_extension("pdf"))
    }

    /// Deletes the configured transient files sharing the stem of `tex`.
    /// Files that do not exist are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PlotnetError::Io`] if an existing file cannot be removed.
    pub fn clean(&self, tex: &Path) -> Result<(), PlotnetError> {
        for extension in self.config.clean_extensions() {
            let path = tex.with_extension(extension);
            match fs::remove_file(&path) {
                Ok(()) => debug!(path:? = path; "Removed build file"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Compiles `tex`, then cleans up unless the configuration keeps the
    /// build files.
    ///
    /// # Errors
    ///
    /// See [`TexCompiler::compile`] and [`TexCompiler::clean`].
    pub fn build(&self, tex: &Path) -> Result<PathBuf, PlotnetError> {
        let pdf = self.compile(tex)?;
        if self.config.clean() {
            self.clean(tex)?;
        }
        Ok(pdf)
    }

    /// Opens `pdf` with the configured viewer, or the platform default.
    ///
    /// The viewer is started in the background and not waited for. Failure to
    /// start it is logged as a warning and otherwise ignored.
    pub fn open_viewer(&self, pdf: &Path) {
        let program = self.config.viewer().unwrap_or(DEFAULT_VIEWER);
        match Command::new(program).arg(pdf).spawn() {
            Ok(child) => debug!(program, pid = child.id(); "Viewer started"),
            Err(err) => warn!(program, err:err; "Failed to start viewer"),
        }
    }
}

fn directory_of(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> TexCompiler {
        TexCompiler::new(
            CompilerConfig::new("sh").with_args(vec![
                "-c".to_string(),
                script.to_string(),
                "sh".to_string(),
            ]),
        )
    }

    #[test]
    fn test_write_tex_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.tex");
        let compiler = TexCompiler::default();

        compiler.write_tex(&path, "first").unwrap();
        compiler.write_tex(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_tex_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("net.tex");
        let err = TexCompiler::default().write_tex(&path, "x").unwrap_err();
        assert!(matches!(err, PlotnetError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_compile_runs_in_document_directory() {
        let dir = tempfile::tempdir().unwrap();
        let tex = dir.path().join("net.tex");
        fs::write(&tex, "").unwrap();

        let compiler = shell("touch \"${1%.tex}.pdf\" \"${1%.tex}.aux\"");
        let pdf = compiler.compile(&tex).unwrap();

        assert_eq!(pdf, dir.path().join("net.pdf"));
        assert!(pdf.exists());
        assert!(dir.path().join("net.aux").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_compile_failure_carries_output() {
        let dir = tempfile::tempdir().unwrap();
        let tex = dir.path().join("net.tex");

        let err = shell("echo 'Undefined control sequence'; echo oops >&2; exit 3")
            .compile(&tex)
            .unwrap_err();

        match err {
            PlotnetError::Tool {
                program,
                status,
                output,
            } => {
                assert_eq!(program, "sh");
                assert_eq!(status.code(), Some(3));
                assert!(output.contains("Undefined control sequence"));
                assert!(output.contains("oops"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_compile_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let tex = dir.path().join("net.tex");
        let compiler = TexCompiler::new(CompilerConfig::new("plotnet-no-such-compiler"));
        assert!(matches!(compiler.compile(&tex).unwrap_err(), PlotnetError::Io(_)));
    }

    #[test]
    fn test_clean_removes_configured_extensions_only() {
        let dir = tempfile::tempdir().unwrap();
        let tex = dir.path().join("net.tex");
        for name in ["net.tex", "net.aux", "net.pdf", "other.log"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        TexCompiler::default().clean(&tex).unwrap();

        assert!(tex.exists());
        assert!(dir.path().join("net.pdf").exists());
        assert!(dir.path().join("other.log").exists());
        assert!(!dir.path().join("net.aux").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_build_respects_clean_flag() {
        let dir = tempfile::tempdir().unwrap();
        let tex = dir.path().join("net.tex");
        let script = "touch \"${1%.tex}.pdf\" \"${1%.tex}.log\"";

        shell(script).build(&tex).unwrap();
        assert!(!dir.path().join("net.log").exists());

        let keep = TexCompiler::new(shell(script).config().clone().with_clean(false));
        keep.build(&tex).unwrap();
        assert!(dir.path().join("net.log").exists());
    }

    #[test]
    fn test_open_viewer_failure_is_not_fatal() {
        let compiler =
            TexCompiler::new(CompilerConfig::default().with_viewer("plotnet-no-such-viewer"));
        compiler.open_viewer(Path::new("net.pdf"));
    }

    #[cfg(unix)]
    #[test]
    fn test_open_viewer_does_not_wait() {
        let dir = tempfile::tempdir().unwrap();
        let viewer = dir.path().join("viewer.sh");
        fs::write(&viewer, "#!/bin/sh\nsleep 5\n").unwrap();
        let mut permissions = fs::metadata(&viewer).unwrap().permissions();
        std::os::unix::fs::PermissionsExt::set_mode(&mut permissions, 0o755);
        fs::set_permissions(&viewer, permissions).unwrap();

        let compiler = TexCompiler::new(
            CompilerConfig::default().with_viewer(viewer.to_string_lossy().into_owned()),
        );
        let started = std::time::Instant::now();
        compiler.open_viewer(Path::new("net.pdf"));
        assert!(started.elapsed() < std::time::Duration::from_secs(4));
    }

    #[test]
    fn test_directory_of_bare_file_name() {
        assert_eq!(directory_of(Path::new("net.tex")), Path::new("."));
        assert_eq!(directory_of(Path::new("out/net.tex")), Path::new("out"));
    }
}
