//! External converter backend: run a CLI such as `docling` as a subprocess.
//!
//! The command receives the artifact path and a scratch directory through the
//! `{input}` and `{output_dir}` placeholders. Converters that write files
//! (docling, pandoc `-o`) are read back from `<output_dir>/<stem>.md`;
//! converters that print to stdout work without the placeholder.

use super::cleanup::clean_extracted_text;
use super::{ConvertedDocument, DocumentFormat};
use crate::config::ExternalCommand;
use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_DIR_PLACEHOLDER: &str = "{output_dir}";

/// Longest stderr excerpt carried in an error message.
const MAX_STDERR_CHARS: usize = 2000;

const SCRATCH_PREFIX: &str = "doctext-out-";

#[derive(Debug, Clone)]
pub struct CommandBackend {
    command: ExternalCommand,
    /// Parent of the per-run scratch directory. `None` uses the system temp dir.
    scratch_parent: Option<PathBuf>,
}

impl CommandBackend {
    pub fn new(command: ExternalCommand, scratch_parent: Option<PathBuf>) -> Self {
        Self {
            command,
            scratch_parent,
        }
    }

    async fn scratch_dir(&self) -> Result<TempDir, ConvertError> {
        let parent = self.scratch_parent.clone();
        let dir = tokio::task::spawn_blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix(SCRATCH_PREFIX);
            match parent {
                Some(p) => builder.tempdir_in(p),
                None => builder.tempdir(),
            }
        })
        .await
        .map_err(|e| ConvertError::Internal(format!("scratch dir task failed: {e}")))??;
        Ok(dir)
    }

    /// Substitute placeholders in the argument template.
    fn build_args(&self, input: &Path, output_dir: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output_dir = output_dir.to_string_lossy();
        self.command
            .args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_DIR_PLACEHOLDER, &output_dir)
            })
            .collect()
    }

    /// Run the converter on `path`.
    ///
    /// The child is killed if this future is dropped, so an extraction
    /// timeout or a client disconnect never leaves a converter running.
    pub async fn convert(
        &self,
        path: &Path,
        format: DocumentFormat,
    ) -> Result<ConvertedDocument, ConvertError> {
        let scratch = self.scratch_dir().await?;
        let args = self.build_args(path, scratch.path());
        debug!("Running {} {:?}", self.command.program, args);

        let child = Command::new(&self.command.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConvertError::EngineUnavailable {
                engine: self.command.program.clone(),
                detail: format!("failed to launch: {e}"),
            })?;

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} failed with {}", self.command.program, output.status);
            return Err(ConvertError::CommandFailed {
                program: self.command.program.clone(),
                status: output.status.to_string(),
                stderr: truncate_chars(stderr.trim(), MAX_STDERR_CHARS),
            });
        }

        let markdown = match find_output_file(scratch.path(), path).await {
            Some(file) => {
                debug!("Reading converter output from {}", file.display());
                let bytes = tokio::fs::read(&file).await?;
                String::from_utf8(bytes).map_err(|e| ConvertError::InvalidOutput(e.to_string()))?
            }
            None => String::from_utf8(output.stdout)
                .map_err(|e| ConvertError::InvalidOutput(e.to_string()))?,
        };

        Ok(ConvertedDocument::single(
            format,
            clean_extracted_text(&markdown),
        ))
    }
}

/// `<output_dir>/<stem>.md`, or the only `.md` file in `output_dir`.
async fn find_output_file(output_dir: &Path, input: &Path) -> Option<PathBuf> {
    if let Some(stem) = input.file_stem() {
        let expected = output_dir.join(format!("{}.md", stem.to_string_lossy()));
        if tokio::fs::try_exists(&expected).await.unwrap_or(false) {
            return Some(expected);
        }
    }

    let mut entries = tokio::fs::read_dir(output_dir).await.ok()?;
    let mut found = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let p = entry.path();
        if p.extension().is_some_and(|e| e == "md") {
            found.push(p);
        }
    }
    match found.len() {
        1 => found.pop(),
        _ => None,
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(program: &str, args: &[&str]) -> CommandBackend {
        CommandBackend::new(
            ExternalCommand::new(program, args.iter().map(|s| s.to_string()).collect()),
            None,
        )
    }

    #[test]
    fn placeholders_are_substituted() {
        let b = CommandBackend::new(ExternalCommand::docling(), None);
        let args = b.build_args(Path::new("/tmp/doctext-1.docx"), Path::new("/tmp/out"));
        assert_eq!(
            args,
            vec!["/tmp/doctext-1.docx", "--to", "md", "--output", "/tmp/out"]
        );
    }

    #[test]
    fn truncate_long_stderr() {
        assert_eq!(truncate_chars("abcdef", 3), "abc…");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }

    #[tokio::test]
    async fn missing_program_is_engine_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.docx");
        std::fs::write(&input, b"x").unwrap();

        let b = backend("doctext-no-such-converter", &["{input}"]);
        let err = b
            .convert(&input, DocumentFormat::Other("docx".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::EngineUnavailable { .. }), "got: {err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_is_used_without_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.rst");
        std::fs::write(&input, "Title\r\n\r\nbody  \r\n").unwrap();

        let b = backend("cat", &["{input}"]);
        let doc = b
            .convert(&input, DocumentFormat::Other("rst".into()))
            .await
            .unwrap();
        assert_eq!(doc.pages, vec!["Title\n\nbody".to_string()]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn output_file_is_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.odt");
        std::fs::write(&input, b"ignored").unwrap();

        let b = backend(
            "sh",
            &["-c", "printf '# Report' > \"$1/report.md\"", "sh", "{output_dir}"],
        );
        let doc = b
            .convert(&input, DocumentFormat::Other("odt".into()))
            .await
            .unwrap();
        assert_eq!(doc.pages, vec!["# Report".to_string()]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.docx");
        std::fs::write(&input, b"x").unwrap();

        let b = backend("sh", &["-c", "echo 'not a zip file' >&2; exit 3"]);
        let err = b
            .convert(&input, DocumentFormat::Other("docx".into()))
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("not a zip file"), "got: {msg}");
        assert!(msg.contains("3"), "got: {msg}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn scratch_dir_lives_in_configured_parent() {
        let parent = tempfile::tempdir().unwrap();
        let input_dir = tempfile::tempdir().unwrap();
        let input = input_dir.path().join("a.odt");
        std::fs::write(&input, b"x").unwrap();

        let b = CommandBackend::new(
            ExternalCommand::new(
                "sh",
                ["-c", "printf '%s' \"$1\"", "sh", "{output_dir}"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            ),
            Some(parent.path().to_path_buf()),
        );
        let doc = b
            .convert(&input, DocumentFormat::Other("odt".into()))
            .await
            .unwrap();

        let scratch = PathBuf::from(&doc.pages[0]);
        assert!(scratch.starts_with(parent.path()), "got: {}", scratch.display());
        assert!(
            std::fs::read_dir(parent.path()).unwrap().next().is_none(),
            "scratch dir must be removed"
        );
    }
}
