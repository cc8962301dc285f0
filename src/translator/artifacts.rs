use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The PDFs a successful run leaves behind: `<stem>-mono.pdf` (translation
/// only) and `<stem>-dual.pdf` (original and translation side by side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifacts {
    pub mono: PathBuf,
    pub dual: PathBuf,
}

impl OutputArtifacts {
    pub fn resolve(input: &Path, output_dir: &Path) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        Self {
            mono: output_dir.join(format!("{}-mono.pdf", stem)),
            dual: output_dir.join(format!("{}-dual.pdf", stem)),
        }
    }

    /// Artifacts actually present on disk, mono first.
    pub fn existing(&self) -> Vec<&Path> {
        [self.mono.as_path(), self.dual.as_path()]
            .into_iter()
            .filter(|p| p.is_file())
            .collect()
    }

    /// The file to preview: the first one that exists.
    pub fn preferred(&self) -> Option<&Path> {
        self.existing().into_iter().next()
    }
}

/// Default output directory: next to the input file.
pub fn default_output_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_uses_stem_and_output_dir() {
        let artifacts = OutputArtifacts::resolve(Path::new("/in/report.v2.pdf"), Path::new("/out"));
        assert_eq!(artifacts.mono, PathBuf::from("/out/report.v2-mono.pdf"));
        assert_eq!(artifacts.dual, PathBuf::from("/out/report.v2-dual.pdf"));
    }

    #[test]
    fn test_existing_filters_missing_files() {
        let dir = tempdir().unwrap();
        let artifacts = OutputArtifacts::resolve(Path::new("paper.pdf"), dir.path());
        assert!(artifacts.existing().is_empty());
        assert_eq!(artifacts.preferred(), None);

        std::fs::write(&artifacts.dual, b"%PDF-1.7").unwrap();
        assert_eq!(artifacts.existing(), vec![artifacts.dual.as_path()]);

        std::fs::write(&artifacts.mono, b"%PDF-1.7").unwrap();
        assert_eq!(artifacts.preferred(), Some(artifacts.mono.as_path()));
    }

    #[test]
    fn test_default_output_dir() {
        assert_eq!(default_output_dir(Path::new("/a/b.pdf")), PathBuf::from("/a"));
        assert_eq!(default_output_dir(Path::new("b.pdf")), PathBuf::from("."));
    }
}
