//! Output path resolution.
//!
//! `save_dir` may name an existing directory, a file path (existing or not),
//! or be absent. A file path only pins the exact destination when a single
//! artifact comes back; batches reuse its stem as a prefix.
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::workflow::JobKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputTarget {
    pub dir: PathBuf,
    pub prefix: String,
    /// Exact destination requested by the caller.
    pub literal_file: Option<PathBuf>,
}

impl OutputTarget {
    pub fn new(dir: PathBuf, prefix: impl Into<String>) -> Self {
        OutputTarget {
            dir,
            prefix: prefix.into(),
            literal_file: None,
        }
    }

    pub async fn ensure_dir(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Local path of artifact `index` out of `count`, keeping `extension`.
    pub fn path_for(&self, index: usize, count: usize, extension: &str) -> PathBuf {
        if count == 1 {
            if let Some(file) = &self.literal_file {
                return file.clone();
            }
            return self.dir.join(format!("{}.{}", self.prefix, extension));
        }
        self.dir.join(format!("{}_{}.{}", self.prefix, index, extension))
    }
}

/// `<kind>_<unix millis>_<8 hex>`; unique per call so concurrent jobs of the
/// same kind never share a destination.
pub fn default_prefix(kind: JobKind) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        kind.api_name(),
        chrono::Utc::now().timestamp_millis(),
        &token[..8]
    )
}

pub fn resolve_output(
    save_dir: Option<&str>,
    filename: Option<&str>,
    default_prefix: &str,
    output_dir: &Path,
) -> AppResult<OutputTarget> {
    let prefix = match filename.map(str::trim).filter(|f| !f.is_empty()) {
        Some(f) => Path::new(f)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::InvalidInput(format!("filename '{}' does not name a file", f)))?,
        None => default_prefix.to_string(),
    };

    let Some(save_dir) = save_dir.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(OutputTarget::new(output_dir.to_path_buf(), prefix));
    };

    let requested = Path::new(save_dir);
    if requested.is_dir() {
        return Ok(OutputTarget::new(requested.to_path_buf(), prefix));
    }

    let dir = match requested.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => output_dir.to_path_buf(),
    };
    let stem = requested
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty());
    let Some(stem) = stem else {
        return Ok(OutputTarget::new(dir, prefix));
    };
    let literal_file = requested.file_name().map(|name| dir.join(name));
    Ok(OutputTarget {
        dir,
        prefix: stem,
        literal_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_project_output_dir() {
        let target = resolve_output(None, None, "txt2bg_1700000000", Path::new("/proj/output")).unwrap();
        assert_eq!(target.dir, PathBuf::from("/proj/output"));
        assert_eq!(target.prefix, "txt2bg_1700000000");
        assert_eq!(
            target.path_for(0, 1, "png"),
            PathBuf::from("/proj/output/txt2bg_1700000000.png")
        );
    }

    #[test]
    fn existing_directory_keeps_requested_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let save_dir = dir.path().to_str().unwrap();

        let named = resolve_output(Some(save_dir), Some("castle"), "txt2bg_1", Path::new("/unused")).unwrap();
        assert_eq!(named.dir, dir.path());
        assert_eq!(named.prefix, "castle");
        assert_eq!(named.path_for(1, 2, "png"), dir.path().join("castle_1.png"));

        let unnamed = resolve_output(Some(save_dir), None, "txt2bg_1", Path::new("/unused")).unwrap();
        assert_eq!(unnamed.prefix, "txt2bg_1");
        assert!(unnamed.literal_file.is_none());
    }

    #[test]
    fn file_path_is_written_directly_for_single_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("renders").join("hero.jpg");
        let target = resolve_output(file.to_str(), Some("ignored"), "txt2bg_1", Path::new("/unused")).unwrap();

        assert_eq!(target.dir, dir.path().join("renders"));
        assert_eq!(target.prefix, "hero");
        assert_eq!(target.path_for(0, 1, "png"), file);
        assert_eq!(target.path_for(0, 2, "png"), dir.path().join("renders").join("hero_0.png"));
    }

    #[test]
    fn bare_file_name_lands_in_output_dir() {
        let target = resolve_output(Some("sunset.png"), None, "txt2bg_1", Path::new("/proj/output")).unwrap();
        assert_eq!(target.dir, PathBuf::from("/proj/output"));
        assert_eq!(target.path_for(0, 1, "png"), PathBuf::from("/proj/output/sunset.png"));
    }

    #[test]
    fn default_prefix_is_kind_timestamp_and_token() {
        let prefix = default_prefix(JobKind::ImgEdit);
        let parts: Vec<_> = prefix.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "imgedit");
        assert!(parts[1].parse::<i64>().unwrap() > 1_600_000_000_000);
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn default_prefixes_differ_between_calls() {
        assert_ne!(default_prefix(JobKind::Txt2Bg), default_prefix(JobKind::Txt2Bg));
    }

    #[test]
    fn filename_without_final_component_is_rejected() {
        for bad in ["..", "foo/..", "/"] {
            let err = resolve_output(None, Some(bad), "txt2bg_1", Path::new("/proj/output")).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "{}", bad);
        }
        let nested = resolve_output(None, Some("a/b/castle"), "txt2bg_1", Path::new("/proj/output")).unwrap();
        assert_eq!(nested.path_for(0, 1, "png"), PathBuf::from("/proj/output/castle.png"));
    }
}
