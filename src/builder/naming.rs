//! Object file naming.
//!
//! Object files land in `<object_dir>/<hash>/<stem>.<ext>`, where `<hash>`
//! is derived from the source file's parent directory. Two `util.c` files in
//! different directories therefore never overwrite each other's objects.

use std::path::{Path, PathBuf};

use crate::util::hash::short_hash;

/// Length of the per-directory hash component.
const DIR_HASH_LEN: usize = 12;

/// Maps source files to object files.
#[derive(Debug, Clone)]
pub struct ObjectFileNaming {
    object_dir: PathBuf,
    extension: String,
}

impl ObjectFileNaming {
    /// Place objects with `extension` under `object_dir`.
    pub fn new(object_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        ObjectFileNaming {
            object_dir: object_dir.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    /// The object file for `source`.
    pub fn object_file(&self, source: &Path) -> PathBuf {
        let parent = source
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string());

        let mut file_name = stem;
        if !self.extension.is_empty() {
            file_name.push('.');
            file_name.push_str(&self.extension);
        }

        self.object_dir
            .join(short_hash(&parent, DIR_HASH_LEN))
            .join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_file_layout() {
        let naming = ObjectFileNaming::new("/build/obj", "obj");
        let object = naming.object_file(Path::new("/src/lib/util.c"));

        assert_eq!(object.file_name().unwrap(), "util.obj");
        assert!(object.starts_with("/build/obj"));
        assert_eq!(
            object.parent().unwrap().file_name().unwrap().len(),
            DIR_HASH_LEN
        );
    }

    #[test]
    fn test_same_name_different_dirs() {
        let naming = ObjectFileNaming::new("/build/obj", "o");
        let a = naming.object_file(Path::new("/src/a/util.c"));
        let b = naming.object_file(Path::new("/src/b/util.c"));
        assert_ne!(a, b);
        assert_eq!(a.file_name(), b.file_name());
    }

    #[test]
    fn test_stable_and_dot_insensitive() {
        let a = ObjectFileNaming::new("/o", ".o").object_file(Path::new("/src/x.cpp"));
        let b = ObjectFileNaming::new("/o", "o").object_file(Path::new("/src/x.cpp"));
        assert_eq!(a, b);
        assert_eq!(a.extension().unwrap(), "o");
    }
}
