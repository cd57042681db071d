//! Filesystem and path utilities.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Expand glob patterns relative to a base directory into matching files.
///
/// Patterns without glob metacharacters are returned as-is, so a missing
/// literal path is reported by whoever opens it.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let full_pattern = absolutize(base, Path::new(pattern));

        if !pattern.contains(['*', '?', '[']) {
            results.push(full_pattern);
            continue;
        }

        let pattern_str = full_pattern.to_string_lossy();
        for entry in
            glob(&pattern_str).with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        normalize_lexically(&base.join(path))
    }
}

/// Make `path` absolute against the process's current directory.
///
/// Falls back to the lexically normalized `path` when the current directory
/// cannot be determined.
pub fn absolute(path: &Path) -> PathBuf {
    match std::path::absolute(path) {
        Ok(abs) => normalize_lexically(&abs),
        Err(_) => normalize_lexically(path),
    }
}

/// Remove `.` components and fold `..` into their parent, without touching the disk.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Express `target` relative to `base`.
///
/// Targets outside `base` get `..` traversal. A relative `target` is taken
/// to be relative to `base` already. When no relative form exists (e.g. a
/// different drive on Windows) the absolute target is returned unchanged.
pub fn relativize(base: &Path, target: &Path) -> String {
    let target = absolutize(base, target);
    let base = normalize_lexically(base);

    match pathdiff::diff_paths(&target, &base) {
        Some(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Some(rel) => rel.to_string_lossy().into_owned(),
        None => target.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relativize_inside_base() {
        assert_eq!(
            relativize(Path::new("/build"), Path::new("/build/obj/foo.o")),
            Path::new("obj").join("foo.o").to_string_lossy()
        );
    }

    #[test]
    fn test_relativize_outside_base() {
        assert_eq!(
            relativize(Path::new("/build/a"), Path::new("/build/b/c.o")),
            Path::new("..").join("b").join("c.o").to_string_lossy()
        );
        assert_eq!(
            relativize(Path::new("/build/a/b"), Path::new("/other/x.o")),
            Path::new("../../../other/x.o").to_string_lossy()
        );
    }

    #[test]
    fn test_relativize_same_dir() {
        assert_eq!(relativize(Path::new("/build"), Path::new("/build")), ".");
    }

    #[test]
    fn test_relativize_relative_target() {
        assert_eq!(
            relativize(Path::new("/build"), Path::new("obj/../src/a.c")),
            Path::new("src/a.c").to_string_lossy()
        );
    }

    #[test]
    fn test_relativize_round_trip() {
        let base = Path::new("/work/project");
        for target in [
            "/work/project/a.c",
            "/work/project/src/deep/nested/b.c",
            "/work/project/build/obj/x.obj.pdb",
        ] {
            let rel = relativize(base, Path::new(target));
            assert_eq!(normalize_lexically(&base.join(&rel)), Path::new(target));
        }
    }

    #[test]
    fn test_absolute_uses_current_dir() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute(Path::new("pch/../pch/a.pch")), cwd.join("pch/a.pch"));
        assert_eq!(absolute(Path::new("/already/abs")), Path::new("/already/abs"));
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/./b/../c")),
            Path::new("/a/c")
        );
        assert_eq!(normalize_lexically(Path::new("../x")), Path::new("../x"));
    }

    #[test]
    fn test_glob_files() {
        let tmp = TempDir::new().unwrap();
        let units = tmp.path().join("units");
        fs::create_dir_all(&units).unwrap();
        fs::write(units.join("a.toml"), "").unwrap();
        fs::write(units.join("b.toml"), "").unwrap();
        fs::write(units.join("readme.txt"), "").unwrap();

        let files = glob_files(tmp.path(), &["units/*.toml".to_string()]).unwrap();
        assert_eq!(files.len(), 2);

        let literal = glob_files(tmp.path(), &["missing.toml".to_string()]).unwrap();
        assert_eq!(literal, vec![tmp.path().join("missing.toml")]);
    }
}
