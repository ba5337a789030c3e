use crate::services::transfer::TransferError;
use std::path::{Component, Path, PathBuf};

/// The directory every client-supplied name is confined to.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    root: PathBuf,
}

impl StorageRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Maps an untrusted name to a path inside the root.
    ///
    /// The check is purely lexical so a rejected name never reaches the
    /// filesystem. `.` segments are dropped, `..`, absolute paths and drive
    /// prefixes are refused.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, TransferError> {
        let relative = confine(name)?;
        Ok(self.root.join(relative))
    }

    /// Like [`resolve`](Self::resolve) but only accepts a single file name.
    pub fn resolve_upload(&self, name: &str) -> Result<PathBuf, TransferError> {
        let relative = confine(name)?;
        if relative.components().count() != 1 {
            return Err(rejected(name, "uploads must target a single file name"));
        }
        Ok(self.root.join(relative))
    }

    /// Path of `full` relative to the root, always with `/` separators.
    pub fn relative(&self, full: &Path) -> Option<String> {
        let rel = full.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }
}

fn confine(name: &str) -> Result<PathBuf, TransferError> {
    if name.trim().is_empty() {
        return Err(rejected(name, "name is empty"));
    }
    if name.contains('\0') {
        return Err(rejected(name, "name contains a NUL byte"));
    }
    // Backslashes are separators for Windows clients; treat them the same everywhere.
    let normalized = name.replace('\\', "/");

    let mut relative = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(rejected(name, "parent directory segment")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(rejected(name, "absolute path"));
            }
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(rejected(name, "name has no file component"));
    }
    Ok(relative)
}

fn rejected(name: &str, reason: &str) -> TransferError {
    TransferError::PathResolution {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> StorageRoot {
        StorageRoot::new("/srv/share")
    }

    #[test]
    fn test_plain_name_resolves_inside_root() {
        let path = root().resolve("report.pdf").unwrap();
        assert_eq!(path, PathBuf::from("/srv/share/report.pdf"));
    }

    #[test]
    fn test_nested_name_allowed_for_resolve_only() {
        let r = root();
        assert_eq!(
            r.resolve("./docs/a.txt").unwrap(),
            PathBuf::from("/srv/share/docs/a.txt")
        );
        assert!(matches!(
            r.resolve_upload("docs/a.txt"),
            Err(TransferError::PathResolution { .. })
        ));
    }

    #[test]
    fn test_traversal_and_absolute_names_rejected() {
        let r = root();
        for name in [
            "../etc/passwd",
            "a/../../b",
            "..",
            "/etc/passwd",
            "..\\..\\boot.ini",
            "",
            "   ",
            ".",
            "a\0b",
        ] {
            assert!(
                matches!(r.resolve(name), Err(TransferError::PathResolution { .. })),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolved_paths_stay_under_root() {
        let r = root();
        for name in ["x", "./x", "x/./y", "dir/file.bin"] {
            let path = r.resolve(name).unwrap();
            assert!(path.starts_with(r.path()));
        }
    }

    #[test]
    fn test_relative_uses_forward_slashes() {
        let r = root();
        let full = r.resolve("docs/a.txt").unwrap();
        assert_eq!(r.relative(&full).as_deref(), Some("docs/a.txt"));
        assert_eq!(r.relative(Path::new("/elsewhere/a.txt")), None);
    }
}
