//! Relative path helpers for generated import specifiers

use std::path::{Component, Path, PathBuf};

/// Path of `to` relative to the directory `from_dir`
///
/// Both paths should be absolute (or both relative to the same directory).
pub fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from_dir.components().collect();
    let target: Vec<Component> = to.components().collect();

    let common = from
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..from.len() {
        result.push("..");
    }
    for component in &target[common..] {
        result.push(component.as_os_str());
    }
    result
}

/// ES module specifier for importing `target` from a file in `from_dir`
///
/// Uses forward slashes, drops a `.ts`/`.js` extension and always starts with
/// `./` or `../`.
pub fn import_specifier(from_dir: &Path, target: &Path) -> String {
    let relative = relative_path(from_dir, &strip_script_extension(target));
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");

    if joined.starts_with("../") || joined == ".." {
        joined
    } else {
        format!("./{}", joined)
    }
}

/// Resolve `.` and `..` components without touching the filesystem
///
/// A `..` that would climb above the root (or the start of a relative path)
/// is kept as is.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.last() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => result.push(component),
            },
            other => result.push(other),
        }
    }
    result.iter().map(|c| c.as_os_str()).collect()
}

/// Forward-slash form of a relative path, for embedding in generated code
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn strip_script_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ts") | Some("js") => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}
