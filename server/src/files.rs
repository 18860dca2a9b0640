use std::fs;
use std::io;
use std::path::{Component, Path};

/// True only if `file_name` resolves inside `base_dir`. Symlinks and `..`
/// are resolved through canonicalization when the target exists; a target
/// that doesn't exist yet is checked lexically instead and the read will 404.
pub fn is_path_safe(base_dir: &Path, file_name: &str) -> bool {
    let rel = Path::new(file_name);
    if rel.is_absolute() {
        return false;
    }
    let base = match base_dir.canonicalize() {
        Ok(b) => b,
        Err(_) => return false,
    };
    match base.join(rel).canonicalize() {
        Ok(full) => full.starts_with(&base),
        Err(_) => !rel
            .components()
            .any(|c| matches!(c, Component::ParentDir)),
    }
}

/// Read the whole file into memory, binary-safe.
pub fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
}

/// Content type from the file name suffix.
pub fn content_type_for(file_name: &str) -> &'static str {
    let suffix = file_name.rsplit_once('.').map(|(_, s)| s).unwrap_or("");
    match suffix.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "js" => "text/javascript",
        "css" => "text/css",
        "xml" => "text/xml",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "mpeg" => "video/mpeg",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
