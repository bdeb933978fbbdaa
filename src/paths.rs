use std::path::{Component, Path, PathBuf};

const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
const MAX_NAME_BYTES: usize = 255;
const MAX_EXTENSION_BYTES: usize = 16;

/// Strips characters that are not allowed in a file name on common
/// filesystems. Never returns an empty name, `.` or `..`.
///
/// Names longer than 255 bytes lose the end of their stem; a short
/// alphanumeric extension survives the cut.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|ch| !ch.is_control() && !RESERVED.contains(ch))
        .collect();
    let cleaned = cleaned.trim().trim_end_matches(['.', ' ']);

    let out = if cleaned.len() <= MAX_NAME_BYTES {
        cleaned.to_owned()
    } else {
        match split_extension(cleaned) {
            Some((stem, ext)) => {
                let stem = truncate(stem, MAX_NAME_BYTES - ext.len() - 1);
                format!("{}.{ext}", stem.trim_end_matches(['.', ' ']))
            }
            None => truncate(cleaned, MAX_NAME_BYTES).to_owned(),
        }
    };

    if out.is_empty() || out == "." || out == ".." {
        return "_".to_owned();
    }
    out
}

fn split_extension(name: &str) -> Option<(&str, &str)> {
    let (stem, ext) = name.rsplit_once('.')?;
    let valid = !stem.is_empty()
        && !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_BYTES
        && ext.chars().all(char::is_alphanumeric);
    valid.then_some((stem, ext))
}

/// Longest prefix of `text` that fits in `max` bytes.
fn truncate(text: &str, max: usize) -> &str {
    let mut end = 0;
    for (idx, ch) in text.char_indices() {
        if idx + ch.len_utf8() > max {
            break;
        }
        end = idx + ch.len_utf8();
    }
    &text[..end]
}

/// Sanitizes every normal component of an operator-configured `folder`.
/// Roots and `..` are kept; the folder is not site-supplied.
pub fn sanitize_folder(folder: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in folder.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir | Component::ParentDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::Normal(segment) => {
                out.push(sanitize_filename(&segment.to_string_lossy()));
            }
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
