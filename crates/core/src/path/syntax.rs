/// Byte offset of the `[` matching the trailing `]` of `path`.
fn matching_open(path: &str) -> Option<usize> {
    let bytes = path.as_bytes();
    if bytes.last() != Some(&b']') {
        return None;
    }

    let mut depth = 0usize;
    for (idx, &byte) in bytes.iter().enumerate().rev() {
        match byte {
            b']' => depth += 1,
            b'[' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Whether `path` ends in a bracketed `[...]` group with a matching `[`.
pub fn is_package_relative(path: &str) -> bool {
    matching_open(path).is_some()
}

/// Split off the outermost package: `"a[b[c]]"` gives `("a", "b[c]")`.
///
/// A path that is not package-relative is returned whole with an empty
/// packaged part.
pub fn split_outer(path: &str) -> (&str, &str) {
    match matching_open(path) {
        Some(open) => (&path[..open], &path[open + 1..path.len() - 1]),
        None => (path, ""),
    }
}

/// Split off the innermost packaged leaf: `"a[b[c]]"` gives `("a[b]", "c")`.
pub fn split_inner(path: &str) -> (String, String) {
    let (package, packaged) = split_outer(path);
    if !is_package_relative(packaged) {
        return (package.to_string(), packaged.to_string());
    }
    let (inner_package, leaf) = split_inner(packaged);
    (join(package, &inner_package), leaf)
}

/// Nest `packaged` inside the innermost package of `package`.
///
/// `join("a", "b")` is `"a[b]"` and `join("a[b]", "c")` is `"a[b[c]]"`.
/// An empty side returns the other side unchanged.
pub fn join(package: &str, packaged: &str) -> String {
    if packaged.is_empty() {
        return package.to_string();
    }
    if package.is_empty() {
        return packaged.to_string();
    }

    let (outer, inner) = split_outer(package);
    if inner.is_empty() {
        format!("{}[{}]", package, packaged)
    } else {
        format!("{}[{}]", outer, join(inner, packaged))
    }
}

/// Join a list of paths outermost first, skipping empty entries.
pub fn join_all<S: AsRef<str>>(paths: &[S]) -> String {
    paths
        .iter()
        .map(AsRef::as_ref)
        .fold(String::new(), |acc, path| join(&acc, path))
}
