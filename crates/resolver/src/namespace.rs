/// Separator between the namespace and the rest of a semantic identifier.
pub const NAMESPACE_SEPARATOR: char = '/';

/// Namespace of `semantic_id`: the segment before the first separator.
///
/// A leading URI scheme is skipped, so `https://admin-shell.io/aas/3/0` and
/// `admin-shell.io/aas/3/0` both live in `admin-shell.io`. Returns `None` when
/// the namespace segment is empty.
pub fn namespace_of(semantic_id: &str) -> Option<&str> {
    let trimmed = semantic_id.trim();
    // Only a scheme ahead of the first separator counts; a URL embedded
    // later in the identifier does not.
    let without_scheme = match trimmed.find("://") {
        Some(index) if !trimmed[..index].contains(NAMESPACE_SEPARATOR) => &trimmed[index + 3..],
        _ => trimmed,
    };
    without_scheme
        .split(NAMESPACE_SEPARATOR)
        .next()
        .filter(|namespace| !namespace.is_empty())
}

/// Whether both identifiers have a namespace and it is the same one.
pub fn same_namespace(left: &str, right: &str) -> bool {
    match (namespace_of(left), namespace_of(right)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}
