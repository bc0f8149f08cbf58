/// Segment under which the service mounts stored images.
pub const UPLOADS_SEGMENT: &str = "uploads/";

/// Maps a stored image reference to the URL it is served from.
///
/// Relative references (`horses/a.jpg`) are placed under the `/uploads/`
/// mount. Older records stored absolute filesystem paths; anything containing
/// `uploads/` is cut down to the root-relative path starting at that segment.
/// An empty reference means there is no image and resolves to `""`.
pub fn resolve_image_url(reference: &str) -> String {
    if reference.is_empty() {
        return String::new();
    }

    match reference.find(UPLOADS_SEGMENT) {
        Some(index) => format!("/{}", &reference[index..]),
        None => format!("/{}{}", UPLOADS_SEGMENT, reference),
    }
}
