//! Extension-based file classification.
//!
//! Attachments carry whatever name the picker or filesystem handed over;
//! the type and mime columns are derived once at creation and never
//! recomputed.

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "heic", "heif", "tif", "tiff",
];

/// Lowercased extension of `file_name`, without the dot.
/// Returns `None` for names with no usable extension.
pub fn normalize_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() || ext.len() >= 10 {
        return None;
    }
    Some(ext)
}

/// Whether the name carries a recognized image extension.
/// Only these get the thumbnail pipeline; everything else renders as a
/// type-icon glyph.
pub fn is_image(file_name: &str) -> bool {
    match normalize_extension(file_name) {
        Some(ext) => IMAGE_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Mime type for the name's extension, `application/octet-stream` when
/// unrecognized.
pub fn mime_type(file_name: &str) -> &'static str {
    let Some(ext) = normalize_extension(file_name) else {
        return "application/octet-stream";
    };
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "xml" => "application/xml",
        "html" | "htm" => "text/html",
        "rtf" => "application/rtf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_normalize_to_lowercase() {
        assert_eq!(normalize_extension("Photo.JPG"), Some("jpg".into()));
        assert_eq!(normalize_extension("report.v2.pdf"), Some("pdf".into()));
        assert_eq!(normalize_extension("noext"), None);
        assert_eq!(normalize_extension(".gitignore"), None);
        assert_eq!(normalize_extension("trailing."), None);
    }

    #[test]
    fn image_extensions_are_recognized() {
        assert!(is_image("IMG_0042.HEIC"));
        assert!(is_image("scan.png"));
        assert!(!is_image("notes.pdf"));
        assert!(!is_image("noext"));
    }

    #[test]
    fn mime_falls_back_to_octet_stream() {
        assert_eq!(mime_type("pic.jpeg"), "image/jpeg");
        assert_eq!(mime_type("slides.pptx"),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation");
        assert_eq!(mime_type("data.bin"), "application/octet-stream");
        assert_eq!(mime_type("noext"), "application/octet-stream");
    }
}
