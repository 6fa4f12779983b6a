//! File extension to content type lookup for multipart uploads.

use std::path::Path;

/// Maps an upload file path to its `Content-Type`.
pub trait MimeResolve: Send + Sync {
    fn resolve(&self, path: &Path) -> String;
}

/// Type used when the extension is unknown.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Extension table covering common upload types.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionMimeResolver;

impl ExtensionMimeResolver {
    fn lookup(ext: &str) -> Option<&'static str> {
        let mime = match ext {
            "png" => "image/png",
            "jpg" | "jpeg" | "jpe" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "webp" => "image/webp",
            "ico" => "image/x-icon",
            "svg" | "svgz" => "image/svg+xml",
            "tif" | "tiff" => "image/tiff",
            "txt" | "text" | "log" => "text/plain",
            "htm" | "html" => "text/html",
            "css" => "text/css",
            "csv" => "text/csv",
            "xml" => "application/xml",
            "js" => "application/javascript",
            "json" => "application/json",
            "pdf" => "application/pdf",
            "zip" => "application/zip",
            "gz" | "tgz" => "application/gzip",
            "tar" => "application/x-tar",
            "rar" => "application/x-rar-compressed",
            "7z" => "application/x-7z-compressed",
            "doc" => "application/msword",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "xls" => "application/vnd.ms-excel",
            "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "ppt" => "application/vnd.ms-powerpoint",
            "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "apk" => "application/vnd.android.package-archive",
            "swf" => "application/x-shockwave-flash",
            "mp3" => "audio/mpeg",
            "wav" => "audio/x-wav",
            "ogg" => "audio/ogg",
            "mp4" => "video/mp4",
            "mpeg" | "mpg" => "video/mpeg",
            "avi" => "video/x-msvideo",
            "mov" | "qt" => "video/quicktime",
            "webm" => "video/webm",
            "flv" => "video/x-flv",
            _ => return None,
        };
        Some(mime)
    }
}

impl MimeResolve for ExtensionMimeResolver {
    fn resolve(&self, path: &Path) -> String {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .and_then(|e| Self::lookup(&e))
            .unwrap_or(FALLBACK_MIME)
            .to_string()
    }
}
