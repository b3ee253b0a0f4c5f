//! Extracted-face panel. Shown only when the service returned both faces
//! as well-formed image data URIs; any partial case shows nothing.

use image::GenericImageView;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::client::ViewState;
use crate::common::image::{decode_data_uri, CapturedImage};
use crate::common::messages::ExtractedFaces;

fn describe(title: &str, face: &CapturedImage) -> String {
    let CapturedImage::DataUri(uri) = face else {
        return format!("{}: (binary)", title);
    };

    match decode_data_uri(uri) {
        Some((mime, bytes)) => match image::load_from_memory(&bytes) {
            Ok(img) => {
                let (width, height) = img.dimensions();
                format!("{}: {}x{} {}", title, width, height, mime)
            }
            Err(_) => format!("{}: {} ({} bytes, not decodable)", title, mime, bytes.len()),
        },
        None => format!("{}: (unreadable)", title),
    }
}

pub fn render_faces(view: &ViewState) -> Option<String> {
    let faces = view.faces.as_ref()?;
    let mut lines = vec![
        describe("Extracted ID Face", &faces.id_face),
        describe("Extracted Live Face", &faces.live_face),
    ];

    if let Some(outcome) = &view.result {
        if let (Some(id_box), Some(live_box)) = (outcome.id_box, outcome.live_box) {
            lines.push(format!(
                "Face boxes: ID {}x{} at ({}, {}), live {}x{} at ({}, {})",
                id_box.width(),
                id_box.height(),
                id_box.left,
                id_box.top,
                live_box.width(),
                live_box.height(),
                live_box.left,
                live_box.top
            ));
        }
        if let Some(quality) = &outcome.quality {
            let score = |s: Option<f64>| s.map_or("n/a".to_string(), |s| format!("{:.1}", s));
            lines.push(format!(
                "Image quality: ID {}, live {}",
                score(quality.id.quality_score),
                score(quality.live.quality_score)
            ));
        }
    }

    Some(lines.join("\n"))
}

fn extension_for(mime: &str) -> &str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        other => other.strip_prefix("image/").unwrap_or("bin"),
    }
}

/// Writes both thumbnails into `dir` as `id_face.<ext>` and `live_face.<ext>`.
pub fn save_faces(faces: &ExtractedFaces, dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for (stem, face) in [("id_face", &faces.id_face), ("live_face", &faces.live_face)] {
        let (mime, bytes) = match face {
            CapturedImage::DataUri(uri) => decode_data_uri(uri).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, format!("{} is not an image", stem))
            })?,
            CapturedImage::Blob { mime, bytes, .. } => (mime.clone(), bytes.clone()),
        };

        let path = dir.join(format!("{}.{}", stem, extension_for(&mime)));
        fs::write(&path, bytes)?;
        written.push(path);
    }

    Ok(written)
}
