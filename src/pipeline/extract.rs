//! Page text and image extraction.
//!
//! ## Two passes
//!
//! **Pass 1** walks every page of the document and records, for each image
//! XObject, the first page that references it ([`ImageProvenance`]). This is
//! what `source_page` means: it is stable no matter how many pages pass 2
//! visits, so an image that first appears on page 3 is still attributed to
//! page 3 when only pages 1–2 are extracted.
//!
//! **Pass 2** visits the first `min(max_pages, page_count)` pages, appends
//! each page's text under a `--- Page N ---` marker, and decodes, filters and
//! writes every image the page references.
//!
//! ## Failure policy
//!
//! [`extract`] never returns an error. A missing or unparsable document
//! yields [`ExtractionResult::empty`]; a failure on a single image or a
//! single page's text is logged and skipped.

use crate::config::ExtractionConfig;
use crate::output::{ExtractionResult, ImageRecord};
use crate::pipeline::pixmap::{self, ImageDecodeError};
use image::{DynamicImage, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// First page (1-indexed) on which each image object is referenced.
#[derive(Debug, Clone, Default)]
pub struct ImageProvenance {
    first_page: HashMap<ObjectId, usize>,
}

impl ImageProvenance {
    /// Walk `pages` in order and record the first page of every image.
    pub fn scan(doc: &Document, pages: &[ObjectId]) -> Self {
        let mut first_page = HashMap::new();
        for (i, page_id) in pages.iter().enumerate() {
            for image_id in page_images(doc, *page_id) {
                first_page.entry(image_id).or_insert(i + 1);
            }
        }
        Self { first_page }
    }

    pub fn source_page(&self, image: ObjectId) -> Option<usize> {
        self.first_page.get(&image).copied()
    }

    /// Number of distinct images in the document.
    pub fn len(&self) -> usize {
        self.first_page.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_page.is_empty()
    }
}

/// Image XObjects referenced by a page, in resource order, without
/// duplicates. Images inside Form XObjects are included.
pub fn page_images(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    if let Some(resources) = page_resources(doc, page_id) {
        collect_images(doc, resources, &mut out, &mut visited);
    }
    out
}

fn collect_images(
    doc: &Document,
    resources: &Dictionary,
    out: &mut Vec<ObjectId>,
    visited: &mut HashSet<ObjectId>,
) {
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|o| deref(doc, o).as_dict().ok())
    else {
        return;
    };

    for (_, value) in xobjects.iter() {
        // Inline XObject dictionaries have no object id to track.
        let Ok(id) = value.as_reference() else {
            continue;
        };
        if !visited.insert(id) {
            continue;
        }
        let Ok(Object::Stream(stream)) = doc.get_object(id) else {
            continue;
        };
        match stream.dict.get(b"Subtype").and_then(|s| s.as_name()) {
            Ok(b"Image") => out.push(id),
            Ok(b"Form") => {
                if let Some(inner) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| deref(doc, r).as_dict().ok())
                {
                    collect_images(doc, inner, out, visited);
                }
            }
            _ => {}
        }
    }
}

/// `/Resources` of a page, inherited through `/Parent` when absent.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    let mut seen = HashSet::new();
    loop {
        if let Ok(res) = node.get(b"Resources") {
            return deref(doc, res).as_dict().ok();
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        if !seen.insert(parent) {
            return None;
        }
        node = doc.get_dictionary(parent).ok()?;
    }
}

fn deref<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

// ── Extraction ───────────────────────────────────────────────────────────

/// Extract text and images from the first `max_pages` pages of `path` into
/// `output_folder`, with default quality filters.
pub fn extract(path: &Path, max_pages: usize, output_folder: &Path) -> ExtractionResult {
    extract_with_config(path, max_pages, output_folder, &ExtractionConfig::default())
}

/// [`extract`] with explicit quality filters.
///
/// `output_folder` is deleted and recreated first, so it must be exclusive
/// to this call.
pub fn extract_with_config(
    path: &Path,
    max_pages: usize,
    output_folder: &Path,
    config: &ExtractionConfig,
) -> ExtractionResult {
    info!("Extracting from: {}", path.display());

    if !path.is_file() {
        warn!("Document not found: {}", path.display());
        return ExtractionResult::empty();
    }

    if let Err(e) = reset_folder(output_folder) {
        error!(
            "Cannot prepare image folder {}: {}",
            output_folder.display(),
            e
        );
        return ExtractionResult::empty();
    }

    let doc = match Document::load(path) {
        Ok(doc) => doc,
        Err(e) => {
            error!("Cannot open {}: {}", path.display(), e);
            return ExtractionResult::empty();
        }
    };

    extract_document(&doc, max_pages, output_folder, config)
}

/// Run both passes over an already-loaded document.
///
/// Each image object yields at most one record, taken at its first
/// reference among the visited pages; later references on other pages or
/// through form XObjects are skipped. Unlike [`extract_with_config`] this
/// does not reset `output_folder`.
pub fn extract_document(
    doc: &Document,
    max_pages: usize,
    output_folder: &Path,
    config: &ExtractionConfig,
) -> ExtractionResult {
    // get_pages is keyed by 1-based page number.
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    let page_ids: Vec<ObjectId> = pages.iter().map(|(_, id)| *id).collect();

    // ── Pass 1: provenance over the whole document ────────────────────────
    let provenance = ImageProvenance::scan(doc, &page_ids);
    debug!(
        "Mapped {} distinct images across {} pages",
        provenance.len(),
        pages.len()
    );

    // ── Pass 2: bounded extraction ────────────────────────────────────────
    let to_visit = max_pages.min(pages.len());
    let mut text = String::new();
    let mut images = Vec::new();
    let mut written: HashMap<String, ObjectId> = HashMap::new();
    let mut emitted: HashSet<ObjectId> = HashSet::new();

    for (i, (page_no, page_id)) in pages.iter().take(to_visit).enumerate() {
        let page = i + 1;
        debug!("Processing page {}", page);

        match doc.extract_text(&[*page_no]) {
            Ok(page_text) if !page_text.trim().is_empty() => {
                debug!("Page {}: {} characters of text", page, page_text.len());
                text.push_str(&format!("\n--- Page {page} ---\n{page_text}\n"));
            }
            Ok(_) => debug!("Page {}: no text", page),
            Err(e) => warn!("Page {}: text extraction failed: {}", page, e),
        }

        let page_imgs = page_images(doc, *page_id);
        debug!("Page {}: {} images referenced", page, page_imgs.len());

        for (idx, image_id) in page_imgs.into_iter().enumerate() {
            let source_page = provenance.source_page(image_id).unwrap_or(page);
            let candidate = ImageCandidate {
                id: image_id,
                page,
                source_page,
                index: idx + 1,
            };
            if emitted.contains(&image_id) {
                debug!("Page {}: image {:?} already extracted", page, image_id);
                continue;
            }
            match save_image(doc, &candidate, output_folder, config, &mut written) {
                Ok(Some(record)) => {
                    debug!("Page {}: kept {}", page, record.filename);
                    emitted.insert(image_id);
                    images.push(record);
                }
                Ok(None) => {}
                Err(e) => warn!(
                    "Page {}: skipping image {} (object {:?}): {}",
                    page, candidate.index, image_id, e
                ),
            }
        }
    }

    let text = text.trim().to_string();
    info!(
        "Extracted {} characters and {} images from {} of {} pages",
        text.len(),
        images.len(),
        to_visit,
        pages.len()
    );

    ExtractionResult {
        text,
        images,
        image_folder: output_folder.to_path_buf(),
        page_count: pages.len(),
        pages_extracted: to_visit,
    }
}

/// Async wrapper running [`extract_with_config`] on the blocking pool.
pub async fn extract_async(
    path: PathBuf,
    max_pages: usize,
    output_folder: PathBuf,
    config: ExtractionConfig,
) -> ExtractionResult {
    let task = tokio::task::spawn_blocking(move || {
        extract_with_config(&path, max_pages, &output_folder, &config)
    });
    match task.await {
        Ok(result) => result,
        Err(e) => {
            error!("Extraction task failed: {}", e);
            ExtractionResult::empty()
        }
    }
}

fn reset_folder(folder: &Path) -> std::io::Result<()> {
    if folder.exists() {
        std::fs::remove_dir_all(folder)?;
    }
    std::fs::create_dir_all(folder)
}

struct ImageCandidate {
    id: ObjectId,
    page: usize,
    source_page: usize,
    index: usize,
}

/// Decode, filter and write one image. `Ok(None)` means a quality filter
/// rejected it.
fn save_image(
    doc: &Document,
    candidate: &ImageCandidate,
    folder: &Path,
    config: &ExtractionConfig,
    written: &mut HashMap<String, ObjectId>,
) -> Result<Option<ImageRecord>, ImageDecodeError> {
    let pixmap = pixmap::decode_image(doc, candidate.id)?;
    let (width, height) = (pixmap.width, pixmap.height);

    if width < config.min_dimension || height < config.min_dimension {
        debug!("Image {:?}: {}x{} too small", candidate.id, width, height);
        return Ok(None);
    }
    if width > config.background_dimension && height > config.background_dimension {
        debug!("Image {:?}: {}x{} likely a background", candidate.id, width, height);
        return Ok(None);
    }

    let mut filename = format!(
        "source_page_{}_img_{}.png",
        candidate.source_page, candidate.index
    );
    // A different image already claimed this name on an earlier page.
    if written.get(&filename).is_some_and(|id| *id != candidate.id) {
        filename = format!(
            "source_page_{}_img_{}_{}.png",
            candidate.source_page, candidate.index, candidate.id.0
        );
    }
    let path = folder.join(&filename);

    pixmap
        .into_dynamic_image()?
        .save_with_format(&path, ImageFormat::Png)?;

    // Check what actually landed on disk.
    let saved = match image::open(&path) {
        Ok(img) => img,
        Err(e) => {
            let _ = std::fs::remove_file(&path);
            return Err(e.into());
        }
    };
    // Alpha is ignored: a dark image under an opaque mask is still dark.
    let brightness = mean_brightness(&saved, config.brightness_samples);
    if brightness < config.min_brightness {
        debug!(
            "Image {:?}: too dark (mean brightness {:.1})",
            candidate.id, brightness
        );
        let _ = std::fs::remove_file(&path);
        return Ok(None);
    }

    written.insert(filename.clone(), candidate.id);
    Ok(Some(ImageRecord {
        page: candidate.page,
        source_page: candidate.source_page,
        index: candidate.index,
        filename,
        path,
        width,
        height,
        xref: candidate.id.0,
    }))
}

/// Mean of `(r+g+b)/3` over up to `samples` evenly spaced pixels; alpha is
/// not considered.
pub fn mean_brightness(img: &DynamicImage, samples: usize) -> f64 {
    let rgb = img.to_rgb8();
    let pixels: Vec<_> = rgb.pixels().collect();
    if pixels.is_empty() || samples == 0 {
        return 0.0;
    }
    let step = (pixels.len() / samples).max(1);
    let picked: Vec<f64> = pixels
        .iter()
        .step_by(step)
        .take(samples)
        .map(|p| (p[0] as f64 + p[1] as f64 + p[2] as f64) / 3.0)
        .collect();
    picked.iter().sum::<f64>() / picked.len() as f64
}
