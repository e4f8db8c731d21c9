//! Image XObject decoding: PDF stream → 8-bit pixel buffer.
//!
//! A [`Pixmap`] is the decoded form of one image XObject: width, height,
//! colour components (1 gray, 3 RGB, 4 CMYK) and an optional interleaved
//! alpha channel. [`decode_image`] runs the full normalisation sequence the
//! extractor needs:
//!
//! 1. decode the base image (filters, colour space, bit depth, `/Decode`),
//! 2. composite its `/SMask` as alpha, only if the base has no alpha yet,
//! 3. convert CMYK to RGB, keeping alpha.
//!
//! ## Supported inputs
//!
//! | Aspect        | Supported                                                    |
//! |---------------|--------------------------------------------------------------|
//! | Filters       | none, `FlateDecode`/`LZWDecode` (+ PNG predictors), `DCTDecode` |
//! | Colour spaces | Device{Gray,RGB,CMYK}, Cal{Gray,RGB}, `ICCBased`, `Indexed`  |
//! | Bit depths    | 1, 2, 4, 8, 16                                               |
//!
//! Anything else is an [`ImageDecodeError`]; the extractor logs it and skips
//! the image. Stencil masks (`/ImageMask true`) carry no colour of their own
//! and are rejected.

use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;
use tracing::{debug, warn};

/// Why one image could not be decoded.
#[derive(Debug, Error)]
pub enum ImageDecodeError {
    #[error("object {0:?} is not an image XObject")]
    NotAnImage(ObjectId),

    #[error("stencil masks are not extracted")]
    StencilMask,

    #[error("missing or invalid /{0}")]
    MissingKey(&'static str),

    #[error("unsupported filter {0}")]
    UnsupportedFilter(String),

    #[error("unsupported colour space {0}")]
    UnsupportedColorSpace(String),

    #[error("unsupported bits per component: {0}")]
    UnsupportedBitDepth(u32),

    #[error("unsupported predictor {0}")]
    UnsupportedPredictor(i64),

    #[error("image data truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("PDF object error: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// Decoded 8-bit samples, row-major, components interleaved, alpha last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    pub width: u32,
    pub height: u32,
    /// Colour components per pixel, excluding alpha.
    pub components: u8,
    pub alpha: bool,
    pub samples: Vec<u8>,
}

impl Pixmap {
    /// Bytes per pixel including alpha.
    pub fn stride(&self) -> usize {
        self.components as usize + self.alpha as usize
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Decode an image XObject stream without touching its soft mask.
    pub fn from_stream(doc: &Document, stream: &Stream) -> Result<Self, ImageDecodeError> {
        let dict = &stream.dict;
        if bool_entry(dict, b"ImageMask") {
            return Err(ImageDecodeError::StencilMask);
        }

        let width = positive_int(doc, dict, b"Width", "Width")?;
        let height = positive_int(doc, dict, b"Height", "Height")?;

        let filters = filter_names(doc, dict);
        // JPEG carries its own colour model; anything after it is nonsense.
        if let Some(pos) = filters.iter().position(|f| matches!(f.as_str(), "DCTDecode" | "DCT")) {
            let data = decompress(doc, stream, &filters[..pos])?;
            return Self::from_jpeg(&data, width, height);
        }
        let data = decompress(doc, stream, &filters)?;

        let cs_obj = dict
            .get(b"ColorSpace")
            .map_err(|_| ImageDecodeError::MissingKey("ColorSpace"))?;
        let color_space = ColorSpace::resolve(doc, cs_obj)?;
        let bpc = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| resolve(doc, o).as_i64().ok())
            .unwrap_or(8) as u32;
        if !matches!(bpc, 1 | 2 | 4 | 8 | 16) {
            return Err(ImageDecodeError::UnsupportedBitDepth(bpc));
        }
        let decode = decode_array(doc, dict);

        unpack(&data, width, height, bpc, &color_space, decode.as_deref())
    }

    fn from_jpeg(data: &[u8], width: u32, height: u32) -> Result<Self, ImageDecodeError> {
        let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
        if img.width() != width || img.height() != height {
            debug!(
                "JPEG dimensions {}x{} differ from dictionary {}x{}",
                img.width(),
                img.height(),
                width,
                height
            );
        }
        let pixmap = if img.color().channel_count() == 1 {
            let gray = img.to_luma8();
            Pixmap {
                width: gray.width(),
                height: gray.height(),
                components: 1,
                alpha: false,
                samples: gray.into_raw(),
            }
        } else {
            let rgb = img.to_rgb8();
            Pixmap {
                width: rgb.width(),
                height: rgb.height(),
                components: 3,
                alpha: false,
                samples: rgb.into_raw(),
            }
        };
        Ok(pixmap)
    }

    /// Attach `mask` (one gray component) as alpha, resampling it to this
    /// pixmap's dimensions when they differ.
    pub fn with_alpha_mask(self, mask: &Pixmap) -> Result<Self, ImageDecodeError> {
        if self.alpha {
            return Ok(self);
        }
        // Only the first component of the mask carries coverage.
        let coverage: Vec<u8> = mask.samples.iter().step_by(mask.stride()).copied().collect();
        let gray = GrayImage::from_raw(mask.width, mask.height, coverage).ok_or(
            ImageDecodeError::Truncated {
                expected: mask.pixel_count(),
                actual: mask.samples.len() / mask.stride(),
            },
        )?;

        let gray = if (gray.width(), gray.height()) != (self.width, self.height) {
            debug!(
                "Resizing soft mask {}x{} → {}x{}",
                gray.width(),
                gray.height(),
                self.width,
                self.height
            );
            image::imageops::resize(
                &gray,
                self.width,
                self.height,
                image::imageops::FilterType::Triangle,
            )
        } else {
            gray
        };

        let n = self.components as usize;
        let mut samples = Vec::with_capacity(self.pixel_count() * (n + 1));
        for (px, a) in self.samples.chunks_exact(n).zip(gray.as_raw()) {
            samples.extend_from_slice(px);
            samples.push(*a);
        }
        Ok(Pixmap {
            alpha: true,
            samples,
            ..self
        })
    }

    /// Convert 4-component CMYK to RGB; other pixmaps are returned unchanged.
    pub fn cmyk_to_rgb(self) -> Self {
        if self.components != 4 {
            return self;
        }
        let stride = self.stride();
        let mut samples = Vec::with_capacity(self.pixel_count() * (3 + self.alpha as usize));
        for px in self.samples.chunks_exact(stride) {
            let [c, m, y, k] = [px[0], px[1], px[2], px[3]].map(|v| v as f32 / 255.0);
            samples.push(((1.0 - c) * (1.0 - k) * 255.0).round() as u8);
            samples.push(((1.0 - m) * (1.0 - k) * 255.0).round() as u8);
            samples.push(((1.0 - y) * (1.0 - k) * 255.0).round() as u8);
            if self.alpha {
                samples.push(px[4]);
            }
        }
        Pixmap {
            components: 3,
            samples,
            ..self
        }
    }

    /// Wrap the samples in an `image` buffer for encoding.
    pub fn into_dynamic_image(self) -> Result<DynamicImage, ImageDecodeError> {
        let expected = self.pixel_count() * self.stride();
        let actual = self.samples.len();
        let truncated = || ImageDecodeError::Truncated { expected, actual };
        let (w, h, s) = (self.width, self.height, self.samples);
        let img = match (self.components, self.alpha) {
            (1, false) => DynamicImage::ImageLuma8(ImageBuffer::from_raw(w, h, s).ok_or_else(truncated)?),
            (1, true) => DynamicImage::ImageLumaA8(ImageBuffer::from_raw(w, h, s).ok_or_else(truncated)?),
            (3, false) => DynamicImage::ImageRgb8(ImageBuffer::from_raw(w, h, s).ok_or_else(truncated)?),
            (3, true) => DynamicImage::ImageRgba8(ImageBuffer::from_raw(w, h, s).ok_or_else(truncated)?),
            (n, _) => {
                return Err(ImageDecodeError::UnsupportedColorSpace(format!(
                    "{n} components"
                )))
            }
        };
        Ok(img)
    }
}

/// Decode image XObject `id`, composite its soft mask and normalise CMYK.
///
/// A soft mask that fails to decode is dropped with a warning; the base image
/// is kept.
pub fn decode_image(doc: &Document, id: ObjectId) -> Result<Pixmap, ImageDecodeError> {
    let stream = image_stream(doc, id)?;
    let mut pixmap = Pixmap::from_stream(doc, stream)?;

    if !pixmap.alpha {
        if let Some(mask_id) = smask_ref(&stream.dict) {
            match image_stream(doc, mask_id).and_then(|s| Pixmap::from_stream(doc, s)) {
                Ok(mask) => pixmap = pixmap.with_alpha_mask(&mask)?,
                Err(e) => warn!("Ignoring soft mask {:?} of image {:?}: {}", mask_id, id, e),
            }
        }
    }

    Ok(pixmap.cmyk_to_rgb())
}

/// The `/SMask` reference of an image dictionary, if any.
pub fn smask_ref(dict: &Dictionary) -> Option<ObjectId> {
    dict.get(b"SMask").ok().and_then(|o| o.as_reference().ok())
}

fn image_stream(doc: &Document, id: ObjectId) -> Result<&Stream, ImageDecodeError> {
    match doc.get_object(id)? {
        Object::Stream(s) if is_image(&s.dict) => Ok(s),
        _ => Err(ImageDecodeError::NotAnImage(id)),
    }
}

/// Whether a stream dictionary is an image XObject.
pub fn is_image(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok())
        .is_some_and(|n| n == b"Image")
}

// ── Colour spaces ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Indexed {
        base: Box<ColorSpace>,
        hival: usize,
        lookup: Vec<u8>,
    },
}

impl ColorSpace {
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
            ColorSpace::Indexed { .. } => 1,
        }
    }

    fn from_components(n: i64) -> Option<Self> {
        match n {
            1 => Some(ColorSpace::Gray),
            3 => Some(ColorSpace::Rgb),
            4 => Some(ColorSpace::Cmyk),
            _ => None,
        }
    }

    fn resolve(doc: &Document, obj: &Object) -> Result<Self, ImageDecodeError> {
        match resolve(doc, obj) {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"G" | b"CalGray" => Ok(ColorSpace::Gray),
                b"DeviceRGB" | b"RGB" | b"CalRGB" => Ok(ColorSpace::Rgb),
                b"DeviceCMYK" | b"CMYK" => Ok(ColorSpace::Cmyk),
                other => Err(unsupported_cs(other)),
            },
            Object::Array(items) => Self::resolve_array(doc, items),
            _ => Err(ImageDecodeError::MissingKey("ColorSpace")),
        }
    }

    fn resolve_array(doc: &Document, items: &[Object]) -> Result<Self, ImageDecodeError> {
        let family = items
            .first()
            .and_then(|o| resolve(doc, o).as_name().ok())
            .ok_or(ImageDecodeError::MissingKey("ColorSpace"))?;

        match family {
            b"CalGray" => Ok(ColorSpace::Gray),
            b"CalRGB" => Ok(ColorSpace::Rgb),
            b"DeviceGray" | b"DeviceRGB" | b"DeviceCMYK" => {
                Self::resolve(doc, &Object::Name(family.to_vec()))
            }
            b"ICCBased" => {
                let profile = items
                    .get(1)
                    .map(|o| resolve(doc, o))
                    .and_then(|o| o.as_stream().ok())
                    .ok_or(ImageDecodeError::MissingKey("ICCBased"))?;
                if let Some(cs) = profile
                    .dict
                    .get(b"N")
                    .ok()
                    .and_then(|n| resolve(doc, n).as_i64().ok())
                    .and_then(Self::from_components)
                {
                    return Ok(cs);
                }
                match profile.dict.get(b"Alternate") {
                    Ok(alt) => Self::resolve(doc, alt),
                    Err(_) => Err(unsupported_cs(b"ICCBased")),
                }
            }
            b"Indexed" | b"I" => {
                let base = items
                    .get(1)
                    .ok_or(ImageDecodeError::MissingKey("Indexed"))
                    .and_then(|b| Self::resolve(doc, b))?;
                if matches!(base, ColorSpace::Indexed { .. }) {
                    return Err(unsupported_cs(b"nested Indexed"));
                }
                let hival = items
                    .get(2)
                    .and_then(|h| resolve(doc, h).as_i64().ok())
                    .ok_or(ImageDecodeError::MissingKey("Indexed"))?
                    .clamp(0, 255) as usize;
                let lookup = match items.get(3).map(|l| resolve(doc, l)) {
                    Some(Object::String(bytes, _)) => bytes.clone(),
                    Some(Object::Stream(s)) => decompress(doc, s, &filter_names(doc, &s.dict))?,
                    _ => return Err(ImageDecodeError::MissingKey("Indexed")),
                };
                Ok(ColorSpace::Indexed {
                    base: Box::new(base),
                    hival,
                    lookup,
                })
            }
            other => Err(unsupported_cs(other)),
        }
    }
}

fn unsupported_cs(name: &[u8]) -> ImageDecodeError {
    ImageDecodeError::UnsupportedColorSpace(String::from_utf8_lossy(name).into_owned())
}

// ── Sample unpacking ─────────────────────────────────────────────────────

fn unpack(
    data: &[u8],
    width: u32,
    height: u32,
    bpc: u32,
    cs: &ColorSpace,
    decode: Option<&[f32]>,
) -> Result<Pixmap, ImageDecodeError> {
    let (w, h) = (width as usize, height as usize);
    let n = cs.components();
    let row_bytes = (w * n * bpc as usize).div_ceil(8);
    let expected = row_bytes * h;
    if data.len() < expected {
        return Err(ImageDecodeError::Truncated {
            expected,
            actual: data.len(),
        });
    }

    let max = ((1u32 << bpc) - 1) as f32;
    let out_n = match cs {
        ColorSpace::Indexed { base, .. } => base.components(),
        other => other.components(),
    };
    let mut samples = Vec::with_capacity(w * h * out_n);

    for row in data.chunks_exact(row_bytes).take(h) {
        for x in 0..w {
            match cs {
                ColorSpace::Indexed {
                    base,
                    hival,
                    lookup,
                } => {
                    let raw = read_sample(row, x, bpc) as f32;
                    let idx = match decode {
                        Some([dmin, dmax, ..]) => dmin + raw * (dmax - dmin) / max,
                        _ => raw,
                    };
                    let idx = (idx.round().max(0.0) as usize).min(*hival);
                    let bn = base.components();
                    for c in 0..bn {
                        samples.push(lookup.get(idx * bn + c).copied().unwrap_or(0));
                    }
                }
                _ => {
                    for c in 0..n {
                        let raw = read_sample(row, x * n + c, bpc);
                        let v = match decode {
                            Some(d) if d.len() >= 2 * (c + 1) => {
                                let (dmin, dmax) = (d[2 * c], d[2 * c + 1]);
                                let t = dmin + (raw as f32 / max) * (dmax - dmin);
                                (t.clamp(0.0, 1.0) * 255.0).round() as u8
                            }
                            _ => scale_to_u8(raw, bpc),
                        };
                        samples.push(v);
                    }
                }
            }
        }
    }

    Ok(Pixmap {
        width,
        height,
        components: out_n as u8,
        alpha: false,
        samples,
    })
}

/// The `i`-th `bpc`-bit sample of a row.
fn read_sample(row: &[u8], i: usize, bpc: u32) -> u32 {
    match bpc {
        8 => row[i] as u32,
        16 => u16::from_be_bytes([row[2 * i], row[2 * i + 1]]) as u32,
        _ => {
            let bit = i * bpc as usize;
            let byte = row[bit / 8];
            let shift = 8 - bpc as usize - (bit % 8);
            ((byte >> shift) as u32) & ((1 << bpc) - 1)
        }
    }
}

fn scale_to_u8(v: u32, bpc: u32) -> u8 {
    match bpc {
        8 => v as u8,
        16 => (v >> 8) as u8,
        _ => (v * 255 / ((1 << bpc) - 1)) as u8,
    }
}

// ── Filters ──────────────────────────────────────────────────────────────

/// Undo `filters` (a prefix of the stream's chain) with lopdf's decoders.
///
/// lopdf refuses to decompress `/Subtype /Image` streams, so the work happens
/// on a bare copy that carries only the filter entries.
fn decompress(
    doc: &Document,
    stream: &Stream,
    filters: &[String],
) -> Result<Vec<u8>, ImageDecodeError> {
    if filters.is_empty() {
        return Ok(stream.content.clone());
    }
    let mut names = Vec::with_capacity(filters.len());
    for filter in filters {
        let name: &[u8] = match filter.as_str() {
            "FlateDecode" | "Fl" => b"FlateDecode",
            "LZWDecode" | "LZW" => b"LZWDecode",
            other => return Err(ImageDecodeError::UnsupportedFilter(other.to_string())),
        };
        names.push(Object::Name(name.to_vec()));
    }

    let mut dict = Dictionary::new();
    dict.set("Filter", names);
    // lopdf reads a single parameter dictionary for the whole chain.
    if let Some(parms) = decode_parms(doc, &stream.dict).into_iter().flatten().next() {
        let predictor = parms.get(b"Predictor").and_then(Object::as_i64).unwrap_or(1);
        if predictor != 1 && !(10..=15).contains(&predictor) {
            return Err(ImageDecodeError::UnsupportedPredictor(predictor));
        }
        dict.set("DecodeParms", parms);
    }
    Ok(Stream::new(dict, stream.content.clone()).decompressed_content()?)
}

// ── Dictionary helpers ───────────────────────────────────────────────────

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn bool_entry(dict: &Dictionary, key: &[u8]) -> bool {
    matches!(dict.get(key), Ok(Object::Boolean(true)))
}

fn positive_int(
    doc: &Document,
    dict: &Dictionary,
    key: &[u8],
    name: &'static str,
) -> Result<u32, ImageDecodeError> {
    dict.get(key)
        .ok()
        .and_then(|o| resolve(doc, o).as_i64().ok())
        .filter(|v| *v > 0 && *v <= u32::MAX as i64)
        .map(|v| v as u32)
        .ok_or(ImageDecodeError::MissingKey(name))
}

fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter").map(|f| resolve(doc, f)) {
        Ok(Object::Name(n)) => vec![String::from_utf8_lossy(n).into_owned()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|f| resolve(doc, f).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_parms(doc: &Document, dict: &Dictionary) -> Vec<Option<Dictionary>> {
    match dict.get(b"DecodeParms").map(|p| resolve(doc, p)) {
        Ok(Object::Dictionary(d)) => vec![Some(d.clone())],
        Ok(Object::Array(arr)) => arr
            .iter()
            .map(|p| resolve(doc, p).as_dict().ok().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_array(doc: &Document, dict: &Dictionary) -> Option<Vec<f32>> {
    let arr = dict.get(b"Decode").ok().map(|d| resolve(doc, d))?.as_array().ok()?;
    arr.iter()
        .map(|v| match resolve(doc, v) {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(r) => Some(*r as f32),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::ZlibEncoder, Compression};
    use lopdf::{dictionary, Stream};
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn image_dict(w: i64, h: i64, cs: Object, bpc: i64) -> Dictionary {
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => w,
            "Height" => h,
            "ColorSpace" => cs,
            "BitsPerComponent" => bpc,
        }
    }

    #[test]
    fn decodes_uncompressed_rgb() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            image_dict(2, 1, Object::Name(b"DeviceRGB".to_vec()), 8),
            vec![255, 0, 0, 0, 0, 255],
        );
        let px = Pixmap::from_stream(&doc, &stream).unwrap();
        assert_eq!((px.width, px.height, px.components, px.alpha), (2, 1, 3, false));
        assert_eq!(px.samples, vec![255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn decodes_flate_gray_with_png_up_predictor() {
        let doc = Document::with_version("1.5");
        // Two rows of 3 gray pixels; row 2 encoded with the Up filter.
        let encoded = [0u8, 10, 20, 30, 2, 1, 1, 1];
        let mut dict = image_dict(3, 2, Object::Name(b"DeviceGray".to_vec()), 8);
        dict.set("Filter", "FlateDecode");
        dict.set(
            "DecodeParms",
            dictionary! { "Predictor" => 12, "Colors" => 1, "Columns" => 3 },
        );
        let stream = Stream::new(dict, zlib(&encoded));
        let px = Pixmap::from_stream(&doc, &stream).unwrap();
        assert_eq!(px.samples, vec![10, 20, 30, 11, 21, 31]);
    }

    #[test]
    fn one_bit_gray_with_inverting_decode() {
        let doc = Document::with_version("1.5");
        let mut dict = image_dict(8, 1, Object::Name(b"DeviceGray".to_vec()), 1);
        dict.set("Decode", vec![Object::Integer(1), Object::Integer(0)]);
        let stream = Stream::new(dict, vec![0b1010_0000]);
        let px = Pixmap::from_stream(&doc, &stream).unwrap();
        assert_eq!(px.samples, vec![0, 255, 0, 255, 255, 255, 255, 255]);
    }

    #[test]
    fn indexed_palette_expands_to_base() {
        let doc = Document::with_version("1.5");
        let cs = Object::Array(vec![
            Object::Name(b"Indexed".to_vec()),
            Object::Name(b"DeviceRGB".to_vec()),
            Object::Integer(1),
            Object::string_literal(vec![255u8, 0, 0, 0, 255, 0]),
        ]);
        let stream = Stream::new(image_dict(2, 1, cs, 8), vec![1, 0]);
        let px = Pixmap::from_stream(&doc, &stream).unwrap();
        assert_eq!(px.components, 3);
        assert_eq!(px.samples, vec![0, 255, 0, 255, 0, 0]);
    }

    #[test]
    fn icc_based_uses_component_count() {
        let mut doc = Document::with_version("1.5");
        let icc = doc.add_object(Stream::new(dictionary! { "N" => 1 }, vec![]));
        let cs = Object::Array(vec![Object::Name(b"ICCBased".to_vec()), Object::Reference(icc)]);
        let stream = Stream::new(image_dict(1, 1, cs, 8), vec![128]);
        let px = Pixmap::from_stream(&doc, &stream).unwrap();
        assert_eq!(px.components, 1);
    }

    #[test]
    fn cmyk_converts_to_rgb() {
        let px = Pixmap {
            width: 2,
            height: 1,
            components: 4,
            alpha: false,
            samples: vec![0, 0, 0, 0, 0, 0, 0, 255],
        }
        .cmyk_to_rgb();
        assert_eq!(px.components, 3);
        assert_eq!(px.samples, vec![255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn smask_is_resized_and_interleaved() {
        let base = Pixmap {
            width: 2,
            height: 2,
            components: 1,
            alpha: false,
            samples: vec![10, 20, 30, 40],
        };
        let mask = Pixmap {
            width: 1,
            height: 1,
            components: 1,
            alpha: false,
            samples: vec![200],
        };
        let px = base.with_alpha_mask(&mask).unwrap();
        assert!(px.alpha);
        assert_eq!(px.samples, vec![10, 200, 20, 200, 30, 200, 40, 200]);
    }

    #[test]
    fn decode_image_composites_smask() {
        let mut doc = Document::with_version("1.5");
        let mask_id = doc.add_object(Stream::new(
            image_dict(2, 1, Object::Name(b"DeviceGray".to_vec()), 8),
            vec![0, 255],
        ));
        let mut dict = image_dict(2, 1, Object::Name(b"DeviceCMYK".to_vec()), 8);
        dict.set("SMask", mask_id);
        let img_id = doc.add_object(Stream::new(dict, vec![0, 0, 0, 0, 255, 0, 0, 0]));

        let px = decode_image(&doc, img_id).unwrap();
        assert_eq!((px.components, px.alpha), (3, true));
        assert_eq!(px.samples, vec![255, 255, 255, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn unsupported_filter_is_an_error() {
        let doc = Document::with_version("1.5");
        let mut dict = image_dict(1, 1, Object::Name(b"DeviceGray".to_vec()), 8);
        dict.set("Filter", "JBIG2Decode");
        let err = Pixmap::from_stream(&doc, &Stream::new(dict, vec![0])).unwrap_err();
        assert!(matches!(err, ImageDecodeError::UnsupportedFilter(ref f) if f == "JBIG2Decode"));
    }

    #[test]
    fn stencil_mask_is_rejected() {
        let doc = Document::with_version("1.5");
        let mut dict = image_dict(1, 1, Object::Name(b"DeviceGray".to_vec()), 1);
        dict.set("ImageMask", true);
        let err = Pixmap::from_stream(&doc, &Stream::new(dict, vec![0])).unwrap_err();
        assert!(matches!(err, ImageDecodeError::StencilMask));
    }

    #[test]
    fn truncated_data_is_an_error() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(image_dict(4, 4, Object::Name(b"DeviceRGB".to_vec()), 8), vec![0; 10]);
        let err = Pixmap::from_stream(&doc, &stream).unwrap_err();
        assert!(matches!(err, ImageDecodeError::Truncated { expected: 48, actual: 10 }));
    }

    #[test]
    fn abbreviated_flate_name_is_accepted() {
        let doc = Document::with_version("1.5");
        let mut dict = image_dict(2, 1, Object::Name(b"DeviceRGB".to_vec()), 8);
        dict.set("Filter", vec![Object::Name(b"Fl".to_vec())]);
        let stream = Stream::new(dict, zlib(&[1, 2, 3, 4, 5, 6]));
        let px = Pixmap::from_stream(&doc, &stream).unwrap();
        assert_eq!(px.samples, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn indexed_lookup_stream_is_inflated() {
        let mut doc = Document::with_version("1.5");
        let lookup = doc.add_object(Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            zlib(&[0, 0, 0, 200, 100, 50]),
        ));
        let cs = Object::Array(vec![
            Object::Name(b"Indexed".to_vec()),
            Object::Name(b"DeviceRGB".to_vec()),
            Object::Integer(1),
            Object::Reference(lookup),
        ]);
        let stream = Stream::new(image_dict(1, 1, cs, 8), vec![1]);
        let px = Pixmap::from_stream(&doc, &stream).unwrap();
        assert_eq!(px.samples, vec![200, 100, 50]);
    }

    #[test]
    fn tiff_predictor_is_an_error() {
        let doc = Document::with_version("1.5");
        let mut dict = image_dict(2, 1, Object::Name(b"DeviceGray".to_vec()), 8);
        dict.set("Filter", "FlateDecode");
        dict.set("DecodeParms", dictionary! { "Predictor" => 2, "Columns" => 2 });
        let err = Pixmap::from_stream(&doc, &Stream::new(dict, zlib(&[1, 1]))).unwrap_err();
        assert!(matches!(err, ImageDecodeError::UnsupportedPredictor(2)));
    }
}
