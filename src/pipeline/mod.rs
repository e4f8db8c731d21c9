//! Pipeline stages for PDF-to-MCQ generation.
//!
//! Each submodule implements one step and can be tested on its own. Only
//! [`input`] and [`llm`] do network I/O; [`extract`] is the only stage that
//! touches the PDF.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ chunk ──▶ generator ──▶ assign
//! (URL/path) (lopdf)    (words)   (quota, llm,  (keywords)
//!                                  parse)
//! ```
//!
//! 1. [`input`]     canonicalise the path or URL to a local, `%PDF`-checked file
//! 2. [`extract`]   page-marked text plus filtered images, with document-wide
//!    image provenance; runs in `spawn_blocking`. [`pixmap`] decodes image
//!    XObjects for it.
//! 3. [`chunk`]     fixed-size word windows
//! 4. [`generator`] per-difficulty [`quota`], one [`llm`] request per
//!    (difficulty, chunk), each response run through [`parse`]
//! 5. [`assign`]    attach at most one image to each question that mentions
//!    a visual

pub mod assign;
pub mod chunk;
pub mod extract;
pub mod generator;
pub mod input;
pub mod llm;
pub mod parse;
pub mod pixmap;
pub mod quota;
