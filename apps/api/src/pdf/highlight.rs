//! Passage highlighting — locates flagged spans on each page and writes
//! colored highlight annotations into the original document.
//!
//! Matching is a case-sensitive literal search with whitespace runs collapsed
//! on both sides: the extraction prompt only ever sees whitespace-collapsed
//! text, so a flagged span may cross a line break in the source document. An
//! entry with no occurrence contributes zero annotations and is not an error.

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfium_render::prelude::*;

use crate::extraction::models::{RedMarker, YellowMarker};

use super::PdfError;

/// Stroke color for defect passages.
const RED: [f32; 3] = [1.0, 0.0, 0.0];
/// Stroke color for improvable passages.
const YELLOW: [f32; 3] = [1.0, 0.9, 0.4];

/// A single positioned character in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy)]
struct PlacedChar {
    ch: char,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

/// An axis-aligned highlight rectangle in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SpanRect {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

/// Applies highlight annotations for every located occurrence of every marker
/// and returns the annotated document as bytes. Pages, occurrences, and
/// markers are all handled independently; misses are silent.
pub fn annotate_resume(
    pdf_bytes: &[u8],
    red: &[RedMarker],
    yellow: &[YellowMarker],
) -> Result<Vec<u8>, PdfError> {
    let page_chars = collect_document_chars(pdf_bytes)?;

    let mut doc =
        Document::load_mem(pdf_bytes).map_err(|e| PdfError::Unreadable(e.to_string()))?;
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for (index, page_id) in page_ids.into_iter().enumerate() {
        let Some(chars) = page_chars.get(index) else {
            continue;
        };

        let mut annots: Vec<Object> = Vec::new();
        for marker in red {
            for rect in locate_spans(chars, &marker.original_text) {
                annots.push(Object::Reference(
                    doc.add_object(highlight_annotation(rect, RED)),
                ));
            }
        }
        for marker in yellow {
            for rect in locate_spans(chars, &marker.original_text) {
                annots.push(Object::Reference(
                    doc.add_object(highlight_annotation(rect, YELLOW)),
                ));
            }
        }

        if !annots.is_empty() {
            append_annotations(&mut doc, page_id, annots)?;
        }
    }

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(lopdf::Error::from)?;
    Ok(out)
}

// ────────────────────────────────────────────────────────────────────────────
// Character geometry (PDFium)
// ────────────────────────────────────────────────────────────────────────────

fn bind_pdfium() -> Result<Pdfium, PdfError> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| PdfError::Engine(format!("failed to initialize PDFium: {e}")))?;
    Ok(Pdfium::new(bindings))
}

/// Collects each page's characters with their bounding boxes, in content
/// order.
fn collect_document_chars(pdf_bytes: &[u8]) -> Result<Vec<Vec<PlacedChar>>, PdfError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .map_err(|e| PdfError::Unreadable(e.to_string()))?;

    let pages = document.pages();
    let mut out = Vec::with_capacity(pages.len() as usize);
    for index in 0..pages.len() {
        let page = pages.get(index).map_err(|e| {
            PdfError::Engine(format!("failed to get page {}: {e}", index + 1))
        })?;
        out.push(collect_page_chars(&page));
    }
    Ok(out)
}

fn collect_page_chars(page: &PdfPage) -> Vec<PlacedChar> {
    let text = match page.text() {
        Ok(t) => t,
        Err(_) => return Vec::new(),
    };

    let mut chars = Vec::new();
    for segment in text.segments().iter() {
        let Ok(segment_chars) = segment.chars() else {
            continue;
        };
        for ch in segment_chars.iter() {
            let (Some(c), Ok(bounds)) = (ch.unicode_char(), ch.loose_bounds()) else {
                continue;
            };
            chars.push(PlacedChar {
                ch: c,
                x0: bounds.left().value,
                y0: bounds.bottom().value,
                x1: bounds.right().value,
                y1: bounds.top().value,
            });
        }
    }
    chars
}

// ────────────────────────────────────────────────────────────────────────────
// Literal span search
// ────────────────────────────────────────────────────────────────────────────

/// Finds every occurrence of `needle` in the page's character stream and
/// returns one rectangle per occupied line.
fn locate_spans(chars: &[PlacedChar], needle: &str) -> Vec<SpanRect> {
    let needle = normalize_needle(needle);
    if needle.is_empty() {
        return Vec::new();
    }
    let stream = normalize_stream(chars);

    find_matches(&stream, &needle)
        .into_iter()
        .flat_map(|indices| group_into_line_rects(chars, &indices))
        .collect()
}

/// Normalized character stream: whitespace runs collapse to a single space
/// that carries no source index. A jump to a different line also reads as
/// whitespace — content streams often carry no space glyph at line breaks.
fn normalize_stream(chars: &[PlacedChar]) -> Vec<(char, Option<usize>)> {
    let mut out = Vec::with_capacity(chars.len());
    let mut pending_space = false;
    let mut prev: Option<&PlacedChar> = None;
    for (i, pc) in chars.iter().enumerate() {
        if pc.ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if let Some(p) = prev {
            if line_break_between(p, pc) {
                pending_space = !out.is_empty();
            }
        }
        if pending_space {
            out.push((' ', None));
            pending_space = false;
        }
        out.push((pc.ch, Some(i)));
        prev = Some(pc);
    }
    out
}

fn line_break_between(a: &PlacedChar, b: &PlacedChar) -> bool {
    let a_mid = (a.y0 + a.y1) / 2.0;
    let b_mid = (b.y0 + b.y1) / 2.0;
    let tolerance = ((a.y1 - a.y0).max(b.y1 - b.y0)) * 0.5;
    (a_mid - b_mid).abs() > tolerance.max(2.0)
}

fn normalize_needle(needle: &str) -> Vec<char> {
    let mut out = Vec::new();
    let mut pending_space = false;
    for c in needle.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

/// Non-overlapping occurrences; each match yields the source indices of its
/// non-whitespace characters.
fn find_matches(stream: &[(char, Option<usize>)], needle: &[char]) -> Vec<Vec<usize>> {
    let mut matches = Vec::new();
    let mut i = 0;
    while i + needle.len() <= stream.len() {
        if stream[i..i + needle.len()]
            .iter()
            .zip(needle)
            .all(|((c, _), n)| c == n)
        {
            matches.push(
                stream[i..i + needle.len()]
                    .iter()
                    .filter_map(|(_, source)| *source)
                    .collect(),
            );
            i += needle.len();
        } else {
            i += 1;
        }
    }
    matches
}

/// Merges the matched characters into one rectangle per text line, splitting
/// whenever a character's vertical position leaves the current line.
fn group_into_line_rects(chars: &[PlacedChar], indices: &[usize]) -> Vec<SpanRect> {
    let mut rects: Vec<SpanRect> = Vec::new();
    let mut current: Option<SpanRect> = None;

    for &i in indices {
        let c = chars[i];
        match current {
            Some(ref mut rect) if same_line(rect, &c) => {
                rect.x0 = rect.x0.min(c.x0);
                rect.y0 = rect.y0.min(c.y0);
                rect.x1 = rect.x1.max(c.x1);
                rect.y1 = rect.y1.max(c.y1);
            }
            _ => {
                if let Some(done) = current.take() {
                    rects.push(done);
                }
                current = Some(SpanRect {
                    x0: c.x0,
                    y0: c.y0,
                    x1: c.x1,
                    y1: c.y1,
                });
            }
        }
    }
    if let Some(done) = current {
        rects.push(done);
    }
    rects
}

fn same_line(rect: &SpanRect, c: &PlacedChar) -> bool {
    let rect_mid = (rect.y0 + rect.y1) / 2.0;
    let char_mid = (c.y0 + c.y1) / 2.0;
    let tolerance = ((rect.y1 - rect.y0).max(c.y1 - c.y0)) * 0.5;
    (rect_mid - char_mid).abs() <= tolerance.max(2.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Annotation writing (lopdf)
// ────────────────────────────────────────────────────────────────────────────

fn highlight_annotation(rect: SpanRect, color: [f32; 3]) -> Dictionary {
    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Highlight".to_vec()));
    annot.set(
        "Rect",
        Object::Array(vec![
            rect.x0.into(),
            rect.y0.into(),
            rect.x1.into(),
            rect.y1.into(),
        ]),
    );
    // Quad order: top-left, top-right, bottom-left, bottom-right.
    annot.set(
        "QuadPoints",
        Object::Array(vec![
            rect.x0.into(),
            rect.y1.into(),
            rect.x1.into(),
            rect.y1.into(),
            rect.x0.into(),
            rect.y0.into(),
            rect.x1.into(),
            rect.y0.into(),
        ]),
    );
    annot.set(
        "C",
        Object::Array(color.iter().map(|&c| c.into()).collect()),
    );
    annot.set("F", Object::Integer(4));
    annot
}

/// Appends annotation references to the page's /Annots array, which may be
/// inline, indirect, or absent.
fn append_annotations(
    doc: &mut Document,
    page_id: ObjectId,
    refs: Vec<Object>,
) -> Result<(), PdfError> {
    let indirect_annots = doc
        .get_dictionary(page_id)?
        .get(b"Annots")
        .ok()
        .and_then(|obj| match obj {
            Object::Reference(id) => Some(*id),
            _ => None,
        });

    if let Some(array_id) = indirect_annots {
        doc.get_object_mut(array_id)?.as_array_mut()?.extend(refs);
        return Ok(());
    }

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    if let Ok(Object::Array(array)) = page.get_mut(b"Annots") {
        array.extend(refs);
        return Ok(());
    }
    page.set("Annots", Object::Array(refs));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lays `text` out as one line at baseline `y`, 10 units per character,
    /// 10 units tall.
    fn line(text: &str, y: f32) -> Vec<PlacedChar> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| PlacedChar {
                ch,
                x0: i as f32 * 10.0,
                y0: y,
                x1: (i + 1) as f32 * 10.0,
                y1: y + 10.0,
            })
            .collect()
    }

    #[test]
    fn test_single_occurrence_single_line() {
        let chars = line("led a team of five", 700.0);
        let rects = locate_spans(&chars, "team");
        assert_eq!(rects.len(), 1);
        // "team" starts at char index 6.
        assert_eq!(rects[0].x0, 60.0);
        assert_eq!(rects[0].x1, 100.0);
        assert_eq!(rects[0].y0, 700.0);
        assert_eq!(rects[0].y1, 710.0);
    }

    #[test]
    fn test_no_occurrence_is_silent() {
        let chars = line("led a team of five", 700.0);
        assert!(locate_spans(&chars, "kubernetes").is_empty());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let chars = line("Led a Team of five", 700.0);
        assert!(locate_spans(&chars, "team").is_empty());
        assert_eq!(locate_spans(&chars, "Team").len(), 1);
    }

    #[test]
    fn test_multiple_occurrences_found() {
        let chars = line("ship it and ship it again", 700.0);
        assert_eq!(locate_spans(&chars, "ship it").len(), 2);
    }

    #[test]
    fn test_whitespace_runs_collapse_in_both_needle_and_page() {
        let chars = line("responsible  for  testing", 700.0);
        assert_eq!(locate_spans(&chars, "responsible for").len(), 1);

        let chars = line("responsible for testing", 700.0);
        assert_eq!(locate_spans(&chars, "responsible\nfor").len(), 1);
    }

    #[test]
    fn test_span_across_lines_yields_one_rect_per_line() {
        let mut chars = line("improved system", 700.0);
        chars.extend(line("reliability", 680.0));
        let rects = locate_spans(&chars, "system reliability");
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].y0, 700.0);
        assert_eq!(rects[1].y0, 680.0);
    }

    #[test]
    fn test_empty_and_whitespace_needles_match_nothing() {
        let chars = line("anything", 700.0);
        assert!(locate_spans(&chars, "").is_empty());
        assert!(locate_spans(&chars, "   \n ").is_empty());
    }

    #[test]
    fn test_highlight_annotation_shape() {
        let rect = SpanRect {
            x0: 10.0,
            y0: 20.0,
            x1: 110.0,
            y1: 32.0,
        };
        let annot = highlight_annotation(rect, RED);
        assert_eq!(
            annot.get(b"Subtype").unwrap(),
            &Object::Name(b"Highlight".to_vec())
        );
        let quads = annot.get(b"QuadPoints").unwrap().as_array().unwrap();
        assert_eq!(quads.len(), 8);
        let colors = annot.get(b"C").unwrap().as_array().unwrap();
        assert_eq!(colors.len(), 3);
    }
}
