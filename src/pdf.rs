//! Single-student report card rendered straight to PDF objects.
//!
//! Layout works in millimetres from the top-left corner of an A4 page and is
//! converted to PDF points (origin bottom-left) only when emitting operators.

use crate::config::Institution;
use crate::scores::{ScoreTable, COLUMNS};
use anyhow::{anyhow, Context};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};
use tracing::warn;

const MM: f32 = 72.0 / 25.4;
const PAGE_W_MM: f32 = 210.0;
const PAGE_H_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const BOTTOM_LIMIT_MM: f32 = PAGE_H_MM - 20.0;
const CELL_PAD_MM: f32 = 1.0;

const COL_W_MM: f32 = 27.0;
const ROW_H_MM: f32 = 10.0;
const IMAGE_W_MM: f32 = 25.0;
const LOGO_POS_MM: (f32, f32) = (10.0, 8.0);
const PHOTO_POS_MM: (f32, f32) = (170.0, 8.0);

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

pub struct ReportCard<'a> {
    pub student_id: &'a str,
    pub rank: &'a str,
    pub table: &'a ScoreTable,
    pub institution: &'a Institution,
    pub logo: Option<PathBuf>,
    pub photo: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum Align {
    Left,
    Center,
    Right,
}

/// Content of one page while it is being laid out.
struct PageCanvas {
    ops: Vec<Operation>,
}

impl PageCanvas {
    fn new() -> Self {
        Self {
            ops: vec![Operation::new("w", vec![(0.2 * MM).into()])],
        }
    }

    fn cell(&mut self, x: f32, y: f32, w: f32, h: f32, text: &str, style: TextStyle) {
        if style.border {
            self.ops.push(Operation::new(
                "re",
                vec![
                    (x * MM).into(),
                    ((PAGE_H_MM - y - h) * MM).into(),
                    (w * MM).into(),
                    (h * MM).into(),
                ],
            ));
            self.ops.push(Operation::new("S", vec![]));
        }
        if text.is_empty() {
            return;
        }

        let text_w = text_width_mm(text, style.size, style.bold);
        let tx = match style.align {
            Align::Left => x + CELL_PAD_MM,
            Align::Center => x + (w - text_w) / 2.0,
            Align::Right => x + w - CELL_PAD_MM - text_w,
        };
        let baseline = y + h / 2.0 + 0.3 * style.size / MM;
        let font = if style.bold { FONT_BOLD } else { FONT_REGULAR };

        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.as_bytes().to_vec()), style.size.into()],
        ));
        self.ops.push(Operation::new(
            "Td",
            vec![(tx * MM).into(), ((PAGE_H_MM - baseline) * MM).into()],
        ));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi(text))],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }
}

#[derive(Clone, Copy)]
struct TextStyle {
    size: f32,
    bold: bool,
    align: Align,
    border: bool,
}

impl TextStyle {
    fn plain(size: f32, align: Align) -> Self {
        Self {
            size,
            bold: false,
            align,
            border: false,
        }
    }

    fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    fn bordered(self) -> Self {
        Self {
            border: true,
            ..self
        }
    }
}

pub fn render_pdf(card: &ReportCard<'_>) -> anyhow::Result<RenderedPdf> {
    let pages = layout_pages(card);
    let page_count = pages.len();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(font_dict("Helvetica"));
    let bold_id = doc.add_object(font_dict("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_REGULAR => regular_id,
            FONT_BOLD => bold_id,
        },
    });

    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(page_count);
    for canvas in pages {
        let content = Content {
            operations: canvas.ops,
        };
        let encoded = content.encode().context("failed to encode page content")?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                (PAGE_W_MM * MM).into(),
                (PAGE_H_MM * MM).into(),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(win_ansi(&format!("Report Card - {}", card.student_id))),
        "Producer" => Object::string_literal(format!("reportcardd {}", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(
            chrono::Local::now().format("D:%Y%m%d%H%M%S").to_string()
        ),
    });
    doc.trailer.set("Info", info_id);

    if let Some(first_page) = page_ids.first().copied() {
        if let Some(logo) = &card.logo {
            place_image(&mut doc, first_page, logo, LOGO_POS_MM);
        }
        if let Some(photo) = &card.photo {
            place_image(&mut doc, first_page, photo, PHOTO_POS_MM);
        }
    }

    doc.compress();
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| anyhow!("failed to serialize pdf: {e}"))?;
    Ok(RenderedPdf {
        bytes,
        pages: page_count,
    })
}

fn layout_pages(card: &ReportCard<'_>) -> Vec<PageCanvas> {
    let full_w = PAGE_W_MM - 2.0 * MARGIN_MM;
    let mut pages = Vec::new();
    let mut page = PageCanvas::new();
    let mut y = MARGIN_MM;

    page.cell(
        MARGIN_MM,
        y,
        full_w,
        10.0,
        &card.institution.name,
        TextStyle::plain(14.0, Align::Center).bold(),
    );
    y += 10.0;
    page.cell(
        MARGIN_MM,
        y,
        full_w,
        10.0,
        &card.institution.address,
        TextStyle::plain(12.0, Align::Center),
    );
    y += 10.0 + 5.0;

    let line = TextStyle::plain(12.0, Align::Left).bold();
    page.cell(
        MARGIN_MM,
        y,
        100.0,
        10.0,
        &format!("Student Name: {}", card.student_id),
        line,
    );
    page.cell(
        MARGIN_MM + 100.0,
        y,
        full_w - 100.0,
        10.0,
        &format!("Rank: {} Position", card.rank),
        TextStyle {
            align: Align::Right,
            ..line
        },
    );
    y += 10.0 + 5.0;

    let header = TextStyle::plain(12.0, Align::Center).bold().bordered();
    for (i, title) in COLUMNS.iter().enumerate() {
        page.cell(MARGIN_MM + i as f32 * COL_W_MM, y, COL_W_MM, ROW_H_MM, title, header);
    }
    y += ROW_H_MM;

    let body = TextStyle::plain(12.0, Align::Center).bordered();
    for row in &card.table.rows {
        if y + ROW_H_MM > BOTTOM_LIMIT_MM {
            pages.push(std::mem::replace(&mut page, PageCanvas::new()));
            y = MARGIN_MM;
        }
        for (i, value) in row.display_cells().iter().enumerate() {
            page.cell(MARGIN_MM + i as f32 * COL_W_MM, y, COL_W_MM, ROW_H_MM, value, body);
        }
        y += ROW_H_MM;
    }
    pages.push(page);
    pages
}

fn font_dict(base_font: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Draws an image `IMAGE_W_MM` wide, keeping its aspect ratio. Unreadable
/// images are skipped like missing ones.
fn place_image(doc: &mut Document, page_id: ObjectId, path: &Path, top_left_mm: (f32, f32)) {
    let stream = match lopdf::xobject::image(path) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable image");
            return;
        }
    };
    let dim = |key: &[u8]| stream.dict.get(key).and_then(|o| o.as_i64()).ok();
    let (Some(px_w), Some(px_h)) = (dim(b"Width"), dim(b"Height")) else {
        warn!(path = %path.display(), "image has no dimensions; skipping");
        return;
    };
    if px_w <= 0 || px_h <= 0 {
        return;
    }
    let h_mm = IMAGE_W_MM * px_h as f32 / px_w as f32;
    let (x_mm, y_mm) = top_left_mm;
    let position = (x_mm * MM, (PAGE_H_MM - y_mm - h_mm) * MM);
    let size = (IMAGE_W_MM * MM, h_mm * MM);
    if let Err(e) = doc.insert_image(page_id, stream, position, size) {
        warn!(path = %path.display(), error = %e, "failed to place image");
    }
}

/// Standard fonts only cover Latin-1; anything else becomes '?'.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Rough Helvetica advance widths in 1/1000 em.
fn glyph_width(c: char) -> f32 {
    match c {
        ' ' | 'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' | 'I' => 278.0,
        'f' | 't' | 'r' => 333.0,
        'm' | 'w' => 833.0,
        'M' | 'W' => 889.0,
        '0'..='9' => 556.0,
        c if c.is_ascii_uppercase() => 667.0,
        _ => 556.0,
    }
}

fn text_width_mm(text: &str, size_pt: f32, bold: bool) -> f32 {
    let units: f32 = text.chars().map(glyph_width).sum();
    let scale = if bold { 1.05 } else { 1.0 };
    units * scale / 1000.0 * size_pt / MM
}
