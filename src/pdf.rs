//! Encodes a [`LaidOutDocument`] as PDF bytes.
//!
//! Text uses the standard 14 Helvetica faces with WinAnsiEncoding, so no
//! font program is embedded. Streams are left uncompressed.

use crate::error::VisionError;
use crate::layout::metrics::MM_PER_PT;
use crate::layout::{FontWeight, LaidOutDocument, Mark, Page, TextRun, PAGE_HEIGHT, PAGE_WIDTH};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

/// Encode `doc` as a complete PDF file.
pub fn write_pdf(doc: &LaidOutDocument) -> Result<Vec<u8>, VisionError> {
    let mut pdf = Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let regular_id = pdf.add_object(font("Helvetica"));
    let bold_id = pdf.add_object(font("Helvetica-Bold"));
    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR_FONT => regular_id,
            BOLD_FONT => bold_id,
        },
    });

    let media_box: Vec<Object> = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(to_pt(PAGE_WIDTH)),
        Object::Real(to_pt(PAGE_HEIGHT)),
    ];

    let mut kids = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let content = page_content(page)
            .encode()
            .map_err(|e| VisionError::PdfEncodingFailed(e.to_string()))?;
        let content_id = pdf.add_object(Stream::new(dictionary! {}, content));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.clone(),
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);

    let props = &doc.properties;
    let info_id = pdf.add_object(dictionary! {
        "Title" => text_string(&props.title),
        "Subject" => text_string(&props.subject),
        "Author" => text_string(&props.author),
        "Keywords" => text_string(&props.keywords),
        "Creator" => text_string("visionai"),
    });
    pdf.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes)
        .map_err(|e| VisionError::PdfEncodingFailed(e.to_string()))?;
    Ok(bytes)
}

fn font(base: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(base.as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn page_content(page: &Page) -> Content {
    let mut operations = Vec::new();
    for mark in &page.marks {
        match mark {
            Mark::Text(run) => text_ops(run, &mut operations),
            Mark::Rule { x1, x2, y, color } => {
                let [r, g, b] = color.unit();
                let y = to_pt(PAGE_HEIGHT - y);
                operations.extend([
                    Operation::new("RG", rgb_operands(r, g, b)),
                    Operation::new("w", vec![Object::Real(0.57)]),
                    Operation::new("m", vec![Object::Real(to_pt(*x1)), Object::Real(y)]),
                    Operation::new("l", vec![Object::Real(to_pt(*x2)), Object::Real(y)]),
                    Operation::new("S", vec![]),
                ]);
            }
        }
    }
    Content { operations }
}

fn text_ops(run: &TextRun, ops: &mut Vec<Operation>) {
    let font = match run.weight {
        FontWeight::Regular => REGULAR_FONT,
        FontWeight::Bold => BOLD_FONT,
    };
    let [r, g, b] = run.color.unit();
    ops.extend([
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(font.as_bytes().to_vec()), Object::Real(run.size)],
        ),
        Operation::new("rg", rgb_operands(r, g, b)),
        Operation::new(
            "Td",
            vec![
                Object::Real(to_pt(run.x)),
                Object::Real(to_pt(PAGE_HEIGHT - run.y)),
            ],
        ),
        Operation::new(
            "Tj",
            vec![Object::String(win_ansi(&run.text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]);
}

fn rgb_operands(r: f32, g: f32, b: f32) -> Vec<Object> {
    vec![Object::Real(r), Object::Real(g), Object::Real(b)]
}

fn to_pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

fn text_string(s: &str) -> Object {
    Object::String(win_ansi(s), StringFormat::Literal)
}

/// Encode text for a WinAnsiEncoding font. Characters without a code point
/// become `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            ' '..='~' => c as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}
