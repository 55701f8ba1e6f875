//! Test helpers that read rendered PDFs back with `lopdf`.

use lopdf::{content::Content, content::Operation, Document, Object};

/// Decoded content-stream operations, one entry per page in page order.
pub fn page_operations(bytes: &[u8]) -> Vec<Vec<Operation>> {
    let doc = Document::load_mem(bytes).expect("rendered bytes should parse as PDF");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let raw = doc.get_page_content(page_id).expect("page content");
            Content::decode(&raw).expect("content stream").operations
        })
        .collect()
}

/// Every string drawn with `Tj`, one entry per page in page order.
pub fn page_texts(bytes: &[u8]) -> Vec<Vec<String>> {
    page_operations(bytes)
        .into_iter()
        .map(|ops| {
            ops.iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(text, _)) => {
                        Some(text.iter().map(|&b| char::from(b)).collect())
                    }
                    _ => None,
                })
                .collect()
        })
        .collect()
}

/// Operands of every `re` (rectangle) operation on a page, as floats.
pub fn rectangles(ops: &[Operation]) -> Vec<Vec<f32>> {
    ops.iter()
        .filter(|op| op.operator == "re")
        .map(|op| {
            op.operands
                .iter()
                .map(|o| o.as_float().expect("numeric operand"))
                .collect()
        })
        .collect()
}

pub fn draws_image(ops: &[Operation]) -> bool {
    ops.iter().any(|op| op.operator == "Do")
}
