//! Blog content rendering.
//!
//! Blog text uses `#`/`##` heading lines and `<<IMAGE n>>` placeholders that
//! refer (1-based) to the recipe's blog images. Rendering turns it into a
//! flat list of blocks the reader can lay out.

use serde::Serialize;

use crate::types::BlogImage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlogBlock {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    #[serde(rename_all = "camelCase")]
    Image { image_url: String, alt_text: String },
}

/// Parse a placeholder line such as `<<IMAGE 2>>` into its 1-based index.
pub fn placeholder_index(line: &str) -> Option<usize> {
    let inner = line.trim().strip_prefix("<<")?.strip_suffix(">>")?;
    let number = inner.trim().strip_prefix("IMAGE")?.trim();
    number.parse().ok()
}

/// Resolve a 1-based placeholder index against the image list.
pub fn resolve_placeholder(index: usize, images: &[BlogImage]) -> Option<&BlogImage> {
    index.checked_sub(1).and_then(|i| images.get(i))
}

/// Split blog content into blocks.
///
/// Placeholders may sit on their own line or inside a paragraph; either way
/// they become image blocks. Unresolved or out-of-range placeholders are
/// dropped.
pub fn render_blog(content: &str, images: &[BlogImage]) -> Vec<BlogBlock> {
    let mut blocks = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(heading) = parse_heading(line) {
            blocks.push(heading);
            continue;
        }

        let mut rest = line;
        while let Some(start) = rest.find("<<") {
            let Some(len) = rest[start..].find(">>") else {
                break;
            };
            let end = start + len + 2;
            push_paragraph(&mut blocks, &rest[..start]);

            match placeholder_index(&rest[start..end]) {
                Some(index) => match resolve_placeholder(index, images) {
                    Some(image) => blocks.push(BlogBlock::Image {
                        image_url: image.image_url.clone(),
                        alt_text: image.alt_text.clone(),
                    }),
                    None => tracing::debug!(index, "dropping unresolved image placeholder"),
                },
                None => push_paragraph(&mut blocks, &rest[start..end]),
            }
            rest = &rest[end..];
        }
        push_paragraph(&mut blocks, rest);
    }

    blocks
}

fn parse_heading(line: &str) -> Option<BlogBlock> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 {
        return None;
    }
    let text = line[hashes..].trim();
    if text.is_empty() {
        return None;
    }
    Some(BlogBlock::Heading {
        level: hashes.min(6) as u8,
        text: text.to_string(),
    })
}

fn push_paragraph(blocks: &mut Vec<BlogBlock>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        blocks.push(BlogBlock::Paragraph {
            text: text.to_string(),
        });
    }
}
