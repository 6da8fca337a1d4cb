use crate::llm::{file_utils, ChatTurn, InlineImage};
use crate::project::{Material, Message, Role};

const SECTION_SEPARATOR: &str = "\n---\n";
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// What the project's active materials contribute to a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialContext {
    /// Non-image materials as labelled sections, empty when there are none.
    pub text: String,
    pub images: Vec<InlineImage>,
}

/// Split the active materials into the text block and the inline image
/// parts. Inactive materials contribute nothing.
pub fn assemble<'a>(materials: impl IntoIterator<Item = &'a Material>) -> MaterialContext {
    let (images, texts): (Vec<&Material>, Vec<&Material>) = materials
        .into_iter()
        .filter(|m| m.is_active)
        .partition(|m| m.is_image_bearing());

    let text = texts
        .iter()
        .map(|m| format!("[资料: {}]\n{}\n", m.title, m.content))
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR);

    let images = images
        .into_iter()
        .filter_map(|m| {
            let data = m.data.as_deref()?;
            Some(InlineImage {
                data: file_utils::data_uri_payload(data).to_string(),
                mime_type: m
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
            })
        })
        .collect();

    MaterialContext { text, images }
}

/// Prior turns to send with `new_text`.
///
/// The message list already ends with the user turn being sent, and sending
/// it again as history would put two user turns back to back. That trailing
/// entry is dropped when it is a USER message with the same text. Empty
/// messages (unfinished placeholders) and error messages are never sent.
pub fn effective_history(messages: &[Message], new_text: &str) -> Vec<ChatTurn> {
    let prior = match messages.split_last() {
        Some((last, rest)) if last.role == Role::User && last.text.trim() == new_text.trim() => rest,
        _ => messages,
    };

    prior
        .iter()
        .filter(|m| !m.is_error && !m.text.trim().is_empty())
        .map(|m| ChatTurn {
            role: m.role,
            text: m.text.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::MaterialKind;

    fn text_material(title: &str, content: &str) -> Material {
        Material::manual(MaterialKind::Text, title, content).unwrap()
    }

    #[test]
    fn test_text_block_labels_sections() {
        let materials = vec![
            text_material("Syllabus", "Grade 6 math"),
            Material::manual(MaterialKind::Link, "Standard", "https://example.org/std").unwrap(),
        ];

        let context = assemble(&materials);
        assert_eq!(
            context.text,
            "[资料: Syllabus]\nGrade 6 math\n\n---\n[资料: Standard]\nhttps://example.org/std\n"
        );
        assert!(context.images.is_empty());
    }

    #[test]
    fn test_inactive_materials_are_left_out() {
        let mut syllabus = text_material("Syllabus", "Grade 6 math");
        syllabus.is_active = false;

        let context = assemble(&[syllabus]);
        assert_eq!(context, MaterialContext::default());
    }

    #[test]
    fn test_images_become_inline_parts() {
        let image = Material::upload("board.png", "image/png", b"hello");
        let pdf = Material::upload("plan.pdf", "application/pdf", b"%PDF");
        let mut image_file = Material::upload("scan", "application/octet-stream", b"hi");
        image_file.mime_type = None;
        image_file.kind = MaterialKind::Image;

        let context = assemble(&[image, pdf, image_file]);

        assert_eq!(context.images.len(), 2);
        assert_eq!(context.images[0].data, "aGVsbG8=");
        assert_eq!(context.images[0].mime_type, "image/png");
        assert_eq!(context.images[1].mime_type, "image/jpeg");
        // Non-image uploads are described in the text block.
        assert_eq!(context.text, "[资料: plan.pdf]\n文件附件\n");
    }

    #[test]
    fn test_image_without_payload_is_skipped() {
        let mut image = Material::upload("board.png", "image/png", b"x");
        image.data = None;
        assert!(assemble(&[image]).images.is_empty());
    }

    #[test]
    fn test_history_drops_trailing_duplicate_user_turn() {
        let messages = vec![
            Message::user("first"),
            Message::model("answer"),
            Message::user("second"),
        ];

        let history = effective_history(&messages, "second");
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().role, Role::Model);
    }

    #[test]
    fn test_history_keeps_trailing_user_turn_with_other_text() {
        let messages = vec![Message::user("template")];
        let history = effective_history(&messages, "my subject is math");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, "template");
    }

    #[test]
    fn test_history_skips_empty_placeholders() {
        let messages = vec![
            Message::user("q"),
            Message::model(""),
            Message::user("q2"),
        ];
        let history = effective_history(&messages, "q2");
        assert_eq!(history, vec![ChatTurn { role: Role::User, text: "q".to_string() }]);
    }

    #[test]
    fn test_history_leaves_out_error_messages() {
        let messages = vec![
            Message::user("first"),
            Message::model("Real lesson plan"),
            Message::user("second"),
            Message::error("Error: API error: quota exceeded"),
            Message::user("third"),
        ];

        let history = effective_history(&messages, "third");
        let texts: Vec<&str> = history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "Real lesson plan", "second"]);
    }
}
