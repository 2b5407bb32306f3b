use super::{Entry, ParameterDocument, SectionKind};

const SECTION_HEADER_WIDTH: usize = 84;
const CONTINUATION_INDENT: usize = 25;

pub(super) fn to_text(document: &ParameterDocument) -> String {
    // The value column is padded to one past the longest `name = value`
    // string anywhere in the document, so the width must be known before a
    // single line is emitted.
    let value_column = 1 + document
        .parameters()
        .map(|(name, value, _)| format!("{} = {}", name, value).len())
        .max()
        .unwrap_or(0);

    let mut text = String::new();

    for entry in &document.section(SectionKind::Description).entries {
        push_entry(&mut text, entry, value_column);
    }

    for section in document.sections().iter().skip(1) {
        text.push('\n');
        push_section_header(&mut text, section.kind);
        for entry in &section.entries {
            push_entry(&mut text, entry, value_column);
        }
    }

    text
}

fn push_section_header(text: &mut String, kind: SectionKind) {
    let title = format!("**{}", kind.name());
    text.push_str(&title);
    for _ in title.len()..SECTION_HEADER_WIDTH {
        text.push('*');
    }
    text.push('\n');
}

fn push_entry(text: &mut String, entry: &Entry, value_column: usize) {
    match entry {
        Entry::Comment { text: comment } => {
            text.push_str("** ");
            text.push_str(comment);
            text.push('\n');
        }
        Entry::Parameter {
            name,
            value,
            description,
        } => {
            let assignment = format!("{} = {}", name, value);
            text.push_str(&assignment);
            for _ in assignment.len()..value_column {
                text.push(' ');
            }

            let mut segments = description.split('*');
            let first = segments.next().unwrap_or_default();
            text.push_str("* ");
            text.push_str(first);
            text.push('\n');
            for segment in segments {
                for _ in 0..CONTINUATION_INDENT {
                    text.push(' ');
                }
                text.push_str("* ");
                text.push_str(segment);
                text.push('\n');
            }
        }
    }
}
