/*
 * diagnostic.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Source-annotated error reports.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use weft_dom::Error;

/// Render a parse error against the source it came from.
///
/// Returns `None` for errors that carry no source position.
pub fn render_parse_error(path: &str, content: &str, error: &Error, color: bool) -> Option<String> {
    let Error::Parse {
        message, offset, ..
    } = error
    else {
        return None;
    };

    // ariadne spans count characters
    let start = char_index(content, *offset);
    let end = (start + 1).min(content.chars().count().max(start));

    let report = Report::build(ReportKind::Error, path, start)
        .with_config(Config::default().with_color(color))
        .with_message("XML syntax error")
        .with_label(
            Label::new((path, start..end))
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish();

    let mut output = Vec::new();
    report
        .write((path, Source::from(content)), &mut output)
        .ok()?;
    String::from_utf8(output).ok()
}

fn char_index(content: &str, offset: usize) -> usize {
    let mut end = offset.min(content.len());
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    content[..end].chars().count()
}
