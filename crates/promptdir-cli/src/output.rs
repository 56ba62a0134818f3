//! Plain-text rendering of records.

use promptdir_core::{ImageRef, Record};

fn image_description(image_ref: &ImageRef) -> String {
    match image_ref {
        ImageRef::Inline(image) => format!("inline {} ({} bytes)", image.mime_type, image.data.len()),
        ImageRef::Url(url) => url.clone(),
    }
}

/// One tab-separated line per record: id, date, title, author, tags.
pub fn summary_line(record: &Record) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        record.id,
        record.created_at.format("%Y-%m-%d"),
        record.title,
        record.author,
        record.tags.join(",")
    )
}

pub fn detail(record: &Record) -> String {
    let mut out = format!(
        "{}\nid: {}\nauthor: {}",
        record.title, record.id, record.author
    );
    if let Some(url) = &record.author_url {
        out.push_str(&format!(" <{}>", url));
    }
    out.push_str(&format!(
        "\ncreated: {}\ntags: {}\nimage: {}\n\n{}",
        record.created_at.to_rfc3339(),
        record.tags.join(", "),
        image_description(&record.image_ref),
        record.body
    ));
    out
}
