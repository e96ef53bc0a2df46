//! Semicolon-separated export of a run's product records.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use storewalk_core::ProductRecord;

pub(crate) const HEADER: [&str; 8] = [
    "Store URL",
    "Category",
    "Product URL",
    "Name",
    "Image URL",
    "Large Image URL",
    "Price",
    "Original Price",
];

/// Line breaks inside a field would split the row; flatten them to spaces.
fn clean(field: &str) -> String {
    field.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

fn row(record: &ProductRecord) -> [String; 8] {
    [
        &record.store_url,
        &record.category,
        &record.product_url,
        &record.name,
        &record.image_url,
        &record.large_image_url,
        &record.price,
        &record.original_price,
    ]
    .map(|field| clean(field))
}

/// Writes the header row followed by one row per record, in order.
pub(crate) fn write_records<W: Write>(w: W, records: &[ProductRecord]) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .terminator(csv::Terminator::CRLF)
        .has_headers(false)
        .from_writer(w);
    writer.write_record(HEADER)?;
    for record in records {
        writer.write_record(row(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Creates (or truncates) `path` and writes `records` to it.
pub(crate) fn write_csv_file(path: &Path, records: &[ProductRecord]) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_records(file, records).with_context(|| format!("failed to write {}", path.display()))
}
