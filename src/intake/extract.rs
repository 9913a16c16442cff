//! Plain-text extraction from uploaded submission documents.

use std::io::{Cursor, Read};

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use quick_xml::events::Event;

use super::IntakeError;

/// Upload formats, detected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// .pdf
    Pdf,
    /// .docx
    Docx,
    /// .xlsx, .xls, .xlsm, .ods
    Spreadsheet,
    /// .txt and anything unrecognised
    Text,
}

impl DocumentFormat {
    pub fn from_filename(filename: &str) -> Self {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => DocumentFormat::Pdf,
            "docx" => DocumentFormat::Docx,
            "xlsx" | "xls" | "xlsm" | "ods" => DocumentFormat::Spreadsheet,
            _ => DocumentFormat::Text,
        }
    }
}

/// Extract the text of an uploaded file, choosing the reader by extension.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, IntakeError> {
    let format = DocumentFormat::from_filename(filename);
    let text = match format {
        DocumentFormat::Pdf => extract_pdf(bytes)?,
        DocumentFormat::Docx => extract_docx(bytes)?,
        DocumentFormat::Spreadsheet => extract_spreadsheet(bytes)?,
        DocumentFormat::Text => String::from_utf8_lossy(bytes).into_owned(),
    };
    tracing::debug!(filename, ?format, chars = text.chars().count(), "Extracted document text");
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, IntakeError> {
    // pdf-extract can panic on malformed input
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(IntakeError::Extraction(format!("PDF: {e}"))),
        Err(_) => Err(IntakeError::Extraction(
            "PDF extraction panicked (malformed file)".to_string(),
        )),
    }
}

/// Paragraph text from `word/document.xml`, one line per `w:p`.
fn extract_docx(bytes: &[u8]) -> Result<String, IntakeError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| IntakeError::Extraction(format!("DOCX zip: {e}")))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| IntakeError::Extraction(format!("DOCX missing document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| IntakeError::Extraction(format!("DOCX read: {e}")))?;

    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    // Outer paragraphs suspended by one nested in a text box
    let mut outer: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"p" => outer.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                // self-closing paragraph
                b"p" => lines.push(String::new()),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    lines.push(std::mem::take(&mut current));
                    current = outer.pop().unwrap_or_default();
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                if let Ok(s) = e.unescape() {
                    current.push_str(&s);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(IntakeError::Extraction(format!("DOCX XML: {e}"))),
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}

/// Every sheet's rows as ` | `-joined cells, one row per line.
fn extract_spreadsheet(bytes: &[u8]) -> Result<String, IntakeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IntakeError::Extraction(format!("Spreadsheet: {e}")))?;

    let mut lines = Vec::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| IntakeError::Extraction(format!("Sheet {sheet_name}: {e}")))?;
        for row in range.rows() {
            let cells: Vec<String> = row.iter().map(cell_text).collect();
            lines.push(cells.join(" | "));
        }
    }
    Ok(lines.join("\n"))
}

/// Render a cell the way it reads in the sheet; integral floats lose `.0`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({e:?})"),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with(body: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(DocumentFormat::from_filename("ACORD.PDF"), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_filename("app.docx"), DocumentFormat::Docx);
        assert_eq!(DocumentFormat::from_filename("sov.xlsm"), DocumentFormat::Spreadsheet);
        assert_eq!(DocumentFormat::from_filename("notes.txt"), DocumentFormat::Text);
        assert_eq!(DocumentFormat::from_filename("README"), DocumentFormat::Text);
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let bytes = docx_with(
            "<w:p><w:r><w:t>Insured:</w:t></w:r><w:r><w:tab/><w:t>Blue Fin LLC</w:t></w:r></w:p>\
             <w:p><w:r><w:t xml:space=\"preserve\">Producer: </w:t><w:t>Harbor &amp; Co</w:t></w:r></w:p>",
        );
        let text = extract_text("submission.docx", &bytes).unwrap();
        assert_eq!(text, "Insured:\tBlue Fin LLC\nProducer: Harbor & Co");
    }

    #[test]
    fn docx_text_box_keeps_outer_paragraph() {
        let bytes = docx_with(
            "<w:p><w:r><w:t>Insured: </w:t></w:r>\
             <w:r><w:pict><w:txbxContent><w:p><w:r><w:t>Boxed note</w:t></w:r></w:p></w:txbxContent></w:pict></w:r>\
             <w:r><w:t>Blue Fin LLC</w:t></w:r></w:p>",
        );
        let text = extract_text("submission.docx", &bytes).unwrap();
        assert_eq!(text, "Boxed note\nInsured: Blue Fin LLC");
    }

    #[test]
    fn spreadsheet_rows_become_lines() {
        let bytes = crate::production::testing::xlsx_with(&[
            &["Insured", "TIV"],
            &["Blue Fin LLC", "1500000"],
        ]);
        let text = extract_text("sov.xlsx", &bytes).unwrap();
        assert_eq!(text, "Insured | TIV\nBlue Fin LLC | 1500000");
    }

    #[test]
    fn docx_without_document_xml_fails() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        let err = extract_text("broken.docx", &bytes).unwrap_err();
        assert!(err.to_string().starts_with("Failed to extract text: DOCX missing"));
    }

    #[test]
    fn garbage_pdf_is_an_error_not_a_panic() {
        let err = extract_text("scan.pdf", b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, IntakeError::Extraction(_)));
    }

    #[test]
    fn garbage_spreadsheet_is_an_error() {
        assert!(extract_text("sov.xlsx", b"PK nope").is_err());
    }

    #[test]
    fn unknown_types_decode_lossily() {
        let text = extract_text("memo.bin", b"TIV \xff 1,000,000").unwrap();
        assert!(text.starts_with("TIV "));
        assert!(text.ends_with(" 1,000,000"));
    }

    #[test]
    fn integral_floats_drop_fraction() {
        assert_eq!(format_number(1500.0), "1500");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(cell_text(&Data::Float(3.0)), "3");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
