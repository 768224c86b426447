//! Minimal OOXML package handling.
//!
//! [`Workbook`] patches cell values inside an existing spreadsheet package: untouched
//! parts are copied raw, edited worksheets are re-emitted event by event so every
//! element other than the rewritten cells stays as it was. [`DocxBuilder`] writes a
//! small WordprocessingML package from scratch.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Write};

use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::AppError;

const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// C0 control characters XML 1.0 does not allow, i.e. all but tab, LF and CR.
fn is_forbidden_in_xml(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}')
}

/// Cell text with forbidden control characters written as `_xHHHH_`, the escape
/// spreadsheet applications decode back into the original character.
fn cell_text(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_forbidden_in_xml) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if is_forbidden_in_xml(c) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Value written into a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Number(n as f64)
    }
}

/// A worksheet as listed in the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    pub name: String,
    /// Part path inside the package, e.g. `xl/worksheets/sheet1.xml`.
    pub path: String,
}

/// A spreadsheet package opened for cell edits.
pub struct Workbook {
    package: Vec<u8>,
    sheets: Vec<SheetRef>,
    edits: HashMap<String, BTreeMap<String, CellValue>>,
}

impl Workbook {
    pub fn open(package: Vec<u8>) -> Result<Self, AppError> {
        let sheets = {
            let mut archive = ZipArchive::new(Cursor::new(package.as_slice()))?;
            list_sheets(&mut archive)?
        };
        if sheets.is_empty() {
            return Err(AppError::GenerationFailure(
                "Workbook contains no worksheets".to_string(),
            ));
        }

        Ok(Self {
            package,
            sheets,
            edits: HashMap::new(),
        })
    }

    /// Sheets in workbook order.
    pub fn sheets(&self) -> &[SheetRef] {
        &self.sheets
    }

    /// Queue a cell write. Cells missing from the sheet are left alone on save.
    pub fn set_cell(&mut self, sheet: usize, cell: &str, value: impl Into<CellValue>) {
        if let Some(sheet) = self.sheets.get(sheet) {
            self.edits
                .entry(sheet.path.clone())
                .or_default()
                .insert(cell.to_ascii_uppercase(), value.into());
        }
    }

    /// Serialize the package with all queued edits applied.
    pub fn save(self) -> Result<Vec<u8>, AppError> {
        let mut archive = ZipArchive::new(Cursor::new(self.package.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for index in 0..archive.len() {
            let name = archive.by_index_raw(index)?.name().to_string();
            match self.edits.get(&name) {
                Some(cells) => {
                    let mut xml = Vec::new();
                    archive
                        .by_index(index)?
                        .read_to_end(&mut xml)
                        .map_err(|e| AppError::generation("Failed to read worksheet", e))?;
                    let patched = patch_sheet(&xml, cells)?;

                    let options = SimpleFileOptions::default()
                        .compression_method(CompressionMethod::Deflated);
                    writer.start_file(name.as_str(), options)?;
                    writer
                        .write_all(&patched)
                        .map_err(|e| AppError::generation("Failed to write worksheet", e))?;
                }
                None => writer.raw_copy_file(archive.by_index_raw(index)?)?,
            }
        }

        Ok(writer.finish()?.into_inner())
    }
}

fn list_sheets(archive: &mut ZipArchive<Cursor<&[u8]>>) -> Result<Vec<SheetRef>, AppError> {
    let workbook_part = match read_part(archive, "_rels/.rels")? {
        Some(rels) => office_document_target(&rels)?,
        None => None,
    }
    .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string());

    let workbook_xml = read_part(archive, &workbook_part)?.ok_or_else(|| {
        AppError::GenerationFailure(format!("Missing workbook part {}", workbook_part))
    })?;
    let (dir, file) = split_part(&workbook_part);
    let rels_part = format!("{}_rels/{}.rels", dir, file);
    let rels_xml = read_part(archive, &rels_part)?.ok_or_else(|| {
        AppError::GenerationFailure(format!("Missing relationships part {}", rels_part))
    })?;

    let targets = relationship_targets(&rels_xml)?;
    let mut sheets = Vec::new();
    for (name, rel_id) in sheet_entries(&workbook_xml)? {
        match targets.get(&rel_id) {
            Some(target) => sheets.push(SheetRef {
                name,
                path: resolve_target(dir, target),
            }),
            None => tracing::warn!("Sheet '{}' has no relationship {}", name, rel_id),
        }
    }
    Ok(sheets)
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<Vec<u8>>, AppError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .map_err(|e| AppError::generation("Failed to read package part", e))?;
    Ok(Some(content))
}

fn split_part(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..=i], &path[i + 1..]),
        None => ("", path),
    }
}

fn resolve_target(dir: &str, target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("{}{}", dir, target),
    }
}

fn malformed(e: impl std::fmt::Display) -> AppError {
    AppError::generation("Malformed package XML", e)
}

fn write_failed(e: impl std::fmt::Display) -> AppError {
    AppError::generation("Failed to write worksheet", e)
}

fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>, AppError> {
    for attr in e.attributes() {
        let attr = attr.map_err(malformed)?;
        if attr.key.local_name().as_ref() == local {
            let value = attr.unescape_value().map_err(malformed)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Values of `attrs`, in order, for every element whose local name is `element`.
fn collect_elements(
    xml: &[u8],
    element: &[u8],
    attrs: &[&[u8]],
) -> Result<Vec<Vec<Option<String>>>, AppError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut found = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(malformed)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == element => {
                let values = attrs
                    .iter()
                    .map(|a| attr_value(&e, a))
                    .collect::<Result<Vec<_>, _>>()?;
                found.push(values);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(found)
}

fn office_document_target(rels: &[u8]) -> Result<Option<String>, AppError> {
    let rows = collect_elements(rels, b"Relationship", &[b"Type", b"Target"])?;
    Ok(rows.into_iter().find_map(|row| match (&row[0], &row[1]) {
        (Some(kind), Some(target)) if kind.ends_with(OFFICE_DOCUMENT_REL) => {
            Some(target.trim_start_matches('/').to_string())
        }
        _ => None,
    }))
}

fn relationship_targets(rels: &[u8]) -> Result<HashMap<String, String>, AppError> {
    let rows = collect_elements(rels, b"Relationship", &[b"Id", b"Target"])?;
    Ok(rows
        .into_iter()
        .filter_map(|mut row| Some((row[0].take()?, row[1].take()?)))
        .collect())
}

/// `(sheet name, relationship id)` in workbook order.
fn sheet_entries(workbook: &[u8]) -> Result<Vec<(String, String)>, AppError> {
    let rows = collect_elements(workbook, b"sheet", &[b"name", b"id"])?;
    Ok(rows
        .into_iter()
        .filter_map(|mut row| Some((row[0].take()?, row[1].take()?)))
        .collect())
}

fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

fn edited_value<'c>(
    cell: &BytesStart<'_>,
    cells: &'c BTreeMap<String, CellValue>,
) -> Result<Option<&'c CellValue>, AppError> {
    Ok(attr_value(cell, b"r")?.and_then(|r| cells.get(&r.to_ascii_uppercase())))
}

/// Rewrite the values of existing `<c>` elements listed in `cells`.
fn patch_sheet(xml: &[u8], cells: &BTreeMap<String, CellValue>) -> Result<Vec<u8>, AppError> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut buf = Vec::new();
    let mut skipped = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(malformed)? {
            Event::Start(e) if e.local_name().as_ref() == b"c" => match edited_value(&e, cells)? {
                Some(value) => {
                    write_cell(&mut writer, &e, value)?;
                    reader
                        .read_to_end_into(e.name(), &mut skipped)
                        .map_err(malformed)?;
                    skipped.clear();
                }
                None => writer.write_event(Event::Start(e)).map_err(write_failed)?,
            },
            Event::Empty(e) if e.local_name().as_ref() == b"c" => match edited_value(&e, cells)? {
                Some(value) => write_cell(&mut writer, &e, value)?,
                None => writer.write_event(Event::Empty(e)).map_err(write_failed)?,
            },
            Event::Eof => break,
            other => writer.write_event(other).map_err(write_failed)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

/// Emit `original` with its content replaced by `value`. Every attribute except the
/// cell type survives, so the style index stays attached.
fn write_cell(
    writer: &mut Writer<Vec<u8>>,
    original: &BytesStart<'_>,
    value: &CellValue,
) -> Result<(), AppError> {
    let name = std::str::from_utf8(original.name().as_ref())
        .map_err(malformed)?
        .to_string();
    let prefix = name.split_once(':').map(|(p, _)| p).unwrap_or("").to_string();

    let mut cell = BytesStart::new(name.clone());
    for attr in original.attributes() {
        let attr = attr.map_err(malformed)?;
        if attr.key.local_name().as_ref() != b"t" {
            cell.push_attribute(attr);
        }
    }

    match value {
        CellValue::Text(text) => {
            cell.push_attribute(("t", "inlineStr"));
            let is = qualified(&prefix, "is");
            let t = qualified(&prefix, "t");
            let mut t_start = BytesStart::new(t.as_str());
            t_start.push_attribute(("xml:space", "preserve"));

            writer.write_event(Event::Start(cell)).map_err(write_failed)?;
            writer
                .write_event(Event::Start(BytesStart::new(is.as_str())))
                .map_err(write_failed)?;
            writer.write_event(Event::Start(t_start)).map_err(write_failed)?;
            writer
                .write_event(Event::Text(BytesText::new(&cell_text(text))))
                .map_err(write_failed)?;
            writer
                .write_event(Event::End(BytesEnd::new(t.as_str())))
                .map_err(write_failed)?;
            writer
                .write_event(Event::End(BytesEnd::new(is.as_str())))
                .map_err(write_failed)?;
        }
        CellValue::Number(number) => {
            let v = qualified(&prefix, "v");
            writer.write_event(Event::Start(cell)).map_err(write_failed)?;
            writer
                .write_event(Event::Start(BytesStart::new(v.as_str())))
                .map_err(write_failed)?;
            writer
                .write_event(Event::Text(BytesText::new(&number.to_string())))
                .map_err(write_failed)?;
            writer
                .write_event(Event::End(BytesEnd::new(v.as_str())))
                .map_err(write_failed)?;
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(write_failed)?;
    Ok(())
}

// ==================== WORDPROCESSING ====================

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

const DOCUMENT_CLOSE: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

const TABLE_BORDERS: &str = r#"<w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
}

/// A run of uniformly formatted text.
#[derive(Debug, Clone, Default)]
pub struct Run {
    text: String,
    bold: bool,
    italic: bool,
    color: Option<String>,
    /// Font size in half-points.
    size: Option<u32>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, hex: &str) -> Self {
        self.color = Some(hex.to_string());
        self
    }

    pub fn size(mut self, half_points: u32) -> Self {
        self.size = Some(half_points);
        self
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<w:r>");
        if self.bold || self.italic || self.color.is_some() || self.size.is_some() {
            out.push_str("<w:rPr>");
            if self.bold {
                out.push_str("<w:b/>");
            }
            if self.italic {
                out.push_str("<w:i/>");
            }
            if let Some(color) = &self.color {
                out.push_str(&format!(r#"<w:color w:val="{}"/>"#, escape(color.as_str())));
            }
            if let Some(size) = self.size {
                out.push_str(&format!(r#"<w:sz w:val="{}"/>"#, size));
            }
            out.push_str("</w:rPr>");
        }
        // Vertical tab is Word's manual line break.
        for (i, line) in self.text.split(['\n', '\u{B}']).enumerate() {
            if i > 0 {
                out.push_str("<w:br/>");
            }
            let line: String = line
                .trim_end_matches('\r')
                .chars()
                .filter(|c| !is_forbidden_in_xml(*c))
                .collect();
            out.push_str(r#"<w:t xml:space="preserve">"#);
            out.push_str(&escape(line.as_str()));
            out.push_str("</w:t>");
        }
        out.push_str("</w:r>");
    }
}

/// Builds the body of a WordprocessingML document.
#[derive(Debug, Default)]
pub struct DocxBuilder {
    body: String,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a paragraph. `spacing_after` is in twentieths of a point.
    pub fn paragraph(&mut self, runs: Vec<Run>, alignment: Alignment, spacing_after: u32) {
        write_paragraph(&mut self.body, &runs, alignment, spacing_after);
    }

    /// Append a bordered two-column table, labels bold in a 30% column.
    pub fn key_value_table(&mut self, rows: &[(&str, String)]) {
        self.body.push_str(r#"<w:tbl><w:tblPr><w:tblW w:w="5000" w:type="pct"/>"#);
        self.body.push_str(TABLE_BORDERS);
        self.body.push_str(
            r#"</w:tblPr><w:tblGrid><w:gridCol w:w="2708"/><w:gridCol w:w="6318"/></w:tblGrid>"#,
        );
        for (label, value) in rows {
            self.body.push_str("<w:tr>");
            self.table_cell(1500, Run::new(*label).bold());
            self.table_cell(3500, Run::new(value.as_str()));
            self.body.push_str("</w:tr>");
        }
        self.body.push_str("</w:tbl>");
    }

    fn table_cell(&mut self, width_pct: u32, run: Run) {
        self.body.push_str(&format!(
            r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="pct"/></w:tcPr>"#,
            width_pct
        ));
        write_paragraph(&mut self.body, &[run], Alignment::Left, 0);
        self.body.push_str("</w:tc>");
    }

    /// Package the document.
    pub fn finish(self) -> Result<Vec<u8>, AppError> {
        let document = format!("{}{}{}", DOCUMENT_OPEN, self.body, DOCUMENT_CLOSE);
        let parts: [(&str, &str); 3] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML),
            ("_rels/.rels", PACKAGE_RELS_XML),
            ("word/document.xml", &document),
        ];

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(name, options)?;
            writer
                .write_all(content.as_bytes())
                .map_err(|e| AppError::generation("Failed to write document", e))?;
        }
        Ok(writer.finish()?.into_inner())
    }
}

fn write_paragraph(out: &mut String, runs: &[Run], alignment: Alignment, spacing_after: u32) {
    out.push_str("<w:p><w:pPr>");
    out.push_str(&format!(r#"<w:spacing w:after="{}"/>"#, spacing_after));
    if alignment == Alignment::Center {
        out.push_str(r#"<w:jc w:val="center"/>"#);
    }
    out.push_str("</w:pPr>");
    for run in runs {
        run.write_xml(out);
    }
    out.push_str("</w:p>");
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Hand-built packages for generator tests.

    use super::*;

    pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="1"><xf numFmtId="0" fontId="0"/></cellXfs></styleSheet>"#;

    /// Build an xlsx package with one worksheet per `(name, sheetData inner XML)`.
    pub fn workbook(sheets: &[(&str, &str)]) -> Vec<u8> {
        let mut workbook = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
        );
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, (name, _)) in sheets.iter().enumerate() {
            let n = i + 1;
            workbook.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(*name),
                n,
                n
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                n, n
            ));
        }
        workbook.push_str("</sheets></workbook>");
        rels.push_str("</Relationships>");

        let root_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut put = |name: String, content: &str| {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        };
        put("_rels/.rels".to_string(), root_rels);
        put("xl/workbook.xml".to_string(), &workbook);
        put("xl/_rels/workbook.xml.rels".to_string(), &rels);
        put("xl/styles.xml".to_string(), STYLES_XML);
        for (i, (_, data)) in sheets.iter().enumerate() {
            put(
                format!("xl/worksheets/sheet{}.xml", i + 1),
                &format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData><mergeCells count="1"><mergeCell ref="A1:B1"/></mergeCells></worksheet>"#,
                    data
                ),
            );
        }
        writer.finish().unwrap().into_inner()
    }

    /// Read one part of a package as text.
    pub fn part(package: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
        let mut content = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{part, workbook, STYLES_XML};
    use super::*;

    #[test]
    fn test_open_lists_sheets_in_workbook_order() {
        let package = workbook(&[("FBD", ""), ("Scripts", ""), ("Archivos", "")]);
        let book = Workbook::open(package).unwrap();
        let names: Vec<_> = book.sheets().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["FBD", "Scripts", "Archivos"]);
        assert_eq!(book.sheets()[1].path, "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn test_open_rejects_garbage() {
        assert!(matches!(
            Workbook::open(b"not a zip".to_vec()),
            Err(AppError::GenerationFailure(_))
        ));
    }

    #[test]
    fn test_set_cell_keeps_style_and_drops_old_value() {
        let package = workbook(&[(
            "Main",
            r#"<row r="2"><c r="C2" s="5" t="s"><v>0</v></c><c r="D2" s="1"/></row>"#,
        )]);
        let mut book = Workbook::open(package).unwrap();
        book.set_cell(0, "C2", "Ana <QA> & co");
        book.set_cell(0, "D2", 7u32);
        let saved = book.save().unwrap();

        let sheet = part(&saved, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(
            r#"<c r="C2" s="5" t="inlineStr"><is><t xml:space="preserve">Ana &lt;QA&gt; &amp; co</t></is></c>"#
        ));
        assert!(sheet.contains(r#"<c r="D2" s="1"><v>7</v></c>"#));
        assert!(!sheet.contains("<v>0</v>"));
        assert!(sheet.contains(r#"<mergeCell ref="A1:B1"/>"#));
    }

    #[test]
    fn test_missing_cells_are_skipped() {
        let package = workbook(&[("Main", r#"<row r="2"><c r="C2"/></row>"#)]);
        let mut book = Workbook::open(package).unwrap();
        book.set_cell(0, "Z99", "ignored");
        let saved = book.save().unwrap();

        let sheet = part(&saved, "xl/worksheets/sheet1.xml");
        assert!(!sheet.contains("Z99"));
        assert!(!sheet.contains("ignored"));
    }

    #[test]
    fn test_untouched_parts_are_copied_verbatim() {
        let package = workbook(&[("Main", r#"<row r="2"><c r="C2"/></row>"#), ("Other", "")]);
        let original_other = part(&package, "xl/worksheets/sheet2.xml");
        let mut book = Workbook::open(package).unwrap();
        book.set_cell(0, "C2", "x");
        let saved = book.save().unwrap();

        assert_eq!(part(&saved, "xl/styles.xml"), STYLES_XML);
        assert_eq!(part(&saved, "xl/worksheets/sheet2.xml"), original_other);
    }

    #[test]
    fn test_cell_text_encodes_control_characters() {
        let package = workbook(&[("Main", r#"<row r="2"><c r="C2"/></row>"#)]);
        let mut book = Workbook::open(package).unwrap();
        book.set_cell(0, "C2", "line one\u{B}line two\u{1}\ttab");
        let saved = book.save().unwrap();

        let sheet = part(&saved, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("line one_x000B_line two_x0001_\ttab"));
        assert!(!sheet.contains('\u{B}'));
        assert!(!sheet.contains('\u{1}'));
    }

    #[test]
    fn test_run_maps_vertical_tab_to_break_and_drops_controls() {
        let mut doc = DocxBuilder::new();
        doc.paragraph(
            vec![Run::new("line one\u{B}line two\u{7}\u{1F}!")],
            Alignment::Left,
            0,
        );
        let bytes = doc.finish().unwrap();

        let document = part(&bytes, "word/document.xml");
        assert!(document.contains(
            r#"line one</w:t><w:br/><w:t xml:space="preserve">line two!</w:t>"#
        ));
        assert!(!document.chars().any(is_forbidden_in_xml));
    }

    #[test]
    fn test_docx_builder_escapes_text() {
        let mut doc = DocxBuilder::new();
        doc.paragraph(
            vec![Run::new("Title & <more>").bold().size(32)],
            Alignment::Center,
            400,
        );
        doc.key_value_table(&[("Case ID:", "CDP-1".to_string())]);
        let bytes = doc.finish().unwrap();

        let document = part(&bytes, "word/document.xml");
        assert!(document.contains("Title &amp; &lt;more&gt;"));
        assert!(document.contains(r#"<w:jc w:val="center"/>"#));
        assert!(document.contains(r#"<w:sz w:val="32"/>"#));
        assert!(document.contains("CDP-1"));
        assert!(part(&bytes, "[Content_Types].xml").contains("/word/document.xml"));
    }
}
