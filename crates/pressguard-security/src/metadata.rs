// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Descriptive metadata: an XMP packet on the catalog and a matching `/Info`
// dictionary in the trailer.

use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use pressguard_core::config::MetadataRecord;
use pressguard_core::error::{PressguardError, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;

const NS_X: &str = "adobe:ns:meta/";
const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_XMP: &str = "http://ns.adobe.com/xap/1.0/";
const NS_PDF: &str = "http://ns.adobe.com/pdf/1.3/";
const NS_XMP_RIGHTS: &str = "http://ns.adobe.com/xap/1.0/rights/";

const PACKET_HEADER: &str = "<?xpacket begin=\"\u{FEFF}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n";
const PACKET_TRAILER: &str = "\n<?xpacket end=\"w\"?>";

/// Value written to `pdf:Producer` and `/Producer`.
pub const PRODUCER: &str = concat!("pressguard-security ", env!("CARGO_PKG_VERSION"));

/// Serialise `record` as a complete XMP packet stamped with `now`.
pub fn xmp_packet(record: &MetadataRecord, now: DateTime<Utc>) -> Result<Vec<u8>> {
    let timestamp = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut xmp = XmpBuilder::new();

    xmp.start("x:xmpmeta", &[("xmlns:x", NS_X)])?;
    xmp.start("rdf:RDF", &[("xmlns:rdf", NS_RDF)])?;
    xmp.start(
        "rdf:Description",
        &[
            ("rdf:about", ""),
            ("xmlns:dc", NS_DC),
            ("xmlns:xmp", NS_XMP),
            ("xmlns:pdf", NS_PDF),
            ("xmlns:xmpRights", NS_XMP_RIGHTS),
        ],
    )?;

    xmp.lang_alt("dc:title", &record.title)?;
    xmp.array("dc:creator", "rdf:Seq", &record.creators)?;
    xmp.lang_alt("dc:description", &record.description)?;
    xmp.array("dc:subject", "rdf:Bag", &record.subject)?;
    xmp.lang_alt("dc:rights", &record.rights)?;
    xmp.text("dc:format", "application/pdf")?;

    xmp.text("xmp:CreateDate", &timestamp)?;
    xmp.text("xmp:ModifyDate", &timestamp)?;
    xmp.text("xmp:MetadataDate", &timestamp)?;
    xmp.text("xmp:CreatorTool", &record.creator_tool)?;

    if let Some(statement) = &record.web_statement {
        xmp.text("xmpRights:WebStatement", statement)?;
    }
    xmp.text("xmpRights:Marked", "True")?;
    xmp.text("pdf:Producer", PRODUCER)?;

    xmp.end("rdf:Description")?;
    xmp.end("rdf:RDF")?;
    xmp.end("x:xmpmeta")?;
    Ok(xmp.finish())
}

/// Attach `record` to `doc` as catalog `/Metadata` and trailer `/Info`.
///
/// Re-applying with the same `now` leaves the document unchanged: existing
/// metadata objects are overwritten in place.
pub fn apply_metadata(doc: &mut Document, record: &MetadataRecord, now: DateTime<Utc>) -> Result<()> {
    let packet = xmp_packet(record, now)?;
    let stream = Stream::new(
        dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
        packet,
    )
    .with_compression(false);

    let existing = doc
        .catalog()
        .ok()
        .and_then(|catalog| catalog.get(b"Metadata").ok())
        .and_then(|object| object.as_reference().ok());
    let metadata_id = put_object(doc, existing, Object::Stream(stream));
    doc.catalog_mut()
        .map_err(|err| PressguardError::Metadata(format!("document has no catalog: {err}")))?
        .set("Metadata", metadata_id);

    let info = info_dictionary(record, now);
    let existing = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|object| object.as_reference().ok());
    let info_id = put_object(doc, existing, Object::Dictionary(info));
    doc.trailer.set("Info", info_id);

    debug!(title = %record.title, ?metadata_id, ?info_id, "Metadata written");
    Ok(())
}

fn put_object(doc: &mut Document, existing: Option<ObjectId>, object: Object) -> ObjectId {
    match existing {
        Some(id) => {
            doc.objects.insert(id, object);
            id
        }
        None => doc.add_object(object),
    }
}

fn info_dictionary(record: &MetadataRecord, now: DateTime<Utc>) -> Dictionary {
    let date = now.format("D:%Y%m%d%H%M%SZ").to_string();
    let mut info = Dictionary::new();
    info.set("Title", text_string(&record.title));
    if !record.creators.is_empty() {
        info.set("Author", text_string(&record.creators.join("; ")));
    }
    info.set("Subject", text_string(&record.description));
    if !record.subject.is_empty() {
        info.set("Keywords", text_string(&record.subject.join(", ")));
    }
    info.set("Creator", text_string(&record.creator_tool));
    info.set("Producer", text_string(PRODUCER));
    info.set("CreationDate", text_string(&date));
    info.set("ModDate", text_string(&date));
    info
}

/// PDF text string: literal for ASCII, UTF-16BE with a byte-order mark otherwise.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::String(value.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

// -- XML writing ----------------------------------------------------------------

struct XmpBuilder {
    writer: Writer<Vec<u8>>,
}

impl XmpBuilder {
    fn new() -> Self {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(PACKET_HEADER.as_bytes());
        Self {
            writer: Writer::new_with_indent(buffer, b' ', 1),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|err| PressguardError::Metadata(format!("XMP serialisation failed: {err}")))
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.write(Event::Start(element))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, name: &str, value: &str) -> Result<()> {
        self.start(name, &[])?;
        self.write(Event::Text(BytesText::new(value)))?;
        self.end(name)
    }

    /// `<name><rdf:Alt><rdf:li xml:lang="x-default">value</rdf:li></rdf:Alt></name>`
    fn lang_alt(&mut self, name: &str, value: &str) -> Result<()> {
        self.start(name, &[])?;
        self.start("rdf:Alt", &[])?;
        self.start("rdf:li", &[("xml:lang", "x-default")])?;
        self.write(Event::Text(BytesText::new(value)))?;
        self.end("rdf:li")?;
        self.end("rdf:Alt")?;
        self.end(name)
    }

    /// Ordered (`rdf:Seq`) or unordered (`rdf:Bag`) array; omitted when empty.
    fn array(&mut self, name: &str, kind: &str, items: &[String]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.start(name, &[])?;
        self.start(kind, &[])?;
        for item in items {
            self.text("rdf:li", item)?;
        }
        self.end(kind)?;
        self.end(name)
    }

    fn finish(self) -> Vec<u8> {
        let mut buffer = self.writer.into_inner();
        buffer.extend_from_slice(PACKET_TRAILER.as_bytes());
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use quick_xml::Reader;

    fn record() -> MetadataRecord {
        MetadataRecord {
            title: "Compilers — Lecture 1".into(),
            creators: vec!["A. Lecturer".into(), "B. Assistant".into()],
            subject: vec!["parsing".into(), "lexing & tokens".into()],
            web_statement: Some("https://example.org/licence".into()),
            ..MetadataRecord::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    fn minimal_document() -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    /// Text content of every element, in document order.
    fn element_texts(xml: &str) -> Vec<(String, String)> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut current = String::new();
        let mut texts = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) => current = String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                Event::Text(e) => texts.push((current.clone(), e.unescape().unwrap().into_owned())),
                Event::Eof => break,
                _ => {}
            }
        }
        texts
    }

    #[test]
    fn packet_is_wrapped_and_well_formed() {
        let packet = xmp_packet(&record(), now()).unwrap();
        let xml = String::from_utf8(packet).unwrap();
        assert!(xml.starts_with("<?xpacket begin="));
        assert!(xml.ends_with("<?xpacket end=\"w\"?>"));

        let texts = element_texts(&xml);
        let value = |name: &str| {
            texts
                .iter()
                .filter(|(element, _)| element == name)
                .map(|(_, text)| text.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(value("xmp:CreateDate"), ["2026-03-14T09:26:53Z"]);
        assert_eq!(value("dc:format"), ["application/pdf"]);
        assert_eq!(value("xmpRights:Marked"), ["True"]);
        assert_eq!(value("xmpRights:WebStatement"), ["https://example.org/licence"]);
        // Escaped on write, unescaped on read.
        assert!(value("rdf:li").contains(&"lexing & tokens"));
        assert!(value("rdf:li").contains(&"Compilers — Lecture 1"));
    }

    #[test]
    fn empty_arrays_are_omitted() {
        let packet = xmp_packet(&MetadataRecord::default(), now()).unwrap();
        let xml = String::from_utf8(packet).unwrap();
        assert!(!xml.contains("dc:creator"));
        assert!(!xml.contains("xmpRights:WebStatement"));
        assert!(xml.contains("dc:title"));
    }

    #[test]
    fn catalog_and_info_are_populated() {
        let mut doc = minimal_document();
        apply_metadata(&mut doc, &record(), now()).unwrap();

        let metadata_id = doc
            .catalog()
            .unwrap()
            .get(b"Metadata")
            .and_then(Object::as_reference)
            .unwrap();
        let stream = doc.get_object(metadata_id).and_then(Object::as_stream).unwrap();
        assert_eq!(stream.dict.get(b"Subtype").and_then(Object::as_name).unwrap(), b"XML");

        let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert_eq!(
            info.get(b"CreationDate").and_then(Object::as_str).unwrap(),
            b"D:20260314092653Z"
        );
        assert_eq!(
            info.get(b"Author").and_then(Object::as_str).unwrap(),
            b"A. Lecturer; B. Assistant"
        );
        // Non-ASCII title is UTF-16BE with a byte-order mark.
        assert_eq!(&info.get(b"Title").and_then(Object::as_str).unwrap()[..2], &[0xFE, 0xFF]);
    }

    #[test]
    fn reapplying_is_idempotent() {
        let mut doc = minimal_document();
        apply_metadata(&mut doc, &record(), now()).unwrap();
        let objects_after_first = doc.objects.len();
        let first = doc.objects.clone();

        apply_metadata(&mut doc, &record(), now()).unwrap();
        assert_eq!(doc.objects.len(), objects_after_first);
        for (id, object) in &first {
            assert_eq!(format!("{:?}", doc.objects[id]), format!("{object:?}"));
        }
    }
}
