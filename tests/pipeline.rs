//! End-to-end tests over in-memory packages.
//!
//! Run with: cargo test --test pipeline

use docxtree::docx::{PropertyValue, StyleType};
use docxtree::model::{ImageSource, NoteReference};
use docxtree::{read_bytes, Error, Node, NoteType, ReadOptions};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const W: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
</Types>"#;

/// Build a zip package from `(path, content)` pairs.
fn build_package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    let options = SimpleFileOptions::default();

    for (name, content) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
    buffer
}

fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {}><w:body>{}</w:body></w:document>"#,
        W, body
    )
}

fn styles_xml(styles: &str) -> String {
    format!(r#"<w:styles {}>{}</w:styles>"#, W, styles)
}

const HEADING_STYLES: &str = r#"
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:rPr><w:b/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:rPr><w:sz w:val="24"/><w:color w:val="000000"/></w:rPr>
  </w:style>"#;

#[test]
fn test_heading_inherits_from_normal() {
    let document = document_xml(
        r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Title</w:t></w:r></w:p>"#,
    );
    let styles = styles_xml(HEADING_STYLES);
    let data = build_package(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", document.as_str()),
        ("word/styles.xml", styles.as_str()),
    ]);

    let result = read_bytes(data, ReadOptions::default()).unwrap();

    let effective = result
        .styles
        .effective_properties(&StyleType::Paragraph, "Heading1")
        .unwrap();
    assert_eq!(
        effective.to_map(),
        BTreeMap::from([
            ("bold", PropertyValue::Bool(true)),
            ("color", PropertyValue::Text("000000".to_string())),
            ("fontSize", PropertyValue::Number(12.0)),
        ])
    );

    let Node::Paragraph(paragraph) = &result.document.children[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(paragraph.style_id.as_deref(), Some("Heading1"));
    assert_eq!(paragraph.style_name.as_deref(), Some("heading 1"));
    assert_eq!(result.raw_text(), "Title\n\n");
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
}

#[test]
fn test_missing_package_relationships_uses_default_document() {
    let document = document_xml(r#"<w:p><w:r><w:t>No rels</w:t></w:r></w:p>"#);
    let data = build_package(&[("word/document.xml", document.as_str())]);

    let result = read_bytes(data, ReadOptions::default()).unwrap();
    assert_eq!(result.part_paths.main_document.as_str(), "word/document.xml");
    assert_eq!(result.raw_text(), "No rels\n\n");
}

#[test]
fn test_missing_main_document_is_invalid() {
    let data = build_package(&[("_rels/.rels", PACKAGE_RELS), ("word/styles.xml", "<x/>")]);
    let err = read_bytes(data, ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidPackage(_)), "{:?}", err);
}

#[test]
fn test_not_a_zip() {
    let err = read_bytes(b"plain text".to_vec(), ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::ZipArchive(_)), "{:?}", err);
}

#[test]
fn test_malformed_styles_is_fatal() {
    let document = document_xml("");
    let data = build_package(&[
        ("word/document.xml", document.as_str()),
        ("word/styles.xml", "<w:styles><w:style></w:styles>"),
    ]);
    let err = read_bytes(data, ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::XmlParse(_)), "{:?}", err);
}

#[test]
fn test_style_cycle_is_fatal() {
    let document = document_xml("");
    let styles = styles_xml(
        r#"<w:style w:type="paragraph" w:styleId="A"><w:basedOn w:val="B"/></w:style>
           <w:style w:type="paragraph" w:styleId="B"><w:basedOn w:val="A"/></w:style>"#,
    );
    let data = build_package(&[("word/document.xml", document.as_str()), ("word/styles.xml", styles.as_str())]);
    let err = read_bytes(data, ReadOptions::default()).unwrap_err();
    match err {
        Error::StyleCycle { style_type, chain } => {
            assert_eq!(style_type, "paragraph");
            assert_eq!(chain, "A -> B -> A");
        }
        other => panic!("expected cycle, got {:?}", other),
    }
}

#[test]
fn test_notes_and_comments() {
    let document = document_xml(
        r#"<w:p>
            <w:commentRangeStart w:id="0"/>
            <w:r><w:t>Body</w:t></w:r>
            <w:r><w:footnoteReference w:id="1"/></w:r>
            <w:r><w:endnoteReference w:id="1"/></w:r>
            <w:commentRangeEnd w:id="0"/>
            <w:r><w:commentReference w:id="0"/></w:r>
        </w:p>"#,
    );
    let footnotes = format!(
        r#"<w:footnotes {}>
            <w:footnote w:type="separator" w:id="-1"><w:p><w:r><w:separator/></w:r></w:p></w:footnote>
            <w:footnote w:id="1"><w:p><w:r><w:t>Foot</w:t></w:r></w:p></w:footnote>
        </w:footnotes>"#,
        W
    );
    let endnotes = format!(
        r#"<w:endnotes {}><w:endnote w:id="1"><w:p><w:r><w:t>End</w:t></w:r></w:p></w:endnote></w:endnotes>"#,
        W
    );
    let comments = format!(
        r#"<w:comments {}>
            <w:comment w:id="0" w:author="Reviewer" w:initials="R"><w:p><w:r><w:t>Why?</w:t></w:r></w:p></w:comment>
        </w:comments>"#,
        W
    );
    let data = build_package(&[
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", document.as_str()),
        ("word/footnotes.xml", footnotes.as_str()),
        ("word/endnotes.xml", endnotes.as_str()),
        ("word/comments.xml", comments.as_str()),
    ]);

    let result = read_bytes(data, ReadOptions::default()).unwrap();
    let notes = &result.document.notes;
    assert_eq!(notes.len(), 2);

    let foot = notes
        .resolve(&NoteReference {
            note_type: NoteType::Footnote,
            note_id: "1".to_string(),
        })
        .unwrap();
    assert_eq!(foot.body[0].raw_text(), "Foot\n\n");

    let end = notes.find_note_by_key("endnote-1").unwrap();
    assert_eq!(end.body[0].raw_text(), "End\n\n");
    assert!(notes.find_note_by_key("footnote-2").is_none());

    let comment = result.document.find_comment("0").unwrap();
    assert_eq!(comment.author_name.as_deref(), Some("Reviewer"));
    assert_eq!(comment.author_initials.as_deref(), Some("R"));
    assert_eq!(result.footnotes.len(), 1);
    assert_eq!(result.endnotes.len(), 1);
    assert_eq!(result.comments.len(), 1);
}

#[test]
fn test_parts_found_through_relationships() {
    let document = document_xml(
        r#"<w:p><w:pPr><w:pStyle w:val="Custom"/><w:numPr><w:ilvl w:val="0"/><w:numId w:val="3"/></w:numPr></w:pPr>
            <w:r><w:t>Item</w:t></w:r></w:p>"#,
    );
    let document_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="missing.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="/shared/theme-styles.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="lists.xml"/>
</Relationships>"#;
    let styles = styles_xml(
        r#"<w:style w:type="paragraph" w:customStyle="1" w:styleId="Custom"><w:name w:val="Custom Para"/></w:style>"#,
    );
    let numbering = format!(
        r#"<w:numbering {}>
            <w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/></w:lvl></w:abstractNum>
            <w:num w:numId="3"><w:abstractNumId w:val="0"/></w:num>
        </w:numbering>"#,
        W
    );
    let data = build_package(&[
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", document.as_str()),
        ("word/_rels/document.xml.rels", document_rels),
        ("shared/theme-styles.xml", styles.as_str()),
        ("word/lists.xml", numbering.as_str()),
    ]);

    let result = read_bytes(data, ReadOptions::default()).unwrap();
    assert_eq!(result.part_paths.styles.as_str(), "shared/theme-styles.xml");
    assert_eq!(result.part_paths.numbering.as_str(), "word/lists.xml");
    assert_eq!(result.part_paths.comments.as_str(), "word/comments.xml");

    let Node::Paragraph(paragraph) = &result.document.children[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(paragraph.style_name.as_deref(), Some("Custom Para"));
    let numbering = paragraph.numbering.as_ref().unwrap();
    assert!(numbering.is_ordered);
    assert_eq!(numbering.level_text.as_deref(), Some("%1."));

    assert_eq!(result.custom_styles.len(), 1);
    assert_eq!(result.custom_styles[0].style_id, "Custom");

    let json = result.to_json_compact().unwrap();
    assert!(json.contains(r#""styleId":"Custom""#));
    assert!(json.contains(r#""main_document":"word/document.xml""#));
}

#[test]
fn test_read_file_resolves_linked_images() {
    let document = document_xml(
        r#"<w:p><w:r><w:drawing>
            <wp:inline xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"
                       xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
                <wp:docPr id="1" name="Picture 1" descr="Linked"/>
                <a:graphic><a:graphicData><a:blip r:link="rId9"/></a:graphicData></a:graphic>
            </wp:inline>
        </w:drawing></w:r></w:p>"#,
    );
    let document_rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="images/photo.png" TargetMode="External"/>
</Relationships>"#;
    let data = build_package(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", document.as_str()),
        ("word/_rels/document.xml.rels", document_rels),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("linked.docx");
    std::fs::write(&path, &data).unwrap();

    let result = docxtree::read_file(&path).unwrap();
    let Node::Paragraph(paragraph) = &result.document.children[0] else {
        panic!("expected paragraph");
    };
    let Node::Run(run) = &paragraph.children[0] else {
        panic!("expected run");
    };
    let Node::Image(image) = &run.children[0] else {
        panic!("expected image, got {:?}", run.children);
    };
    assert_eq!(
        image.source,
        ImageSource::Linked(dir.path().join(PathBuf::from("images/photo.png")))
    );
    assert_eq!(image.alt_text.as_deref(), Some("Linked"));
    assert_eq!(image.content_type.as_deref(), Some("image/png"));

    // Without a base path the link cannot be resolved
    let result = read_bytes(data, ReadOptions::default()).unwrap();
    assert_eq!(result.document.children[0].children()[0].children().len(), 0);
    assert_eq!(result.warnings.len(), 1);

    let text = docxtree::extract_raw_text(&path).unwrap();
    assert_eq!(text, "\n\n");
}
