use curio_model::import::{BibtexmlImporter, TellicoImporter};
use curio_model::{CollectionType, ImportFormat, Importer, ModelError};
use pretty_assertions::assert_eq;

const BOOKS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tellico xmlns="http://periapsis.org/tellico/" syntaxVersion="10">
  <collection title="Shelf" type="2">
    <fields>
      <field name="_default"/>
      <field name="signed" title="Signed" category="Personal" flags="2" format="4" type="4">
        <prop name="origin">local</prop>
      </field>
    </fields>
    <entry id="3">
      <title>Dune</title>
      <authors>
        <author>Frank Herbert</author>
      </authors>
      <genres>
        <genre>Science Fiction</genre>
        <genre>Classic</genre>
      </genres>
      <binding>Paperback</binding>
      <signed>true</signed>
    </entry>
    <entry id="4">
      <title>Emma</title>
      <authors><author>Jane Austen</author></authors>
      <binding>Scroll</binding>
    </entry>
  </collection>
</tellico>"#;

// ── Tellico XML ──────────────────────────────────────────────────

#[test]
fn tellico_import_reads_schema_and_entries() {
    let mut importer = TellicoImporter::new();
    importer.set_text(BOOKS);
    let collection = importer.collection().unwrap();

    assert_eq!(collection.kind(), CollectionType::Book);
    assert_eq!(collection.title(), "Shelf");
    assert_eq!(collection.entry_count(), 2);

    let signed = collection.schema().field_by_name("signed").unwrap();
    assert_eq!(signed.category(), "Personal");
    assert!(signed.is_groupable());
    assert_eq!(signed.property("origin"), Some("local"));
}

#[test]
fn tellico_import_keeps_ids_and_values() {
    let mut importer = TellicoImporter::new();
    importer.set_text(BOOKS);
    let collection = importer.collection().unwrap();

    let ids: Vec<i64> = collection.entries().map(|e| e.id()).collect();
    assert_eq!(ids, vec![3, 4]);
    let dune = collection.entries().next().unwrap();
    assert_eq!(dune.field("title"), "Dune");
    assert_eq!(dune.field("author"), "Frank Herbert");
    assert_eq!(dune.field("genre"), "Science Fiction; Classic");
    assert_eq!(dune.field("signed"), "true");
}

#[test]
fn tellico_import_skips_disallowed_values() {
    let mut importer = TellicoImporter::new();
    importer.set_text(BOOKS);
    let collection = importer.collection().unwrap();
    let emma = collection.entries().nth(1).unwrap();
    assert_eq!(emma.field("title"), "Emma");
    assert_eq!(emma.field("binding"), "");
}

#[test]
fn tellico_import_builds_group_indexes() {
    let mut importer = TellicoImporter::new();
    importer.set_text(BOOKS);
    let collection = importer.collection().unwrap();
    let group = collection.group_by_name("genre", "Classic").unwrap();
    assert_eq!(group.len(), 1);
    assert!(collection.group_by_name("author", "Austen, Jane").is_some());
}

#[test]
fn tellico_import_reads_tables_and_dates() {
    let text = r#"<tellico><collection type="3" title="Films">
      <fields><field name="_default"/></fields>
      <entry>
        <title>Alien</title>
        <casts>
          <cast><column>Sigourney Weaver</column><column>Ripley</column></cast>
          <cast><column>Tom Skerritt</column><column>Dallas</column></cast>
        </casts>
      </entry>
    </collection></tellico>"#;
    let mut importer = TellicoImporter::new();
    importer.set_text(text);
    let collection = importer.collection().unwrap();
    let alien = collection.entries().next().unwrap();
    assert_eq!(alien.field("cast"), "Sigourney Weaver::Ripley\nTom Skerritt::Dallas");
    assert_eq!(alien.id(), 1);

    let files = r#"<tellico><collection type="12">
      <entry><title>notes</title><created><year>2009</year><month>3</month><day>7</day></created></entry>
    </collection></tellico>"#;
    importer.set_text(files);
    let collection = importer.collection().unwrap();
    let notes = collection.entries().next().unwrap();
    assert_eq!(notes.field("created"), "2009-3-7");
    assert_eq!(notes.formatted_field("created"), "2009-03-07");
}

#[test]
fn tellico_import_rejects_other_documents() {
    let mut importer = TellicoImporter::new();
    importer.set_text("<html><body/></html>");
    assert!(importer.collection().is_none());
    assert!(importer.status_message().is_some());

    importer.set_text("<tellico><collection");
    assert!(importer.collection().is_none());
    assert!(importer.status_message().unwrap().contains("XML"));
}

// ── BibTeXML ─────────────────────────────────────────────────────

const BIBTEXML: &str = r#"<?xml version="1.0"?>
<file xmlns="http://bibtexml.sf.net/">
  <entry id="herbert1965">
    <book>
      <title>Dune</title>
      <authorlist>
        <person><first>Frank</first><last>Herbert</last></person>
        <person><first>Brian</first><last>Herbert</last></person>
      </authorlist>
      <publisher>Chilton   Books</publisher>
      <year>1965</year>
      <keywords><keyword>desert</keyword><keyword>spice</keyword></keywords>
    </book>
  </entry>
</file>"#;

#[test]
fn bibtexml_import_maps_bibtex_names() {
    let mut importer = BibtexmlImporter::new();
    importer.set_text(BIBTEXML);
    let collection = importer.collection().unwrap();
    assert_eq!(collection.kind(), CollectionType::Bibtex);

    let entry = collection.entries().next().unwrap();
    assert_eq!(entry.field("bibtex-key"), "herbert1965");
    assert_eq!(entry.field("entry-type"), "book");
    assert_eq!(entry.field("title"), "Dune");
    assert_eq!(entry.field("author"), "Frank Herbert; Brian Herbert");
    assert_eq!(entry.field("publisher"), "Chilton Books");
    assert_eq!(entry.field("year"), "1965");
    assert_eq!(entry.field("keyword"), "desert; spice");
}

#[test]
fn bibtexml_import_requires_file_root() {
    let mut importer = BibtexmlImporter::new();
    importer.set_text(BOOKS);
    assert!(importer.collection().is_none());
    assert!(importer.status_message().is_some());
}

// ── Formats ──────────────────────────────────────────────────────

#[test]
fn import_formats_parse_by_name() {
    assert_eq!("tellico".parse::<ImportFormat>().unwrap(), ImportFormat::Tellico);
    assert_eq!("BibTeXML".parse::<ImportFormat>().unwrap(), ImportFormat::Bibtexml);
    assert!(matches!("csv".parse::<ImportFormat>(), Err(ModelError::UnknownFormat(_))));
    assert_eq!(ImportFormat::default(), ImportFormat::Tellico);
}

#[test]
fn format_importer_is_usable_through_the_trait() {
    let mut importer = ImportFormat::Tellico.importer();
    importer.set_text(BOOKS);
    assert_eq!(importer.collection().unwrap().entry_count(), 2);
}
