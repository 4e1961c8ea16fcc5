mod common;

use std::path::Path;

use common::{InMemoryFileSystem, MODULE_DIR, MODULE_LOCATION, module_xml};
use content_lint::{
    DiagnosticSource, Document, Position, Severity, TokioFileSystem, parse, validate_image_paths,
};

fn document(text: &str) -> Document {
    Document::new(MODULE_LOCATION, text).unwrap()
}

fn resolved(raw: &str) -> std::path::PathBuf {
    Path::new(MODULE_DIR).join(raw)
}

/// Text covered by a diagnostic range
fn covered<'a>(document: &'a Document, start: Position, end: Position) -> &'a str {
    &document.text()[document.offset_at(start)..document.offset_at(end)]
}

#[tokio::test]
async fn test_document_without_images_checks_nothing() {
    let fs = InMemoryFileSystem::new();
    let doc = document(&module_xml("<para id=\"p1\">No figures here.</para>"));
    let tree = parse(doc.text());

    let diagnostics = validate_image_paths(&doc, tree.as_ref(), &fs).await;

    assert!(diagnostics.is_empty());
    assert!(fs.queries().is_empty());
}

#[tokio::test]
async fn test_unparsable_document_checks_nothing() {
    let fs = InMemoryFileSystem::new();
    let doc = document("<document>\n<image src=\"missing.png\"/>\n");
    let tree = parse(doc.text());

    assert!(tree.is_none());
    let diagnostics = validate_image_paths(&doc, tree.as_ref(), &fs).await;

    assert!(diagnostics.is_empty());
    assert!(fs.queries().is_empty());
}

#[tokio::test]
async fn test_existing_images_produce_no_diagnostics() {
    let fs = InMemoryFileSystem::with_files([
        resolved("../../media/a.png"),
        resolved("../../media/b.jpg"),
    ]);
    let doc = document(&module_xml(
        "<image src=\"../../media/a.png\"/>\n<image src=\"../../media/b.jpg\"/>",
    ));

    let diagnostics = validate_image_paths(&doc, parse(doc.text()).as_ref(), &fs).await;

    assert!(diagnostics.is_empty());
    assert_eq!(fs.queries().len(), 2);
}

#[tokio::test]
async fn test_missing_image_diagnostic_covers_path_text() {
    let fs = InMemoryFileSystem::with_files([resolved("../../media/present.png")]);
    let doc = document(&module_xml(
        "<image src=\"../../media/present.png\"/>\n<image src=\"../../media/missing.png\"/>",
    ));

    let diagnostics = validate_image_paths(&doc, parse(doc.text()).as_ref(), &fs).await;

    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.source, DiagnosticSource::ImagePath);
    assert_eq!(
        diagnostic.message,
        "Image file ../../media/missing.png doesn't exist!"
    );
    assert_eq!(diagnostic.range.start, Position::new(3, 12));
    assert_eq!(diagnostic.range.end, Position::new(3, 35));
    assert_eq!(
        covered(&doc, diagnostic.range.start, diagnostic.range.end),
        "../../media/missing.png"
    );
}

#[tokio::test]
async fn test_paths_resolve_against_document_directory() {
    let fs = InMemoryFileSystem::new();
    let doc = document(&module_xml("<image src=\"figure.png\"/>"));

    validate_image_paths(&doc, parse(doc.text()).as_ref(), &fs).await;

    assert_eq!(fs.queries(), vec![resolved("figure.png")]);
}

#[tokio::test]
async fn test_image_without_source_is_ignored() {
    let fs = InMemoryFileSystem::new();
    let doc = document(&module_xml("<image mime-type=\"image/png\"/>"));

    let diagnostics = validate_image_paths(&doc, parse(doc.text()).as_ref(), &fs).await;

    assert!(diagnostics.is_empty());
    assert!(fs.queries().is_empty());
}

#[tokio::test]
async fn test_incomplete_image_does_not_affect_siblings() {
    let fs = InMemoryFileSystem::new();
    let doc = document(&module_xml(
        "<image mime-type=\"image/png\"/>\n<image src=\"gone.png\"/>",
    ));

    let diagnostics = validate_image_paths(&doc, parse(doc.text()).as_ref(), &fs).await;

    assert_eq!(fs.queries(), vec![resolved("gone.png")]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].range.start, Position::new(3, 12));
}

#[tokio::test]
async fn test_nested_images_are_reported_in_document_order() {
    let fs = InMemoryFileSystem::new();
    let doc = document(&module_xml(
        "<figure id=\"f1\">\n<media><image src=\"one.png\"/></media>\n</figure>\n<para><image src=\"two.png\"/></para>",
    ));

    let diagnostics = validate_image_paths(&doc, parse(doc.text()).as_ref(), &fs).await;

    let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Image file one.png doesn't exist!",
            "Image file two.png doesn't exist!",
        ]
    );
    assert!(diagnostics[0].range.start < diagnostics[1].range.start);
}

#[tokio::test]
async fn test_io_error_counts_as_missing() {
    let fs = InMemoryFileSystem::new();
    fs.fail_on(resolved("locked.png"));
    let doc = document(&module_xml("<image src=\"locked.png\"/>"));

    let diagnostics = validate_image_paths(&doc, parse(doc.text()).as_ref(), &fs).await;

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Image file locked.png doesn't exist!");
}

#[tokio::test]
async fn test_repeated_runs_reflect_filesystem_changes() {
    let fs = InMemoryFileSystem::new();
    let doc = document(&module_xml("<image src=\"late.png\"/>"));
    let tree = parse(doc.text());

    let before = validate_image_paths(&doc, tree.as_ref(), &fs).await;
    assert_eq!(before.len(), 1);

    fs.add_file(resolved("late.png"));
    let after = validate_image_paths(&doc, tree.as_ref(), &fs).await;
    assert!(after.is_empty());

    fs.remove_file(&resolved("late.png"));
    let again = validate_image_paths(&doc, tree.as_ref(), &fs).await;
    assert_eq!(again, before);
}

#[tokio::test]
async fn test_real_filesystem_layout() {
    let fixture = common::BookFixture::new().await.unwrap();
    let location = fixture.module_path("broken");
    let doc = Document::load(&location).await.unwrap();

    let diagnostics = validate_image_paths(&doc, parse(doc.text()).as_ref(), &TokioFileSystem).await;

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        "Image file ../../media/missing.png doesn't exist!"
    );
}
