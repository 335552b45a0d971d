//! Engine integration tests
//!
//! Whole-tree conversions through `convert_tree`, checking the rewritten
//! Markdown and the files written to the output root.

mod common;

use common::{page, resolve_from, TestPack};
use packdown::convert::{convert_tree, ConvertError, ConvertOptions, IMAGES_DIR};
use std::fs;

fn convert(pack: &TestPack) -> packdown::BatchReport {
    convert_tree(&ConvertOptions::new(&pack.input, &pack.output), &()).expect("conversion failed")
}

#[test]
fn test_end_to_end_scenario() {
    let pack = TestPack::new();
    pack.write(
        "index.html",
        page(r#"<h1>Home</h1><p><a href="page2.html">Next</a></p><p><img src="logo.png" alt="Logo"></p>"#),
    )
    .write("page2.html", page("<h1>Second</h1><p>Body</p>"))
    .write("logo.png", b"\x89PNG\r\n\x1a\nlogo");

    let report = convert(&pack);

    assert_eq!(report.converted_count(), 2);
    assert!(report.failures.is_empty());
    let index = pack.read_output("index.md");
    assert!(index.contains("[Next](page2.md)"), "got: {index}");
    assert!(index.contains("![Logo](images/logo.png)"), "got: {index}");
    assert!(!index.contains("Site chrome"));
    assert!(!index.contains("color: red"));
    assert!(pack.output_exists("page2.md"));
    assert_eq!(
        fs::read(pack.output.join("images/logo.png")).unwrap(),
        b"\x89PNG\r\n\x1a\nlogo"
    );
    assert_eq!(report.images, vec!["logo.png".to_string()]);
}

#[test]
fn test_sibling_link_keeps_fragment() {
    let pack = TestPack::new();
    pack.write("a.html", page(r#"<p><a href="b.html#sec">B</a></p>"#))
        .write("b.html", page("<h2 id=\"sec\">Sec</h2>"));

    convert(&pack);

    assert!(pack.read_output("a.md").contains("[B](b.md#sec)"));
}

#[test]
fn test_subdirectory_link_keeps_query() {
    let pack = TestPack::new();
    pack.write("guide/a.html", page(r#"<p><a href="../sub/c.htm?x=1">C</a></p>"#))
        .write("sub/c.htm", page("<p>c</p>"));

    convert(&pack);

    let md = pack.read_output("guide/a.md");
    assert!(md.contains("](../sub/c.md?x=1)"), "got: {md}");
    assert!(pack.output_exists("sub/c.md"));
}

#[test]
fn test_passthrough_and_anchors_unchanged() {
    let pack = TestPack::new();
    pack.write(
        "a.html",
        page(concat!(
            r#"<p><a href="https://example.com/doc.html">web</a> "#,
            r#"<a href="mailto:team@example.com">mail</a> "#,
            r##"<a href="#local">anchor</a></p>"##,
            r#"<p><img src="https://cdn.example.com/x.png" alt="remote"></p>"#,
        )),
    );

    let report = convert(&pack);

    let md = pack.read_output("a.md");
    assert!(md.contains("(https://example.com/doc.html)"), "got: {md}");
    assert!(md.contains("(mailto:team@example.com)"), "got: {md}");
    assert!(md.contains("(#local)"), "got: {md}");
    assert!(md.contains("(https://cdn.example.com/x.png)"), "got: {md}");
    assert_eq!(report.converted[0].links_rewritten, 0);
    assert!(!pack.output_exists(IMAGES_DIR));
}

#[test]
fn test_same_named_images_get_suffixes() {
    let pack = TestPack::new();
    pack.write("one/a.html", page(r#"<p><img src="foo.png" alt="first"></p>"#))
        .write("one/foo.png", b"first image")
        .write("two/b.html", page(r#"<p><img src="foo.png" alt="second"></p>"#))
        .write("two/foo.png", b"second image");

    let report = convert(&pack);

    assert_eq!(report.images, vec!["foo.png".to_string(), "foo-1.png".to_string()]);
    let a = pack.read_output("one/a.md");
    let b = pack.read_output("two/b.md");
    assert!(a.contains("![first](../images/foo.png)"), "got: {a}");
    assert!(b.contains("![second](../images/foo-1.png)"), "got: {b}");
    assert_eq!(fs::read(pack.output.join("images/foo.png")).unwrap(), b"first image");
    assert_eq!(fs::read(pack.output.join("images/foo-1.png")).unwrap(), b"second image");
}

#[test]
fn test_missing_image_does_not_fail() {
    let pack = TestPack::new();
    pack.write("a.html", page(r#"<p><img src="gone/missing.png" alt="x"></p>"#));

    let report = convert(&pack);

    assert_eq!(report.converted_count(), 1);
    assert_eq!(report.unresolved_count(), 1);
    assert!(!pack.output_exists(IMAGES_DIR));
    let md = pack.read_output("a.md");
    let destination = md
        .split("![x](")
        .nth(1)
        .and_then(|rest| rest.split(')').next())
        .expect("image reference present");
    assert_eq!(
        resolve_from(&pack.output.join("a.md"), destination),
        pack.input.join("gone/missing.png")
    );
}

#[test]
fn test_non_document_link_points_back_at_source() {
    let pack = TestPack::new();
    pack.write("a.html", page(r#"<p><a href="files/spec.pdf">PDF</a></p>"#))
        .write("files/spec.pdf", b"%PDF");

    convert(&pack);

    let md = pack.read_output("a.md");
    assert!(md.contains("[PDF](../pack/files/spec.pdf)"), "got: {md}");
}

#[test]
fn test_main_selector_override() {
    let pack = TestPack::new();
    pack.write(
        "a.html",
        page(r#"<div class="wiki-content"><p>Wanted</p></div><div class="footer">Footer</div>"#),
    );

    let mut opts = ConvertOptions::new(&pack.input, &pack.output);
    opts.main_selector = Some(".wiki-content".into());
    let report = convert_tree(&opts, &()).unwrap();

    assert_eq!(report.converted[0].locator, ".wiki-content");
    let md = pack.read_output("a.md");
    assert!(md.contains("Wanted"));
    assert!(!md.contains("Footer"));
}

#[test]
fn test_markdown_flavor() {
    let pack = TestPack::new();
    pack.write(
        "a.html",
        page("<h2>Setup</h2><ul><li>first_item</li><li>2 * 3</li></ul><script>var x = 1;</script>"),
    );

    convert(&pack);

    let md = pack.read_output("a.md");
    assert!(md.starts_with("## Setup"), "got: {md}");
    assert!(
        md.lines()
            .any(|l| l.trim_start().starts_with('*') && l.contains("first_item")),
        "got: {md}"
    );
    assert!(md.contains("2 * 3"), "got: {md}");
    assert!(!md.contains("var x"));
    assert!(md.ends_with('\n') && !md.ends_with("\n\n"));
}

#[test]
fn test_encoding_noise_is_dropped() {
    let pack = TestPack::new();
    let mut bytes = page("<p>caf\u{e9}</p>").into_bytes();
    bytes.extend_from_slice(b"<p>bad \xFF byte</p>");
    pack.write("a.html", bytes);

    let report = convert(&pack);

    assert_eq!(report.converted[0].dropped_sequences, 1);
    assert!(pack.read_output("a.md").contains("café"));
}

#[test]
fn test_empty_pack_reports_nothing() {
    let pack = TestPack::new();
    pack.write("readme.txt", "not html");

    let report = convert(&pack);

    assert!(report.is_empty());
    assert!(pack.output.is_dir());
}

#[test]
fn test_missing_input_is_fatal() {
    let pack = TestPack::new();
    let opts = ConvertOptions::new(pack.input.join("nope"), &pack.output);
    let err = convert_tree(&opts, &()).unwrap_err();
    assert!(matches!(err, ConvertError::InvalidInput { .. }));
    assert!(!pack.output.exists());
}

#[test]
fn test_output_inside_input() {
    let pack = TestPack::new();
    pack.write("a.html", page(r#"<p><a href="b.html">B</a></p>"#))
        .write("b.html", page("<p>b</p>"));
    let output = pack.input.join("md");

    let report = convert_tree(&ConvertOptions::new(&pack.input, &output), &()).unwrap();

    assert_eq!(report.converted_count(), 2);
    let md = fs::read_to_string(output.join("a.md")).unwrap();
    assert!(md.contains("[B](b.md)"), "got: {md}");
}

#[test]
fn test_output_equal_to_input_keeps_pack_images() {
    let pack = TestPack::new();
    pack.write(
        "index.html",
        page(r#"<p><img src="images/logo.png" alt="Logo"></p>"#),
    )
    .write("images/logo.png", b"LOGO BYTES")
    .write("sub/a.html", page(r#"<p><img src="foo.png" alt="sub"></p>"#))
    .write("sub/foo.png", b"sub image")
    .write("z.html", page(r#"<p><img src="images/foo.png" alt="pack"></p>"#))
    .write("images/foo.png", b"pack image");

    let report = convert_tree(&ConvertOptions::new(&pack.input, &pack.input), &()).unwrap();

    assert_eq!(report.converted_count(), 3);
    assert_eq!(fs::read(pack.input.join("images/logo.png")).unwrap(), b"LOGO BYTES");
    assert_eq!(fs::read(pack.input.join("images/foo.png")).unwrap(), b"pack image");
    assert_eq!(fs::read(pack.input.join("images/foo-1.png")).unwrap(), b"sub image");

    let index = fs::read_to_string(pack.input.join("index.md")).unwrap();
    assert!(index.contains("![Logo](images/logo.png)"), "got: {index}");
    let sub = fs::read_to_string(pack.input.join("sub/a.md")).unwrap();
    assert!(sub.contains("![sub](../images/foo-1.png)"), "got: {sub}");
    let z = fs::read_to_string(pack.input.join("z.md")).unwrap();
    assert!(z.contains("![pack](images/foo.png)"), "got: {z}");
}

#[test]
fn test_rerun_is_stable() {
    let pack = TestPack::new();
    pack.write("a.html", page(r#"<p><img src="i.png" alt="i"></p>"#))
        .write("i.png", b"i");

    convert(&pack);
    let first = pack.read_output("a.md");
    let report = convert(&pack);

    assert_eq!(pack.read_output("a.md"), first);
    assert_eq!(report.images, vec!["i.png".to_string()]);
}
