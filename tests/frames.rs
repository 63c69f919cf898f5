use std::time::Duration;
use treemark::{Document, FrameState, Mark, MarkOptions, NodeId};

fn with_frame(host: &str) -> (Document, NodeId, NodeId) {
    let doc = Document::parse(host).unwrap();
    let body = doc.document_element(doc.root()).unwrap();
    let iframe = doc
        .descendants(body)
        .into_iter()
        .find(|n| doc.tag_name(*n) == Some("iframe"))
        .unwrap();
    (doc, body, iframe)
}

fn frame_options() -> MarkOptions {
    MarkOptions {
        iframes: true,
        ..MarkOptions::default()
    }
}

#[tokio::test]
async fn marks_inside_ready_same_origin_frames() {
    let (mut doc, body, iframe) =
        with_frame(r#"<body><p>word</p><iframe src="inner.html"></iframe></body>"#);
    doc.load_frame(iframe, Document::parse("<html><p>a word</p></html>").unwrap())
        .unwrap();

    let mut containers = Vec::new();
    let mut handler = treemark::Callbacks::new().on_each(|doc, marker| {
        containers.push(doc.text_content(doc.parent(marker).unwrap()));
    });
    let total = Mark::new(body)
        .mark(&mut doc, "word", &frame_options(), &mut handler)
        .await;
    drop(handler);

    assert_eq!(total, 2);
    let inner = doc.frame_root(iframe).unwrap();
    assert_eq!(
        doc.markup_of(inner),
        r#"<html><p>a <mark data-markjs="true">word</mark></p></html>"#
    );
    assert_eq!(containers, vec!["a word", "word"]);
}

#[tokio::test]
async fn frames_are_ignored_unless_enabled() {
    let (mut doc, body, iframe) = with_frame(r#"<body><iframe src="f.html"></iframe></body>"#);
    doc.load_frame(iframe, Document::parse("<html><p>word</p></html>").unwrap())
        .unwrap();

    let total = Mark::new(body)
        .mark(&mut doc, "word", &MarkOptions::default(), &mut ())
        .await;

    assert_eq!(total, 0);
}

#[tokio::test]
async fn waits_for_a_frame_signalled_by_another_task() {
    let (mut doc, body, iframe) = with_frame(r#"<body><iframe src="late.html"></iframe></body>"#);
    let handle = doc
        .attach_frame(iframe, Document::parse("<html><p>late word</p></html>").unwrap())
        .unwrap();
    assert_eq!(handle.state(), FrameState::Loading);

    let signal = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.set_ready();
    });

    let total = Mark::new(body)
        .mark(&mut doc, "word", &frame_options(), &mut ())
        .await;
    signal.await.unwrap();

    assert_eq!(total, 1);
}

#[tokio::test]
async fn unready_frames_time_out_and_are_skipped() {
    testing_logger::setup();
    let (mut doc, body, iframe) =
        with_frame(r#"<body><p>word</p><iframe src="never.html"></iframe></body>"#);
    doc.attach_frame(iframe, Document::parse("<html><p>word</p></html>").unwrap())
        .unwrap();
    let options = MarkOptions {
        frame_timeout_ms: Some(20),
        debug: true,
        ..frame_options()
    };

    let total = Mark::new(body).mark(&mut doc, "word", &options, &mut ()).await;

    assert_eq!(total, 1);
    testing_logger::validate(|logs| {
        assert!(logs
            .iter()
            .any(|l| l.body == r#"treemark: iframe "never.html" could not be accessed"#));
    });
}

#[tokio::test]
async fn cross_origin_frames_are_skipped() {
    let mut doc = Document::parse_with_origin(
        r#"<body><iframe src="https://other.test/"></iframe><p>word</p></body>"#,
        "https://host.test",
    )
    .unwrap();
    let body = doc.document_element(doc.root()).unwrap();
    let iframe = doc.children(body)[0];
    doc.load_frame(
        iframe,
        Document::parse_with_origin("<html><p>word</p></html>", "https://other.test").unwrap(),
    )
    .unwrap();

    let total = Mark::new(body)
        .mark(&mut doc, "word", &frame_options(), &mut ())
        .await;

    assert_eq!(total, 1);
}

#[tokio::test]
async fn failed_frames_do_not_abort_the_pass() {
    let (mut doc, body, iframe) =
        with_frame(r#"<body><iframe src="broken.html"></iframe><p>word</p></body>"#);
    doc.frame_handle(iframe).unwrap().set_failed();

    let total = Mark::new(body)
        .mark(&mut doc, "word", &frame_options(), &mut ())
        .await;

    assert_eq!(total, 1);
}

#[tokio::test]
async fn nested_frames_are_searched_depth_first() {
    let (mut doc, body, outer) =
        with_frame(r#"<body><p>word 3</p><iframe src="outer.html"></iframe></body>"#);

    let mut middle =
        Document::parse(r#"<html><p>word 2</p><iframe src="inner.html"></iframe></html>"#)
            .unwrap();
    let middle_html = middle.document_element(middle.root()).unwrap();
    let inner = middle.children(middle_html)[1];
    middle
        .load_frame(inner, Document::parse("<html><p>word 1</p></html>").unwrap())
        .unwrap();
    doc.load_frame(outer, middle).unwrap();

    let mut seen = Vec::new();
    let mut handler = treemark::Callbacks::new().on_each(|doc, marker| {
        let container = doc.parent(marker).unwrap();
        seen.push(doc.text_content(container));
    });
    let total = Mark::new(body)
        .mark(&mut doc, "word", &frame_options(), &mut handler)
        .await;
    drop(handler);

    assert_eq!(total, 3);
    assert_eq!(seen, vec!["word 1", "word 2", "word 3"]);
}

#[tokio::test]
async fn frame_content_survives_unmark() {
    let (mut doc, body, iframe) = with_frame(r#"<body><iframe src="f.html"></iframe></body>"#);
    doc.load_frame(iframe, Document::parse("<html><p>word</p></html>").unwrap())
        .unwrap();
    let inner = doc.frame_root(iframe).unwrap();
    let options = frame_options();

    Mark::new(body).mark(&mut doc, "word", &options, &mut ()).await;
    let removed = Mark::new(inner).unmark(&mut doc, &options, || {});

    assert_eq!(removed, 1);
    assert_eq!(doc.markup_of(inner), "<html><p>word</p></html>");
}
