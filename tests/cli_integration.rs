use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn treemark() -> Command {
    let mut cmd = Command::cargo_bin("treemark").unwrap();
    cmd.env("RUST_LOG", "error");
    cmd
}

const PAGE: &str = "<html><body><p>The quick brown fox</p><script>fox()</script></body></html>";

#[test]
fn mark_writes_marked_markup_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.xhtml");
    fs::write(&page, PAGE)?;

    treemark()
        .arg("mark")
        .arg(&page)
        .arg("fox")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"brown <mark data-markjs="true">fox</mark></p><script>fox()</script>"#,
        ))
        .stderr(predicate::str::contains("1 marker(s) created"));

    // the input stays untouched without --in-place
    assert_eq!(fs::read_to_string(&page)?, PAGE);
    Ok(())
}

#[test]
fn mark_honours_marker_and_accuracy_flags() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.xml");
    let out = dir.path().join("out.xml");
    fs::write(&page, "<p>cats category cat.</p>")?;

    treemark()
        .args(["mark", "--accuracy", "exactly", "--element", "span", "--class", "hit"])
        .arg(&page)
        .arg("cat")
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(
        fs::read_to_string(&out)?,
        r#"<p>cats category <span data-markjs="true" class="hit">cat</span>.</p>"#
    );
    Ok(())
}

#[test]
fn across_elements_flag_joins_fragments() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("split.xml");
    fs::write(&page, "<p>hello wor<b>ld</b></p>")?;

    treemark()
        .args(["mark", "--across-elements"])
        .arg(&page)
        .arg("world")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"<mark data-markjs="true">wor</mark><b><mark data-markjs="true">ld</mark></b>"#,
        ));
    Ok(())
}

#[test]
fn directories_require_in_place() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.xhtml"), "<p>one</p>")?;

    treemark()
        .arg("mark")
        .arg(dir.path())
        .arg("one")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--in-place"));
    Ok(())
}

#[test]
fn in_place_rewrites_every_markup_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("nested"))?;
    fs::write(dir.path().join("a.xhtml"), "<p>one</p>")?;
    fs::write(dir.path().join("nested/b.xml"), "<p>one two</p>")?;
    fs::write(dir.path().join("notes.txt"), "one")?;

    treemark()
        .args(["mark", "--in-place"])
        .arg(dir.path())
        .arg("one")
        .assert()
        .success()
        .stderr(predicate::str::contains("2 marker(s) created in 2 file(s)"));

    assert_eq!(
        fs::read_to_string(dir.path().join("a.xhtml"))?,
        r#"<p><mark data-markjs="true">one</mark></p>"#
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("nested/b.xml"))?,
        r#"<p><mark data-markjs="true">one</mark> two</p>"#
    );
    assert_eq!(fs::read_to_string(dir.path().join("notes.txt"))?, "one");
    Ok(())
}

#[test]
fn in_place_keeps_prolog_and_quotes_intact() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.xhtml");
    let markup = "<?xml version=\"1.0\"?>\n<!DOCTYPE html>\n<html><body><p>it's \"here\"<br/></p></body></html>\n";
    fs::write(&page, markup)?;

    treemark()
        .args(["mark", "--in-place"])
        .arg(&page)
        .arg("absent")
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&page)?, markup);

    treemark()
        .args(["mark", "--in-place"])
        .arg(&page)
        .arg("here")
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(&page)?,
        "<?xml version=\"1.0\"?>\n<!DOCTYPE html>\n<html><body><p>it's \"<mark data-markjs=\"true\">here</mark>\"<br/></p></body></html>\n"
    );
    Ok(())
}

#[test]
fn html_entities_are_understood() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.html");
    fs::write(&page, "<html><body><p>caf&eacute;&nbsp;au lait &copy;</p></body></html>")?;

    treemark()
        .arg("mark")
        .arg(&page)
        .arg("cafe")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "<p><mark data-markjs=\"true\">caf\u{e9}</mark>\u{a0}au lait \u{a9}</p>",
        ));
    Ok(())
}

#[test]
fn unmark_removes_markers() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.xml");
    fs::write(
        &page,
        r#"<p>a <mark data-markjs="true">b</mark> c <mark>kept</mark></p>"#,
    )?;

    treemark()
        .args(["unmark", "--in-place"])
        .arg(&page)
        .assert()
        .success()
        .stderr(predicate::str::contains("1 marker(s) removed"));

    assert_eq!(fs::read_to_string(&page)?, "<p>a b c <mark>kept</mark></p>");
    Ok(())
}

#[test]
fn regex_command_marks_pattern_matches() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.xml");
    fs::write(&page, "<p>call 555-1234 or 555-9876</p>")?;

    treemark()
        .arg("regex")
        .arg(&page)
        .arg(r"\d{3}-\d{4}")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"call <mark data-markjs="true">555-1234</mark> or <mark data-markjs="true">555-9876</mark>"#,
        ));
    Ok(())
}

#[test]
fn invalid_regex_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.xml");
    fs::write(&page, "<p>x</p>")?;

    treemark()
        .arg("regex")
        .arg(&page)
        .arg("(unclosed")
        .assert()
        .failure();
    Ok(())
}

#[test]
fn json_summary_lists_unmatched_terms() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.xml");
    fs::write(&page, "<p>alpha beta</p>")?;

    let output = treemark()
        .args(["--json", "mark"])
        .arg(&page)
        .arg("alpha gamma")
        .output()?;
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr)?;
    let start = stderr.find('{').ok_or("no JSON in stderr")?;
    let summary: serde_json::Value = serde_json::from_str(&stderr[start..])?;
    assert_eq!(summary["command"], "mark");
    assert_eq!(summary["total_markers"], 1);
    assert_eq!(summary["files"][0]["unmatched"][0], "gamma");
    Ok(())
}

#[test]
fn missing_input_fails() {
    treemark()
        .args(["mark", "/definitely/not/here.xml", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn completions_are_generated() {
    treemark()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("treemark"));
}
