/// Tests for the HTML repair pass
use playforge::repair::repair;

const VALID_GAME: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Pong</title>
<style>body { margin: 0; }</style>
</head>
<body>
<canvas id="game"></canvas>
<script>
  let score = 0;
  function init() { score = 0; }
  setInterval(init, 16);
</script>
</body>
</html>"#;

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn repair_is_idempotent() {
    let inputs: Vec<String> = vec![
        VALID_GAME.to_string(),
        "".to_string(),
        "<html><head></head>No body here".to_string(),
        "<!DOCTYPE html><html><head></head><body>x</body>".to_string(),
        "<!DOCTYPE html>\n<!DOCTYPE html>\n<html><html><head></head><body>y</body></html></html>".to_string(),
        format!("Here you go:\n```html\n{}\n```\nEnjoy!", VALID_GAME),
        "<!DOCTYPE html>\n<html>\n<body><script>let s=1;</script></body>\n<head><title>x</title></head>\n</html>".to_string(),
        "random prose with <b>some</b> markup".to_string(),
    ];
    for input in inputs {
        let once = repair(&input);
        let twice = repair(&once);
        assert_eq!(once, twice, "repair not idempotent for input: {:?}", input);
    }
}

#[test]
fn missing_body_is_synthesized_around_trailing_content() {
    let output = repair("<html><head></head>No body here");

    let head = output.find("<head></head>").expect("head preserved intact");
    let body_open = output.find("<body>").expect("body synthesized");
    let content = output.find("No body here").expect("content kept");
    let body_close = output.find("</body>").expect("body closed");
    let html_close = output.find("</html>").expect("document closed");

    assert!(head < body_open);
    assert!(body_open < content);
    assert!(content < body_close);
    assert!(body_close < html_close);
}

#[test]
fn duplicate_declarations_collapse_to_one() {
    let input =
        "<!DOCTYPE html>\n<!DOCTYPE html>\n<html>\n<html>\n<head></head><body>x</body></html>\n</html>";
    let output = repair(input);
    assert_eq!(count(&output, "<!DOCTYPE html>"), 1);
    assert_eq!(count(&output, "<html>"), 1);
    assert_eq!(count(&output, "</html>"), 1);
}

#[test]
fn missing_closing_html_is_appended() {
    let output = repair("<!DOCTYPE html><html><head></head><body>x</body>");
    assert!(output.trim_end().ends_with("</html>"));
    assert_eq!(count(&output, "</html>"), 1);
}

#[test]
fn missing_doctype_is_prepended() {
    let output = repair("<html><head></head><body>x</body></html>");
    assert!(output.starts_with("<!DOCTYPE html>"));
}

#[test]
fn unclosed_head_is_terminated_before_body() {
    let output = repair("<!DOCTYPE html><html><head><title>t</title><body>x</body></html>");
    let head_close = output.find("</head>").expect("head closed");
    let body_open = output.find("<body>").expect("body present");
    assert!(head_close < body_open);
}

#[test]
fn markdown_fences_and_prose_are_stripped() {
    let input = format!("Here you go:\n```html\n{}\n```\nEnjoy!", VALID_GAME);
    let output = repair(&input);
    assert!(output.starts_with("<!DOCTYPE html>"));
    assert!(output.trim_end().ends_with("</html>"));
    assert!(!output.contains("```"));
    assert!(!output.contains("Enjoy!"));
    assert!(!output.contains("Here you go:"));
}

#[test]
fn excess_blank_lines_collapse_to_three_newlines() {
    let input =
        "<!DOCTYPE html><html><head></head><body>a\n\n\n\n\n\nb</body></html>";
    let output = repair(input);
    assert!(output.contains("a\n\n\nb"));
    assert!(!output.contains("\n\n\n\n"));
}

#[test]
fn scrambled_order_is_reassembled_head_first() {
    let input = "<!DOCTYPE html>\n<html>\n<body><script>let s=1;</script></body>\n<head><title>x</title></head>\n</html>";
    let output = repair(input);
    let head = output.find("<head>").expect("head present");
    let body = output.find("<body>").expect("body present");
    assert!(head < body, "head should precede body after repair");
    assert!(output.contains("<script>let s=1;</script>"));
    assert!(output.contains("<title>x</title>"));
}

#[test]
fn reorder_preserves_stray_content() {
    let input = "<!DOCTYPE html>\n<html>\n<body><p>board</p></body>\n<head><title>x</title></head>\n<script>stray()</script>\n</html>";
    let output = repair(input);
    let head = output.find("<head>").expect("head present");
    let body = output.find("<body>").expect("body present");
    assert!(head < body);
    // the stray top-level script is folded into the body, not dropped
    let stray = output.find("stray()").expect("stray content preserved");
    let body_close = output.find("</body>").expect("body closed");
    assert!(body < stray && stray < body_close);
}

#[test]
fn repair_of_garbage_still_yields_a_document() {
    let output = repair("random prose with <b>some</b> markup");
    assert!(output.starts_with("<!DOCTYPE html>"));
    assert!(output.contains("<head>"));
    assert!(output.contains("<body>"));
    assert!(output.trim_end().ends_with("</html>"));
}

#[test]
fn well_formed_document_is_untouched() {
    assert_eq!(repair(VALID_GAME), VALID_GAME);
}
