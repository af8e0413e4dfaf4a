/// Tests for SSE framing and gateway error classification
use playforge::clients::common::{
    concat_sse_body, decode_delta_frame, parse_sse_line, sse_body_to_chunks, SseLine,
};
use playforge::GatewayError;

#[test]
fn blank_and_comment_lines_are_ignored() {
    assert_eq!(parse_sse_line(""), SseLine::Ignore);
    assert_eq!(parse_sse_line("\r"), SseLine::Ignore);
    assert_eq!(parse_sse_line(": keep-alive"), SseLine::Ignore);
    assert_eq!(parse_sse_line(":"), SseLine::Ignore);
}

#[test]
fn non_data_fields_are_ignored() {
    assert_eq!(parse_sse_line("event: message"), SseLine::Ignore);
    assert_eq!(parse_sse_line("id: 42"), SseLine::Ignore);
    assert_eq!(parse_sse_line("retry: 1000"), SseLine::Ignore);
}

#[test]
fn done_sentinel_terminates() {
    assert_eq!(parse_sse_line("data: [DONE]"), SseLine::Done);
    assert_eq!(parse_sse_line("data:[DONE]"), SseLine::Done);
    assert_eq!(parse_sse_line("data: [DONE]\r"), SseLine::Done);
}

#[test]
fn data_payloads_are_extracted_with_or_without_space() {
    assert_eq!(
        parse_sse_line("data: {\"x\":1}"),
        SseLine::Data("{\"x\":1}".to_string())
    );
    assert_eq!(
        parse_sse_line("data:{\"x\":1}"),
        SseLine::Data("{\"x\":1}".to_string())
    );
}

#[test]
fn delta_frames_decode_content_and_finish_reason() {
    let chunk =
        decode_delta_frame(r#"{"choices":[{"delta":{"content":"Hel"}}]}"#).expect("valid frame");
    assert_eq!(chunk.content, "Hel");
    assert!(!chunk.is_final);

    let last = decode_delta_frame(
        r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
    )
    .expect("valid frame");
    assert_eq!(last.content, "");
    assert!(last.is_final);
}

#[test]
fn malformed_frames_are_skipped_not_fatal() {
    assert!(decode_delta_frame("{not json").is_none());

    let body = "data: {garbled\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n";
    assert_eq!(concat_sse_body(body), "ok");
}

#[test]
fn deltas_concatenate_in_order_and_stop_at_done() {
    let body = concat_lines(&[
        ": welcome",
        "data: {\"choices\":[{\"delta\":{\"content\":\"<!DOCTYPE \"}}]}",
        "",
        "data: {\"choices\":[{\"delta\":{\"content\":\"html><html>\"}}]}",
        ": keep-alive",
        "data: {\"choices\":[{\"delta\":{\"content\":\"</html>\"}}]}",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}",
        "data: [DONE]",
        "data: {\"choices\":[{\"delta\":{\"content\":\"IGNORED\"}}]}",
    ]);
    assert_eq!(concat_sse_body(&body), "<!DOCTYPE html><html></html>");
}

#[test]
fn chunks_preserve_final_flag() {
    let body = concat_lines(&[
        "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}",
    ]);
    let chunks = sse_body_to_chunks(&body);
    assert_eq!(chunks.len(), 2);
    assert!(!chunks[0].is_final);
    assert!(chunks[1].is_final);
}

#[test]
fn status_codes_classify_into_fixed_categories() {
    assert_eq!(GatewayError::from_status(429, ""), GatewayError::RateLimited);
    assert_eq!(GatewayError::from_status(402, ""), GatewayError::QuotaExceeded);
    assert_eq!(
        GatewayError::from_status(403, "monthly quota exceeded"),
        GatewayError::QuotaExceeded
    );
    assert_eq!(GatewayError::from_status(403, "forbidden"), GatewayError::Unauthorized);
    assert_eq!(GatewayError::from_status(401, ""), GatewayError::Unauthorized);
    assert_eq!(GatewayError::from_status(500, ""), GatewayError::Server(500));
    assert_eq!(GatewayError::from_status(503, ""), GatewayError::Server(503));
    assert!(matches!(
        GatewayError::from_status(418, "teapot"),
        GatewayError::InvalidResponse(_)
    ));
}

fn concat_lines(lines: &[&str]) -> String {
    let mut body = String::new();
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    body
}
