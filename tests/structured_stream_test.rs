//! Snapshots produced by `stream_object` against the story and comment schemas.

mod support;

use futures_util::StreamExt;
use serde_json::Value;

use hn_stream::error::LlmError;
use hn_stream::highlevel::{StreamObjectOptions, stream_object};
use hn_stream::hn::{
    StoriesPayload, comments_schema, conversation, stories_prompt, stories_schema,
};
use hn_stream::retry::RetryPolicy;
use hn_stream::schema::JsonSchemaValidator;

use support::{ScriptedBackend, comments_json, growing_stories, story_title, tool_args};

fn story_count(value: &Value) -> usize {
    value["stories"].as_array().map_or(0, Vec::len)
}

#[tokio::test]
async fn every_snapshot_conforms_and_the_last_is_complete() {
    let schema = stories_schema();
    let relaxed = JsonSchemaValidator::relaxed(&schema.schema).unwrap();
    let full = JsonSchemaValidator::new(&schema.schema).unwrap();

    // Split a finished document at arbitrary byte offsets, including inside
    // keys and string values.
    let text = growing_stories(&[5]).concat();
    let chunks: Vec<String> = text
        .as_bytes()
        .chunks(17)
        .map(|c| String::from_utf8(c.to_vec()).unwrap())
        .collect();
    let backend = ScriptedBackend::new()
        .with_stories(tool_args(&chunks))
        .into_arc();

    let snapshots: Vec<Value> = stream_object::<Value, _>(
        backend,
        conversation(stories_prompt(5)),
        StreamObjectOptions::new(schema).with_retry(RetryPolicy::immediate(1)),
    )
    .map(|item| item.unwrap())
    .collect()
    .await;

    assert!(snapshots.len() > 1);
    for snapshot in &snapshots {
        assert!(relaxed.is_valid(snapshot), "not a valid partial: {snapshot}");
    }
    let last = snapshots.last().unwrap();
    full.validate(last).unwrap();
    assert_eq!(story_count(last), 5);

    for pair in snapshots.windows(2) {
        assert_ne!(pair[0], pair[1]);
        assert!(story_count(&pair[1]) >= story_count(&pair[0]));
    }
}

#[tokio::test]
async fn comment_snapshots_never_hold_half_written_strings() {
    let text = comments_json(3, 3);
    let chunks: Vec<String> = text
        .as_bytes()
        .chunks(9)
        .map(|c| String::from_utf8(c.to_vec()).unwrap())
        .collect();
    let backend = ScriptedBackend::new()
        .with_comments(&story_title(3), tool_args(&chunks))
        .into_arc();

    let snapshots: Vec<Value> = stream_object::<Value, _>(
        backend,
        conversation(hn_stream::hn::comments_prompt(&story_title(3))),
        StreamObjectOptions::new(comments_schema()).with_retry(RetryPolicy::immediate(1)),
    )
    .map(|item| item.unwrap())
    .collect()
    .await;

    let finished: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(snapshots.last(), Some(&finished));
    for snapshot in &snapshots {
        for comment in snapshot["comments"].as_array().into_iter().flatten() {
            if let Some(body) = comment["comment"].as_str() {
                assert!(body.ends_with("on story 3"), "truncated string: {body}");
            }
        }
    }
}

#[tokio::test]
async fn missing_required_field_fails_final_validation() {
    // Valid as a partial throughout, but `points` never arrives.
    let chunks = vec![
        r#"{"stories":[{"title":"Rust 2.0","username":"a","#.to_string(),
        r#""domain":"rust-lang.org","type":"story"}]}"#.to_string(),
    ];
    let backend = ScriptedBackend::new()
        .with_stories(tool_args(&chunks))
        .into_arc();

    let items: Vec<Result<Value, LlmError>> = stream_object::<Value, _>(
        backend.clone(),
        conversation(stories_prompt(1)),
        StreamObjectOptions::new(stories_schema()).with_retry(RetryPolicy::immediate(3)),
    )
    .collect()
    .await;

    assert!(items.len() >= 2);
    assert!(items[..items.len() - 1].iter().all(Result::is_ok));
    assert!(matches!(
        items.last(),
        Some(Err(LlmError::SchemaValidationFailure(_)))
    ));
    assert_eq!(backend.story_requests(), 1);
}

#[tokio::test]
async fn whole_float_points_are_accepted_without_retry() {
    let text = r#"{"stories":[{"title":"T","username":"u","domain":"d","type":"story","points":120.0}]}"#;
    let backend = ScriptedBackend::new()
        .with_stories(tool_args(&[text.to_string()]))
        .into_arc();

    let items: Vec<Result<StoriesPayload, LlmError>> = stream_object(
        backend.clone(),
        conversation(stories_prompt(1)),
        StreamObjectOptions::new(stories_schema()).with_retry(RetryPolicy::immediate(3)),
    )
    .collect()
    .await;

    assert_eq!(items.len(), 1);
    let payload = items[0].as_ref().expect("schema-conformant payload");
    assert_eq!(payload.stories[0].points, Some(120));
    assert_eq!(backend.story_requests(), 1);
}
