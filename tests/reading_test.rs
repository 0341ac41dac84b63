use axum::http::StatusCode;
use lingo::api::{self, ErrorBody};
use lingo::reading::{DEFAULT_IMAGE_URL, PassageResponse, Token};

mod common;

#[tokio::test]
async fn test_list_passages() {
    let app = common::create_test_app().await;
    let (status, passages): (_, Vec<PassageResponse>) = common::send_json(
        &app,
        api::reading_passages::LIST.method,
        api::reading_passages::LIST.path,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(passages.len(), 1);
    let p = &passages[0];
    assert_eq!(p.passage.title, "Treasure Island Excerpt");
    assert_eq!(p.id, p.passage.passage_id);
    assert_eq!(p.content, p.passage.body_text);
    assert_eq!(p.level, "2");
    assert_eq!(p.image_url, "https://example.com/treasure_island.mp3");
}

#[tokio::test]
async fn test_list_passages_empty_is_ok() {
    let app = common::app_for(common::empty_db().await);
    let (status, passages): (_, Vec<PassageResponse>) = common::send_json(
        &app,
        api::reading_passages::LIST.method,
        api::reading_passages::LIST.path,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(passages.is_empty());
}

#[tokio::test]
async fn test_get_passage() {
    let app = common::create_test_app().await;
    let url = api::reading_passages::GET.url(&[("id", "1")]);
    let (status, passage): (_, PassageResponse) =
        common::send_json(&app, api::reading_passages::GET.method, &url, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(passage.id, 1);
}

#[tokio::test]
async fn test_get_missing_passage_is_404() {
    let app = common::create_test_app().await;
    let url = api::reading_passages::GET.url(&[("id", "404")]);
    let (status, body): (_, ErrorBody) =
        common::send_json(&app, api::reading_passages::GET.method, &url, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.message, "Passage not found");
}

#[tokio::test]
async fn test_get_malformed_passage_id_is_400() {
    let app = common::create_test_app().await;
    let url = api::reading_passages::GET.url(&[("id", "first")]);
    let (status, body): (_, ErrorBody) =
        common::send_json(&app, api::reading_passages::GET.method, &url, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.field.as_deref(), Some("id"));
}

#[tokio::test]
async fn test_passage_without_media_gets_default_image() {
    let db = common::empty_db().await;
    db.connection()
        .execute(
            "INSERT INTO passage (title, body_text, reading_level) VALUES ('Plain', 'No pictures here.', 1)",
            (),
        )
        .await
        .unwrap();
    let app = common::app_for(db);

    let url = api::reading_passages::GET.url(&[("id", "1")]);
    let (_, passage): (_, PassageResponse) =
        common::send_json(&app, api::reading_passages::GET.method, &url, None).await;
    assert_eq!(passage.image_url, DEFAULT_IMAGE_URL);
    assert!(passage.passage.audio_url.is_none());
}

#[tokio::test]
async fn test_passage_tokens_link_vocabulary() {
    let app = common::create_test_app().await;
    let url = api::reading_passages::WORDS.url(&[("id", "1")]);
    let (status, tokens): (_, Vec<Token>) =
        common::send_json(&app, api::reading_passages::WORDS.method, &url, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(tokens[0].text, "Well,");
    let matey = tokens.iter().find(|t| t.text == "matey,").expect("matey token");
    assert_eq!(matey.lookup, "matey");
    assert!(matey.word_id.is_some());
    assert!(tokens.iter().filter(|t| t.word_id.is_some()).all(|t| t.lookup == "matey"));

    let url = api::reading_passages::WORDS.url(&[("id", "9")]);
    let (status, _) = common::send(&app, api::reading_passages::WORDS.method, &url, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
