use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::Utc;
use serde_json::{json, Value};

use flashdeck::config::AppConfig;
use flashdeck::state::AppState;
use flashdeck::{db, dispatch, handlers};

const BOT_KEY: &str = "test-key";

fn setup() -> (TestServer, AppState) {
  let pool = db::init_memory_db().unwrap();
  let config = AppConfig {
    bot_api_key: Some(BOT_KEY.to_string()),
    ..Default::default()
  };
  let state = AppState::new(pool, config);
  let server = TestServer::new(handlers::router(state.clone())).unwrap();
  (server, state)
}

fn bot_header() -> (HeaderName, HeaderValue) {
  (
    HeaderName::from_static("x-bot-api-key"),
    HeaderValue::from_static(BOT_KEY),
  )
}

async fn create_deck(server: &TestServer, name: &str) -> i64 {
  let response = server.post("/api/decks").json(&json!({ "name": name })).await;
  response.assert_status(StatusCode::CREATED);
  response.json::<Value>()["id"].as_i64().unwrap()
}

async fn create_card(server: &TestServer, deck_id: i64, front: &str, back: &str) -> i64 {
  let response = server
    .post(&format!("/api/decks/{}/cards", deck_id))
    .json(&json!({ "frontText": front, "backText": back }))
    .await;
  response.assert_status(StatusCode::CREATED);
  response.json::<Value>()["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
  let (server, _) = setup();
  let response = server.get("/api/health").await;
  response.assert_status_ok();
  assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_create_deck_requires_name() {
  let (server, _) = setup();
  let response = server.post("/api/decks").json(&json!({ "name": "   " })).await;
  response.assert_status(StatusCode::BAD_REQUEST);
  assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_new_card_has_default_schedule() {
  let (server, _) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  create_card(&server, deck_id, "Capital of France?", "Paris").await;

  let deck = server.get(&format!("/api/decks/{}", deck_id)).await.json::<Value>();
  assert_eq!(deck["name"], "Capitals");
  let cards = deck["cards"].as_array().unwrap();
  assert_eq!(cards.len(), 1);
  assert_eq!(cards[0]["intervalDays"], 0);
  assert_eq!(cards[0]["easeFactor"], 2.5);
}

#[tokio::test]
async fn test_card_for_missing_deck_is_404() {
  let (server, _) = setup();
  let response = server
    .post("/api/decks/999/cards")
    .json(&json!({ "frontText": "Q", "backText": "A" }))
    .await;
  response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_study_next_and_review() {
  let (server, _) = setup();
  let deck_id = create_deck(&server, "Capitals").await;

  let empty = server.get(&format!("/api/study/{}/next", deck_id)).await;
  empty.assert_status_ok();
  assert_eq!(empty.json::<Value>(), Value::Null);

  let card_id = create_card(&server, deck_id, "Capital of France?", "Paris").await;
  let next = server.get(&format!("/api/study/{}/next", deck_id)).await.json::<Value>();
  assert_eq!(next["id"], card_id);
  assert_eq!(next["frontText"], "Capital of France?");

  let review = server
    .post("/api/study/review")
    .json(&json!({ "cardId": card_id, "rating": "Good" }))
    .await;
  review.assert_status_ok();
  let body = review.json::<Value>();
  assert_eq!(body["rating"], "Good");
  assert_eq!(body["intervalDays"], 1);
  assert_eq!(body["easeFactor"], 2.5);

  // Scheduled a day out, so nothing is due now
  let after = server.get(&format!("/api/study/{}/next", deck_id)).await;
  assert_eq!(after.json::<Value>(), Value::Null);

  let history = server
    .get(&format!("/api/cards/{}/reviews", card_id))
    .await
    .json::<Value>();
  let entries = history.as_array().unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0]["channel"], "web");
}

#[tokio::test]
async fn test_review_accepts_numeric_code() {
  let (server, _) = setup();
  let deck_id = create_deck(&server, "Numbers").await;
  let card_id = create_card(&server, deck_id, "One", "1").await;

  let response = server
    .post("/api/study/review")
    .json(&json!({ "cardId": card_id, "rating": 1 }))
    .await;
  response.assert_status_ok();
  let body = response.json::<Value>();
  assert_eq!(body["rating"], "Again");
  assert_eq!(body["intervalDays"], 0);
}

#[tokio::test]
async fn test_review_rejects_unknown_rating() {
  let (server, _) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  let card_id = create_card(&server, deck_id, "Capital of France?", "Paris").await;

  for rating in [json!("good"), json!("Perfect"), json!(0), json!(9)] {
    let response = server
      .post("/api/study/review")
      .json(&json!({ "cardId": card_id, "rating": rating }))
      .await;
    response.assert_status(StatusCode::BAD_REQUEST);
  }

  // Rejected ratings leave no trace
  let history = server
    .get(&format!("/api/cards/{}/reviews", card_id))
    .await
    .json::<Value>();
  assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_review_of_missing_card_is_404() {
  let (server, _) = setup();
  let response = server
    .post("/api/study/review")
    .json(&json!({ "cardId": 4242, "rating": "Easy" }))
    .await;
  response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bot_routes_require_key() {
  let (server, _) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  let card_id = create_card(&server, deck_id, "Capital of France?", "Paris").await;
  let path = format!("/api/internal/cards/{}", card_id);

  server.get(&path).await.assert_status(StatusCode::UNAUTHORIZED);
  server
    .get(&path)
    .add_header(
      HeaderName::from_static("x-bot-api-key"),
      HeaderValue::from_static("wrong"),
    )
    .await
    .assert_status(StatusCode::UNAUTHORIZED);

  let (name, value) = bot_header();
  let response = server.get(&path).add_header(name, value).await;
  response.assert_status_ok();
  assert_eq!(
    response.json::<Value>(),
    json!({ "frontText": "Capital of France?", "backText": "Paris", "deck": { "name": "Capitals" } })
  );
}

#[tokio::test]
async fn test_bot_routes_fail_closed_without_configured_key() {
  let pool = db::init_memory_db().unwrap();
  let state = AppState::new(pool, AppConfig::default());
  let server = TestServer::new(handlers::router(state)).unwrap();

  let (name, value) = bot_header();
  server
    .get("/api/internal/cards/1")
    .add_header(name, value)
    .await
    .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_chat_review_maps_correct_and_incorrect() {
  let (server, _) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  let card_id = create_card(&server, deck_id, "Capital of France?", "Paris").await;

  let (name, value) = bot_header();
  let response = server
    .post("/api/reviews/chat")
    .add_header(name.clone(), value.clone())
    .json(&json!({ "cardId": card_id, "outcome": "correct" }))
    .await;
  response.assert_status_ok();
  assert_eq!(response.json::<Value>()["message"], "Chat review recorded");

  server
    .post("/api/reviews/chat")
    .add_header(name.clone(), value.clone())
    .json(&json!({ "cardId": card_id, "outcome": "incorrect" }))
    .await
    .assert_status_ok();

  server
    .post("/api/reviews/chat")
    .add_header(name, value)
    .json(&json!({ "cardId": card_id, "outcome": "maybe" }))
    .await
    .assert_status(StatusCode::BAD_REQUEST);

  let history = server
    .get(&format!("/api/cards/{}/reviews", card_id))
    .await
    .json::<Value>();
  let outcomes: Vec<&str> = history
    .as_array()
    .unwrap()
    .iter()
    .map(|entry| entry["outcome"].as_str().unwrap())
    .collect();
  assert_eq!(outcomes, vec!["Good", "Again"]);
}

#[tokio::test]
async fn test_chat_prompt_flow() {
  let (server, state) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  let paris = create_card(&server, deck_id, "Capital of France?", "Paris").await;
  let rome = create_card(&server, deck_id, "Capital of Italy?", "Rome").await;

  server
    .put(&format!("/api/decks/{}/chat", deck_id))
    .json(&json!({ "chatUserId": "user-1", "chatReviewEnabled": true }))
    .await
    .assert_status_ok();

  let queued = dispatch::dispatch_due_reviews(&state.db, &state.sessions, Utc::now()).unwrap();
  assert_eq!(queued, 2);

  let (name, value) = bot_header();
  let prompt = server
    .get("/api/internal/prompts/user-1/next")
    .add_header(name.clone(), value.clone())
    .await
    .json::<Value>();
  assert_eq!(prompt["cardId"], paris);
  assert_eq!(prompt["remaining"], 1);

  // Unanswered prompts are presented again
  let again = server
    .get("/api/internal/prompts/user-1/next")
    .add_header(name.clone(), value.clone())
    .await
    .json::<Value>();
  assert_eq!(again["cardId"], paris);

  let answer = server
    .post("/api/internal/prompts/user-1/answer")
    .add_header(name.clone(), value.clone())
    .json(&json!({ "answer": "  paris " }))
    .await;
  answer.assert_status_ok();
  let graded = answer.json::<Value>();
  assert_eq!(graded["correct"], true);
  assert_eq!(graded["intervalDays"], 1);
  assert_eq!(graded["expectedAnswer"], "Paris");

  let prompt = server
    .get("/api/internal/prompts/user-1/next")
    .add_header(name.clone(), value.clone())
    .await
    .json::<Value>();
  assert_eq!(prompt["cardId"], rome);

  let answer = server
    .post("/api/internal/prompts/user-1/answer")
    .add_header(name.clone(), value.clone())
    .json(&json!({ "answer": "Madrid" }))
    .await
    .json::<Value>();
  assert_eq!(answer["correct"], false);
  assert_eq!(answer["intervalDays"], 0);

  let done = server
    .get("/api/internal/prompts/user-1/next")
    .add_header(name.clone(), value.clone())
    .await;
  assert_eq!(done.json::<Value>(), Value::Null);

  server
    .post("/api/internal/prompts/user-1/answer")
    .add_header(name, value)
    .json(&json!({ "answer": "Rome" }))
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_settings_require_user_when_enabled() {
  let (server, _) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  server
    .put(&format!("/api/decks/{}/chat", deck_id))
    .json(&json!({ "chatReviewEnabled": true }))
    .await
    .assert_status(StatusCode::BAD_REQUEST);
  server
    .put("/api/decks/999/chat")
    .json(&json!({ "chatUserId": "u", "chatReviewEnabled": true }))
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

async fn enable_chat(server: &TestServer, deck_id: i64, user: &str) {
  server
    .put(&format!("/api/decks/{}/chat", deck_id))
    .json(&json!({ "chatUserId": user, "chatReviewEnabled": true }))
    .await
    .assert_status_ok();
}

#[tokio::test]
async fn test_prompt_reviewed_on_web_is_skipped() {
  let (server, state) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  let paris = create_card(&server, deck_id, "Capital of France?", "Paris").await;
  let rome = create_card(&server, deck_id, "Capital of Italy?", "Rome").await;
  enable_chat(&server, deck_id, "user-1").await;
  assert_eq!(
    dispatch::dispatch_due_reviews(&state.db, &state.sessions, Utc::now()).unwrap(),
    2
  );

  // Reviewed on the web after queueing: no longer due
  server
    .post("/api/study/review")
    .json(&json!({ "cardId": paris, "rating": "Good" }))
    .await
    .assert_status_ok();

  let (name, value) = bot_header();
  let prompt = server
    .get("/api/internal/prompts/user-1/next")
    .add_header(name.clone(), value.clone())
    .await
    .json::<Value>();
  assert_eq!(prompt["cardId"], rome);
  assert_eq!(prompt["remaining"], 0);

  // The skipped card was reviewed once, on the web only
  let history = server
    .get(&format!("/api/cards/{}/reviews", paris))
    .await
    .json::<Value>();
  assert_eq!(history.as_array().unwrap().len(), 1);
  assert_eq!(history[0]["channel"], "web");
}

#[tokio::test]
async fn test_queued_card_deleted_before_asking_is_skipped() {
  let (server, state) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  let paris = create_card(&server, deck_id, "Capital of France?", "Paris").await;
  let rome = create_card(&server, deck_id, "Capital of Italy?", "Rome").await;
  enable_chat(&server, deck_id, "user-1").await;
  dispatch::dispatch_due_reviews(&state.db, &state.sessions, Utc::now()).unwrap();

  server
    .delete(&format!("/api/cards/{}", paris))
    .await
    .assert_status_ok();

  let (name, value) = bot_header();
  let prompt = server
    .get("/api/internal/prompts/user-1/next")
    .add_header(name, value)
    .await
    .json::<Value>();
  assert_eq!(prompt["cardId"], rome);
}

#[tokio::test]
async fn test_answer_for_card_deleted_while_asked() {
  let (server, state) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  let paris = create_card(&server, deck_id, "Capital of France?", "Paris").await;
  enable_chat(&server, deck_id, "user-1").await;
  dispatch::dispatch_due_reviews(&state.db, &state.sessions, Utc::now()).unwrap();

  let (name, value) = bot_header();
  let prompt = server
    .get("/api/internal/prompts/user-1/next")
    .add_header(name.clone(), value.clone())
    .await
    .json::<Value>();
  assert_eq!(prompt["cardId"], paris);

  server
    .delete(&format!("/api/cards/{}", paris))
    .await
    .assert_status_ok();

  let answer = server
    .post("/api/internal/prompts/user-1/answer")
    .add_header(name.clone(), value.clone())
    .json(&json!({ "answer": "Paris" }))
    .await;
  answer.assert_status(StatusCode::NOT_FOUND);
  assert!(answer.json::<Value>()["error"]
    .as_str()
    .unwrap()
    .contains("deleted"));

  // The dead prompt was cleared rather than left in flight
  server
    .post("/api/internal/prompts/user-1/answer")
    .add_header(name.clone(), value.clone())
    .json(&json!({ "answer": "Paris" }))
    .await
    .assert_status(StatusCode::NOT_FOUND);
  let next = server
    .get("/api/internal/prompts/user-1/next")
    .add_header(name, value)
    .await;
  assert_eq!(next.json::<Value>(), Value::Null);
  assert!(state.sessions.in_flight("user-1").is_none());
}

#[tokio::test]
async fn test_update_deck() {
  let (server, _) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  let path = format!("/api/decks/{}", deck_id);

  let response = server
    .put(&path)
    .json(&json!({ "name": " European capitals ", "description": "EU only" }))
    .await;
  response.assert_status_ok();
  let deck = response.json::<Value>();
  assert_eq!(deck["name"], "European capitals");
  assert_eq!(deck["description"], "EU only");

  server
    .put(&path)
    .json(&json!({}))
    .await
    .assert_status(StatusCode::BAD_REQUEST);
  server
    .put(&path)
    .json(&json!({ "name": "  " }))
    .await
    .assert_status(StatusCode::BAD_REQUEST);
  server
    .put("/api/decks/999")
    .json(&json!({ "name": "x" }))
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_deck_removes_cards() {
  let (server, _) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  let card_id = create_card(&server, deck_id, "Capital of France?", "Paris").await;

  let response = server.delete(&format!("/api/decks/{}", deck_id)).await;
  response.assert_status_ok();
  assert_eq!(response.json::<Value>()["message"], "Deck deleted successfully");

  server
    .get(&format!("/api/decks/{}", deck_id))
    .await
    .assert_status(StatusCode::NOT_FOUND);
  server
    .get(&format!("/api/cards/{}/reviews", card_id))
    .await
    .assert_status(StatusCode::NOT_FOUND);
  server
    .delete(&format!("/api/decks/{}", deck_id))
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_card_text_keeps_schedule() {
  let (server, _) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  let card_id = create_card(&server, deck_id, "Capital of Frnace?", "Paris").await;
  server
    .post("/api/study/review")
    .json(&json!({ "cardId": card_id, "rating": "Easy" }))
    .await
    .assert_status_ok();

  let response = server
    .put(&format!("/api/cards/{}", card_id))
    .json(&json!({ "frontText": "Capital of France?" }))
    .await;
  response.assert_status_ok();
  let card = response.json::<Value>();
  assert_eq!(card["frontText"], "Capital of France?");
  assert_eq!(card["backText"], "Paris");
  assert_eq!(card["intervalDays"], 1);
  assert_eq!(card["easeFactor"], 2.65);

  server
    .put(&format!("/api/cards/{}", card_id))
    .json(&json!({ "backText": "" }))
    .await
    .assert_status(StatusCode::BAD_REQUEST);
  server
    .put("/api/cards/999")
    .json(&json!({ "backText": "x" }))
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_card() {
  let (server, _) = setup();
  let deck_id = create_deck(&server, "Capitals").await;
  let card_id = create_card(&server, deck_id, "Capital of France?", "Paris").await;

  let response = server.delete(&format!("/api/cards/{}", card_id)).await;
  response.assert_status_ok();
  assert_eq!(response.json::<Value>()["message"], "Card deleted successfully");

  let deck = server.get(&format!("/api/decks/{}", deck_id)).await.json::<Value>();
  assert!(deck["cards"].as_array().unwrap().is_empty());
  server
    .delete(&format!("/api/cards/{}", card_id))
    .await
    .assert_status(StatusCode::NOT_FOUND);
}
