// Integration tests for Lume Dating, driving the full HTTP surface

use actix_web::{http::header, http::StatusCode, test, web, App};
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::Arc;

use lume_dating::auth::{issue_token, verify_password, TokenVerifier};
use lume_dating::config::AuthSettings;
use lume_dating::error::{handle_form_payload_error, handle_query_payload_error};
use lume_dating::models::{Gender, ProfileChanges, User, UserProfile};
use lume_dating::routes::{configure_routes, AppState};
use lume_dating::services::{CacheManager, InMemoryStore, ProfileStore};

const SECRET: &str = "integration-secret";

fn auth_settings() -> AuthSettings {
    AuthSettings {
        jwt_secret: SECRET.to_string(),
        login_url: "/accounts/login/".to_string(),
        cookie_name: "lume_session".to_string(),
    }
}

fn app_state(store: &Arc<InMemoryStore>) -> AppState {
    AppState::new(
        store.clone(),
        store.clone(),
        Arc::new(CacheManager::local(100, 60)),
        Arc::new(TokenVerifier::new(&auth_settings())),
        1,
    )
}

macro_rules! init_app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(app_state(&$store)))
                .app_data(web::FormConfig::default().error_handler(handle_form_payload_error))
                .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
                .configure(configure_routes),
        )
        .await
    };
}

fn bearer(user: &User) -> (header::HeaderName, String) {
    let token = issue_token(SECRET, user.id, &user.username, Duration::hours(1)).unwrap();
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

fn attributes(age: u8, gender: Gender, gender_pref: Gender) -> ProfileChanges {
    ProfileChanges {
        age,
        location: "Lisbon".to_string(),
        gender,
        gender_pref,
        from_age: 25,
        to_age: 35,
        about_me: String::new(),
        avatar: None,
    }
}

async fn create_member(
    store: &InMemoryStore,
    username: &str,
    age: u8,
    gender: Gender,
    gender_pref: Gender,
) -> (User, UserProfile) {
    let user = store
        .insert_user(username, &format!("{}@example.com", username))
        .await;
    let profile = store
        .insert_profile(user.id, attributes(age, gender, gender_pref))
        .await
        .unwrap();
    (user, profile)
}

fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn test_feed_yields_only_in_range_candidate() {
    let store = Arc::new(InMemoryStore::new());
    let (viewer, _) = create_member(&store, "viewer", 30, Gender::Male, Gender::Female).await;
    create_member(&store, "young", 20, Gender::Female, Gender::Male).await;
    let (_, thirty) = create_member(&store, "thirty", 30, Gender::Female, Gender::Male).await;
    create_member(&store, "older", 40, Gender::Female, Gender::Male).await;
    let app = init_app!(store);

    let req = test::TestRequest::get()
        .uri("/dating/")
        .insert_header(bearer(&viewer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let candidates = body["candidates"].as_array().unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0]["id"], thirty.id);
    assert_eq!(candidates[0]["age"], 30);
    assert_eq!(body["page"]["total"], 1);
    assert_eq!(body["page"]["num_pages"], 1);
}

#[actix_web::test]
async fn test_feed_respects_gender_preference_and_excludes_self() {
    let store = Arc::new(InMemoryStore::new());
    let (viewer, _) = create_member(&store, "viewer", 30, Gender::Female, Gender::Female).await;
    create_member(&store, "man", 30, Gender::Male, Gender::Female).await;
    let (_, woman) = create_member(&store, "woman", 28, Gender::Female, Gender::Female).await;
    let app = init_app!(store);

    let req = test::TestRequest::get()
        .uri("/dating/?page=last")
        .insert_header(bearer(&viewer))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let candidates = body["candidates"].as_array().unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0]["id"], woman.id);
    assert_eq!(candidates[0]["gender"], "F");
}

#[actix_web::test]
async fn test_skip_and_like_remove_candidates() {
    let store = Arc::new(InMemoryStore::new());
    let (viewer, viewer_profile) =
        create_member(&store, "viewer", 30, Gender::Male, Gender::Female).await;
    let (_, first) = create_member(&store, "first", 27, Gender::Female, Gender::Male).await;
    let (_, second) = create_member(&store, "second", 29, Gender::Female, Gender::Male).await;
    let app = init_app!(store);

    let req = test::TestRequest::get()
        .uri(&format!("/dating/skip/{}/", first.id))
        .insert_header(bearer(&viewer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/dating/");

    let req = test::TestRequest::get()
        .uri("/dating/")
        .insert_header(bearer(&viewer))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["candidates"][0]["id"], second.id);
    assert_eq!(body["page"]["total"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/dating/like/{}/", second.id))
        .insert_header(bearer(&viewer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let req = test::TestRequest::get()
        .uri("/dating/")
        .insert_header(bearer(&viewer))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["candidates"].as_array().unwrap().is_empty());

    let profile = store.get_profile(viewer_profile.id).await.unwrap();
    assert!(profile.skip_ids.contains(&first.id));
    assert!(profile.like_ids.contains(&second.id));
    assert!(!profile.skip_ids.contains(&second.id));
}

#[actix_web::test]
async fn test_invalid_decisions() {
    let store = Arc::new(InMemoryStore::new());
    let (viewer, viewer_profile) =
        create_member(&store, "viewer", 30, Gender::Male, Gender::Female).await;
    let (_, target) = create_member(&store, "target", 30, Gender::Female, Gender::Male).await;
    let app = init_app!(store);

    let cases = [
        (format!("/dating/poke/{}/", target.id), StatusCode::NOT_FOUND),
        ("/dating/like/999999/".to_string(), StatusCode::NOT_FOUND),
        (format!("/dating/like/{}/", viewer_profile.id), StatusCode::BAD_REQUEST),
    ];

    for (uri, expected) in cases {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(&viewer))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "unexpected status for {}", uri);
    }
}

#[actix_web::test]
async fn test_feed_pagination_bounds() {
    let store = Arc::new(InMemoryStore::new());
    let (viewer, _) = create_member(&store, "viewer", 30, Gender::Male, Gender::Female).await;
    let app = init_app!(store);

    // empty feed: page 1 exists
    let req = test::TestRequest::get()
        .uri("/dating/?page=1")
        .insert_header(bearer(&viewer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["candidates"].as_array().unwrap().is_empty());
    assert_eq!(body["page"]["has_next"], false);

    for page in ["2", "0", "abc"] {
        let req = test::TestRequest::get()
            .uri(&format!("/dating/?page={}", page))
            .insert_header(bearer(&viewer))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "page {}", page);
    }
}

#[actix_web::test]
async fn test_feed_walks_pages_in_id_order() {
    let store = Arc::new(InMemoryStore::new());
    let (viewer, _) = create_member(&store, "viewer", 30, Gender::Male, Gender::Female).await;
    let (_, a) = create_member(&store, "a", 26, Gender::Female, Gender::Male).await;
    let (_, b) = create_member(&store, "b", 31, Gender::Female, Gender::Male).await;
    let app = init_app!(store);

    let req = test::TestRequest::get()
        .uri("/dating/?page=2")
        .insert_header(bearer(&viewer))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["candidates"][0]["id"], b.id);
    assert_eq!(body["page"]["number"], 2);
    assert_eq!(body["page"]["has_previous"], true);
    assert_eq!(body["page"]["previous_page"], 1);
    assert!(a.id < b.id);
}

#[actix_web::test]
async fn test_mutual_likes_show_on_match_page() {
    let store = Arc::new(InMemoryStore::new());
    let (ann, ann_profile) = create_member(&store, "ann", 30, Gender::Female, Gender::Male).await;
    let (bob, bob_profile) = create_member(&store, "bob", 30, Gender::Male, Gender::Female).await;
    let app = init_app!(store);

    let req = test::TestRequest::get()
        .uri(&format!("/dating/like/{}/", bob_profile.id))
        .insert_header(bearer(&ann))
        .to_request();
    test::call_service(&app, req).await;

    // one-sided like is not a match
    let req = test::TestRequest::get()
        .uri("/match/")
        .insert_header(bearer(&ann))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 0);

    let req = test::TestRequest::get()
        .uri(&format!("/dating/like/{}/", ann_profile.id))
        .insert_header(bearer(&bob))
        .to_request();
    test::call_service(&app, req).await;

    for (user, other) in [(&ann, bob_profile.id), (&bob, ann_profile.id)] {
        let req = test::TestRequest::get()
            .uri("/match/")
            .insert_header(bearer(user))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["matches"][0]["id"], other);
    }
}

#[actix_web::test]
async fn test_match_page_reflects_profile_edits() {
    let store = Arc::new(InMemoryStore::new());
    let (ann, ann_profile) = create_member(&store, "ann", 30, Gender::Female, Gender::Male).await;
    let (bob, bob_profile) = create_member(&store, "bob", 30, Gender::Male, Gender::Female).await;
    let app = init_app!(store);

    for (user, target) in [(&ann, bob_profile.id), (&bob, ann_profile.id)] {
        let req = test::TestRequest::get()
            .uri(&format!("/dating/like/{}/", target))
            .insert_header(bearer(user))
            .to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::get()
        .uri("/match/")
        .insert_header(bearer(&ann))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["matches"][0]["age"], 30);

    let edit = vec![
        ("age", "33"),
        ("location", "Lisbon"),
        ("gender", "M"),
        ("gender_pref", "F"),
        ("from_age", "25"),
        ("to_age", "35"),
        ("about_me", "Edited bio"),
    ];
    let req = test::TestRequest::post()
        .uri("/accounts/profile/edit/")
        .insert_header(bearer(&bob))
        .set_form(&edit)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let req = test::TestRequest::get()
        .uri("/match/")
        .insert_header(bearer(&ann))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["matches"][0]["age"], 33);
    assert_eq!(body["matches"][0]["about_me"], "Edited bio");
}

#[actix_web::test]
async fn test_room_requires_authentication() {
    let store = Arc::new(InMemoryStore::new());
    let (ann, _) = create_member(&store, "ann", 30, Gender::Female, Gender::Male).await;
    let app = init_app!(store);

    let req = test::TestRequest::get().uri("/chat/lobby/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/accounts/login/?next=%2Fchat%2Flobby%2F");

    let req = test::TestRequest::get()
        .uri("/chat/lobby/")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let req = test::TestRequest::get()
        .uri("/chat/lobby/")
        .insert_header(bearer(&ann))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["room_name_json"], "\"lobby\"");
    assert_eq!(body["username"], "\"ann\"");
}

#[actix_web::test]
async fn test_session_cookie_authenticates() {
    let store = Arc::new(InMemoryStore::new());
    let (ann, _) = create_member(&store, "ann", 30, Gender::Female, Gender::Male).await;
    let app = init_app!(store);

    let token = issue_token(SECRET, ann.id, &ann.username, Duration::hours(1)).unwrap();
    let req = test::TestRequest::get()
        .uri("/chat/")
        .cookie(actix_web::cookie::Cookie::new("lume_session", token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "ann");

    let req = test::TestRequest::get().uri("/chat/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["username"].is_null());
}

#[actix_web::test]
async fn test_dialog_returns_last_ten_messages() {
    let store = Arc::new(InMemoryStore::new());
    let (ann, _) = create_member(&store, "ann", 30, Gender::Female, Gender::Male).await;
    let dialog = store.insert_dialog("ann-bob").await;
    let start = Utc::now() - Duration::hours(2);
    for i in 1..=12 {
        store
            .insert_message(dialog.id, ann.id, &format!("t{}", i), start + Duration::minutes(i))
            .await
            .unwrap();
    }
    let app = init_app!(store);

    let req = test::TestRequest::get()
        .uri(&format!("/chat/dialogs/{}/messages/", dialog.id))
        .insert_header(bearer(&ann))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let texts: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["t12", "t11", "t10", "t9", "t8", "t7", "t6", "t5", "t4", "t3"]);
    assert_eq!(body["dialog"]["name"], "ann-bob");

    let req = test::TestRequest::get()
        .uri("/chat/dialogs/424242/messages/")
        .insert_header(bearer(&ann))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_contact_lookup() {
    let store = Arc::new(InMemoryStore::new());
    let (ann, _) = create_member(&store, "ann", 30, Gender::Female, Gender::Male).await;
    create_member(&store, "bob", 30, Gender::Male, Gender::Female).await;
    let app = init_app!(store);

    let req = test::TestRequest::get()
        .uri("/chat/contacts/bob/")
        .insert_header(bearer(&ann))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["contact"]["username"], "bob");
    assert!(body["contact"].get("password_hash").is_none());

    let req = test::TestRequest::get()
        .uri("/chat/contacts/nobody/")
        .insert_header(bearer(&ann))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_profile_edit_validation_and_update() {
    let store = Arc::new(InMemoryStore::new());
    let (ann, profile) = create_member(&store, "ann", 30, Gender::Female, Gender::Male).await;
    let app = init_app!(store);

    let req = test::TestRequest::get()
        .uri("/accounts/profile/edit/")
        .insert_header(bearer(&ann))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["form"]["age"], "30");
    assert_eq!(body["form"]["location"], "Lisbon");

    let inverted = vec![
        ("age", "31"),
        ("location", "Porto"),
        ("gender", "F"),
        ("gender_pref", "M"),
        ("from_age", "40"),
        ("to_age", "30"),
        ("about_me", "Surfer"),
    ];
    let req = test::TestRequest::post()
        .uri("/accounts/profile/edit/")
        .insert_header(bearer(&ann))
        .set_form(&inverted)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["__all__"].is_array());
    assert_eq!(body["form"]["location"], "Porto");

    let unparseable = vec![
        ("age", "abc"),
        ("location", "Porto"),
        ("gender_pref", "X"),
        ("from_age", "-1"),
        ("to_age", "300"),
    ];
    let req = test::TestRequest::post()
        .uri("/accounts/profile/edit/")
        .insert_header(bearer(&ann))
        .set_form(&unparseable)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["age"][0], "Enter a whole number.");
    assert_eq!(body["errors"]["gender"][0], "This field is required.");
    assert!(body["errors"]["gender_pref"].is_array());
    assert_eq!(body["form"]["age"], "abc");
    assert_eq!(store.get_profile(profile.id).await.unwrap().age, 30);

    let valid = vec![
        ("age", "31"),
        ("location", "Porto"),
        ("gender", "F"),
        ("gender_pref", "M"),
        ("from_age", "28"),
        ("to_age", "40"),
        ("about_me", "Surfer"),
    ];
    let req = test::TestRequest::post()
        .uri("/accounts/profile/edit/")
        .insert_header(bearer(&ann))
        .set_form(&valid)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/accounts/profile/");

    let updated = store.get_profile(profile.id).await.unwrap();
    assert_eq!(updated.age, 31);
    assert_eq!(updated.location, "Porto");
    assert_eq!(updated.to_age, 40);

    let req = test::TestRequest::get()
        .uri("/accounts/profile/")
        .insert_header(bearer(&ann))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["user"]["username"], "ann");
    assert_eq!(body["profile"]["about_me"], "Surfer");
}

#[actix_web::test]
async fn test_user_edit() {
    let store = Arc::new(InMemoryStore::new());
    let (ann, _) = create_member(&store, "ann", 30, Gender::Female, Gender::Male).await;
    create_member(&store, "bob", 30, Gender::Male, Gender::Female).await;
    let app = init_app!(store);

    let mismatched = vec![
        ("username", "annie"),
        ("email", "annie@example.com"),
        ("password1", "correct horse"),
        ("password2", "battery staple"),
    ];
    let req = test::TestRequest::post()
        .uri("/accounts/user/edit/")
        .insert_header(bearer(&ann))
        .set_form(&mismatched)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["password2"][0], "The two password fields didn't match");
    assert!(body["form"].get("password1").is_none());

    let taken = vec![
        ("username", "bob"),
        ("email", "ann@example.com"),
        ("password1", "correct horse"),
        ("password2", "correct horse"),
    ];
    let req = test::TestRequest::post()
        .uri("/accounts/user/edit/")
        .insert_header(bearer(&ann))
        .set_form(&taken)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["username"].is_array());

    let valid = vec![
        ("username", "annie"),
        ("email", "annie@example.com"),
        ("first_name", "Ann"),
        ("password1", "correct horse"),
        ("password2", "correct horse"),
    ];
    let req = test::TestRequest::post()
        .uri("/accounts/user/edit/")
        .insert_header(bearer(&ann))
        .set_form(&valid)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let updated = store.get_user(ann.id).await.unwrap();
    assert_eq!(updated.username, "annie");
    assert_eq!(updated.first_name, "Ann");
    assert!(verify_password("correct horse", &updated.password_hash));
}

#[actix_web::test]
async fn test_protected_pages_redirect_to_login() {
    let store = Arc::new(InMemoryStore::new());
    let app = init_app!(store);

    for uri in ["/dating/", "/match/", "/accounts/profile/", "/accounts/user/edit/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", uri);
        assert!(location(&resp).starts_with("/accounts/login/?next="));
    }

    let req = test::TestRequest::get().uri("/dating/?page=3").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        location(&resp),
        "/accounts/login/?next=%2Fdating%2F%3Fpage%3D3"
    );

    let req = test::TestRequest::get()
        .uri("/accounts/login/?next=%2Fmatch%2F")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["next"], "/match/");
}

#[actix_web::test]
async fn test_health_check() {
    let store = Arc::new(InMemoryStore::new());
    let app = init_app!(store);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
}
