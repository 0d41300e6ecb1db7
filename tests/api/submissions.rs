use serde_json::json;

use crate::helpers::spawn_app;

#[tokio::test]
async fn creating_a_submission_requires_a_factory_session() {
    let app = spawn_app().await;
    let body = json!({ "factory_name": "Brightway Electronics" });

    let anonymous = app.post_json("/api/v1/submissions", &body, None).await;
    assert_eq!(401, anonymous.status().as_u16());

    let entrepreneur_token = app.entrepreneur_token("ada@venture.io", "Ada");
    let entrepreneur = app
        .post_json("/api/v1/submissions", &body, Some(&entrepreneur_token))
        .await;
    assert_eq!(403, entrepreneur.status().as_u16());
}

#[tokio::test]
async fn a_blank_factory_name_is_rejected_before_storage() {
    let app = spawn_app().await;
    let token = app.factory_token("owner@brightway.cn");

    let response = app
        .post_json(
            "/api/v1/submissions",
            &json!({ "factory_name": "   " }),
            Some(&token),
        )
        .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn visibility_values_are_normalized_fail_open_on_save() {
    let app = spawn_app().await;
    let token = app.factory_token("owner@brightway.cn");

    let submission_id = app
        .create_submission(
            &token,
            &json!({
                "factory_name": "Brightway Electronics",
                "answers": { "B1": "yes", "B2": "no" },
                "visibility": { "B1": " Private ", "B2": "hidden" }
            }),
        )
        .await;

    // B2's unknown marker became public; anonymous callers can read it.
    let response = app
        .get(&format!("/api/v1/submissions/{}/answers", submission_id), None)
        .await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["data"]["answers"]["B2"].is_string());
    assert_eq!(
        body["data"]["private_question_ids"],
        json!(["B1"])
    );
}

#[tokio::test]
async fn anonymous_callers_get_public_answers_and_the_hidden_id_list() {
    let app = spawn_app().await;
    let submission_id = app.create_mixed_submission("owner@brightway.cn").await;

    let response = app
        .get(&format!("/api/v1/submissions/{}/answers", submission_id), None)
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["answers"], json!({ "B1": "yes" }));
    assert_eq!(body["data"]["private_question_ids"], json!(["B2", "B3"]));
}

#[tokio::test]
async fn the_owning_factory_sees_every_answer() {
    let app = spawn_app().await;
    let submission_id = app.create_mixed_submission("owner@brightway.cn").await;
    let token = app.factory_token("owner@brightway.cn");

    let response = app
        .get(
            &format!("/api/v1/submissions/{}/answers", submission_id),
            Some(&token),
        )
        .await;

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["answers"].as_object().unwrap().len(), 3);
    assert_eq!(body["data"]["private_question_ids"], json!([]));
}

#[tokio::test]
async fn a_different_factory_is_treated_like_an_anonymous_reader() {
    let app = spawn_app().await;
    let submission_id = app.create_mixed_submission("owner@brightway.cn").await;
    let other_token = app.factory_token("rival@otherfactory.cn");

    let response = app
        .get(
            &format!("/api/v1/submissions/{}/answers", submission_id),
            Some(&other_token),
        )
        .await;

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["answers"], json!({ "B1": "yes" }));
    assert_eq!(body["data"]["private_question_ids"], json!(["B2", "B3"]));
}

#[tokio::test]
async fn an_entrepreneur_with_a_full_grant_sees_every_answer() {
    let app = spawn_app().await;
    let submission_id = app.create_mixed_submission("owner@brightway.cn").await;
    let owner_token = app.factory_token("owner@brightway.cn");
    let entrepreneur_token = app.entrepreneur_token("ada@venture.io", "Ada");

    let created = app
        .request_access(&entrepreneur_token, &submission_id, &["all"])
        .await;
    let request_id = created["data"]["request_id"].as_str().unwrap();
    let response = app
        .respond_to_request(&owner_token, request_id, "approved")
        .await;
    assert_eq!(200, response.status().as_u16());

    let response = app
        .get(
            &format!("/api/v1/submissions/{}/answers", submission_id),
            Some(&entrepreneur_token),
        )
        .await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["answers"].as_object().unwrap().len(), 3);
    assert_eq!(body["data"]["private_question_ids"], json!([]));
}

#[tokio::test]
async fn answers_for_an_unknown_submission_are_a_404() {
    let app = spawn_app().await;

    let response = app
        .get("/api/v1/submissions/does-not-exist/answers", None)
        .await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn updates_shallow_merge_answers_and_visibility() {
    let app = spawn_app().await;
    let submission_id = app.create_mixed_submission("owner@brightway.cn").await;
    let token = app.factory_token("owner@brightway.cn");

    // B4 is new and private; B2 flips to public; B3's marker is untouched.
    let response = app
        .put_json(
            &format!("/api/v1/submissions/{}", submission_id),
            &json!({
                "answers": { "B4": "quarterly audit report" },
                "visibility": { "B2": "public", "B4": "private" }
            }),
            Some(&token),
        )
        .await;
    assert_eq!(200, response.status().as_u16());

    let response = app
        .get(&format!("/api/v1/submissions/{}/answers", submission_id), None)
        .await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["data"]["answers"],
        json!({ "B1": "yes", "B2": "ISO 9001 certificate on file" })
    );
    assert_eq!(body["data"]["private_question_ids"], json!(["B3", "B4"]));
}

#[tokio::test]
async fn updating_someone_elses_submission_is_a_404_not_a_403() {
    let app = spawn_app().await;
    let submission_id = app.create_mixed_submission("owner@brightway.cn").await;
    let other_token = app.factory_token("rival@otherfactory.cn");

    let response = app
        .put_json(
            &format!("/api/v1/submissions/{}", submission_id),
            &json!({ "answers": { "B1": "tampered" } }),
            Some(&other_token),
        )
        .await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn the_browse_listing_is_public_and_paginated() {
    let app = spawn_app().await;
    let token = app.factory_token("owner@brightway.cn");
    for i in 0..3 {
        app.create_submission(
            &token,
            &json!({ "factory_name": format!("Factory {}", i) }),
        )
        .await;
    }

    let response = app
        .get("/api/v1/submissions?page=1&per_page=2", None)
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total_items"], json!(3));
    assert_eq!(body["pagination"]["total_pages"], json!(2));
    // Summaries never leak answers.
    assert!(body["data"][0].get("answers").is_none());
}

#[tokio::test]
async fn deleting_a_submission_cascades_to_requests_and_grants() {
    let app = spawn_app().await;
    let submission_id = app.create_mixed_submission("owner@brightway.cn").await;
    let owner_token = app.factory_token("owner@brightway.cn");
    let entrepreneur_token = app.entrepreneur_token("ada@venture.io", "Ada");

    let created = app
        .request_access(&entrepreneur_token, &submission_id, &["B2"])
        .await;
    let request_id = created["data"]["request_id"].as_str().unwrap();
    app.respond_to_request(&owner_token, request_id, "approved")
        .await;
    assert_eq!(1, app.grant_count(&submission_id).await);

    let response = app
        .delete(
            &format!("/api/v1/submissions/{}", submission_id),
            Some(&owner_token),
        )
        .await;
    assert_eq!(200, response.status().as_u16());

    assert_eq!(0, app.grant_count(&submission_id).await);
    assert_eq!(0, app.request_count(&submission_id).await);
    let response = app
        .get(&format!("/api/v1/submissions/{}/answers", submission_id), None)
        .await;
    assert_eq!(404, response.status().as_u16());
}
