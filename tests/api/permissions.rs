use serde_json::json;

use crate::helpers::spawn_app;

#[tokio::test]
async fn the_grant_listing_unions_records_per_entrepreneur() {
    let app = spawn_app().await;
    let submission_id = app.create_mixed_submission("owner@brightway.cn").await;
    let owner_token = app.factory_token("owner@brightway.cn");
    let entrepreneur_token = app.entrepreneur_token("ada@venture.io", "Ada");

    // Two approval events accumulate two grant records for the same pair.
    let first = app
        .request_access(&entrepreneur_token, &submission_id, &["B2"])
        .await;
    app.respond_to_request(
        &owner_token,
        first["data"]["request_id"].as_str().unwrap(),
        "approved",
    )
    .await;
    let second = app
        .request_access(&entrepreneur_token, &submission_id, &["B3"])
        .await;
    app.respond_to_request(
        &owner_token,
        second["data"]["request_id"].as_str().unwrap(),
        "approved",
    )
    .await;
    assert_eq!(2, app.grant_count(&submission_id).await);

    let response = app
        .get(
            &format!("/api/v1/access/grants/{}", submission_id),
            Some(&owner_token),
        )
        .await;
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["data"],
        json!([{
            "entrepreneur_email": "ada@venture.io",
            "question_ids": ["B2", "B3"]
        }])
    );
}

#[tokio::test]
async fn the_grant_listing_is_reserved_for_the_owning_factory() {
    let app = spawn_app().await;
    let submission_id = app.create_mixed_submission("owner@brightway.cn").await;

    let rival_token = app.factory_token("rival@otherfactory.cn");
    let response = app
        .get(
            &format!("/api/v1/access/grants/{}", submission_id),
            Some(&rival_token),
        )
        .await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn revoking_deletes_every_grant_record_for_the_pair() {
    let app = spawn_app().await;
    let submission_id = app.create_mixed_submission("owner@brightway.cn").await;
    let owner_token = app.factory_token("owner@brightway.cn");
    let entrepreneur_token = app.entrepreneur_token("ada@venture.io", "Ada");

    for question_id in ["B2", "B3"] {
        let created = app
            .request_access(&entrepreneur_token, &submission_id, &[question_id])
            .await;
        app.respond_to_request(
            &owner_token,
            created["data"]["request_id"].as_str().unwrap(),
            "approved",
        )
        .await;
    }
    assert_eq!(2, app.grant_count(&submission_id).await);

    let response = app
        .post_json(
            "/api/v1/access/grants/revoke",
            &json!({
                "submission_id": submission_id,
                "entrepreneur_email": "ada@venture.io"
            }),
            Some(&owner_token),
        )
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["revoked"], json!(true));
    assert_eq!(0, app.grant_count(&submission_id).await);
}

#[tokio::test]
async fn revoking_a_pair_with_no_grants_reports_revoked_false() {
    let app = spawn_app().await;
    let submission_id = app.create_mixed_submission("owner@brightway.cn").await;
    let owner_token = app.factory_token("owner@brightway.cn");

    let response = app
        .post_json(
            "/api/v1/access/grants/revoke",
            &json!({
                "submission_id": submission_id,
                "entrepreneur_email": "nobody@venture.io"
            }),
            Some(&owner_token),
        )
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["revoked"], json!(false));
}

#[tokio::test]
async fn revoke_payloads_are_validated_before_storage() {
    let app = spawn_app().await;
    let owner_token = app.factory_token("owner@brightway.cn");

    let response = app
        .post_json(
            "/api/v1/access/grants/revoke",
            &json!({ "submission_id": "s1", "entrepreneur_email": "not-an-email" }),
            Some(&owner_token),
        )
        .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn the_request_grant_revoke_walk_behaves_end_to_end() {
    let app = spawn_app().await;
    let submission_id = app.create_mixed_submission("owner@brightway.cn").await;
    let owner_token = app.factory_token("owner@brightway.cn");
    let entrepreneur_token = app.entrepreneur_token("ada@venture.io", "Ada");
    let answers_path = format!("/api/v1/submissions/{}/answers", submission_id);

    // E asks for B2 and B3; F denies; everything stays hidden.
    let created = app
        .request_access(&entrepreneur_token, &submission_id, &["B2", "B3"])
        .await;
    app.respond_to_request(
        &owner_token,
        created["data"]["request_id"].as_str().unwrap(),
        "denied",
    )
    .await;
    let body: serde_json::Value = app
        .get(&answers_path, Some(&entrepreneur_token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["private_question_ids"], json!(["B2", "B3"]));

    // E asks again, for B2 only; F approves; B2 opens up, B3 stays hidden.
    let created = app
        .request_access(&entrepreneur_token, &submission_id, &["B2"])
        .await;
    app.respond_to_request(
        &owner_token,
        created["data"]["request_id"].as_str().unwrap(),
        "approved",
    )
    .await;
    let body: serde_json::Value = app
        .get(&answers_path, Some(&entrepreneur_token))
        .await
        .json()
        .await
        .unwrap();
    assert!(body["data"]["answers"]["B2"].is_string());
    assert_eq!(body["data"]["private_question_ids"], json!(["B3"]));

    // F revokes; E is back to the public view.
    app.post_json(
        "/api/v1/access/grants/revoke",
        &json!({
            "submission_id": submission_id,
            "entrepreneur_email": "ada@venture.io"
        }),
        Some(&owner_token),
    )
    .await;
    let body: serde_json::Value = app
        .get(&answers_path, Some(&entrepreneur_token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["answers"], json!({ "B1": "yes" }));
    assert_eq!(body["data"]["private_question_ids"], json!(["B2", "B3"]));
}
