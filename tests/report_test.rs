mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn list_reports_is_admin_only() {
    let app = common::spawn_app().await;
    let (_user, user_token) = common::create_test_user(&app, "user").await;

    let resp = app.client.get(app.url("/reports")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .get(app.url("/reports"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn open_reports_listed_oldest_first() {
    let app = common::spawn_app().await;
    let (admin, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, &admin).await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;

    let (first_site, _) = common::create_test_site(&app, &token).await;
    let (second_site, _) = common::create_test_site(&app, &token).await;
    let (third_site, _) = common::create_test_site(&app, &token).await;

    let resp = app
        .client
        .get(app.url("/reports?only_unanswered=true&resource_type=SITE&per_page=100"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert!(items.iter().all(|r| r["resolution"] == "UNRESOLVED"));

    // Creation order is preserved for the three sites of this test
    let expected = [
        first_site.as_str(),
        second_site.as_str(),
        third_site.as_str(),
    ];
    let ours: Vec<&str> = items
        .iter()
        .map(|r| r["resource_id"].as_str().unwrap())
        .filter(|id| expected.contains(id))
        .collect();
    assert_eq!(ours, expected);
}

#[tokio::test]
async fn resolved_reports_drop_out_of_unanswered_listing() {
    let app = common::spawn_app().await;
    let (admin, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, &admin).await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;

    let (_site_id, report_id) = common::create_test_site(&app, &token).await;
    common::approve_report(&app, &admin_token, &report_id).await;

    let resp = app
        .client
        .get(app.url("/reports?only_unanswered=true&resource_type=SITE&per_page=100"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["id"] != report_id.as_str()));

    // Without the filter the resolved report is still visible
    let resp = app
        .client
        .get(app.url("/reports?resource_type=SITE&per_page=100"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let ours = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == report_id.as_str())
        .cloned()
        .expect("approved report missing from unfiltered listing");
    assert_eq!(ours["resolution"], "APPROVED");
    assert_eq!(ours["resolved_by"], admin.as_str());
}

#[tokio::test]
async fn approve_keeps_entity_and_stamps_report() {
    let app = common::spawn_app().await;
    let (admin, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, &admin).await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;

    let (site_id, report_id) = common::create_test_site(&app, &token).await;

    let resp = app
        .client
        .post(app.url(&format!("/reports/{}/resolve", report_id)))
        .bearer_auth(&admin_token)
        .json(&json!({ "action": "approve" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["resolution"], "APPROVED");
    assert_eq!(body["data"]["resolved_by"], admin.as_str());
    assert!(body["data"]["resolved_at"].is_string());

    let resp = app
        .client
        .get(app.url(&format!("/sites/{}", site_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn reject_deletes_entity_and_cascade() {
    let app = common::spawn_app().await;
    let (admin, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, &admin).await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;

    let (site_id, site_report) = common::create_test_site(&app, &token).await;
    let (flavor_id, _flavor_report) =
        common::create_test_flavor(&app, &token, &site_id, "doomed").await;

    let resp = app
        .client
        .post(app.url(&format!("/reports/{}/resolve", site_report)))
        .bearer_auth(&admin_token)
        .json(&json!({ "action": "reject" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["resolution"], "REJECTED");

    // Site and its flavor are gone
    let resp = app
        .client
        .get(app.url(&format!("/sites/{}", site_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .get(app.url(&format!("/flavors/{}", flavor_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // The cascaded flavor's open report is gone too
    let resp = app
        .client
        .get(app.url("/reports?only_unanswered=true&resource_type=FLAVOR"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["resource_id"] != flavor_id.as_str()));
}

#[tokio::test]
async fn double_resolution_fails() {
    let app = common::spawn_app().await;
    let (admin, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, &admin).await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;

    let (site_id, report_id) = common::create_test_site(&app, &token).await;
    common::approve_report(&app, &admin_token, &report_id).await;

    // Second resolve of the same report is an error, not a no-op
    let resp = app
        .client
        .post(app.url(&format!("/reports/{}/resolve", report_id)))
        .bearer_auth(&admin_token)
        .json(&json!({ "action": "reject" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // The failed reject did not touch the approved entity
    let resp = app
        .client
        .get(app.url(&format!("/sites/{}", site_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn resolve_requires_admin() {
    let app = common::spawn_app().await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;
    let (_site_id, report_id) = common::create_test_site(&app, &token).await;

    let resp = app
        .client
        .post(app.url(&format!("/reports/{}/resolve", report_id)))
        .bearer_auth(&token)
        .json(&json!({ "action": "approve" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .post(app.url(&format!("/reports/{}/resolve", report_id)))
        .json(&json!({ "action": "approve" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn resolve_unknown_report_returns_404() {
    let app = common::spawn_app().await;
    let (admin, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, &admin).await;

    let resp = app
        .client
        .post(app.url("/reports/00000000-0000-0000-0000-000000000000/resolve"))
        .bearer_auth(&admin_token)
        .json(&json!({ "action": "approve" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn resolve_with_bogus_action_is_a_validation_error() {
    let app = common::spawn_app().await;
    let (admin, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, &admin).await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;
    let (_site_id, report_id) = common::create_test_site(&app, &token).await;

    let resp = app
        .client
        .post(app.url(&format!("/reports/{}/resolve", report_id)))
        .bearer_auth(&admin_token)
        .json(&json!({ "action": "dismiss" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn filing_a_report_hides_an_approved_entity_again() {
    let app = common::spawn_app().await;
    let (admin, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, &admin).await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;
    let (_reporter, reporter_token) = common::create_test_user(&app, "reporter").await;

    let (site_id, report_id) = common::create_test_site(&app, &token).await;
    common::approve_report(&app, &admin_token, &report_id).await;

    // Approved and listed
    let resp = app.client.get(app.url("/sites?per_page=100")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s["id"] == site_id.as_str()));

    // A user flags the site
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&reporter_token)
        .json(&json!({
            "resource_type": "SITE",
            "resource_id": site_id,
            "message": "This site lists hardware it does not have"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["resolution"], "UNRESOLVED");
    assert_eq!(
        body["data"]["message"],
        "This site lists hardware it does not have"
    );

    // Hidden again until the new report is answered
    let resp = app.client.get(app.url("/sites?per_page=100")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["id"] != site_id.as_str()));
}

#[tokio::test]
async fn filing_a_report_against_unknown_entity_returns_404() {
    let app = common::spawn_app().await;
    let (_reporter, reporter_token) = common::create_test_user(&app, "reporter").await;

    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&reporter_token)
        .json(&json!({
            "resource_type": "RESULT",
            "resource_id": "00000000-0000-0000-0000-000000000000"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn get_report_details_as_admin() {
    let app = common::spawn_app().await;
    let (admin, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, &admin).await;
    let (uploader, token) = common::create_test_user(&app, "uploader").await;
    let (site_id, report_id) = common::create_test_site(&app, &token).await;

    let resp = app
        .client
        .get(app.url(&format!("/reports/{}", report_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["resource_id"], site_id.as_str());
    assert_eq!(body["data"]["reporter_id"], uploader.as_str());
}
