mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn create_benchmark_opens_unresolved_report() {
    let app = common::spawn_app().await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;

    let resp = app
        .client
        .post(app.url("/benchmarks"))
        .bearer_auth(&token)
        .json(&json!({
            "docker_image": "thechristophe/openbench-c-ray",
            "docker_tag": "latest",
            "description": "C-Ray raytracing benchmark",
            "json_template": { "score": 0, "machine": { "cpu": "" } }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["data"]["benchmark"]["docker_image"],
        "thechristophe/openbench-c-ray"
    );
    assert_eq!(body["data"]["report"]["resolution"], "UNRESOLVED");
    assert_eq!(body["data"]["report"]["resource_type"], "BENCHMARK");
}

#[tokio::test]
async fn duplicate_image_tag_pair_conflicts() {
    let app = common::spawn_app().await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;

    common::create_test_benchmark(&app, &token, "org/bench", "v1", json!({ "score": 0 })).await;

    let resp = app
        .client
        .post(app.url("/benchmarks"))
        .bearer_auth(&token)
        .json(&json!({
            "docker_image": "org/bench",
            "docker_tag": "v1",
            "json_template": { "score": 0 }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // A different tag of the same image is a different benchmark
    let resp = app
        .client
        .post(app.url("/benchmarks"))
        .bearer_auth(&token)
        .json(&json!({
            "docker_image": "org/bench",
            "docker_tag": "v2",
            "json_template": { "score": 0 }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn non_object_template_is_rejected() {
    let app = common::spawn_app().await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;

    let resp = app
        .client
        .post(app.url("/benchmarks"))
        .bearer_auth(&token)
        .json(&json!({
            "docker_image": "org/broken",
            "docker_tag": "latest",
            "json_template": [1, 2, 3]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn benchmark_hidden_until_approved() {
    let app = common::spawn_app().await;
    let (admin, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, &admin).await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;

    let (benchmark_id, report_id) =
        common::create_test_benchmark(&app, &token, "org/hidden", "v1", json!({ "score": 0 }))
            .await;

    let resp = app.client.get(app.url("/benchmarks")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert!(items.iter().all(|b| b["id"] != benchmark_id.as_str()));

    common::approve_report(&app, &admin_token, &report_id).await;

    let resp = app.client.get(app.url("/benchmarks")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert!(items.iter().any(|b| b["id"] == benchmark_id.as_str()));
}

#[tokio::test]
async fn search_benchmarks_by_image_substring() {
    let app = common::spawn_app().await;
    let (admin, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, &admin).await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;

    let (benchmark_id, report_id) = common::create_test_benchmark(
        &app,
        &token,
        "thechristophe/openbench-c-ray",
        "latest",
        json!({ "score": 0 }),
    )
    .await;
    common::approve_report(&app, &admin_token, &report_id).await;

    let resp = app
        .client
        .get(app.url("/benchmarks/search?terms=c-ray"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert!(items.iter().any(|b| b["id"] == benchmark_id.as_str()));
}

#[tokio::test]
async fn update_benchmark_admin_only() {
    let app = common::spawn_app().await;
    let (admin, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, &admin).await;
    let (_uploader, token) = common::create_test_user(&app, "uploader").await;

    let (benchmark_id, _report_id) =
        common::create_test_benchmark(&app, &token, "org/editable", "v1", json!({ "score": 0 }))
            .await;

    let resp = app
        .client
        .put(app.url(&format!("/benchmarks/{}", benchmark_id)))
        .bearer_auth(&token)
        .json(&json!({ "description": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .put(app.url(&format!("/benchmarks/{}", benchmark_id)))
        .bearer_auth(&admin_token)
        .json(&json!({ "description": "tuned", "docker_tag": "v1.1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["docker_tag"], "v1.1");
    assert_eq!(body["data"]["description"], "tuned");
}
