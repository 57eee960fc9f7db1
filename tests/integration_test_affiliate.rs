mod common;

use axum::http::StatusCode;
use common::{application_body, parse_body, TestApp};
use serde_json::json;

async fn count(app: &TestApp, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(app.pool()).await.unwrap()
}

#[tokio::test]
async fn test_application_requires_known_user() {
    let app = TestApp::new().await;

    let res = app.send("POST", "/api/affiliate/profile/apply", None, Some(application_body())).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.send("POST", "/api/affiliate/profile/apply", Some("no-such-user"), Some(application_body())).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_second_submission_returns_pending_application() {
    let app = TestApp::new().await;
    let user = app.register("Asha Rao", "asha@x.com").await;

    let res = app.send("POST", "/api/affiliate/profile/apply", Some(&user), Some(application_body())).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let first = parse_body(res).await;
    assert_eq!(first["alreadyPending"], false);
    assert_eq!(first["application"]["status"], "pending");
    assert_eq!(first["profile"]["status"], "pending");
    assert!(first["profile"]["affiliate_code"].as_str().unwrap().starts_with("AFF"));

    let res = app.send("POST", "/api/affiliate/profile/apply", Some(&user), Some(application_body())).await;
    assert_eq!(res.status(), StatusCode::OK);
    let second = parse_body(res).await;
    assert_eq!(second["alreadyPending"], true);
    assert_eq!(second["application"]["id"], first["application"]["id"]);

    assert_eq!(count(&app, "SELECT COUNT(*) FROM affiliate_applications").await, 1);
    assert_eq!(count(&app, "SELECT COUNT(*) FROM affiliate_profiles").await, 1);
}

#[tokio::test]
async fn test_short_reason_is_rejected() {
    let app = TestApp::new().await;
    let user = app.register("Asha Rao", "asha@x.com").await;

    let mut body = application_body();
    body["reason"] = json!("Sounds fun");
    let res = app.send("POST", "/api/affiliate/profile/apply", Some(&user), Some(body)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(count(&app, "SELECT COUNT(*) FROM affiliate_applications").await, 0);
}

#[tokio::test]
async fn test_quick_application_checks_account_email() {
    let app = TestApp::new().await;
    let user = app.register("Asha Rao", "asha@x.com").await;

    let mut body = json!({
        "userId": user,
        "name": "Asha Rao",
        "accountEmail": "someone@else.com",
        "paymentEmail": "payouts@x.com",
        "promotionMethod": "YouTube channel on CA exams"
    });
    let res = app.send("POST", "/api/affiliate/apply", None, Some(body.clone())).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    body["accountEmail"] = json!("ASHA@x.com");
    let res = app.send("POST", "/api/affiliate/apply", None, Some(body)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = parse_body(res).await;
    assert_eq!(created["application"]["company_name"], "Asha Rao");
    assert_eq!(created["profile"]["payment_email"], "payouts@x.com");
}

#[tokio::test]
async fn test_approval_promotes_user_and_cannot_repeat() {
    let app = TestApp::new().await;
    let admin = app.register_admin("ops@example.in").await;
    let user = app.register("Asha Rao", "asha@x.com").await;

    let res = app.send("POST", "/api/affiliate/profile/apply", Some(&user), Some(application_body())).await;
    let application_id = parse_body(res).await["application"]["id"].as_str().unwrap().to_string();

    let decide = json!({
        "applicationId": application_id,
        "status": "approved",
        "adminNotes": "Strong audience",
        "approvedBy": "ops@example.in"
    });

    // Regular users cannot decide.
    let res = app.send("PUT", "/api/admin/affiliates", Some(&user), Some(decide.clone())).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.send("PUT", "/api/admin/affiliates", Some(&admin), Some(decide.clone())).await;
    assert_eq!(res.status(), StatusCode::OK);
    let decided = parse_body(res).await;
    assert_eq!(decided["application"]["status"], "approved");
    assert_eq!(decided["application"]["approved_by"], "ops@example.in");
    assert!(decided["application"]["decided_at"].is_string());

    let overview = parse_body(app.send("GET", "/api/affiliate/profile", Some(&user), None).await).await;
    assert_eq!(overview["profile"]["status"], "approved");

    let stored = app.state.repos().unwrap().user_repo.find_by_id(&user).await.unwrap().unwrap();
    assert_eq!(stored.role, "Affiliate");
    assert_eq!(stored.affiliate_id.as_deref(), overview["profile"]["id"].as_str());

    let res = app.send("PUT", "/api/admin/affiliates", Some(&admin), Some(decide)).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Approved is terminal: applying again is refused.
    let res = app.send("POST", "/api/affiliate/profile/apply", Some(&user), Some(application_body())).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let decision_mail = app.email.sent.lock().unwrap().iter().any(|m| m.to == vec!["asha@x.com".to_string()] && m.subject.contains("approved"));
    assert!(decision_mail);
}

#[tokio::test]
async fn test_rejection_leaves_profile_and_allows_reapplying() {
    let app = TestApp::new().await;
    let admin = app.register_admin("ops@example.in").await;
    let user = app.register("Asha Rao", "asha@x.com").await;

    let res = app.send("POST", "/api/affiliate/profile/apply", Some(&user), Some(application_body())).await;
    let application_id = parse_body(res).await["application"]["id"].as_str().unwrap().to_string();

    let res = app.send("PUT", "/api/admin/affiliates", Some(&admin), Some(json!({
        "applicationId": application_id,
        "status": "rejected",
        "adminNotes": "Audience too small"
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let overview = parse_body(app.send("GET", "/api/affiliate/profile", Some(&user), None).await).await;
    assert_eq!(overview["profile"]["status"], "pending");
    assert_eq!(overview["application"]["status"], "rejected");

    let stored = app.state.repos().unwrap().user_repo.find_by_id(&user).await.unwrap().unwrap();
    assert_eq!(stored.role, "user");

    let res = app.send("POST", "/api/affiliate/profile/apply", Some(&user), Some(application_body())).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(count(&app, "SELECT COUNT(*) FROM affiliate_applications").await, 2);

    let res = app.send("GET", "/api/admin/affiliates?status=pending", Some(&admin), None).await;
    assert_eq!(parse_body(res).await["applications"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_decision_is_bad_request() {
    let app = TestApp::new().await;
    let admin = app.register_admin("ops@example.in").await;

    let res = app.send("PUT", "/api/admin/affiliates", Some(&admin), Some(json!({
        "applicationId": "missing",
        "status": "maybe"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.send("PUT", "/api/admin/affiliates", Some(&admin), Some(json!({
        "applicationId": "missing",
        "status": "approved"
    }))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_referral_is_capped_at_one_for_good() {
    let app = TestApp::new().await;
    let admin = app.register_admin("ops@example.in").await;
    let (user, _profile_id, code) = app.approved_affiliate(&admin, "asha@x.com").await;

    let status = parse_body(app.send("GET", "/api/affiliate/referral-status", Some(&user), None).await).await;
    assert_eq!(status["canRefer"], true);
    assert_eq!(status["referralCount"], 0);
    assert_eq!(status["affiliateCode"], code);

    let res = app.send("POST", "/api/affiliate/referrals", Some(&user), Some(json!({ "name": "Ravi Iyer", "email": "ravi@y.com" }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(parse_body(res).await["referral"]["source"], "dashboard");

    let status = parse_body(app.send("GET", "/api/affiliate/referral-status", Some(&user), None).await).await;
    assert_eq!(status["canRefer"], false);
    assert_eq!(status["referralCount"], 1);

    let res = app.send("POST", "/api/affiliate/referrals", Some(&user), Some(json!({ "name": "Meera N", "email": "meera@z.com" }))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Signups through the link still count toward lifetime referrals.
    let res = app.send("POST", "/api/registrations", None, Some(json!({ "name": "Kiran", "email": "kiran@w.com", "referralCode": code }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let overview = parse_body(app.send("GET", "/api/affiliate/profile", Some(&user), None).await).await;
    assert_eq!(overview["profile"]["dashboard_referral_count"], 1);
    assert_eq!(overview["profile"]["total_referrals"], 2);

    let status = parse_body(app.send("GET", "/api/affiliate/referral-status", Some(&user), None).await).await;
    assert_eq!(status["canRefer"], false);
}

#[tokio::test]
async fn test_unusable_referral_codes_are_ignored_at_signup() {
    let app = TestApp::new().await;
    let admin = app.register_admin("ops@example.in").await;
    let (_approved_user, approved_profile, _) = app.approved_affiliate(&admin, "asha@x.com").await;

    // Applied but never approved.
    let pending_user = app.register("Meera N", "meera@z.com").await;
    let res = app.send("POST", "/api/affiliate/profile/apply", Some(&pending_user), Some(application_body())).await;
    let pending_code = parse_body(res).await["profile"]["affiliate_code"].as_str().unwrap().to_string();

    for (email, code) in [("kiran@w.com", "AFFNOTREAL"), ("dev@w.com", pending_code.as_str())] {
        let res = app.send("POST", "/api/registrations", None, Some(json!({ "name": "New User", "email": email, "referralCode": code }))).await;
        assert_eq!(res.status(), StatusCode::CREATED, "code {}", code);
        assert_eq!(parse_body(res).await["user"]["referred_by"], serde_json::Value::Null);
    }

    assert_eq!(count(&app, "SELECT COUNT(*) FROM referrals").await, 0);

    let repo = &app.state.repos().unwrap().affiliate_repo;
    let approved = repo.find_profile(&approved_profile).await.unwrap().unwrap();
    assert_eq!(approved.total_referrals, 0);
    assert_eq!(approved.pending_referrals, 0);
    let pending_profile = repo.find_profile_by_user(&pending_user).await.unwrap().unwrap();
    assert_eq!(pending_profile.total_referrals, 0);
}

#[tokio::test]
async fn test_suspended_affiliate_cannot_refer() {
    let app = TestApp::new().await;
    let admin = app.register_admin("ops@example.in").await;
    let (user, profile_id, _) = app.approved_affiliate(&admin, "asha@x.com").await;

    let res = app.send("PUT", &format!("/api/admin/affiliates/profiles/{}/status", profile_id), Some(&admin), Some(json!({ "status": "suspended" }))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.send("POST", "/api/affiliate/referrals", Some(&user), Some(json!({ "name": "Ravi Iyer", "email": "ravi@y.com" }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.send("PUT", &format!("/api/admin/affiliates/profiles/{}/status", profile_id), Some(&admin), Some(json!({ "status": "pending" }))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_non_affiliate_has_no_referral_slot() {
    let app = TestApp::new().await;
    let user = app.register("Asha Rao", "asha@x.com").await;

    let status = parse_body(app.send("GET", "/api/affiliate/referral-status", Some(&user), None).await).await;
    assert_eq!(status["canRefer"], false);
    assert_eq!(status["affiliateCode"], serde_json::Value::Null);

    let res = app.send("POST", "/api/affiliate/referrals", Some(&user), Some(json!({ "name": "Ravi", "email": "ravi@y.com" }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_affiliate_routes_need_a_database() {
    let app = TestApp::unconfigured().await;

    let res = app.send("POST", "/api/registrations", None, Some(json!({ "name": "Asha", "email": "asha@x.com" }))).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let res = app.send("GET", "/api/affiliate/profile", Some("anyone"), None).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Submissions are not confirmed optimistically: nothing was recorded.
    let res = app.send("POST", "/api/affiliate/apply", None, Some(json!({
        "userId": "someone",
        "name": "Asha Rao",
        "accountEmail": "asha@x.com",
        "paymentEmail": "payouts@x.com",
        "promotionMethod": "YouTube channel on CA exams"
    }))).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(parse_body(res).await["success"], false);

    let res = app.send("POST", "/api/affiliate/profile/apply", Some("someone"), Some(application_body())).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    assert!(app.email.sent.lock().unwrap().is_empty());
    assert!(app.crm.contacts.lock().unwrap().is_empty());
}
