use quotes_api::auth::UserRole;
use quotes_api::auth::responses::{TokenPairResponse, TokenVerifyResponse, UserSummary};
use quotes_api::auth::routes::{current_user, logout, obtain_token, refresh_token, verify_token};
use quotes_api::test_support::{
    TestDatabase, TestDatabaseError, TestFixtures, TestRocketBuilder, test_auth_state,
};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use rocket::routes;
use serde_json::json;

const PASSWORD: &str = "sturdy-password-42";

async fn provision(test_name: &str) -> Option<TestDatabase> {
    match TestDatabase::new_from_env().await {
        Ok(db) => Some(db),
        Err(TestDatabaseError::MissingUrl) => {
            eprintln!("skipping {test_name}: TEST_DATABASE_URL not set");
            None
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    }
}

async fn auth_client(db: &TestDatabase) -> Client {
    let pool = db.pool_clone();
    TestFixtures::new(&pool)
        .insert_user("Editor", UserRole::Admin, PASSWORD)
        .await
        .expect("insert user");

    TestRocketBuilder::new()
        .manage_auth_state(test_auth_state(&pool).expect("auth state"))
        .manage_pg_pool(pool)
        .mount_api_routes(routes![
            obtain_token,
            refresh_token,
            verify_token,
            logout,
            current_user
        ])
        .async_client()
        .await
}

async fn login(client: &Client) -> TokenPairResponse {
    let response = client
        .post("/api/v1/auth/token")
        .header(ContentType::JSON)
        .body(json!({"username": "editor", "password": PASSWORD}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    response.into_json().await.expect("token pair")
}

async fn refresh(client: &Client, token: &str) -> (Status, Option<TokenPairResponse>) {
    let response = client
        .post("/api/v1/auth/token/refresh")
        .header(ContentType::JSON)
        .body(json!({"refresh": token}).to_string())
        .dispatch()
        .await;
    let status = response.status();
    let body = if status == Status::Ok {
        response.into_json().await
    } else {
        None
    };
    (status, body)
}

async fn me(client: &Client, access: &str) -> Status {
    client
        .get("/api/v1/auth/me")
        .header(Header::new("Authorization", format!("Bearer {access}")))
        .dispatch()
        .await
        .status()
}

#[tokio::test]
async fn login_is_case_insensitive_and_rejects_bad_passwords() {
    let Some(db) = provision("auth login test").await else {
        return;
    };
    let client = auth_client(&db).await;

    let pair = login(&client).await;
    let user = pair.user.expect("login returns the account");
    assert_eq!(user.username, "Editor");
    assert_eq!(user.role, UserRole::Admin);

    let response = client
        .get("/api/v1/auth/me")
        .header(Header::new("Authorization", format!("Bearer {}", pair.access)))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let summary: UserSummary = response.into_json().await.expect("user summary");
    assert_eq!(summary.id, user.id);

    let verify = client
        .post("/api/v1/auth/token/verify")
        .header(ContentType::JSON)
        .body(json!({"token": pair.access}).to_string())
        .dispatch()
        .await;
    assert_eq!(verify.status(), Status::Ok);
    let verified: TokenVerifyResponse = verify.into_json().await.expect("verify payload");
    assert!(verified.valid);

    let wrong = client
        .post("/api/v1/auth/token")
        .header(ContentType::JSON)
        .body(json!({"username": "editor", "password": "not-the-password"}).to_string())
        .dispatch()
        .await;
    assert_eq!(wrong.status(), Status::Unauthorized);

    let blank = client
        .post("/api/v1/auth/token")
        .header(ContentType::JSON)
        .body(json!({"username": " ", "password": ""}).to_string())
        .dispatch()
        .await;
    assert_eq!(blank.status(), Status::BadRequest);

    db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn refresh_rotation_detects_reuse() {
    let Some(db) = provision("auth refresh rotation test").await else {
        return;
    };
    let client = auth_client(&db).await;

    let first = login(&client).await;

    let (status, rotated) = refresh(&client, &first.refresh).await;
    assert_eq!(status, Status::Ok);
    let rotated = rotated.expect("rotated pair");
    assert_ne!(rotated.refresh, first.refresh);
    assert_eq!(me(&client, &rotated.access).await, Status::Ok);

    // Replaying the blacklisted token ends every session of the account.
    let (status, _) = refresh(&client, &first.refresh).await;
    assert_eq!(status, Status::Unauthorized);

    let (status, _) = refresh(&client, &rotated.refresh).await;
    assert_eq!(status, Status::Unauthorized);
    assert_eq!(me(&client, &rotated.access).await, Status::Unauthorized);

    let (status, _) = refresh(&client, "garbage").await;
    assert_eq!(status, Status::Unauthorized);

    db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn logout_blacklists_refresh_token() {
    let Some(db) = provision("auth logout test").await else {
        return;
    };
    let client = auth_client(&db).await;

    let pair = login(&client).await;
    let other_device = login(&client).await;

    let response = client
        .post("/api/v1/auth/logout")
        .header(ContentType::JSON)
        .body(json!({"refresh": pair.refresh}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);
    assert_eq!(me(&client, &other_device.access).await, Status::Ok);

    let everywhere = client
        .post("/api/v1/auth/logout")
        .header(ContentType::JSON)
        .body(json!({"refresh": other_device.refresh, "allDevices": true}).to_string())
        .dispatch()
        .await;
    assert_eq!(everywhere.status(), Status::NoContent);
    assert_eq!(me(&client, &other_device.access).await, Status::Unauthorized);

    let (status, _) = refresh(&client, &pair.refresh).await;
    assert_eq!(status, Status::Unauthorized);

    db.close().await.expect("failed to drop test database");
}
