#![allow(clippy::unwrap_used)]
// Controller flows against a wiremock backend.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use smartdisplay_api::ApiClient;
use smartdisplay_core::{
    AlarmController, AppContext, ArmMode, AuthState, CoreConfig, CoreError, GuestController,
    HomeController, LinkHealth, LoginController, MenuController, Role, SessionKey, View, slices,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AppContext) {
    setup_with(|_| {}).await
}

async fn setup_with(tweak: impl FnOnce(&mut CoreConfig)) -> (MockServer, AppContext) {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let mut config = CoreConfig::new(base.clone());
    tweak(&mut config);
    let api = ApiClient::with_client(reqwest::Client::new(), base, Duration::from_secs(5));
    (server, AppContext::with_client(config, api))
}

fn auth_state(ctx: &AppContext) -> serde_json::Value {
    ctx.store().slice(slices::AUTH).unwrap()
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_context_starts_as_guest_on_login_view() {
    let (_server, ctx) = setup().await;

    assert_eq!(auth_state(&ctx), json!({"authenticated": false, "role": "guest"}));
    assert_eq!(ctx.router().current(), View::Login);
}

#[tokio::test]
async fn test_partial_pin_never_calls_backend() {
    let (server, ctx) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;

    let login = LoginController::new(ctx.clone());
    for key in ['1', '2', '3'] {
        assert!(login.press(key).await.unwrap().is_none());
    }
    assert_eq!(login.masked().await, "●●●○");

    let err = login.login("123").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidPin { expected: 4 }));
    assert_eq!(ctx.router().current(), View::Login);
}

#[tokio::test]
async fn test_fourth_digit_submits_exactly_once() {
    let (server, ctx) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"pin": "1234"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let login = LoginController::new(ctx.clone());
    let mut outcome = None;
    for key in ['1', '2', '3', '4'] {
        outcome = login.press(key).await.unwrap();
    }

    assert_eq!(outcome, Some(AuthState::signed_in(Role::Admin, None)));
    assert_eq!(login.masked().await, "○○○○");
}

#[tokio::test]
async fn test_admin_pin_signs_in_and_routes_home() {
    let (server, ctx) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let login = LoginController::new(ctx.clone());
    let state = login.login("1234").await.unwrap();

    assert_eq!(state.role, Role::Admin);
    assert_eq!(auth_state(&ctx), json!({"authenticated": true, "role": "admin"}));
    assert_eq!(ctx.router().current(), View::Home);
    assert_eq!(ctx.session().role(), Role::Admin);
    assert!(ctx.session().pin().is_some());
}

#[tokio::test]
async fn test_backend_role_and_username_win() {
    let (server, ctx) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "role": "user",
            "username": "Ayşe"
        })))
        .mount(&server)
        .await;

    let login = LoginController::new(ctx.clone());
    login.login("1234").await.unwrap();

    assert_eq!(
        auth_state(&ctx),
        json!({"authenticated": true, "role": "user", "username": "Ayşe"})
    );
    assert_eq!(ctx.session().get(SessionKey::CurrentUser).as_deref(), Some("Ayşe"));
}

#[tokio::test]
async fn test_rejected_pin_resets_to_guest_with_message() {
    let (server, ctx) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"pin": "0000"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Hatalı PIN"
        })))
        .expect(1)
        .mount(&server)
        .await;

    ctx.session().set(SessionKey::Role, "user");
    let login = LoginController::new(ctx.clone());
    let err = login.login("0000").await.unwrap_err();

    assert!(matches!(err, CoreError::LoginRejected { .. }));
    assert!(err.to_string().contains("Hatalı PIN"));
    assert_eq!(auth_state(&ctx), json!({"authenticated": false, "role": "guest"}));
    assert!(!ctx.session().is_signed_in());
    assert_eq!(ctx.router().current(), View::Login);
}

#[tokio::test]
async fn test_login_transport_error_propagates() {
    let (server, ctx) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let login = LoginController::new(ctx.clone());
    let err = login.login("1234").await.unwrap_err();

    assert_eq!(err.kind(), Some(smartdisplay_api::ErrorKind::HttpError));
    assert_eq!(ctx.router().current(), View::Login);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let (server, ctx) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let login = LoginController::new(ctx.clone());
    login.login("5678").await.unwrap();
    assert_eq!(ctx.auth_state().role, Role::User);

    login.logout().await;

    assert_eq!(ctx.auth_state(), AuthState::guest());
    assert!(ctx.session().pin().is_none());
    assert_eq!(ctx.router().current(), View::Login);
}

// ── Alarm ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_arm_merges_reply_into_alarm_state() {
    let (server, ctx) = setup().await;
    Mock::given(method("GET"))
        .and(path("/ui/alarm/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mode": "disarmed",
            "zones": 4
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ui/alarm/action"))
        .and(body_json(json!({"action": "arm_away"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mode": "arming"})))
        .expect(1)
        .mount(&server)
        .await;

    let alarm = AlarmController::new(ctx.clone());
    alarm.load().await.unwrap();
    alarm.arm(ArmMode::Away).await.unwrap();

    assert_eq!(alarm.state(), Some(json!({"mode": "arming", "zones": 4})));
}

#[tokio::test]
async fn test_alarm_action_error_surfaces() {
    let (server, ctx) = setup().await;
    Mock::given(method("POST"))
        .and(path("/ui/alarm/action"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "zone open",
            "code": "ZONE_OPEN"
        })))
        .mount(&server)
        .await;

    let alarm = AlarmController::new(ctx.clone());
    let err = alarm.disarm().await.unwrap_err();

    assert_eq!(err.kind(), Some(smartdisplay_api::ErrorKind::ApiError));
    assert!(alarm.state().is_none());
}

#[tokio::test]
async fn test_arm_rejection_keeps_envelope_details() {
    let (server, ctx) = setup().await;
    Mock::given(method("POST"))
        .and(path("/ui/alarm/action"))
        .and(body_json(json!({"action": "arm_away"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "zone open",
            "code": "ZONE",
            "details": {"zone": "kitchen"},
            "data": {"open": [3]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let alarm = AlarmController::new(ctx.clone());
    let err = alarm.arm(ArmMode::Away).await.unwrap_err();

    let CoreError::Api {
        message,
        status,
        code,
        details,
        data,
        body,
        ..
    } = err
    else {
        panic!("expected an API error");
    };
    assert_eq!(message, "zone open");
    assert_eq!(status, Some(200));
    assert_eq!(code.as_deref(), Some("ZONE"));
    assert_eq!(details, Some(json!({"zone": "kitchen"})));
    assert_eq!(data, Some(json!({"open": [3]})));
    assert_eq!(body.unwrap()["error"], json!("zone open"));
}

// ── Guest / menu ────────────────────────────────────────────────────

#[tokio::test]
async fn test_guest_actions_post_empty_objects() {
    let (server, ctx) = setup().await;
    Mock::given(method("POST"))
        .and(path("/ui/guest/request"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ui/guest/exit"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let guest = GuestController::new(ctx);
    assert_eq!(guest.request_access().await.unwrap()["status"], "pending");
    assert_eq!(guest.exit().await.unwrap(), json!({}));
}

#[tokio::test]
async fn test_menu_provider_sends_session_role() {
    let (server, ctx) = setup().await;
    Mock::given(method("GET"))
        .and(path("/ui/menu"))
        .and(header("X-User-Role", "admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "settings"}])))
        .expect(1)
        .mount(&server)
        .await;

    ctx.session().set(SessionKey::Role, "admin");
    let menu = MenuController::new(ctx.clone());
    menu.attach();
    ctx.store().refresh().await;

    assert_eq!(menu.state(), Some(json!({"items": [{"id": "settings"}]})));
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failing_slice_does_not_block_others() {
    let (server, ctx) = setup().await;
    Mock::given(method("GET"))
        .and(path("/ui/home/state"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ui/alarm/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mode": "armed_home"})))
        .mount(&server)
        .await;

    let home = HomeController::new(ctx.clone());
    let alarm = AlarmController::new(ctx.clone());
    home.attach();
    alarm.attach();

    let report = ctx.store().refresh().await;

    assert_eq!(report.providers, 2);
    assert_eq!(report.updated_keys, vec![slices::ALARM.to_owned()]);
    assert!(home.state().is_none());
    assert_eq!(alarm.state(), Some(json!({"mode": "armed_home"})));
}

#[tokio::test]
async fn test_degraded_signal_after_threshold() {
    let (server, ctx) = setup_with(|c| c.failure_threshold = 2).await;
    Mock::given(method("GET"))
        .and(path("/ui/guest/state"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ui/guest/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"visitors": 0})))
        .mount(&server)
        .await;

    let guest = GuestController::new(ctx.clone());
    guest.attach();
    let health = guest.health();

    ctx.store().refresh().await;
    assert_eq!(*health.borrow(), LinkHealth::Healthy);

    ctx.store().refresh().await;
    assert_eq!(
        *health.borrow(),
        LinkHealth::Degraded {
            consecutive_failures: 2
        }
    );

    ctx.store().refresh().await;
    assert_eq!(*health.borrow(), LinkHealth::Healthy);
    assert_eq!(guest.state(), Some(json!({"visitors": 0})));
}

#[tokio::test]
async fn test_home_state_is_idempotent_across_cycles() {
    let (server, ctx) = setup().await;
    Mock::given(method("GET"))
        .and(path("/ui/home/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"scene": "evening"})))
        .expect(2)
        .mount(&server)
        .await;

    let home = HomeController::new(ctx.clone());
    let id = home.attach();
    ctx.store().refresh().await;
    let first = home.state();
    ctx.store().refresh().await;

    assert_eq!(home.state(), first);
    assert!(ctx.store().unregister(id));
}
