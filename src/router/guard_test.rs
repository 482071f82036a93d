use super::*;
use crate::auth::Claims;
use crate::router::table::{RouteMeta, RouteTable};
use serde_json::json;

fn session_with(payload: serde_json::Value) -> AuthSession {
    AuthSession::Authenticated(Claims::new(payload.as_object().unwrap().clone()))
}

fn admin() -> AuthSession {
    session_with(json!({ "role": "admin" }))
}

fn member() -> AuthSession {
    session_with(json!({ "role": "member" }))
}

fn stranger() -> AuthSession {
    session_with(json!({ "role": "auditor" }))
}

fn decide(path: &str, session: &AuthSession) -> GuardDecision {
    let table = RouteTable::portal();
    guard(table.resolve(path).unwrap(), session)
}

// =============================================================================
// root
// =============================================================================

#[test]
fn root_unauthenticated_goes_to_member_login() {
    assert_eq!(decide("/", &AuthSession::Unauthenticated), GuardDecision::Redirect("/member/login"));
}

#[test]
fn root_redirects_by_role() {
    assert_eq!(decide("/", &admin()), GuardDecision::Redirect("/admin"));
    assert_eq!(decide("/", &member()), GuardDecision::Redirect("/member"));
}

#[test]
fn root_unknown_role_goes_to_member_login() {
    assert_eq!(decide("/", &stranger()), GuardDecision::Redirect("/member/login"));
}

// =============================================================================
// guest-only pages
// =============================================================================

#[test]
fn login_pages_open_when_unauthenticated() {
    assert!(decide("/admin/login", &AuthSession::Unauthenticated).is_allow());
    assert!(decide("/member/login", &AuthSession::Unauthenticated).is_allow());
}

#[test]
fn login_pages_bounce_authenticated_users_home() {
    assert_eq!(decide("/admin/login", &admin()), GuardDecision::Redirect("/admin"));
    assert_eq!(decide("/member/login", &admin()), GuardDecision::Redirect("/admin"));
    assert_eq!(decide("/admin/login", &member()), GuardDecision::Redirect("/member"));
    assert_eq!(decide("/member/login", &member()), GuardDecision::Redirect("/member"));
}

#[test]
fn login_page_allows_unknown_role() {
    assert!(decide("/member/login", &stranger()).is_allow());
}

#[test]
fn register_is_public_for_everyone() {
    assert!(decide("/register", &AuthSession::Unauthenticated).is_allow());
    assert!(decide("/register", &member()).is_allow());
}

// =============================================================================
// requires_auth
// =============================================================================

#[test]
fn unauthenticated_member_route_goes_to_member_login() {
    assert_eq!(decide("/member/services", &AuthSession::Unauthenticated), GuardDecision::Redirect("/member/login"));
}

#[test]
fn unauthenticated_admin_route_goes_to_admin_login() {
    assert_eq!(decide("/admin/applications", &AuthSession::Unauthenticated), GuardDecision::Redirect("/admin/login"));
}

#[test]
fn unauthenticated_is_always_sent_to_a_login_page() {
    let table = RouteTable::portal();
    for route in table.routes().iter().filter(|r| r.meta.requires_auth && !r.is_root()) {
        let decision = guard(route, &AuthSession::Unauthenticated);
        assert!(
            matches!(decision, GuardDecision::Redirect("/member/login" | "/admin/login")),
            "{} -> {decision:?}",
            route.path
        );
    }
}

#[test]
fn auth_required_without_role_allows_any_authenticated_user() {
    let route = Route::new("/inbox", RouteMeta::default());
    assert!(guard(&route, &stranger()).is_allow());
    assert_eq!(guard(&route, &AuthSession::Unauthenticated), GuardDecision::Redirect("/member/login"));
}

// =============================================================================
// role checks
// =============================================================================

#[test]
fn admin_on_member_route_goes_to_admin_home() {
    assert_eq!(decide("/member", &admin()), GuardDecision::Redirect("/admin"));
    assert_eq!(decide("/member/account/edit", &admin()), GuardDecision::Redirect("/admin"));
}

#[test]
fn member_on_admin_route_goes_to_member_home() {
    assert_eq!(decide("/admin/services", &member()), GuardDecision::Redirect("/member"));
}

#[test]
fn unknown_role_on_role_route_goes_to_login() {
    assert_eq!(decide("/admin", &stranger()), GuardDecision::Redirect("/member/login"));
}

#[test]
fn matching_role_is_allowed() {
    assert!(decide("/admin/appointments", &admin()).is_allow());
    assert!(decide("/member/history", &member()).is_allow());
}

#[test]
fn public_route_with_role_still_checks_role() {
    let route = Route::new(
        "/kiosk",
        RouteMeta { requires_auth: false, role: Some(Role::Member), guest_only: false },
    );
    assert_eq!(guard(&route, &AuthSession::Unauthenticated), GuardDecision::Redirect("/member/login"));
    assert!(guard(&route, &member()).is_allow());
}
