//! Integration test to verify the workspace compiles correctly.

#![allow(clippy::no_effect_underscore_binding)]

#[test]
fn domain_crate_compiles() {
    // Verify domain types are accessible
    let _kind = gatehouse_domain::AuthErrorKind::UserNotSignedUp;
    let _record = gatehouse_domain::StoredSession::empty();
    let _active = gatehouse_domain::resolve_active_provider(&[], "client", "issuer");
}

#[test]
fn application_crate_compiles() {
    // Verify application types are accessible
    let _error = gatehouse_application::SessionError::NotSignedIn;
    let _request = gatehouse_application::HttpRequest::get("https://example.com");
}

#[test]
fn infrastructure_crate_compiles() {
    // Verify infrastructure adapters are accessible
    use gatehouse_application::Clock;
    let clock = gatehouse_infrastructure::SystemClock::new();
    let _now = clock.now();
}
