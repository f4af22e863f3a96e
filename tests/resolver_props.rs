//! Property tests for the mode-resolution invariants that must hold for
//! arbitrary inputs, not just the scripted scenarios.

mod common;

use proptest::prelude::*;
use vantage::model::{Location, Role, SessionFacts};
use vantage::session::resolver::{resolve, ResolveContext, SessionEvent, ViewMode};

const CTX: ResolveContext<'static> = ResolveContext {
    oauth_return_path: "/auth/callback",
    admin_email_marker: "admin",
};

fn any_mode() -> impl Strategy<Value = ViewMode> {
    prop_oneof![
        Just(ViewMode::Login),
        Just(ViewMode::Callback),
        Just(ViewMode::Admin),
        Just(ViewMode::User),
    ]
}

fn any_facts() -> impl Strategy<Value = SessionFacts> {
    prop_oneof![
        Just(SessionFacts::loading()),
        Just(SessionFacts::signed_out()),
        Just(SessionFacts::signed_in(
            Role::Admin,
            common::user("u-1", "boss-admin@vantage.io"),
        )),
        Just(SessionFacts::signed_in(
            Role::User,
            common::user("u-2", "pat@example.com"),
        )),
    ]
}

/// Path segment without separators or query markers.
fn path_segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,12}"
}

fn non_artifact_query() -> impl Strategy<Value = Vec<(String, String)>> {
    // Distinct keys only, so first-match lookups stay unambiguous.
    let keys = ["tab", "page", "sort", "filter", "q"];
    (
        prop::sample::subsequence(keys.to_vec(), 0..=keys.len()),
        prop::collection::vec("[a-z0-9]{1,8}", keys.len()),
    )
        .prop_map(|(keys, values)| {
            keys.into_iter()
                .zip(values)
                .map(|(k, v)| (k.to_string(), v))
                .collect()
        })
}

fn render_location(path: &str, query: &[(String, String)]) -> Location {
    let mut raw = path.to_string();
    for (i, (k, v)) in query.iter().enumerate() {
        raw.push(if i == 0 { '?' } else { '&' });
        raw.push_str(k);
        raw.push('=');
        raw.push_str(v);
    }
    Location::parse(&raw)
}

proptest! {
    /// The URL always wins: navigating to the return path forces callback
    /// mode whatever the facts and the current mode say.
    #[test]
    fn return_path_navigation_forces_callback(
        mode in any_mode(),
        facts in any_facts(),
        query in non_artifact_query(),
    ) {
        let loc = render_location("/auth/callback", &query);
        let t = resolve(mode, &facts, &loc, &SessionEvent::NavigationChanged(loc.clone()), &CTX);
        prop_assert_eq!(t.mode, ViewMode::Callback);
    }

    /// A `code` parameter forces callback mode on any path.
    #[test]
    fn code_param_forces_callback_anywhere(
        mode in any_mode(),
        facts in any_facts(),
        segment in path_segment(),
        code in "[a-zA-Z0-9]{4,24}",
    ) {
        let loc = Location::parse(&format!("/{segment}?code={code}"));
        let t = resolve(mode, &facts, &loc, &SessionEvent::NavigationChanged(loc.clone()), &CTX);
        prop_assert_eq!(t.mode, ViewMode::Callback);
    }

    /// While facts are loading, a facts snapshot never moves the mode and
    /// requests no side effects.
    #[test]
    fn loading_guard_holds_everywhere(
        mode in any_mode(),
        segment in path_segment(),
    ) {
        let facts = SessionFacts::loading();
        let loc = Location::parse(&format!("/{segment}"));
        let t = resolve(mode, &facts, &loc, &SessionEvent::FactsChanged(facts.clone()), &CTX);
        prop_assert_eq!(t.mode, mode);
        prop_assert!(t.effects.is_empty());
    }

    /// Outside callback mode, fully resolved facts decide the mode by role
    /// alone; the location (short of callback markers) is irrelevant.
    #[test]
    fn resolved_facts_decide_by_role(
        mode in any_mode(),
        segment in path_segment(),
        admin in any::<bool>(),
    ) {
        prop_assume!(mode != ViewMode::Callback);
        let role = if admin { Role::Admin } else { Role::User };
        let facts = SessionFacts::signed_in(role, common::user("u-1", "pat@example.com"));
        let loc = Location::parse(&format!("/{segment}"));
        let t = resolve(mode, &facts, &loc, &SessionEvent::FactsChanged(facts.clone()), &CTX);
        prop_assert_eq!(t.mode, ViewMode::for_role(role));
    }

    /// Stripping artifacts removes exactly the OAuth parameters: everything
    /// else survives, and a second strip changes nothing.
    #[test]
    fn strip_is_exact_and_idempotent(
        query in non_artifact_query(),
        code in "[a-zA-Z0-9]{4,16}",
    ) {
        let mut with_code = query.clone();
        with_code.push(("code".to_string(), code));
        let mut loc = render_location("/auth/callback", &with_code);

        prop_assert!(loc.strip_oauth_artifacts());
        prop_assert!(!loc.has_query_param("code"));
        for (k, v) in &query {
            prop_assert_eq!(loc.query_param(k), Some(v.as_str()));
        }
        prop_assert!(!loc.strip_oauth_artifacts());
    }
}
