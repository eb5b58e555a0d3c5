//! Authorization URL builder

use loopauth_domain::ProviderConfig;

use super::pkce::PkceParams;

/// Build the URL the user is sent to in order to authorize the client.
///
/// Query parameters, in order: `response_type=code`, `client_id`,
/// `redirect_uri`, `scope`, `code_challenge`, `code_challenge_method=S256`,
/// `state`. Values are percent-encoded (spaces become `%20`). An existing query
/// string on the authorization endpoint is preserved.
#[must_use]
pub fn build_authorization_url(config: &ProviderConfig, pkce: &PkceParams, state: &str) -> String {
    let scope = config.authorization_scope();
    let params = [
        ("response_type", "code"),
        ("client_id", config.client_id()),
        ("redirect_uri", config.redirect_uri()),
        ("scope", scope.as_str()),
        ("code_challenge", pkce.code_challenge()),
        ("code_challenge_method", pkce.challenge_method()),
        ("state", state),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let endpoint = config.authorization_endpoint();
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}{query_string}")
}

#[cfg(test)]
mod tests {
    use loopauth_domain::{RawProviderConfig, ScopeValue};

    use super::*;
    use crate::auth::pkce::{derive_code_challenge, AuthorizationAttempt};

    fn config(scope: &str, refresh_token_scope: Option<&str>) -> ProviderConfig {
        ProviderConfig::from_raw(RawProviderConfig {
            authorization_endpoint: Some("https://p/authorize".to_string()),
            token_endpoint: Some("https://p/token".to_string()),
            client_id: Some("abc".to_string()),
            client_secret: Some("never-in-url".to_string()),
            redirect_uri: Some("http://localhost:4200/cb".to_string()),
            scope: Some(ScopeValue::Joined(scope.to_string())),
            refresh_token_scope: refresh_token_scope.map(str::to_string),
        })
        .unwrap()
    }

    #[test]
    fn url_carries_every_required_parameter() {
        let attempt = AuthorizationAttempt::new();
        let url = build_authorization_url(&config("read", None), attempt.pkce(), attempt.state());

        assert!(url.starts_with("https://p/authorize?response_type=code&client_id=abc&"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A4200%2Fcb"));
        assert!(url.contains("scope=read"));
        assert!(url.contains(&format!("code_challenge={}", attempt.pkce().code_challenge())));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.ends_with(&format!("state={}", attempt.state())));
        assert!(!url.contains("never-in-url"));
        assert!(!url.contains(attempt.pkce().code_verifier()));
    }

    #[test]
    fn state_round_trips_through_url_parsing() {
        let attempt = AuthorizationAttempt::new();
        let url = build_authorization_url(&config("read", None), attempt.pkce(), attempt.state());

        let parsed = url::Url::parse(&url).unwrap();
        let state = parsed.query_pairs().find(|(k, _)| k == "state").map(|(_, v)| v.into_owned());
        assert_eq!(state.as_deref(), Some(attempt.state()));

        let challenge =
            parsed.query_pairs().find(|(k, _)| k == "code_challenge").map(|(_, v)| v.into_owned());
        assert_eq!(challenge, Some(derive_code_challenge(attempt.pkce().code_verifier())));
    }

    #[test]
    fn refresh_token_scope_wins_over_default_scope() {
        let attempt = AuthorizationAttempt::new();
        let url = build_authorization_url(
            &config("read write", Some("IoT offline_access")),
            attempt.pkce(),
            attempt.state(),
        );
        assert!(url.contains("scope=IoT%20offline_access"));
        assert!(!url.contains("scope=read"));
    }

    #[test]
    fn multiple_scopes_are_space_joined() {
        let attempt = AuthorizationAttempt::new();
        let url =
            build_authorization_url(&config("read write", None), attempt.pkce(), attempt.state());
        assert!(url.contains("scope=read%20write"));
    }

    #[test]
    fn existing_query_on_endpoint_is_preserved() {
        let config = ProviderConfig::new(
            "https://p/authorize?tenant=x",
            "https://p/token",
            "abc",
            "http://localhost:4200/cb",
            vec!["read".to_string()],
        )
        .unwrap();
        let attempt = AuthorizationAttempt::new();
        let url = build_authorization_url(&config, attempt.pkce(), attempt.state());
        assert!(url.starts_with("https://p/authorize?tenant=x&response_type=code"));
    }
}
