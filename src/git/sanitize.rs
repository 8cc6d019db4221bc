//! URI credential stripping (spec §4.8, §8 S6): `Repository` identity is the
//! sanitized URI, credentials embedded in the clone URI are used for auth
//! but never persisted.

use url::Url;

/// `sanitize("https://user:pw@host/org/repo.git") == "https://host/org/repo.git"`.
/// Local filesystem paths pass through unchanged (they never carry userinfo).
pub fn sanitize_uri(uri: &str) -> String {
    let Ok(mut parsed) = Url::parse(uri) else {
        return uri.to_owned();
    };
    if parsed.username().is_empty() && parsed.password().is_none() {
        return uri.to_owned();
    }
    let _ = parsed.set_username("");
    let _ = parsed.set_password(None);
    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_userinfo() {
        assert_eq!(
            sanitize_uri("https://user:pw@host/org/repo.git"),
            "https://host/org/repo.git"
        );
    }

    #[test]
    fn leaves_credential_free_uri_untouched() {
        assert_eq!(
            sanitize_uri("https://host/org/repo.git"),
            "https://host/org/repo.git"
        );
    }

    #[test]
    fn leaves_local_paths_untouched() {
        assert_eq!(sanitize_uri("/home/user/repo"), "/home/user/repo");
    }
}
