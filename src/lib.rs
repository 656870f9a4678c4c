//! Kakao OAuth login, opaque session tokens and two-phase registration
//! for the Haru mobile app.

pub mod api;
pub mod auth;
pub mod cli;
pub mod oauth;
pub mod storage;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// User agent sent on outbound HTTP calls, `haru-auth/<version>`.
pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_user_agent() {
        assert!(APP_USER_AGENT.starts_with("haru-auth/"));
        assert_eq!(
            APP_USER_AGENT,
            format!("haru-auth/{}", env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn test_git_commit_hash() {
        // Either a hex hash or the fallback
        assert!(
            GIT_COMMIT_HASH == "unknown"
                || GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit())
        );
    }
}
