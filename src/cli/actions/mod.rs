pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        frontend_url: String,
        access_ttl_secs: u64,
        refresh_ttl_secs: u64,
        kakao_client_id: String,
        kakao_client_secret: SecretString,
        kakao_redirect_uri: String,
        blob_endpoint: String,
        blob_bucket: String,
        blob_public_url: String,
        blob_token: SecretString,
    },
}
