use rand::RngCore;

use app_api::AppContext;

/// Router state: the app context plus the per-run token every API call
/// must present.
#[derive(Clone)]
pub struct HttpState {
    pub context: AppContext,
    pub access_token: String,
}

impl HttpState {
    pub fn new(context: AppContext, access_token: String) -> Self {
        Self {
            context,
            access_token,
        }
    }
}

/// 128 random bits, hex encoded.
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}
