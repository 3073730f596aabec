use std::path::PathBuf;

use serde::Deserialize;

use crate::remote::RemoteClient;
use crate::session::Session;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub server: Option<RemoteClient>,
    pub state_dir: Option<PathBuf>,
    pub session: Session,
}
