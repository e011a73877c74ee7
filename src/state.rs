use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::analytics::Analytics;
use crate::assistant::Assistant;

pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub analytics: Arc<Mutex<Analytics>>,
    pub admin_ids: HashSet<u64>,
}

impl AppState {
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
