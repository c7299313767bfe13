use crate::domain::WatermarkState;
use crate::errors::BotResult;

#[cfg_attr(test, mockall::automock)]
pub trait WatermarkStore: Send + Sync {
    /// Load the persisted state, falling back to an empty state
    fn load(&self) -> WatermarkState;
    fn save(&self, state: &WatermarkState) -> BotResult<()>;
}
