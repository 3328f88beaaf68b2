pub mod app_state;
pub mod session;
pub mod session_store;
pub mod settings;

pub use app_state::AppState;
pub use session::{MAX_CAPACITY, MIN_CAPACITY, Session, SessionStatus};
pub use session_store::SessionStore;
pub use settings::SettingsStore;
