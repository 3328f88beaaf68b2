pub mod lifecycle;
pub mod reconcile;
pub mod sweep;
pub mod timeout;

pub use lifecycle::{
    ConfirmOutcome, CreatedSession, DeclineOutcome, JoinOutcome, LeaveOutcome, confirm,
    create_session, decline, join, leave, terminate,
};
pub use reconcile::{handle_member_removed, handle_voice_join};
pub use sweep::run_expiry_sweep;
pub use timeout::expire_confirmation;
