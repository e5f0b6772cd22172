pub mod errors;
pub mod events;
pub mod id;

pub use errors::{AnonpairError, ConfigError, DeliveryError, PersistError, StoreError};
pub use events::{Decision, EventKind, InboundEvent};
pub use id::{new_id, MessageHandle, ParticipantId};

pub type Result<T> = std::result::Result<T, AnonpairError>;
