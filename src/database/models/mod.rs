pub mod content;
pub mod group;
pub mod snapshot;
pub mod user;

pub use content::{ContentItem, FileDocument, FilePayload, JsonDocument, JsonPayload, Payload};
pub use group::GroupInfo;
pub use snapshot::{NewSnapshot, Snapshot};
pub use user::User;
