//! Live push to display boards.

pub mod channel_layer;
pub mod events;
pub mod subscriber;

pub use channel_layer::{ChannelId, ChannelLayer};
pub use events::{announcement_group, ClientMessage, ServerEvent, DISPLAY_BOARDS_GROUP};
pub use subscriber::DisplaySubscriber;
