mod event;

pub use event::{EventKind, WebsiteEvent};
