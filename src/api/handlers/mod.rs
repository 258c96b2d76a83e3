pub mod announcements;
pub mod display;
pub mod root;
pub mod ws;
