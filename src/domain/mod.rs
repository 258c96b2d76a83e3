pub mod language;
pub mod announcement;
pub mod translation;
pub mod audio;
pub mod display_board;
pub mod bundle;

pub use language::*;
pub use announcement::*;
pub use translation::*;
pub use audio::*;
pub use display_board::*;
pub use bundle::*;
