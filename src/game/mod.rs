//! Game logic: collision resolution, the session state machine, level
//! parsing, particles and scene assembly.

pub mod collision;
pub mod input;
pub mod level;
pub mod particles;
pub mod render;
pub mod session;
pub mod state;

pub use input::InputSnapshot;
pub use level::Level;
pub use session::{GameSession, UiAction};
pub use state::GameState;
