pub mod messages;
pub use messages::SessionCommand;

pub mod utils;

pub mod game_state;
pub mod partition;
pub mod presenter;
pub mod sampler;
pub mod timer;

pub use game_state::{GameState, RoundPhase, StateContext};
pub use presenter::{ChannelPresenter, Presenter};
