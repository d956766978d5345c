//! Data access and review-flow logic shared by every Skripts front end.

pub mod api;
pub mod clock;
pub mod error;
pub mod fixture;
pub mod flow;
pub mod http;
pub mod keymap;
pub mod navigator;
pub mod review;

pub use api::{AuthApi, ThreadApi};
pub use clock::{Clock, ManualTimeline, Scheduler, SystemClock, TimerId, TokioScheduler};
pub use error::ClientError;
pub use fixture::{InMemoryThreadApi, LocalAuth};
pub use flow::{working_cards, CardReview, ThreadReview};
pub use http::RemoteDataClient;
pub use keymap::{command_for_key, KeyContext, ReviewCommand, ReviewKey};
pub use navigator::{ChannelNavigator, Navigator, RecordingNavigator};
pub use review::{
    run_mutation, Applied, Completion, Mutation, MutationKind, ReviewController, ReviewExecutor,
    ReviewItem, ReviewStatus, UndoToken, DEFAULT_UNDO_WINDOW,
};
