use state::TrainerState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue};

pub mod commands;
pub mod config;
pub mod constructor;
pub mod database;
pub mod engine;
pub mod keyboard;
pub mod render;
pub mod reporter;
pub mod runner;
pub mod schema;
pub mod state;
pub mod trainer;

type UserDialogue = Dialogue<TrainerState, InMemStorage<TrainerState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
