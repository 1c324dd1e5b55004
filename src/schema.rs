use std::{error::Error, sync::Arc};

use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        DpHandlerDescription, UpdateFilterExt, UpdateHandler,
    },
    dptree::{self, Handler},
    payloads::SendMessageSetters,
    prelude::{DependencyMap, Requester},
    types::{Message, Update},
    Bot,
};
use tracing::{info, instrument};

use crate::{
    commands::{self, cancel, help, history, language, leaderboard, start, Command},
    constructor,
    keyboard::{action_keyboard, mode_keyboard, HISTORY, IMPORT, LEADERBOARD, PLAY},
    runner,
    state::TrainerState,
    trainer::Trainer,
    HandlerResult, UserDialogue,
};

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Cancel].endpoint(cancel))
        .branch(case![Command::Leaderboard].endpoint(leaderboard))
        .branch(case![Command::History].endpoint(history))
        .branch(case![Command::Language(tag)].endpoint(language));

    let handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![TrainerState::Start].endpoint(choose_what_to_do))
        .branch(running_scheme())
        .branch(case![TrainerState::AwaitImport].endpoint(constructor::receive_import))
        .endpoint(invalid_state);

    dialogue::enter::<Update, InMemStorage<TrainerState>, TrainerState, _>()
        .branch(handler)
        .branch(callback_query_scheme())
}

#[instrument(level = "info", skip(bot, dialogue, msg, trainer), fields(chat = msg.chat.id.0))]
async fn choose_what_to_do(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    trainer: Arc<Trainer>,
) -> HandlerResult {
    match msg.text() {
        Some(PLAY) => {
            info!("Chooses to play");
            bot.send_message(msg.chat.id, "How many questions?")
                .reply_markup(mode_keyboard())
                .await?;
            dialogue.update(TrainerState::ChooseMode).await?;
        }
        Some(IMPORT) => {
            info!("Chooses to import questions");
            constructor::start_import(bot, dialogue, msg, trainer).await?;
        }
        Some(LEADERBOARD) => commands::show_leaderboard(&bot, msg.chat.id, &trainer).await?,
        Some(HISTORY) => commands::show_history(&bot, msg.chat.id, &trainer).await?,
        _ => {
            bot.send_message(msg.chat.id, "Invalid input. Please try again.")
                .reply_markup(action_keyboard())
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "debug")]
fn running_scheme() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<(dyn Error + Send + Sync + 'static)>>,
    DpHandlerDescription,
> {
    use dptree::case;
    Update::filter_message()
        .branch(case![TrainerState::ChooseMode].endpoint(runner::choose_mode))
        .branch(case![TrainerState::Playing { mode }].endpoint(runner::playing))
}

#[instrument(level = "debug")]
fn callback_query_scheme() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<(dyn Error + Send + Sync + 'static)>>,
    DpHandlerDescription,
> {
    use dptree::case;

    Update::filter_callback_query()
        .branch(case![TrainerState::Playing { mode }].endpoint(runner::take_action))
        .endpoint(runner::stale_button)
}

#[instrument(level = "info", skip(bot, msg), fields(chat = msg.chat.id.0))]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Enter /help to see usages.",
    )
    .await?;
    Ok(())
}
