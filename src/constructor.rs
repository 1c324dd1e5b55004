use std::sync::Arc;

use teloxide::{
    net::Download,
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Document, Message},
    Bot,
};
use tracing::{info, instrument, warn};

use crate::{
    keyboard::{action_keyboard, import_keyboard, BACK, CLEAR_CUSTOM},
    state::TrainerState,
    trainer::Trainer,
    HandlerResult, UserDialogue,
};

/// Largest question file accepted for import.
const MAX_IMPORT_BYTES: u32 = 1024 * 1024;

pub(crate) const IMPORT_HELP: &str = "Send a JSON file or paste JSON with your questions. \
    Each question needs \"question\", four \"options\", \"correctAnswer\" (0-3), \
    \"category\" and \"difficulty\" (easy, medium or hard).";

pub(crate) async fn start_import(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    trainer: Arc<Trainer>,
) -> HandlerResult {
    let count = trainer.custom_count(msg.chat.id);
    bot.send_message(
        msg.chat.id,
        format!("{}\n\nYou have {} custom questions.", IMPORT_HELP, count),
    )
    .reply_markup(import_keyboard())
    .await?;
    dialogue.update(TrainerState::AwaitImport).await?;
    Ok(())
}

async fn download(bot: &Bot, document: &Document) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let file = bot.get_file(document.file.id.clone()).await?;
    let mut data = Vec::new();
    bot.download_file(&file.path, &mut data).await?;
    Ok(String::from_utf8(data)?)
}

#[instrument(level = "info", skip(bot, dialogue, msg, trainer), fields(chat = msg.chat.id.0))]
pub(crate) async fn receive_import(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    trainer: Arc<Trainer>,
) -> HandlerResult {
    let text = match (msg.text(), msg.document()) {
        (Some(BACK), _) => {
            bot.send_message(msg.chat.id, "Please choose what to do:")
                .reply_markup(action_keyboard())
                .await?;
            dialogue.update(TrainerState::Start).await?;
            return Ok(());
        }
        (Some(CLEAR_CUSTOM), _) => {
            let removed = trainer.clear_custom(msg.chat.id);
            info!(removed, "Custom questions cleared");
            bot.send_message(msg.chat.id, format!("Removed {} custom questions.", removed))
                .await?;
            return Ok(());
        }
        (Some(text), _) => text.to_owned(),
        (None, Some(document)) if document.file.size > MAX_IMPORT_BYTES => {
            bot.send_message(msg.chat.id, "The file is too large.")
                .await?;
            return Ok(());
        }
        (None, Some(document)) => match download(&bot, document).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to download question file");
                bot.send_message(msg.chat.id, "Could not read the file. Is it UTF-8 JSON?")
                    .await?;
                return Ok(());
            }
        },
        (None, None) => {
            bot.send_message(msg.chat.id, IMPORT_HELP).await?;
            return Ok(());
        }
    };

    match trainer.import(msg.chat.id, &text) {
        Ok(count) => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "Imported {} questions. You now have {} custom questions.",
                    count,
                    trainer.custom_count(msg.chat.id)
                ),
            )
            .reply_markup(action_keyboard())
            .await?;
            dialogue.update(TrainerState::Start).await?;
        }
        Err(e) => {
            info!(error = %e, "Rejected question file");
            bot.send_message(msg.chat.id, format!("Nothing was imported: {}", e))
                .await?;
        }
    }

    Ok(())
}
