//! Telegram transport: turns updates into bot events and delivers the replies.

use std::path::Path;
use std::sync::Arc;

use teloxide::{
    dispatching::UpdateHandler,
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile},
    utils::command::BotCommands,
};
use tokio::sync::Mutex;

use crate::bot::{Callback, Command, CourseBot, Event, Inbound, Keyboard, Outbound};

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
pub type SharedBot = Arc<Mutex<CourseBot>>;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum BotCommand {
    #[command(description = "начать и ввести код доступа")]
    Start,
    #[command(description = "список модулей")]
    Modules,
    #[command(description = "мой прогресс")]
    Progress,
    #[command(description = "показать эту справку")]
    Help,
}

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let message_handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<BotCommand>()
                .endpoint(receive_command),
        )
        .branch(dptree::endpoint(receive_text));

    dptree::entry()
        .branch(message_handler)
        .branch(Update::filter_callback_query().endpoint(receive_button))
}

async fn receive_command(
    bot: Bot,
    msg: Message,
    cmd: BotCommand,
    state: SharedBot,
) -> HandlerResult {
    let command = match cmd {
        BotCommand::Start => Command::Start,
        BotCommand::Modules => Command::Modules,
        BotCommand::Progress => Command::Progress,
        BotCommand::Help => {
            bot.send_message(msg.chat.id, BotCommand::descriptions().to_string())
                .await?;
            return Ok(());
        }
    };
    let Some(user) = msg.from() else {
        return Ok(());
    };

    let inbound = Inbound::new(user.id.to_string(), Event::Command(command));
    let replies = state.lock().await.handle(inbound);
    deliver(&bot, msg.chat.id, None, replies).await
}

async fn receive_text(bot: Bot, msg: Message, state: SharedBot) -> HandlerResult {
    let (Some(user), Some(text)) = (msg.from(), msg.text()) else {
        return Ok(());
    };
    if text.starts_with('/') {
        log::debug!("Ignoring unknown command {:?} from user {}", text, user.id);
        return Ok(());
    }

    let inbound = Inbound::new(user.id.to_string(), Event::Text(text.to_string()));
    let replies = state.lock().await.handle(inbound);
    deliver(&bot, msg.chat.id, None, replies).await
}

async fn receive_button(bot: Bot, q: CallbackQuery, state: SharedBot) -> HandlerResult {
    // Stops the loading animation on the client, whatever happens next
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(callback) = q.data.as_deref().and_then(Callback::parse) else {
        log::warn!("Unrecognized button data {:?} from user {}", q.data, q.from.id);
        return Ok(());
    };

    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat.id)
        .unwrap_or_else(|| ChatId::from(q.from.id));
    let inbound = Inbound::new(q.from.id.to_string(), Event::Button(callback));
    let replies = state.lock().await.handle(inbound);
    deliver(&bot, chat_id, q.message.as_ref(), replies).await
}

/// What actually goes to Telegram for one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Delivery {
    Send {
        text: String,
        keyboard: Option<Keyboard>,
    },
    Edit {
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        path: String,
        caption: String,
    },
    Video {
        path: String,
    },
    Document {
        path: String,
    },
    Skip,
}

/// Edits fall back to a new message when there is nothing to edit. A missing
/// image leaves the caption as plain text; missing video and files are dropped.
fn plan_delivery(reply: Outbound, can_edit: bool, exists: impl Fn(&str) -> bool) -> Delivery {
    match reply {
        Outbound::Text { text, keyboard } => Delivery::Send { text, keyboard },
        Outbound::Edit { text, keyboard } if can_edit => Delivery::Edit { text, keyboard },
        Outbound::Edit { text, keyboard } => Delivery::Send { text, keyboard },
        Outbound::Photo { path, caption } if exists(&path) => Delivery::Photo { path, caption },
        Outbound::Photo { caption, .. } => Delivery::Send {
            text: caption,
            keyboard: None,
        },
        Outbound::Video { path } if exists(&path) => Delivery::Video { path },
        Outbound::Document { path } if exists(&path) => Delivery::Document { path },
        Outbound::Video { .. } | Outbound::Document { .. } => Delivery::Skip,
    }
}

async fn deliver(
    bot: &Bot,
    chat_id: ChatId,
    origin: Option<&Message>,
    replies: Vec<Outbound>,
) -> HandlerResult {
    for reply in replies {
        match plan_delivery(reply, origin.is_some(), attachment_exists) {
            Delivery::Send { text, keyboard } => send_text(bot, chat_id, text, keyboard).await?,
            Delivery::Edit { text, keyboard } => {
                let Some(message) = origin else {
                    continue;
                };
                let request = bot.edit_message_text(chat_id, message.id, text);
                match keyboard {
                    Some(keyboard) => request.reply_markup(inline_keyboard(keyboard)).await?,
                    None => request.await?,
                };
            }
            Delivery::Photo { path, caption } => {
                if let Err(e) = bot
                    .send_photo(chat_id, InputFile::file(&path))
                    .caption(caption.clone())
                    .await
                {
                    log::warn!("Failed to send photo {}: {}", path, e);
                    send_text(bot, chat_id, caption, None).await?;
                }
            }
            Delivery::Video { path } => {
                if let Err(e) = bot.send_video(chat_id, InputFile::file(&path)).await {
                    log::warn!("Failed to send video {}: {}", path, e);
                }
            }
            Delivery::Document { path } => {
                if let Err(e) = bot.send_document(chat_id, InputFile::file(&path)).await {
                    log::warn!("Failed to send document {}: {}", path, e);
                }
            }
            Delivery::Skip => {}
        }
    }
    Ok(())
}

async fn send_text(
    bot: &Bot,
    chat_id: ChatId,
    text: String,
    keyboard: Option<Keyboard>,
) -> HandlerResult {
    let request = bot.send_message(chat_id, text);
    match keyboard {
        Some(keyboard) => request.reply_markup(inline_keyboard(keyboard)).await?,
        None => request.await?,
    };
    Ok(())
}

fn attachment_exists(path: &str) -> bool {
    let exists = Path::new(path).is_file();
    if !exists {
        log::warn!("Attachment {} not found, skipping", path);
    }
    exists
}

fn inline_keyboard(keyboard: Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.into_iter().map(|row| {
        row.into_iter()
            .map(|button| InlineKeyboardButton::callback(button.label, button.callback.to_string()))
            .collect::<Vec<_>>()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::Button;

    #[test]
    fn command_names_are_lowercase() {
        assert!(matches!(
            BotCommand::parse("/modules", "course_bot"),
            Ok(BotCommand::Modules)
        ));
        assert!(matches!(
            BotCommand::parse("/progress", "course_bot"),
            Ok(BotCommand::Progress)
        ));
        assert!(BotCommand::parse("1234", "course_bot").is_err());
    }

    #[test]
    fn keyboards_keep_rows_and_callback_data() {
        let markup = inline_keyboard(vec![
            vec![Button::new("Модуль 1", Callback::Module("Модуль 1".into()))],
            vec![Button::new("Модуль 2", Callback::Module("Модуль 2".into()))],
        ]);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0][0].text, "Модуль 1");
    }

    #[test]
    fn missing_attachments_are_detected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lesson.pdf");
        std::fs::write(&file, b"%PDF").unwrap();

        assert!(attachment_exists(file.to_str().unwrap()));
        assert!(!attachment_exists(dir.path().join("nope.pdf").to_str().unwrap()));
        assert!(!attachment_exists(dir.path().to_str().unwrap()));
    }

    fn caption_only(text: &str) -> Delivery {
        Delivery::Send {
            text: text.to_string(),
            keyboard: None,
        }
    }

    #[test]
    fn missing_image_becomes_a_text_message() {
        let photo = Outbound::Photo {
            path: "./files/missing.jpg".into(),
            caption: "Урок: Урок 1\nтекст".into(),
        };

        assert_eq!(
            plan_delivery(photo.clone(), false, |_| false),
            caption_only("Урок: Урок 1\nтекст")
        );
        assert_eq!(
            plan_delivery(photo, false, |_| true),
            Delivery::Photo {
                path: "./files/missing.jpg".into(),
                caption: "Урок: Урок 1\nтекст".into(),
            }
        );
    }

    #[test]
    fn missing_video_and_file_are_skipped() {
        let video = Outbound::Video {
            path: "clip.mp4".into(),
        };
        let document = Outbound::Document {
            path: "notes.pdf".into(),
        };

        assert_eq!(plan_delivery(video.clone(), false, |_| false), Delivery::Skip);
        assert_eq!(plan_delivery(document.clone(), false, |_| false), Delivery::Skip);
        assert_eq!(
            plan_delivery(video, false, |_| true),
            Delivery::Video {
                path: "clip.mp4".into()
            }
        );
        assert_eq!(
            plan_delivery(document, false, |_| true),
            Delivery::Document {
                path: "notes.pdf".into()
            }
        );
    }

    #[test]
    fn edits_need_a_message_to_edit() {
        let edit = Outbound::Edit {
            text: "Для этого урока нет теста.".into(),
            keyboard: None,
        };
        assert_eq!(
            plan_delivery(edit.clone(), true, |_| true),
            Delivery::Edit {
                text: "Для этого урока нет теста.".into(),
                keyboard: None,
            }
        );
        assert_eq!(
            plan_delivery(edit, false, |_| true),
            caption_only("Для этого урока нет теста.")
        );
    }

    #[test]
    fn lesson_with_missing_media_still_arrives() {
        let replies = vec![
            Outbound::Photo {
                path: "a.jpg".into(),
                caption: "Урок: L\nbody".into(),
            },
            Outbound::Video {
                path: "b.mp4".into(),
            },
            Outbound::Document {
                path: "c.pdf".into(),
            },
        ];
        let planned: Vec<_> = replies
            .into_iter()
            .map(|reply| plan_delivery(reply, true, |path| path == "c.pdf"))
            .collect();
        assert_eq!(
            planned,
            vec![
                caption_only("Урок: L\nbody"),
                Delivery::Skip,
                Delivery::Document {
                    path: "c.pdf".into()
                },
            ]
        );
    }
}
