//! Banner media shown above the guide menu

use crate::bot::views::{MENU_MEDIA_FAILED, MENU_MEDIA_SAVED};
use chrono::Utc;
use guidebot_core::session::{MenuMediaFlow, SessionStore};
use guidebot_core::storage::{MediaKind, MenuMedia, MenuMediaStore};
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, Message};
use tracing::{error, warn};

/// Photo or video extracted from a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    /// Media kind
    pub kind: MediaKind,
    /// Telegram file id
    pub file_id: String,
    /// Caption of the message, if any
    pub caption: Option<String>,
}

impl MediaUpload {
    /// Largest photo size or the video of `msg`
    #[must_use]
    pub fn from_message(msg: &Message) -> Option<Self> {
        let (kind, file_id) = if let Some(photo) = msg.photo().and_then(<[_]>::last) {
            (MediaKind::Photo, photo.file.id.0.clone())
        } else if let Some(video) = msg.video() {
            (MediaKind::Video, video.file.id.0.clone())
        } else {
            return None;
        };

        Some(Self {
            kind,
            file_id,
            caption: msg.caption().map(ToString::to_string),
        })
    }
}

/// Arm the upload for `initiator_id` in this conversation
pub async fn begin(sessions: &dyn SessionStore, conversation_id: i64, initiator_id: i64) {
    let mut session = sessions.get(conversation_id).await;
    session.menu_media_flow = Some(MenuMediaFlow { initiator_id });
    sessions.set(conversation_id, session).await;
}

/// Store `upload` if `user_id` armed the upload here
///
/// Returns the reply to send, or `None` when no upload is pending for this
/// sender. The pending upload is cleared whether saving succeeds or not.
pub async fn accept_upload(
    sessions: &dyn SessionStore,
    store: &dyn MenuMediaStore,
    conversation_id: i64,
    user_id: i64,
    upload: MediaUpload,
) -> Option<&'static str> {
    let mut session = sessions.get(conversation_id).await;
    if session
        .menu_media_flow
        .as_ref()
        .is_none_or(|flow| flow.initiator_id != user_id)
    {
        return None;
    }

    let media = MenuMedia {
        kind: upload.kind,
        file_id: upload.file_id,
        caption: upload.caption.filter(|c| !c.is_empty()),
        updated_at: Some(Utc::now()),
        updated_by: Some(user_id),
    };
    let reply = match store.save(media).await {
        Ok(()) => MENU_MEDIA_SAVED,
        Err(e) => {
            error!(user_id, error = %e, "Failed to save menu media");
            MENU_MEDIA_FAILED
        }
    };

    session.menu_media_flow = None;
    sessions.set(conversation_id, session).await;
    Some(reply)
}

/// Send the stored banner, if any
///
/// Returns `false` when nothing was sent.
pub async fn send_menu_media(bot: &Bot, chat_id: ChatId, store: &dyn MenuMediaStore) -> bool {
    let media = match store.get().await {
        Ok(Some(media)) => media,
        Ok(None) => return false,
        Err(e) => {
            warn!(error = %e, "Failed to read menu media");
            return false;
        }
    };

    let file = InputFile::file_id(FileId(media.file_id.clone()));
    let sent = match media.kind {
        MediaKind::Photo => {
            let mut req = bot.send_photo(chat_id, file);
            if let Some(caption) = &media.caption {
                req = req.caption(caption.clone());
            }
            req.await.map(|_| ())
        }
        MediaKind::Video => {
            let mut req = bot.send_video(chat_id, file);
            if let Some(caption) = &media.caption {
                req = req.caption(caption.clone());
            }
            req.await.map(|_| ())
        }
    };

    match sent {
        Ok(()) => true,
        Err(e) => {
            warn!(chat_id = %chat_id, error = %e, "Failed to send menu media");
            false
        }
    }
}
