//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, UserId};

use crate::decision_token::{Decision, DecisionAction};
use crate::localization::{t_args_lang, t_lang, LocalizationManager};

/// Create the yes/no keyboard for a verification prompt
pub fn create_verification_keyboard(
    user_id: UserId,
    chat_id: ChatId,
    language_code: Option<&str>,
    localization: &LocalizationManager,
) -> InlineKeyboardMarkup {
    let approve = Decision::new(DecisionAction::Approve, user_id, chat_id);
    let decline = Decision::new(DecisionAction::Decline, user_id, chat_id);

    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            t_lang(localization, "button-yes", language_code),
            approve.encode(),
        )],
        vec![InlineKeyboardButton::callback(
            t_lang(localization, "button-no", language_code),
            decline.encode(),
        )],
    ])
}

/// The screening question addressed to `first_name`
pub fn format_verification_question(
    first_name: &str,
    language_code: Option<&str>,
    localization: &LocalizationManager,
) -> String {
    t_args_lang(
        localization,
        "verification-question",
        &[("name", first_name)],
        language_code,
    )
}

/// Append the contact hint to `key`'s text when a contact is configured,
/// otherwise the `fallback_key` text if there is one
fn with_contact(
    localization: &LocalizationManager,
    key: &str,
    contact_key: &str,
    fallback_key: Option<&str>,
    contact: &str,
    language_code: Option<&str>,
) -> String {
    let mut text = t_lang(localization, key, language_code);
    let contact = contact.trim();
    let hint = if contact.is_empty() {
        fallback_key.map(|fallback| t_lang(localization, fallback, language_code))
    } else {
        Some(t_args_lang(
            localization,
            contact_key,
            &[("contact", contact)],
            language_code,
        ))
    };
    if let Some(hint) = hint {
        text.push_str("\n\n");
        text.push_str(&hint);
    }
    text
}

/// Text shown after a successful approval
pub fn format_approved_message(
    contact: &str,
    language_code: Option<&str>,
    localization: &LocalizationManager,
) -> String {
    with_contact(
        localization,
        "approved-welcome",
        "approved-contact",
        None,
        contact,
        language_code,
    )
}

/// Text presenting a freshly created invite link
pub fn format_invite_link_message(
    link: &str,
    ttl_secs: u64,
    language_code: Option<&str>,
    localization: &LocalizationManager,
) -> String {
    let minutes = (ttl_secs / 60).max(1).to_string();
    t_args_lang(
        localization,
        "invite-link-issued",
        &[("link", link), ("minutes", &minutes)],
        language_code,
    )
}

/// Text shown after a decline. It always names somewhere to turn to:
/// the configured contact or the chat administrators.
pub fn format_declined_message(
    contact: &str,
    language_code: Option<&str>,
    localization: &LocalizationManager,
) -> String {
    with_contact(
        localization,
        "declined-notice",
        "declined-contact",
        Some("declined-contact-admins"),
        contact,
        language_code,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn localization() -> LocalizationManager {
        LocalizationManager::with_default_language("en").expect("embedded locales load")
    }

    fn callback_data(button: &InlineKeyboardButton) -> Option<&str> {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_keyboard_carries_both_tokens() {
        let loc = localization();
        let keyboard = create_verification_keyboard(UserId(111), ChatId(-500), None, &loc);

        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert_eq!(
            callback_data(&keyboard.inline_keyboard[0][0]),
            Some("approve_111_-500")
        );
        assert_eq!(
            callback_data(&keyboard.inline_keyboard[1][0]),
            Some("decline_111_-500")
        );
        assert!(keyboard.inline_keyboard[0][0].text.contains("Yes"));
        assert!(keyboard.inline_keyboard[1][0].text.contains("No"));
    }

    #[test]
    fn test_question_mentions_name() {
        let loc = localization();
        let text = format_verification_question("Alice", Some("en-US"), &loc);
        assert!(text.contains("Alice"));
        assert!(text.ends_with('?'));
    }

    #[test]
    fn test_contact_hint_only_when_configured() {
        let loc = localization();
        let without = format_approved_message("", None, &loc);
        let with = format_approved_message("https://instagram.com/someone", None, &loc);

        assert!(!without.contains("https://"));
        assert!(with.starts_with(&without));
        assert!(with.contains("https://instagram.com/someone"));

        let declined = format_declined_message("@helpdesk", None, &loc);
        assert!(declined.contains("@helpdesk"));
    }

    #[test]
    fn test_decline_without_contact_points_to_admins() {
        let loc = localization();
        let notice = t_lang(&loc, "declined-notice", None);

        let declined = format_declined_message("", None, &loc);
        assert!(declined.starts_with(&notice));
        assert!(declined.len() > notice.len());
        assert!(declined.contains("administrators"));

        let declined_ru = format_declined_message("  ", Some("ru"), &loc);
        assert!(declined_ru.contains("администраторами"));
    }

    #[test]
    fn test_invite_link_text() {
        let loc = localization();
        let text = format_invite_link_message("https://t.me/+abc", 3600, None, &loc);
        assert!(text.contains("https://t.me/+abc"));
        assert!(text.contains("60"));
    }
}
