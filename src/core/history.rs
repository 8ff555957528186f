use crate::models::Message;

/// Number of messages shown when a chat is opened
pub const RECENT_MESSAGES_LIMIT: usize = 10;

/// Newest-first slice of a dialog's messages
///
/// Ties on timestamp fall back to descending id so the order is stable.
pub fn latest_messages<I>(messages: I, limit: usize) -> Vec<Message>
where
    I: IntoIterator<Item = Message>,
{
    let mut messages: Vec<Message> = messages.into_iter().collect();
    messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
    messages.truncate(limit);
    messages
}
