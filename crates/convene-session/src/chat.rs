use chrono::Local;
use convene_common::ChatMessage;

/// Append-only chat history in arrival order.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message stamped with the local wall clock.
    ///
    /// Blank senders and blank text are ignored; text is trimmed.
    pub fn append(&mut self, sender: &str, text: &str) -> Option<&ChatMessage> {
        let sender = sender.trim();
        let text = text.trim();
        if sender.is_empty() || text.is_empty() {
            return None;
        }
        self.messages.push(ChatMessage {
            sender: sender.to_string(),
            text: text.to_string(),
            sent_at: Local::now(),
        });
        self.messages.last()
    }

    pub fn all(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_arrival_order() {
        let mut log = ChatLog::new();
        log.append("You", "first").unwrap();
        log.append("John Doe", "Hello everyone!").unwrap();

        let texts: Vec<_> = log.all().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "Hello everyone!"]);
        assert_eq!(log.all()[1].sender, "John Doe");
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut log = ChatLog::new();
        assert!(log.append("", "text").is_none());
        assert!(log.append("You", "   ").is_none());
        assert!(log.append("You", "").is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn test_text_is_trimmed() {
        let mut log = ChatLog::new();
        let message = log.append("You", "  hi there \n").unwrap();
        assert_eq!(message.text, "hi there");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_timestamps_do_not_go_backwards() {
        let mut log = ChatLog::new();
        log.append("You", "one");
        log.append("You", "two");
        assert!(log.all()[0].sent_at <= log.all()[1].sent_at);
    }
}
