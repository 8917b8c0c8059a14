pub const TYPING_TEXT: &str = "AI is typing...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bubble {
    Message { sender: Sender, text: String },
    Typing,
}

impl Bubble {
    pub fn user(text: impl Into<String>) -> Self {
        Self::Message {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::Message {
            sender: Sender::Ai,
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Message { text, .. } => text,
            Self::Typing => TYPING_TEXT,
        }
    }

    /// One line of terminal output.
    pub fn render(&self) -> String {
        match self {
            Self::Message {
                sender: Sender::User,
                text,
            } => format!("you> {}", text),
            Self::Message {
                sender: Sender::Ai,
                text,
            } => format!("ai>  {}", text),
            Self::Typing => format!("ai>  {}", TYPING_TEXT),
        }
    }
}

/// The message list of one chat window. Nothing is persisted.
#[derive(Debug, Default)]
pub struct ChatView {
    messages: Vec<Bubble>,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Bubble] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Bubble> {
        self.messages.last()
    }

    pub fn display_message(&mut self, text: impl Into<String>, sender: Sender) {
        self.messages.push(Bubble::Message {
            sender,
            text: text.into(),
        });
    }

    pub fn display_typing_indicator(&mut self) {
        self.messages.push(Bubble::Typing);
    }

    pub fn remove_typing_indicator(&mut self) {
        if let Some(pos) = self.messages.iter().position(|b| *b == Bubble::Typing) {
            self.messages.remove(pos);
        }
    }

    pub fn is_typing(&self) -> bool {
        self.messages.contains(&Bubble::Typing)
    }

    /// Terminal lines for every bubble from index `start` on.
    pub fn render_from(&self, start: usize) -> Vec<String> {
        self.messages
            .get(start..)
            .unwrap_or_default()
            .iter()
            .map(Bubble::render)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_typing_indicator_round_trip() {
        let mut view = ChatView::new();
        view.display_message("Hello", Sender::User);
        view.display_typing_indicator();
        assert!(view.is_typing());
        assert_eq!(view.last(), Some(&Bubble::Typing));

        view.remove_typing_indicator();
        assert!(!view.is_typing());
        assert_eq!(view.messages(), &[Bubble::user("Hello")]);
    }

    #[test]
    fn test_remove_without_indicator_is_noop() {
        let mut view = ChatView::new();
        view.display_message("Hi", Sender::Ai);
        view.remove_typing_indicator();
        assert_eq!(view.messages().len(), 1);
    }

    #[test]
    fn test_render_from_includes_user_bubble_and_placeholder() {
        let mut view = ChatView::new();
        view.display_message("Earlier", Sender::User);
        let start = view.messages().len();

        view.display_message("Hello", Sender::User);
        view.display_typing_indicator();

        assert_eq!(
            view.render_from(start),
            vec!["you> Hello".to_string(), "ai>  AI is typing...".to_string()]
        );
        assert!(view.render_from(10).is_empty());
    }

    #[test]
    fn test_render() {
        assert_eq!(Bubble::user("Hello").render(), "you> Hello");
        assert_eq!(Bubble::ai("Hi there").render(), "ai>  Hi there");
        assert_eq!(Bubble::Typing.render(), "ai>  AI is typing...");
        assert_eq!(Bubble::Typing.text(), TYPING_TEXT);
    }
}
