use serde::Serialize;

/// Slash command understood by the bot, independent of how the transport
/// delivered it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "command", content = "argument", rename_all = "snake_case")]
pub enum ChatCommand {
    Start,
    Help,
    Privacy,
    Faq,
    /// `/law <topic>`; the topic may be empty.
    Law(String),
    Case,
    Language,
    Unknown(String),
}

impl ChatCommand {
    /// `name` is the command without its leading slash; `argument` is the
    /// remaining text with surrounding whitespace removed.
    pub fn from_parts(name: &str, argument: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "privacy" => Self::Privacy,
            "faq" => Self::Faq,
            "law" => Self::Law(argument.trim().to_owned()),
            "case" => Self::Case,
            "language" => Self::Language,
            _ => Self::Unknown(name.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Privacy => "privacy",
            Self::Faq => "faq",
            Self::Law(_) => "law",
            Self::Case => "case",
            Self::Language => "language",
            Self::Unknown(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ChatCommand;

    #[test]
    fn law_keeps_its_topic() {
        assert_eq!(
            ChatCommand::from_parts("law", "  IPC 302 "),
            ChatCommand::Law("IPC 302".to_owned())
        );
        assert_eq!(ChatCommand::from_parts("law", ""), ChatCommand::Law(String::new()));
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(ChatCommand::from_parts("START", ""), ChatCommand::Start);
        assert_eq!(ChatCommand::from_parts("Language", "ignored"), ChatCommand::Language);
    }

    #[test]
    fn unrecognized_names_are_kept() {
        let command = ChatCommand::from_parts("refund", "now");

        assert_eq!(command, ChatCommand::Unknown("refund".to_owned()));
        assert_eq!(command.name(), "refund");
    }
}
