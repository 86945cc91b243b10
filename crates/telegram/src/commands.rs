use legaltune_core::ChatCommand;

/// Parses `/name[@bot] [argument...]`. Returns `None` for anything that is
/// not a command, including text with leading whitespace before the slash.
pub fn parse_command(text: &str) -> Option<ChatCommand> {
    let body = text.strip_prefix('/')?;
    let (head, argument) = match body.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest),
        None => (body, ""),
    };
    let name = head.split_once('@').map_or(head, |(name, _bot)| name);

    Some(ChatCommand::from_parts(name, argument))
}

#[cfg(test)]
mod tests {
    use legaltune_core::ChatCommand;

    use super::parse_command;

    #[test]
    fn parses_bare_and_addressed_commands() {
        assert_eq!(parse_command("/start"), Some(ChatCommand::Start));
        assert_eq!(parse_command("/help@LegalTuneBot"), Some(ChatCommand::Help));
        assert_eq!(
            parse_command("/law@LegalTuneBot   Section 138 NI Act "),
            Some(ChatCommand::Law("Section 138 NI Act".to_owned()))
        );
    }

    #[test]
    fn law_argument_spans_newlines() {
        assert_eq!(
            parse_command("/law\nArticle 21"),
            Some(ChatCommand::Law("Article 21".to_owned()))
        );
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_command("what is /law"), None);
        assert_eq!(parse_command(" /start"), None);
    }

    #[test]
    fn unknown_and_empty_commands_are_reported() {
        assert_eq!(parse_command("/refund now"), Some(ChatCommand::Unknown("refund".to_owned())));
        assert_eq!(parse_command("/"), Some(ChatCommand::Unknown(String::new())));
    }
}
