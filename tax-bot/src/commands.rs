use regex::Regex;

/// Command names, without the prefix.
pub const LOAD_TIME: &str = "calc";
pub const INCOME_TAX: &str = "imposto-de-renda";
pub const CANCEL: &str = "cancelar";

/// A recognized command and its first argument, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `.calc <pixels>`
    LoadTime(Option<&'a str>),
    /// `.imposto-de-renda <annual income>`
    IncomeTax(Option<&'a str>),
    /// `.cancelar`
    Cancel,
}

/// Recognizes commands written as `<prefix><name> [argument ...]`.
///
/// The name must match exactly, so `.calculate` is not `.calc`. Anything
/// after the first argument is ignored.
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefix: String,
    pattern: Regex,
}

impl CommandParser {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"^\s*{}(?P<name>[\w-]+)(?:\s+(?P<arg>\S+))?",
            regex::escape(prefix)
        ))?;
        Ok(Self {
            prefix: prefix.to_string(),
            pattern,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns `None` for plain text and for unknown command names.
    pub fn parse<'a>(
        &self,
        text: &'a str,
    ) -> Option<Command<'a>> {
        let captures = self.pattern.captures(text)?;
        let arg = captures.name("arg").map(|m| m.as_str());

        match captures.name("name")?.as_str() {
            LOAD_TIME => Some(Command::LoadTime(arg)),
            INCOME_TAX => Some(Command::IncomeTax(arg)),
            CANCEL => Some(Command::Cancel),
            _ => None,
        }
    }

    /// `.calc 900`-style example for usage replies.
    pub fn example(
        &self,
        name: &str,
        arg: &str,
    ) -> String {
        format!("`{}{name} {arg}`", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parser() -> CommandParser {
        CommandParser::new(".").unwrap()
    }

    #[test]
    fn parses_command_with_argument() {
        assert_eq!(parser().parse(".calc 900"), Some(Command::LoadTime(Some("900"))));
        assert_eq!(
            parser().parse("  .imposto-de-renda 85000"),
            Some(Command::IncomeTax(Some("85000")))
        );
    }

    #[test]
    fn missing_argument_is_none() {
        assert_eq!(parser().parse(".imposto-de-renda"), Some(Command::IncomeTax(None)));
        assert_eq!(parser().parse(".calc   "), Some(Command::LoadTime(None)));
    }

    #[test]
    fn extra_words_are_ignored() {
        assert_eq!(
            parser().parse(".calc 900 pixels please"),
            Some(Command::LoadTime(Some("900")))
        );
    }

    #[test]
    fn cancel_takes_no_argument() {
        assert_eq!(parser().parse(".cancelar"), Some(Command::Cancel));
    }

    #[test]
    fn plain_text_and_unknown_names_are_not_commands() {
        assert_eq!(parser().parse("85000"), None);
        assert_eq!(parser().parse(".calculate 5"), None);
        assert_eq!(parser().parse(".help"), None);
        assert_eq!(parser().parse("see .calc 5"), None);
    }

    #[test]
    fn prefix_is_matched_literally() {
        let parser = CommandParser::new("$").unwrap();

        assert_eq!(parser.parse("$calc 10"), Some(Command::LoadTime(Some("10"))));
        assert_eq!(parser.parse(".calc 10"), None);
    }

    #[test]
    fn example_uses_configured_prefix() {
        let parser = CommandParser::new("!").unwrap();

        assert_eq!(parser.example(LOAD_TIME, "900"), "`!calc 900`");
    }
}
