/// Browse-mode commands and their lookup

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All commands understood by `browse`
pub const COMMANDS: &[Command] = &[
  Command {
    name: "next",
    aliases: &["n"],
    usage: "next",
    description: "Go to the next page",
  },
  Command {
    name: "prev",
    aliases: &["p", "previous"],
    usage: "prev",
    description: "Go to the previous page",
  },
  Command {
    name: "page",
    aliases: &["g", "goto"],
    usage: "page <n>",
    description: "Jump to page n",
  },
  Command {
    name: "search",
    aliases: &["/", "s", "filter"],
    usage: "search [text]",
    description: "Filter by text (empty clears the filter)",
  },
  Command {
    name: "limit",
    aliases: &["l"],
    usage: "limit <n>",
    description: "Show n rows per page",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    usage: "refresh",
    description: "Refetch the current page",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "Show this list",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Leave browse mode",
  },
];

/// A parsed browse-mode input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Next,
  Prev,
  Page(u32),
  Search(Option<String>),
  Limit(u32),
  Refresh,
  Help,
  Quit,
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    if cmd.name == input_lower {
      matches.push((cmd, 0));
      continue;
    }

    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Parse one input line. `/text` is shorthand for `search text`.
pub fn parse(line: &str) -> Result<Action, String> {
  let line = line.trim();
  if let Some(text) = line.strip_prefix('/') {
    return Ok(Action::Search(non_empty(text)));
  }

  let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
  let rest = rest.trim();
  if word.is_empty() {
    return Err("empty command, try 'help'".to_string());
  }

  let Some(cmd) = get_suggestions(word).first().copied() else {
    return Err(format!("unknown command '{}', try 'help'", word));
  };

  match cmd.name {
    "next" => Ok(Action::Next),
    "prev" => Ok(Action::Prev),
    "page" => number(rest, cmd).map(Action::Page),
    "search" => Ok(Action::Search(non_empty(rest))),
    "limit" => number(rest, cmd).map(Action::Limit),
    "refresh" => Ok(Action::Refresh),
    "help" => Ok(Action::Help),
    _ => Ok(Action::Quit),
  }
}

fn non_empty(text: &str) -> Option<String> {
  let text = text.trim();
  (!text.is_empty()).then(|| text.to_string())
}

fn number(arg: &str, cmd: &Command) -> Result<u32, String> {
  arg
    .parse()
    .map_err(|_| format!("usage: {}", cmd.usage))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("n");
    assert_eq!(suggestions[0].name, "next");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("ref");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "refresh");
  }

  #[test]
  fn test_parse_navigation() {
    assert_eq!(parse("n"), Ok(Action::Next));
    assert_eq!(parse(" prev "), Ok(Action::Prev));
    assert_eq!(parse("g 4"), Ok(Action::Page(4)));
    assert_eq!(parse("limit 25"), Ok(Action::Limit(25)));
    assert_eq!(parse("q"), Ok(Action::Quit));
  }

  #[test]
  fn test_parse_search() {
    assert_eq!(
      parse("/red shoes"),
      Ok(Action::Search(Some("red shoes".to_string())))
    );
    assert_eq!(parse("search"), Ok(Action::Search(None)));
    assert_eq!(parse("/"), Ok(Action::Search(None)));
  }

  #[test]
  fn test_parse_errors() {
    assert!(parse("").is_err());
    assert!(parse("jump").is_err());
    assert_eq!(parse("page two"), Err("usage: page <n>".to_string()));
  }
}
