/// Command palette entries and autocomplete

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// Route opened by the command; `None` for `quit`
  pub route: Option<&'static str>,
}

pub const COMMANDS: &[Command] = &[
  Command {
    name: "products",
    aliases: &["p", "product", "shop"],
    description: "Browse decoration products",
    route: Some("/products"),
  },
  Command {
    name: "orders",
    aliases: &["o", "order"],
    description: "Your orders",
    route: Some("/orders"),
  },
  Command {
    name: "cart",
    aliases: &["c", "basket"],
    description: "Shopping cart and checkout",
    route: Some("/cart"),
  },
  Command {
    name: "dashboard",
    aliases: &["d", "seller"],
    description: "Seller dashboard",
    route: Some("/seller/dashboard"),
  },
  Command {
    name: "admin",
    aliases: &["a"],
    description: "Admin dashboard",
    route: Some("/admin/dashboard"),
  },
  Command {
    name: "login",
    aliases: &["signin", "verify"],
    description: "Sign-in help and email verification",
    route: Some("/authen/login"),
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit decorhub",
    route: None,
  },
];

/// What a submitted palette line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandTarget {
  Navigate(String),
  Quit,
  Unknown(String),
}

/// Resolve palette input: a raw `/path` navigates as typed, anything else
/// must name a command.
pub fn resolve(input: &str) -> CommandTarget {
  let input = input.trim();
  if input.starts_with('/') {
    return CommandTarget::Navigate(input.to_string());
  }
  let lower = input.to_lowercase();
  match COMMANDS
    .iter()
    .find(|c| c.name == lower || c.aliases.contains(&lower.as_str()))
  {
    Some(Command { route: Some(route), .. }) => CommandTarget::Navigate(route.to_string()),
    Some(Command { route: None, .. }) => CommandTarget::Quit,
    None => CommandTarget::Unknown(input.to_string()),
  }
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }
  if input_lower.starts_with('/') {
    return Vec::new();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_rank(cmd, &input_lower).map(|rank| (cmd, rank)))
    .collect();
  matches.sort_by_key(|(_, rank)| *rank);
  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower ranks sort first: exact name, exact alias, prefixes, then substrings.
fn match_rank(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}
