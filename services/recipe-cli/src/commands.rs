//! CLI commands

use std::io::BufRead;

use anyhow::{Context, Result, bail};
use auth_client::AuthenticatedClient;
use recipe_api::search::{self, Difficulty, FilterOptions};
use recipe_api::{notifications, orders, profile};
use serde_json::{Value, json};
use tracing::info;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `None` reads the credential from stdin, keeping it out of argv.
    Login { refresh_token: Option<String> },
    Logout,
    Status,
    Get { path: String, query: Vec<(String, String)> },
    Search { filters: FilterOptions, page: u32 },
    Filters,
    Profile,
    Notifications,
    Orders,
}

fn parse_search(args: &[String]) -> Result<Command> {
    let mut filters = FilterOptions::default();
    let mut page = 1;
    let mut terms = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("{flag} needs a value"))
        };
        match arg.as_str() {
            "--vegetarian" => filters.vegetarian = Some(true),
            "--vegan" => filters.vegan = Some(true),
            "--gluten-free" => filters.gluten_free = Some(true),
            "--dairy-free" => filters.dairy_free = Some(true),
            "--healthy" => filters.very_healthy = Some(true),
            "--cheap" => filters.cheap = Some(true),
            "--difficulty" => {
                let level = value(arg.as_str())?.to_ascii_lowercase();
                filters.difficulty = Some(match level.as_str() {
                    "easy" => Difficulty::Easy,
                    "medium" => Difficulty::Medium,
                    "hard" => Difficulty::Hard,
                    other => bail!("difficulty must be easy, medium or hard, got: {other}"),
                });
            }
            "--cuisine" => filters.cuisines.push(value(arg.as_str())?),
            "--diet" => filters.diets.push(value(arg.as_str())?),
            "--order" => filters.ordering = Some(value(arg.as_str())?),
            "--limit" => {
                let limit = value(arg.as_str())?;
                filters.limit = Some(limit.parse().context("--limit must be a number")?);
            }
            "--page" => page = value(arg.as_str())?.parse().context("--page must be a number")?,
            flag if flag.starts_with("--") => bail!("unknown search option: {flag}"),
            term => terms.push(term.to_owned()),
        }
    }
    if page == 0 {
        bail!("--page starts at 1");
    }
    if !terms.is_empty() {
        filters.search = Some(terms.join(" "));
    }
    Ok(Command::Search { filters, page })
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            bail!("missing command, see `recipe --help`");
        };
        let command = match name.as_str() {
            "login" => match rest {
                [] => Command::Login {
                    refresh_token: None,
                },
                [token] if token == "-" => Command::Login {
                    refresh_token: None,
                },
                [token] => Command::Login {
                    refresh_token: Some(token.clone()),
                },
                _ => bail!("usage: recipe login [<refresh_token> | -]"),
            },
            "get" => {
                let Some((path, pairs)) = rest.split_first() else {
                    bail!("usage: recipe get <path> [key=value ...]");
                };
                let query = pairs
                    .iter()
                    .map(|pair| {
                        pair.split_once('=')
                            .map(|(k, v)| (k.to_owned(), v.to_owned()))
                            .with_context(|| format!("query must be key=value, got: {pair}"))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Command::Get {
                    path: path.trim_start_matches('/').to_owned(),
                    query,
                }
            }
            "search" => parse_search(rest)?,
            "filters" => Command::Filters,
            "logout" => Command::Logout,
            "status" => Command::Status,
            "profile" => Command::Profile,
            "notifications" => Command::Notifications,
            "orders" => Command::Orders,
            other => bail!("unknown command: {other}"),
        };

        let takes_args = matches!(
            command,
            Command::Login { .. } | Command::Get { .. } | Command::Search { .. }
        );
        if !takes_args && !rest.is_empty() {
            bail!("{name} takes no arguments");
        }
        Ok(command)
    }
}

/// First non-blank line of `reader`, trimmed.
fn read_token(reader: impl BufRead) -> Result<String> {
    for line in reader.lines() {
        let line = line.context("failed to read refresh token from stdin")?;
        let token = line.trim();
        if !token.is_empty() {
            return Ok(token.to_owned());
        }
    }
    bail!("no refresh token on stdin")
}

/// Run a command and return what to print.
pub async fn execute(client: &AuthenticatedClient, config: &Config, command: Command) -> Result<Value> {
    match command {
        Command::Login { refresh_token } => {
            let refresh_token = match refresh_token {
                Some(token) => token,
                None => read_token(std::io::stdin().lock())?,
            };
            client.login(&refresh_token).await?;
            info!("logged in");
            Ok(json!({ "logged_in": true }))
        }
        Command::Logout => {
            client.logout().await;
            Ok(json!({ "logged_in": false }))
        }
        Command::Status => {
            let pair = client.store().snapshot().await;
            Ok(json!({
                "logged_in": pair.access.is_some(),
                "has_refresh_token": pair.refresh.is_some(),
                "store": client.store().backend_id(),
                "base_url": config.api.base_url,
                "refresh_policy": format!("{:?}", config.api.refresh_policy),
            }))
        }
        Command::Get { path, query } => {
            let query: Vec<(&str, &str)> = query
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            let response = client.get(&path, &query).await?;
            if response.body().is_empty() {
                return Ok(Value::Null);
            }
            Ok(response
                .json::<Value>()
                .unwrap_or_else(|_| Value::String(response.text())))
        }
        Command::Search { filters, page } => {
            Ok(serde_json::to_value(search::search(client, &filters, page).await?)?)
        }
        Command::Filters => Ok(serde_json::to_value(search::filters(client).await?)?),
        Command::Profile => {
            let (user, sections) = tokio::try_join!(
                profile::user_profile(client),
                profile::profile_sections(client),
            )?;
            Ok(json!({ "profile": user, "sections": sections }))
        }
        Command::Notifications => Ok(serde_json::to_value(notifications::list(client).await?)?),
        Command::Orders => Ok(serde_json::to_value(orders::history(client).await?)?),
    }
}
