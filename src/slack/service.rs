//! Workspace data fetcher
//!
//! Resolves the workspace's name tables once at construction, then fetches
//! channel history, thread replies and bot names on demand. Calls are issued
//! strictly one after another; dependent calls are separated by the
//! configured request interval.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::core::config::FetcherConfig;
use crate::core::models::{
    Message, NameTable, Threads, WorkspaceContext, WorkspaceInfo, is_thread_root, str_field,
};
use crate::errors::SlackError;
use crate::slack::api::{SlackApi, ensure_ok};
use crate::slack::pagination::{PageRequest, fetch_pages};
use crate::utils::{normalize_text, reduce_to_dict, to_slack_ts};

/// Token that skips all network calls and leaves every table empty.
pub const TEST_TOKEN: &str = "TEST";

/// Service layer between the document renderer and the Slack API.
pub struct SlackService {
    api: Arc<dyn SlackApi>,
    config: FetcherConfig,
    context: WorkspaceContext,
    bot_names: NameTable,
    is_test_mode: bool,
}

impl SlackService {
    /// Connects to the workspace and loads its name tables.
    ///
    /// With [`TEST_TOKEN`] no request is made and the tables stay empty.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no token is configured, or the first error
    /// reported by any bootstrap call.
    pub async fn connect(
        api: Arc<dyn SlackApi>,
        config: FetcherConfig,
    ) -> Result<Self, SlackError> {
        let token = config
            .slack_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SlackError::ConfigError("slack_token can not be null".to_string()))?;

        if token == TEST_TOKEN {
            info!("Starting in test mode, no data will be fetched from Slack");
            let context = WorkspaceContext {
                author: "test user".to_string(),
                ..WorkspaceContext::default()
            };
            return Ok(Self {
                api,
                config,
                context,
                bot_names: NameTable::new(),
                is_test_mode: true,
            });
        }

        let context = Self::load_context(api.as_ref(), &config).await?;

        Ok(Self {
            api,
            config,
            context,
            bot_names: NameTable::new(),
            is_test_mode: false,
        })
    }

    /// Builds a service around an already resolved context without touching
    /// the network.
    #[must_use]
    pub fn from_context(
        api: Arc<dyn SlackApi>,
        config: FetcherConfig,
        context: WorkspaceContext,
    ) -> Self {
        Self {
            api,
            config,
            context,
            bot_names: NameTable::new(),
            is_test_mode: false,
        }
    }

    async fn load_context(
        api: &dyn SlackApi,
        config: &FetcherConfig,
    ) -> Result<WorkspaceContext, SlackError> {
        let workspace_info = fetch_workspace_info(api).await?;
        let user_names = fetch_user_names(api, config).await?;
        let channel_names = fetch_channel_names(api, config).await?;
        let usergroup_names = fetch_usergroup_names(api).await?;

        let (author, author_info) = match workspace_info.user_id.as_deref() {
            Some(author_id) => {
                let author = user_names
                    .get(author_id)
                    .cloned()
                    .unwrap_or_else(|| format!("unknown_user_{author_id}"));
                let author_info = fetch_user_info(api, author_id).await?;
                (author, author_info)
            }
            None => ("unknown user".to_string(), Map::new()),
        };

        Ok(WorkspaceContext {
            workspace_info,
            user_names,
            channel_names,
            usergroup_names,
            author,
            author_info,
        })
    }

    #[must_use]
    pub fn context(&self) -> &WorkspaceContext {
        &self.context
    }

    #[must_use]
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    #[must_use]
    pub fn author(&self) -> &str {
        &self.context.author
    }

    #[must_use]
    pub fn author_info(&self) -> &Map<String, Value> {
        &self.context.author_info
    }

    /// Locale of the authenticated user, e.g. `en-US`.
    #[must_use]
    pub fn author_locale(&self) -> Option<&str> {
        self.context.author_info.get("locale").and_then(Value::as_str)
    }

    #[must_use]
    pub fn team(&self) -> Option<&str> {
        self.context.workspace_info.team.as_deref()
    }

    #[must_use]
    pub fn workspace_info(&self) -> &WorkspaceInfo {
        &self.context.workspace_info
    }

    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        self.is_test_mode
    }

    #[must_use]
    pub fn user_names(&self) -> &NameTable {
        &self.context.user_names
    }

    #[must_use]
    pub fn channel_names(&self) -> &NameTable {
        &self.context.channel_names
    }

    #[must_use]
    pub fn usergroup_names(&self) -> &NameTable {
        &self.context.usergroup_names
    }

    /// Every bot name resolved so far in this session.
    #[must_use]
    pub fn bot_names(&self) -> &NameTable {
        &self.bot_names
    }

    /// Re-reads the workspace's user list. The session's table is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if any page of `users.list` fails.
    pub async fn fetch_user_names(&self) -> Result<NameTable, SlackError> {
        fetch_user_names(self.api.as_ref(), &self.config).await
    }

    /// Retrieves up to `max_messages` messages from a channel, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if any page fails; nothing is returned in that case.
    pub async fn fetch_messages_from_channel(
        &self,
        channel_id: &str,
        max_messages: usize,
        oldest: Option<DateTime<Utc>>,
        latest: Option<DateTime<Utc>>,
    ) -> Result<Vec<Message>, SlackError> {
        let request = PageRequest::new(
            "conversations.history",
            json!({
                "channel": channel_id,
                "oldest": to_slack_ts(oldest),
                "latest": to_slack_ts(latest),
            }),
            self.config.page_size,
            "messages",
            max_messages,
        );
        let rows = fetch_pages(self.api.as_ref(), &request, self.config.request_interval).await?;
        let messages = into_messages(rows)?;

        let channel_name = self
            .context
            .channel_names
            .get(channel_id)
            .map_or(channel_id, String::as_str);
        info!(
            "Fetched a total of {} messages from channel {}",
            messages.len(),
            channel_name
        );

        Ok(messages)
    }

    /// Fetches the replies of every thread started in `messages`.
    ///
    /// Only thread roots (`thread_ts == ts`) trigger a fetch.
    ///
    /// # Errors
    ///
    /// Returns the first error from any thread; no threads are returned then.
    pub async fn fetch_threads_from_messages(
        &self,
        channel_id: &str,
        messages: &[Message],
        max_messages: usize,
        oldest: Option<DateTime<Utc>>,
        latest: Option<DateTime<Utc>>,
    ) -> Result<Threads, SlackError> {
        let mut threads = Threads::new();
        let mut thread_num = 0;
        let mut thread_messages_total = 0;

        for msg in messages.iter().filter(|m| is_thread_root(m)) {
            let Some(thread_ts) = str_field(msg, "thread_ts") else {
                continue;
            };
            thread_num += 1;

            let thread_messages = self
                .fetch_messages_from_thread(channel_id, thread_ts, max_messages, oldest, latest)
                .await?;
            thread_messages_total += thread_messages.len();
            threads.insert(thread_ts.to_string(), thread_messages);
        }

        if thread_messages_total > 0 {
            info!(
                "Fetched a total of {} messages from {} threads",
                thread_messages_total, thread_num
            );
        } else {
            info!("This channel has no threads");
        }

        Ok(threads)
    }

    async fn fetch_messages_from_thread(
        &self,
        channel_id: &str,
        thread_ts: &str,
        max_messages: usize,
        oldest: Option<DateTime<Utc>>,
        latest: Option<DateTime<Utc>>,
    ) -> Result<Vec<Message>, SlackError> {
        let request = PageRequest::new(
            "conversations.replies",
            json!({
                "channel": channel_id,
                "ts": thread_ts,
                "oldest": to_slack_ts(oldest),
                "latest": to_slack_ts(latest),
            }),
            self.config.page_size,
            "messages",
            max_messages,
        );

        let rows = fetch_pages(self.api.as_ref(), &request, self.config.request_interval).await?;
        into_messages(rows)
    }

    /// Resolves display names for the bots that posted in `messages` and
    /// `threads`.
    ///
    /// Names given inline via `username` are used as-is. Only bots that never
    /// appear with a username are looked up with `bots.info`, one call per bot.
    /// Bots already named earlier in the session are not looked up again. A
    /// failed lookup leaves that bot unnamed. New names are added to
    /// [`Self::bot_names`], which never overwrites an existing entry; the
    /// returned table holds the session's name for every bot seen here.
    pub async fn fetch_bot_names_for_messages(
        &mut self,
        messages: &[Message],
        threads: &Threads,
    ) -> NameTable {
        let mut thread_keys: Vec<&String> = threads.keys().collect();
        thread_keys.sort();
        let all_messages = messages
            .iter()
            .chain(thread_keys.into_iter().flat_map(|k| threads[k].iter()));

        let mut bot_names = NameTable::new();
        let mut seen_ids: Vec<&str> = Vec::new();
        let mut unnamed: Vec<&str> = Vec::new();
        for msg in all_messages {
            let Some(bot_id) = str_field(msg, "bot_id") else {
                continue;
            };
            seen_ids.push(bot_id);
            match str_field(msg, "username") {
                Some(username) => {
                    bot_names.insert(bot_id.to_string(), normalize_text(username));
                }
                None => unnamed.push(bot_id),
            }
        }

        let mut seen = HashSet::new();
        let pending: Vec<&str> = unnamed
            .into_iter()
            .filter(|id| {
                !bot_names.contains_key(*id)
                    && !self.bot_names.contains_key(*id)
                    && seen.insert(*id)
            })
            .collect();

        if !pending.is_empty() {
            info!("Fetching names for {} bots", pending.len());
            for (i, bot_id) in pending.into_iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(self.config.request_interval).await;
                }
                if let Some(name) = self.fetch_bot_name(bot_id).await {
                    bot_names.insert(bot_id.to_string(), name);
                }
            }
        }

        for (id, name) in bot_names {
            self.bot_names.entry(id).or_insert(name);
        }

        seen_ids
            .into_iter()
            .filter_map(|id| {
                self.bot_names
                    .get(id)
                    .map(|name| (id.to_string(), name.clone()))
            })
            .collect()
    }

    async fn fetch_bot_name(&self, bot_id: &str) -> Option<String> {
        let response = match self.api.call("bots.info", &json!({ "bot": bot_id })).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to fetch bot info for {}: {}", bot_id, e);
                return None;
            }
        };

        if let Err(e) = ensure_ok("bots.info", &response) {
            warn!("Failed to fetch bot info for {}: {}", bot_id, e);
            return None;
        }

        let name = response
            .get("bot")
            .and_then(|b| b.get("name"))
            .and_then(Value::as_str);
        if name.is_none() {
            warn!("bots.info returned no name for {}", bot_id);
        }
        name.map(normalize_text)
    }
}

async fn fetch_workspace_info(api: &dyn SlackApi) -> Result<WorkspaceInfo, SlackError> {
    info!("Fetching workspace info from Slack...");
    let response = api.call("auth.test", &json!({})).await?;
    ensure_ok("auth.test", &response)?;
    Ok(serde_json::from_value(response)?)
}

async fn fetch_user_names(
    api: &dyn SlackApi,
    config: &FetcherConfig,
) -> Result<NameTable, SlackError> {
    info!("Fetching users for workspace...");
    let request = PageRequest::new(
        "users.list",
        json!({}),
        config.page_size,
        "members",
        usize::MAX,
    );
    let members = fetch_pages(api, &request, config.request_interval).await?;
    Ok(normalized(reduce_to_dict(&members, "id", "real_name", Some("name"))))
}

async fn fetch_user_info(
    api: &dyn SlackApi,
    user_id: &str,
) -> Result<Map<String, Value>, SlackError> {
    info!("Fetching user info for author...");
    let response = api
        .call("users.info", &json!({ "user": user_id, "include_locale": 1 }))
        .await?;
    ensure_ok("users.info", &response)?;

    match response.get("user") {
        Some(Value::Object(user)) => Ok(user.clone()),
        _ => Err(SlackError::ParseError(
            "users.info: response has no `user` object".to_string(),
        )),
    }
}

async fn fetch_channel_names(
    api: &dyn SlackApi,
    config: &FetcherConfig,
) -> Result<NameTable, SlackError> {
    info!("Fetching channels for workspace...");
    let request = PageRequest::new(
        "conversations.list",
        json!({ "types": "public_channel,private_channel" }),
        config.page_size,
        "channels",
        usize::MAX,
    );
    let channels = fetch_pages(api, &request, config.request_interval).await?;
    Ok(normalized(reduce_to_dict(&channels, "id", "name", None)))
}

async fn fetch_usergroup_names(api: &dyn SlackApi) -> Result<NameTable, SlackError> {
    info!("Fetching usergroups for workspace...");
    let response = api.call("usergroups.list", &json!({})).await?;
    ensure_ok("usergroups.list", &response)?;

    let usergroups = response
        .get("usergroups")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            SlackError::ParseError("usergroups.list: response has no `usergroups` list".to_string())
        })?;
    Ok(normalized(reduce_to_dict(usergroups, "id", "handle", None)))
}

fn normalized(table: NameTable) -> NameTable {
    table
        .into_iter()
        .map(|(id, name)| (id, normalize_text(&name)))
        .collect()
}

fn into_messages(rows: Vec<Value>) -> Result<Vec<Message>, SlackError> {
    rows.into_iter()
        .map(|row| match row {
            Value::Object(msg) => Ok(msg),
            other => Err(SlackError::ParseError(format!(
                "expected message object, got: {other}"
            ))),
        })
        .collect()
}
