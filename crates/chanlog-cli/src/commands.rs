use std::sync::Arc;

use anyhow::Context;
use chanlog_core::{
    ChannelRegistry, CoreError, QueryOptions, QueryResult, SharedSecret, SyncOutcome,
};
use chanlog_refs::{FileHeadStore, HeadStore};
use chanlog_store::FsContentStore;
use chanlog_types::{ContentHash, Identity};
use colored::Colorize;
use serde_json::{json, Value};
use tracing::debug;

use crate::cli::*;
use crate::config::CliConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let session = Session::open(&config, cli.user.as_deref(), cli.password, cli.format).await?;

    match cli.command {
        Command::Put(args) => {
            session.open_channel(&args.channel).await?;
            let payload = session
                .registry
                .put(&args.channel, &session.password, args.key.as_str(), parse_value(&args.value))
                .await?;
            session.print_write("put", &args.channel, payload)
        }
        Command::Add(args) => {
            session.open_channel(&args.channel).await?;
            let payload = session
                .registry
                .add(&args.channel, &session.password, parse_value(&args.value))
                .await?;
            session.print_write("add", &args.channel, payload)
        }
        Command::Del(args) => {
            session.open_channel(&args.channel).await?;
            let payload = session
                .registry
                .del(&args.channel, &session.password, args.key.as_str())
                .await?;
            session.print_write("del", &args.channel, payload)
        }
        Command::Get(args) => {
            session.open_channel(&args.channel).await?;
            let result = session
                .registry
                .query(&args.channel, &session.password, &QueryOptions::key(&args.key))
                .await?;
            session.print_query(&result)
        }
        Command::Query(args) => {
            session.open_channel(&args.channel).await?;
            let result = session
                .registry
                .query(&args.channel, &session.password, &query_options(&args))
                .await?;
            session.print_query(&result)
        }
        Command::Sync(args) => {
            let head = ContentHash::from_hex(&args.head)
                .with_context(|| format!("invalid head hash {:?}", args.head))?;
            session.open_channel(&args.channel).await?;
            let outcome = session.registry.sync(&args.channel, Some(head)).await?;
            session.print_sync(&args.channel, outcome)
        }
        Command::Head(args) => {
            session.open_channel(&args.channel).await?;
            let head = session.persisted_head(&args.channel)?;
            session.print_head(&args.channel, head)
        }
        Command::Drop(args) => {
            session.open_channel(&args.channel).await?;
            let existed = session
                .registry
                .delete_channel(&args.channel, &session.password)
                .await?;
            session.print_drop(&args.channel, existed)
        }
    }
}

/// Interpret a command-line value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub fn query_options(args: &QueryArgs) -> QueryOptions {
    QueryOptions {
        limit: args.limit,
        key: None,
        gt: args.gt.clone(),
        gte: args.gte.clone(),
        lt: args.lt.clone(),
        lte: args.lte.clone(),
        reverse: args.reverse,
    }
}

/// A registry wired to on-disk collaborators for one invocation.
pub struct Session {
    pub registry: ChannelRegistry,
    heads: Option<Arc<FileHeadStore>>,
    identity: Identity,
    password: String,
    format: OutputFormat,
}

impl Session {
    pub async fn open(
        config: &CliConfig,
        user: Option<&str>,
        password: String,
        format: OutputFormat,
    ) -> anyhow::Result<Self> {
        let store = FsContentStore::open(&config.data_dir)
            .await
            .with_context(|| format!("cannot open object store {}", config.data_dir.display()))?;

        let mut registry = ChannelRegistry::new(Arc::new(store)).with_config(config.core.clone())?;
        let heads = config
            .cache_file
            .as_ref()
            .map(|path| Arc::new(FileHeadStore::new(path)));
        if let Some(heads) = &heads {
            registry = registry.with_heads(heads.clone());
        }
        if let Some(secret) = &config.password {
            registry = registry.with_auth(Arc::new(SharedSecret::new().fallback(secret)));
        }

        let identity = match user.or(config.user.as_deref()) {
            Some(name) => Identity::new(name)?,
            None => Identity::anonymous(),
        };
        debug!(user = %identity, data_dir = %config.data_dir.display(), "session opened");

        Ok(Self {
            registry,
            heads,
            identity,
            password,
            format,
        })
    }

    pub async fn open_channel(&self, channel: &str) -> anyhow::Result<()> {
        self.registry
            .use_channel(channel, self.identity.clone())
            .await
            .with_context(|| format!("cannot open channel {channel}"))
    }

    /// The head recorded for `channel`, falling back to this session's
    /// last write when no head file is configured.
    pub fn persisted_head(&self, channel: &str) -> Result<Option<ContentHash>, CoreError> {
        match &self.heads {
            Some(heads) => Ok(heads.get(channel)?),
            None => Ok(self.registry.head(channel)),
        }
    }

    fn print_write(&self, op: &str, channel: &str, payload: ContentHash) -> anyhow::Result<()> {
        let head = self.registry.head(channel);
        match self.format {
            OutputFormat::Json => print_json(&json!({
                "op": op,
                "channel": channel,
                "payload": payload,
                "head": head,
            })),
            OutputFormat::Text => {
                println!(
                    "{} {} {} {}",
                    "✓".green().bold(),
                    op,
                    channel.bold(),
                    payload.short_hex().yellow()
                );
                if let Some(head) = head {
                    println!("  head: {}", head.to_hex().cyan());
                }
                Ok(())
            }
        }
    }

    fn print_query(&self, result: &QueryResult) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            return print_json(result);
        }
        match result {
            _ if result.is_empty() => println!("{}", "(no results)".dimmed()),
            QueryResult::Values(values) => {
                for value in values {
                    println!("{value}");
                }
            }
            QueryResult::Records(records) => {
                for record in records {
                    println!(
                        "{}  {}  {}",
                        record.op.to_string().dimmed(),
                        record.key.bold(),
                        record.value
                    );
                }
            }
        }
        Ok(())
    }

    fn print_sync(&self, channel: &str, outcome: SyncOutcome) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            return print_json(&outcome);
        }
        match outcome {
            SyncOutcome::Merged { added, head } => println!(
                "{} Merged {} entries into {} (head {})",
                "✓".green().bold(),
                added.to_string().bold(),
                channel.bold(),
                head.short_hex().yellow()
            ),
            SyncOutcome::UpToDate => println!("{} {}", channel.bold(), "up to date".green()),
            SyncOutcome::Skipped => println!("{} {}", channel.bold(), "nothing to sync".dimmed()),
        }
        Ok(())
    }

    fn print_head(&self, channel: &str, head: Option<ContentHash>) -> anyhow::Result<()> {
        match (self.format, head) {
            (OutputFormat::Json, head) => print_json(&json!({ "channel": channel, "head": head })),
            (OutputFormat::Text, Some(head)) => {
                println!("{}", head.to_hex());
                Ok(())
            }
            (OutputFormat::Text, None) => {
                println!("{} {}", channel.bold(), "(no head)".dimmed());
                Ok(())
            }
        }
    }

    fn print_drop(&self, channel: &str, existed: bool) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => print_json(&json!({ "channel": channel, "cleared": existed })),
            OutputFormat::Text => {
                if existed {
                    println!("{} Cleared {}", "✓".green().bold(), channel.bold());
                } else {
                    println!("No channel {}", channel.bold());
                }
                Ok(())
            }
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
