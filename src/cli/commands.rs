//! Execution of `msess` subcommands against a session file
//!
//! The file plays the part of the session persistence layer: each command
//! loads the container, runs one manager/strategy operation on it, and writes
//! it back if the operation changed anything.

use crate::cli::args::Commands;
use crate::cli::config::{CliConfig, ConfigDiscovery};
use crate::cli::persist::SessionFile;
use crate::session::{
    AuthenticateOptions, Deserializer, RequestContext, Restored, SessionManager, SessionStrategy,
    Serializer,
};
use anyhow::{Context, Result};
use serde_json::{Value, json};
use tracing::info;

/// Runs CLI commands against one session file
pub struct SessionCli {
    file: SessionFile,
    manager: SessionManager<RequestContext, Value>,
    strategy: SessionStrategy<RequestContext, Value>,
}

impl SessionCli {
    pub fn new(config: &CliConfig, file: SessionFile) -> Self {
        // Accounts are stored as given and restored as stored
        let manager = SessionManager::new(
            config.session.clone(),
            Serializer::from_fn(|user: &Value| Ok(user.clone())),
        );
        let strategy = SessionStrategy::new(
            config.session.clone(),
            Deserializer::from_fn(|value: Value| Ok(Some(value))),
        );

        Self {
            file,
            manager,
            strategy,
        }
    }

    pub fn file(&self) -> &SessionFile {
        &self.file
    }

    /// Execute one command and return what it prints
    pub async fn execute(&self, command: &Commands) -> Result<String> {
        match command {
            Commands::Login { id, name, .. } => {
                let info = command
                    .login_info()
                    .context("login command without login details")?;
                let mut user = json!({ "id": id });
                if let Some(name) = name {
                    user["name"] = json!(name);
                }

                let mut ctx = self.load().await?;
                let handle = self.manager.log_in(&mut ctx, &user, &info).await?;
                self.save(&ctx).await?;
                info!("Account {} recorded under session {}", id, handle);
                Ok(format!("{}\n", handle))
            }
            Commands::Logout { select } => {
                let mut ctx = self.load().await?;
                let removed = self.manager.log_out(&mut ctx, select.as_deref())?;
                match select {
                    Some(handle) if removed == 0 => {
                        Ok(format!("No session {} to log out\n", handle))
                    }
                    Some(handle) => {
                        self.save(&ctx).await?;
                        Ok(format!("Logged out {}\n", handle))
                    }
                    None => {
                        self.save(&ctx).await?;
                        Ok(format!("Logged out all {} accounts\n", removed))
                    }
                }
            }
            Commands::Restore { select, multi } => {
                let mut ctx = self.load().await?;
                ctx.selector = select.clone();
                let options = AuthenticateOptions {
                    multi: *multi || self.strategy.config().multi,
                    ..Default::default()
                };
                let restored = self.strategy.authenticate(&mut ctx, &options).await?;
                render_restored(&restored)
            }
            Commands::Switch { handle } => {
                let mut ctx = self.load().await?;
                self.manager.set_default(&mut ctx, handle)?;
                self.save(&ctx).await?;
                Ok(format!("Default account is now {}\n", handle))
            }
            Commands::List => {
                let ctx = self.load().await?;
                let accounts = self.manager.accounts(&ctx)?;
                if accounts.is_empty() {
                    return Ok("No accounts\n".to_string());
                }

                let mut out = String::new();
                for account in accounts {
                    let marker = if account.is_default { "*" } else { " " };
                    let methods: Vec<String> = account
                        .methods
                        .iter()
                        .map(|m| {
                            let method = m.discriminator().unwrap_or("?");
                            match m.timestamp {
                                Some(at) => format!("{}@{}", method, at.to_rfc3339()),
                                None => method.to_string(),
                            }
                        })
                        .collect();
                    out.push_str(&format!(
                        "{} {} {} [{}]\n",
                        marker,
                        account.handle,
                        account.user,
                        methods.join(", ")
                    ));
                }
                Ok(out)
            }
            Commands::ShowConfig => Ok(ConfigDiscovery::discovery_info()),
            Commands::InitConfig => {
                let path = ConfigDiscovery::create_default_user_config()
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
                Ok(format!("Configuration file: {:?}\n", path))
            }
        }
    }

    async fn load(&self) -> Result<RequestContext> {
        Ok(RequestContext::with_session(self.file.load().await?))
    }

    async fn save(&self, ctx: &RequestContext) -> Result<()> {
        match ctx.session.as_ref() {
            Some(container) => self.file.save(container).await,
            None => Ok(()),
        }
    }
}

fn render_restored(restored: &Restored<Value>) -> Result<String> {
    let value = match restored {
        Restored::Anonymous => return Ok("No account restored\n".to_string()),
        Restored::Single { user, info } => json!({ "user": user, "authInfo": info }),
        Restored::Multiple { users, infos } => json!({ "users": users, "authInfo": infos }),
    };
    let mut out = serde_json::to_string_pretty(&value).context("Failed to render result")?;
    out.push('\n');
    Ok(out)
}
