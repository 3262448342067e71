use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use formpost::{
    AllocationStrategy, FormLayout, IntakeConfig, NotificationOptions, PartialBatchPolicy,
    TargetEntry, TargetTable,
};
use reqwest::Url;

/// Runtime configuration for the `formpost-server` binary.
///
/// Every setting can be given as a flag or through the environment (a `.env`
/// file in the working directory is loaded first). The target table, the
/// spreadsheet id and the form layout describe one deployment; the remaining
/// settings tune the collaborators.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "formpost-server",
    version,
    about = "Turns form submissions into spreadsheet rows and a chat summary"
)]
pub struct CliArgs {
    /// Id of the spreadsheet holding one worksheet per target.
    ///
    /// Environment variable: `SPREADSHEET_ID`
    #[arg(long, env = "SPREADSHEET_ID")]
    pub spreadsheet_id: String,

    /// Target mapping of the form `LABEL=ACCOUNT:WORKSHEET`. Repeat the flag,
    /// or separate entries with `;` in the environment.
    ///
    /// The label is the exact answer text of the target question.
    ///
    /// Environment variable: `TARGETS`
    #[arg(long = "target", env = "TARGETS", value_delimiter = ';', required = true)]
    pub targets: Vec<String>,

    /// Post group layout: `simple`, `detailed`, or a comma separated list of
    /// slot roles (`content`, `media`, `enabled`, `priority`, `continue`,
    /// `ignore`).
    ///
    /// Environment variable: `FORM_LAYOUT`
    #[arg(long, env = "FORM_LAYOUT", default_value_t = String::from("simple"))]
    pub layout: String,

    /// Whether answer position 2 holds the post type. Defaults to what the
    /// layout preset implies.
    ///
    /// Environment variable: `POST_TYPE_SLOT`
    #[arg(long, env = "POST_TYPE_SLOT")]
    pub post_type_slot: Option<bool>,

    /// Continuation answers that end a submission. Replaces the built-in
    /// answers. Separate entries with `;` in the environment.
    ///
    /// Environment variable: `STOP_ANSWERS`
    #[arg(long = "stop-answer", env = "STOP_ANSWERS", value_delimiter = ';')]
    pub stop_answers: Vec<String>,

    /// Post type written when the form does not ask for one.
    ///
    /// Environment variable: `DEFAULT_POST_TYPE`
    #[arg(long, env = "DEFAULT_POST_TYPE")]
    pub default_post_type: Option<String>,

    /// Id allocation strategy: `read-max` re-reads the id column for every
    /// post, `counter` reads once per worksheet.
    ///
    /// Environment variable: `ID_ALLOCATION`
    #[arg(long, env = "ID_ALLOCATION", default_value_t = String::from("read-max"))]
    pub allocation: String,

    /// What to notify when a batch fails midway: `notify-partial` or
    /// `error-only`.
    ///
    /// Environment variable: `PARTIAL_BATCH_POLICY`
    #[arg(long, env = "PARTIAL_BATCH_POLICY", default_value_t = String::from("notify-partial"))]
    pub partial_policy: String,

    /// Incoming webhook for summaries and errors. Notifications are disabled
    /// when unset.
    ///
    /// Environment variable: `SLACK_WEBHOOK_URL`
    #[arg(long, env = "SLACK_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Minutes the scheduled job needs to convert images to video, quoted in
    /// summaries.
    ///
    /// Environment variable: `TRANSCODING_WINDOW_MINUTES`
    #[arg(long, env = "TRANSCODING_WINDOW_MINUTES", default_value_t = 30)]
    pub transcoding_window_minutes: u32,

    /// Base URL of the Sheets API.
    ///
    /// Environment variable: `SHEETS_API_URL`
    #[arg(
        long,
        env = "SHEETS_API_URL",
        default_value_t = String::from("https://sheets.googleapis.com")
    )]
    pub sheets_api_url: String,

    /// OAuth access token sent as a bearer token to the Sheets API.
    ///
    /// Environment variable: `SHEETS_ACCESS_TOKEN`
    #[arg(long, env = "SHEETS_ACCESS_TOKEN", hide_env_values = true)]
    pub sheets_access_token: Option<String>,

    /// Timeout in seconds for each outbound request.
    ///
    /// Environment variable: `REQUEST_TIMEOUT_SECS`
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Address to listen on. The intake endpoint is unauthenticated, so only
    /// bind a public interface behind a proxy that authenticates callers.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("127.0.0.1:8080"))]
    pub server_addr: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub intake: IntakeConfig,
    pub allocation: AllocationStrategy,
    pub webhook_url: Option<Url>,
    pub sheets_api_url: Url,
    pub sheets_access_token: Option<String>,
    pub request_timeout: Duration,
    pub server_addr: String,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.targets.is_empty() {
            bail!("at least one TARGETS entry is required");
        }
        let entries = args
            .targets
            .iter()
            .map(|raw| raw.parse::<TargetEntry>())
            .collect::<Result<Vec<_>, _>>()?;
        let targets = TargetTable::from_entries(entries)?;

        let mut layout = args
            .layout
            .parse::<FormLayout>()
            .with_context(|| format!("invalid FORM_LAYOUT {:?}", args.layout))?;
        if let Some(post_type_slot) = args.post_type_slot {
            layout = layout.with_post_type_slot(post_type_slot);
        }
        if !args.stop_answers.is_empty() {
            layout = layout.with_stop_sentinels(args.stop_answers);
        }
        if let Some(post_type) = args.default_post_type {
            layout.defaults.post_type = post_type;
        }

        let allocation = args
            .allocation
            .parse::<AllocationStrategy>()
            .map_err(anyhow::Error::msg)?;
        let partial_policy = args
            .partial_policy
            .parse::<PartialBatchPolicy>()
            .map_err(anyhow::Error::msg)?;

        if args.request_timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be greater than 0");
        }

        let webhook_url = args
            .webhook_url
            .filter(|url| !url.trim().is_empty())
            .map(|url| Url::parse(&url).context("invalid SLACK_WEBHOOK_URL"))
            .transpose()?;
        let sheets_api_url = Url::parse(&args.sheets_api_url).context("invalid SHEETS_API_URL")?;
        if sheets_api_url.cannot_be_a_base() {
            bail!("SHEETS_API_URL must be an http(s) base URL");
        }

        let intake = IntakeConfig::new(args.spreadsheet_id, targets, layout)
            .with_notification(NotificationOptions {
                transcoding_window_minutes: args.transcoding_window_minutes,
            })
            .with_partial_policy(partial_policy);

        Ok(Self {
            intake,
            allocation,
            webhook_url,
            sheets_api_url,
            sheets_access_token: args.sheets_access_token,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            server_addr: args.server_addr,
        })
    }
}
