use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use remote_document_client::{
    BatchTokens, ConfirmUpload, DocumentClient, DocumentServiceConfig, ExpirationPolicy,
    PostProcessParams, PostProcessingLaunch, PostProcessingType, TokenOutcome, TokenRequest,
    UploadTo, generate_filename,
};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Command line access to the remote document service.
#[derive(Parser)]
#[command(name = "docctl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a local file and print its write token
    Upload {
        file: PathBuf,
        #[arg(long, default_value = "application/octet-stream")]
        mimetype: String,
        /// Confirm right away, storing under this strftime directory pattern
        #[arg(long)]
        confirm_to: Option<String>,
        #[arg(long, value_parser = parse_policy)]
        expiration: Option<ExpirationPolicy>,
    },
    /// Download the content behind a read token
    Download { token: String, output: PathBuf },
    /// Print the metadata behind one or more tokens
    Metadata { tokens: Vec<String> },
    /// Issue a read (or write) token for an upload id
    Token {
        uuid: String,
        #[arg(long)]
        write: bool,
        #[arg(long, value_parser = parse_post_process)]
        post_process: Option<PostProcessingType>,
        #[arg(long)]
        ttl: Option<u64>,
        #[arg(long)]
        modified: bool,
    },
    /// Issue read tokens for several upload ids
    Tokens {
        uuids: Vec<String>,
        #[arg(long, value_parser = parse_post_process)]
        post_process: Option<PostProcessingType>,
        #[arg(long)]
        ttl: Option<u64>,
        #[arg(long)]
        modified: bool,
    },
    /// Confirm a pending upload
    Confirm {
        token: String,
        #[arg(long)]
        upload_to: Option<String>,
        #[arg(long, value_parser = parse_policy)]
        expiration: Option<ExpirationPolicy>,
    },
    /// Duplicate documents
    Duplicate {
        uuids: Vec<String>,
        #[arg(long)]
        with_modified: bool,
    },
    /// Launch post-processing
    PostProcess {
        uuids: Vec<String>,
        #[arg(long = "type", value_parser = parse_post_process, required = true)]
        types: Vec<PostProcessingType>,
        #[arg(long = "async")]
        asynchronous: bool,
        /// Output filename of the merge
        #[arg(long)]
        output_filename: Option<String>,
    },
    /// Poll post-processing progress
    Progress {
        uuid: String,
        #[arg(long, value_parser = parse_post_process)]
        post_process: Option<PostProcessingType>,
    },
    /// Declare documents as deleted
    Delete { uuids: Vec<Uuid> },
    /// Change metadata fields (key=value pairs)
    ChangeMetadata { token: String, fields: Vec<String> },
    /// Print the download URL of a token
    Url { token: String },
}

fn parse_policy(s: &str) -> Result<ExpirationPolicy, String> {
    s.parse()
}

fn parse_post_process(s: &str) -> Result<PostProcessingType, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remote_document_client=info,docctl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = DocumentServiceConfig::from_env()?;
    info!("🔌 Document service at {}", config.base_url);
    let client = DocumentClient::new(config)?;

    let output = run(&client, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(client: &DocumentClient, command: Command) -> anyhow::Result<Value> {
    match command {
        Command::Upload {
            file,
            mimetype,
            confirm_to,
            expiration,
        } => {
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .context("file name is not valid UTF-8")?
                .to_string();

            let token = client.save_raw_content(content, &name, &mimetype).await?;
            let Some(pattern) = confirm_to else {
                return Ok(json!({ "token": token }));
            };

            let path = generate_filename::<()>(None, &name, &UploadTo::pattern(pattern));
            let options = ConfirmUpload::to_path(path.clone())
                .expiring(expiration.unwrap_or_default());
            let uuid = client.confirm_upload(&token, &options).await?;
            Ok(json!({ "uuid": uuid, "upload_to": path }))
        }
        Command::Download { token, output } => {
            let Some(content) = client.get_raw_content(&token).await? else {
                bail!("no content behind this token");
            };
            tokio::fs::write(&output, &content)
                .await
                .with_context(|| format!("cannot write {}", output.display()))?;
            Ok(json!({ "written": content.len(), "path": output }))
        }
        Command::Metadata { tokens } => match tokens.as_slice() {
            [single] => Ok(json!(client.get_metadata(single).await?)),
            _ => Ok(json!(client.get_several_metadata(&tokens).await?)),
        },
        Command::Token {
            uuid,
            write,
            post_process,
            ttl,
            modified,
        } => {
            let request = token_request(write, post_process, ttl, modified);
            Ok(match client.get_token(&uuid, &request).await? {
                TokenOutcome::Token(token) => json!({ "token": token }),
                TokenOutcome::UploadInvalid => json!({ "outcome": "upload_invalid" }),
                TokenOutcome::FileInfected => json!({ "outcome": "file_infected" }),
                TokenOutcome::NotFound => json!({ "outcome": "not_found" }),
            })
        }
        Command::Tokens {
            uuids,
            post_process,
            ttl,
            modified,
        } => {
            let request = token_request(false, post_process, ttl, modified);
            Ok(match client.get_read_tokens(&uuids, &request).await? {
                BatchTokens::Issued(tokens) => json!(tokens),
                BatchTokens::Partial(raw) => json!({ "partial": raw }),
            })
        }
        Command::Confirm {
            token,
            upload_to,
            expiration,
        } => {
            let options = ConfirmUpload {
                upload_to,
                expiration_policy: expiration.unwrap_or_default(),
                ..ConfirmUpload::default()
            };
            Ok(json!({ "uuid": client.confirm_upload(&token, &options).await? }))
        }
        Command::Duplicate {
            uuids,
            with_modified,
        } => Ok(json!(client.duplicate(&uuids, with_modified, None).await?)),
        Command::PostProcess {
            uuids,
            types,
            asynchronous,
            output_filename,
        } => {
            let mut params = PostProcessParams::new();
            if let Some(name) = output_filename {
                params.insert(
                    PostProcessingType::Merge,
                    HashMap::from([("output_filename".to_string(), name)]),
                );
            }
            match client
                .launch_post_processing(&uuids, asynchronous, &types, &params)
                .await?
            {
                PostProcessingLaunch::Completed(result) => Ok(result),
                PostProcessingLaunch::Pending(response) => {
                    Ok(json!({ "accepted": response.status().as_u16() }))
                }
            }
        }
        Command::Progress { uuid, post_process } => {
            let progress = client.get_progress(&uuid, post_process).await?;
            Ok(json!({
                "progress": format!("{:?}", progress),
                "terminal": progress.is_terminal(),
            }))
        }
        Command::Delete { uuids } => {
            client.declare_deleted(&uuids).await;
            Ok(json!({ "declared": uuids.len() }))
        }
        Command::ChangeMetadata { token, fields } => {
            let mut metadata = Map::new();
            for field in fields {
                let (key, value) = field
                    .split_once('=')
                    .with_context(|| format!("expected key=value, got '{}'", field))?;
                metadata.insert(key.to_string(), Value::String(value.to_string()));
            }
            Ok(Value::Object(client.change_metadata(&token, &metadata).await?))
        }
        Command::Url { token } => Ok(json!({ "url": client.file_url(&token) })),
    }
}

fn token_request(
    write: bool,
    post_process: Option<PostProcessingType>,
    ttl: Option<u64>,
    modified: bool,
) -> TokenRequest {
    let mut request = if write {
        TokenRequest::write()
    } else {
        TokenRequest::read()
    };
    request.wanted_post_process = post_process;
    request.custom_ttl = ttl;
    request.for_modified_upload = modified;
    request
}
