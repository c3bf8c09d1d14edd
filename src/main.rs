use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use llmcall::agent::{AgentEvent, Runner, weather_agent};
use llmcall::client::{ChatClient, ChatOutcome};
use llmcall::config::{ClientConfig, ToolServerConfig};
use llmcall::error::Result;
use llmcall::server::{ToolServerState, run_server};
use llmcall::slop::{DEFAULT_TOOL_SERVER_URL, SlopSession, ToolServerClient};
use llmcall::telemetry;
use llmcall::tools::{AddTool, GutenbergSearchTool, ToolRegistry, ToolResolver};
use llmcall::types::{ChatMessage, CompletionRequest};
use llmcall::validate::{Measurement, StructuredOutput, render_system_prompt};

const CONVERTER_QUERY: &str = "
You are a generic conversor of measurements.
You will receive a message with a measurement and you will need to convert it to the desired unit.
";

/// OpenAI-compatible chat completion demos
#[derive(Parser)]
#[command(name = "llmcall", version)]
struct Cli {
    /// Model identifier (defaults to LLMCALL_MODEL or a free DeepSeek model).
    #[arg(long, global = true)]
    model: Option<String>,

    /// API root of the chat completions endpoint.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Whole-request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Connect timeout in seconds.
    #[arg(long, global = true)]
    connect_timeout: Option<u64>,

    /// Log at debug level to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Ask for a unit conversion as JSON and validate it against a schema.
    Validate {
        /// Measurement to convert.
        #[arg(short, long, default_value = "1000 meters to kilometers")]
        input: String,
    },

    /// Serve the `add` tool over HTTP.
    SlopServer {
        /// Port to listen on (defaults to PORT or 3030).
        #[arg(short, long)]
        port: Option<u16>,

        /// Address or hostname to bind (defaults to 0.0.0.0).
        #[arg(long)]
        host: Option<String>,
    },

    /// Answer a question through the SLOP tool server.
    SlopClient {
        /// Question for the model.
        #[arg(short, long, default_value = "What is 2 + 3?")]
        question: String,

        /// Tool server root URL.
        #[arg(long, default_value = DEFAULT_TOOL_SERVER_URL)]
        server_url: String,
    },

    /// Native tool calling with a Project Gutenberg search tool.
    ToolCalling {
        /// Task for the model.
        #[arg(short, long, default_value = "What are the titles of some James Joyce books?")]
        task: String,
    },

    /// Ask the weather agent a question.
    Weather {
        /// Query for the agent.
        #[arg(short, long, default_value = "Weather in London please.")]
        query: String,
    },
}

fn client_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(model) = &cli.model {
        config = config.with_model(model);
    }
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = cli.connect_timeout {
        config = config.with_connect_timeout(Duration::from_secs(secs));
    }
    config
}

fn write_fragment(out: &mut impl Write, fragment: &str) -> std::io::Result<()> {
    out.write_all(fragment.as_bytes())?;
    out.flush()
}

fn print_fragment(fragment: &str) {
    if let Err(e) = write_fragment(&mut std::io::stdout().lock(), fragment) {
        tracing::debug!(target: "llmcall::cli", error = %e, "failed to write fragment to stdout");
    }
}

async fn validate(client: &ChatClient, input: &str) -> Result<()> {
    let output = StructuredOutput::<Measurement>::new(&Measurement::json_schema())?;
    let request = client.request(vec![
        ChatMessage::system(render_system_prompt(CONVERTER_QUERY, output.schema())?),
        ChatMessage::user(input),
    ]);

    let outcome = client.send_with(&request, print_fragment).await;
    println!();
    if let ChatOutcome::Failed(err) = &outcome {
        eprintln!("request failed: {err}");
    }

    match output.validate(&outcome.into_compat().content) {
        Ok(measurement) => {
            println!("Valid JSON output:");
            println!("{measurement:?}");
        }
        Err(err) => println!("Invalid JSON output: {err}"),
    }
    Ok(())
}

async fn slop_client(client: ChatClient, question: &str, server_url: &str) -> Result<()> {
    let server = ToolServerClient::new(server_url);
    let tools = server.list_tools().await?;
    let session = SlopSession::new(client, Arc::new(server), tools);

    let transcript = session.run(question).await?;
    println!("Response 1: {}", transcript.plan.content);
    println!("{}", transcript.executed.to_pretty_json()?);
    println!("Response 2: {}", transcript.answer.content);
    Ok(())
}

async fn tool_calling(client: &ChatClient, task: &str) -> Result<()> {
    let tools = ToolRegistry::builder()
        .register(GutenbergSearchTool::default())
        .build();
    let mut messages = vec![
        ChatMessage::system("You are a helpful assistant."),
        ChatMessage::user(task),
    ];

    let request = CompletionRequest::new(&client.config().model, messages.clone())
        .with_tools(tools.definitions());
    let first = client.complete(&request).await?.message;
    println!("{}", serde_json::to_string_pretty(&first)?);
    if !first.has_tool_calls() {
        return Ok(());
    }

    messages.push(first.clone());
    for call in &first.tool_calls {
        let arguments = serde_json::from_str(&call.function.arguments)?;
        let result = tools.call_tool(&call.function.name, arguments).await?;
        println!("{} -> {}", call.function.name, serde_json::to_string_pretty(&result)?);
        messages.push(ChatMessage::tool_result(&call.id, result.to_string()));
    }

    let request = CompletionRequest::new(&client.config().model, messages)
        .with_tools(tools.definitions());
    let answer = client.complete(&request).await?.message;
    println!("{}", answer.content_text());
    Ok(())
}

async fn weather(client: ChatClient, query: &str) -> Result<()> {
    let agent = weather_agent(&client.config().model);
    println!("Agent '{}' created using model '{}'.", agent.name, agent.model);
    let runner = Runner::new(agent, client);

    println!("\n>>> User Query: {query}");
    let reply = runner.run(query).await?;
    for event in &reply.events {
        match event {
            AgentEvent::ToolCall { name, arguments } => {
                println!("--- Tool: {name} called with {arguments} ---");
            }
            AgentEvent::ToolResult { name, result } => {
                println!("--- Tool: {name} returned {result} ---");
            }
            AgentEvent::FinalResponse { .. } | AgentEvent::Escalated { .. } => {}
        }
    }
    println!("<<< Agent Response: {}", reply.text);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Validate { input } => {
            let client = ChatClient::new(client_config(&cli))?;
            validate(&client, input).await
        }
        Command::SlopServer { port, host } => {
            let mut config = ToolServerConfig::from_env()?;
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(port) = port {
                config = config.with_port(*port);
            }
            let tools = ToolRegistry::builder().register(AddTool).build();
            println!("SLOP API running on port {}", config.port);
            run_server(ToolServerState::new(tools), &config).await
        }
        Command::SlopClient {
            question,
            server_url,
        } => {
            let client = ChatClient::new(client_config(&cli))?;
            slop_client(client, question, server_url).await
        }
        Command::ToolCalling { task } => {
            let client = ChatClient::new(client_config(&cli))?;
            tool_calling(&client, task).await
        }
        Command::Weather { query } => {
            let client = ChatClient::new(client_config(&cli))?;
            weather(client, query).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_init = if cli.verbose {
        telemetry::init_subscriber(telemetry::SubscriberConfig::debug())
    } else {
        telemetry::init_from_env()
    };
    let _guard = match log_init {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
