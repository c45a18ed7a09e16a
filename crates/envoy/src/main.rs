mod client;
mod config;
mod render;

use anyhow::Result;
use client::ApiClient;
use config::Config;
use plebchat_shared::{ChatMessage, FinishReason, GraphRequest};
use render::Renderer;

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return Err(e);
        }
    };

    let args: Vec<String> = std::env::args().collect();
    let client = ApiClient::new(&config.server_url)?;

    match args.get(1).map(|s| s.as_str()) {
        None | Some("help") | Some("--help") | Some("-h") => print_usage(),
        Some("graphs") => {
            let graphs = match client.list_graphs().await {
                Ok(graphs) => graphs,
                Err(e) => return fail(&client, e),
            };
            for graph in graphs {
                println!("{:<12} {}", graph.id, graph.name);
            }
        }
        Some("config") => {
            if args.len() < 3 {
                println!("Config file: {}", Config::config_path()?.display());
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else if args[2] == "set" && args.len() >= 5 {
                match args[3].as_str() {
                    "server" => {
                        config.server_url = args[4].clone();
                        config.save()?;
                        println!("Server URL updated to: {}", config.server_url);
                    }
                    name => {
                        config.set_valve(name, &args[4]);
                        config.save()?;
                        println!("Valve {} updated", name.to_uppercase());
                    }
                }
            } else {
                print_usage();
            }
        }
        Some(graph_id) => {
            if args.len() < 3 {
                print_usage();
                return Ok(());
            }
            let message = args[2..].join(" ");
            run_turn(&client, &config, graph_id, message).await?;
        }
    }

    Ok(())
}

async fn run_turn(client: &ApiClient, config: &Config, graph_id: &str, message: String) -> Result<()> {
    let request = GraphRequest {
        query: None,
        messages: vec![ChatMessage::user(message)],
        config: config.valves.clone(),
    };

    let mut renderer = Renderer::new(std::io::stdout(), std::io::stderr());
    let mut write_error = None;
    let outcome = client
        .run_graph(graph_id, &request, |frame| {
            if write_error.is_none() {
                write_error = renderer.handle(&frame).err();
            }
        })
        .await;

    if let Err(e) = outcome {
        return fail(client, e);
    }
    if let Some(e) = write_error {
        return Err(e.into());
    }
    match renderer.finish()? {
        Some(FinishReason::Stop) => Ok(()),
        Some(FinishReason::Error) => Err(anyhow::anyhow!("graph `{}` reported an error", graph_id)),
        None => Err(anyhow::anyhow!("stream ended without a terminal frame")),
    }
}

fn fail(client: &ApiClient, e: anyhow::Error) -> Result<()> {
    if let Some(err) = e.downcast_ref::<reqwest::Error>() {
        eprintln!(
            "{}",
            render::connection_failure(client::error_kind(err), &err.to_string(), client.base_url())
        );
    }
    Err(e)
}

fn print_usage() {
    println!("Envoy - pipe client for plebchat");
    println!("\nUsage:");
    println!("  envoy graphs                  List available graphs");
    println!("  envoy <graph> \"message\"       Run one turn on a graph");
    println!("  envoy config                  Show current configuration");
    println!("  envoy config set server URL   Set server URL");
    println!("  envoy config set NAME VALUE   Set a valve sent with every request");
}
