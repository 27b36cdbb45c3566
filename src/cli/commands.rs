use crate::cli::{output, Cli, Commands, OutputFormat};
use crate::config::Config;
use crate::Result;
use fedadmin_server::{Api, ExplainRequest, RequestContext, ScatterExplainEngine};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn handle_command(cli: &Cli, command: Commands) -> Result<()> {
    let config = Config::load(&cli.config)?;
    let api = build_api(&config)?;

    info!(clusters = api.clusters().len(), "clusters loaded");

    let ctx = config.request_context();
    let interrupt = tokio::spawn(cancel_on_interrupt(ctx.clone()));

    let result = execute(&api, &ctx, command, cli.output).await;
    interrupt.abort();

    println!("{}", result?);

    if cli.metrics {
        print!("{}", api.metrics().render()?);
    }

    Ok(())
}

pub fn build_api(config: &Config) -> Result<Api> {
    Ok(Api::new(
        config.build_clusters()?,
        Arc::new(ScatterExplainEngine::new()),
        config.api_options(),
    )?)
}

async fn cancel_on_interrupt(ctx: RequestContext) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Interrupted, cancelling request");
        ctx.cancel();
    }
}

/// Run one command and render its result
pub async fn execute(
    api: &Api,
    ctx: &RequestContext,
    command: Commands,
    format: OutputFormat,
) -> Result<String> {
    match command {
        Commands::Clusters => output::clusters(format, &api.get_clusters()),
        Commands::Gates { filter } => {
            output::gates(format, api.get_gates(ctx, &filter.clusters).await?)
        }
        Commands::Keyspaces { filter } => {
            output::keyspaces(format, api.get_keyspaces(ctx, &filter.clusters).await?)
        }
        Commands::Schemas { filter } => {
            output::schemas(format, api.get_schemas(ctx, &filter.clusters).await?)
        }
        Commands::Tablets { filter } => {
            output::tablets(format, api.get_tablets(ctx, &filter.clusters).await?)
        }
        Commands::Tablet { hostname, filter } => output::tablet(
            format,
            api.get_tablet(ctx, &hostname, &filter.clusters).await?,
        ),
        Commands::Explain {
            cluster,
            keyspace,
            sql,
        } => {
            let plan = api
                .vtexplain(ctx, &ExplainRequest::new(cluster, keyspace, sql))
                .await?;
            output::explain(format, &plan)
        }
    }
}
