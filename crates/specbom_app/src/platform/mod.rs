mod app;
mod config;
mod effects;
mod logging;
mod ui;

use std::io;

use anyhow::{anyhow, Context};
use bom_logging::bom_info;
use log::LevelFilter;
use specbom_core::{AppState, FileSelection, Msg, QueueView};
use specbom_engine::EngineHandle;
use specbom_proxy::ProxyState;

use crate::cli::{CatalogCommand, Cli, Command, ListTarget};
use app::Session;
use effects::EffectRunner;
use ui::prompt::{AssumeYes, Confirm, StdinConfirm};
use ui::render;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let level = if cli.global.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(cli.global.log, level);
    let settings = config::resolve(&cli.global)?;

    match cli.command {
        Command::Proxy { listen } => run_proxy(&settings, listen.unwrap_or(settings.proxy_listen)),
        command => run_client(settings, command),
    }
}

fn run_client(settings: config::Settings, command: Command) -> anyhow::Result<()> {
    if settings.api_key().is_none() {
        bom_info!(
            "No API key configured; requests go to {} without credentials",
            settings.engine.client.base_url
        );
    }
    let engine = EngineHandle::new(settings.engine.clone())
        .map_err(|err| anyhow!("starting engine: {err}"))?;

    let confirm: Box<dyn Confirm> = match &command {
        Command::Delete { yes: true, .. } => Box::new(AssumeYes),
        _ => Box::new(StdinConfirm),
    };
    let session = Session::new(
        AppState::with_settings(settings.state.clone()),
        EffectRunner::new(engine, confirm),
        Box::new(io::stdout()),
    );

    let plan = plan_for(command);
    let view = session.run(plan.steps, plan.wait_for_jobs);

    let mut output = String::new();
    if let Some(which) = plan.show {
        output.push_str(&render::render_panels(&view, which));
    }
    if plan.show_links {
        for link in &view.download_links {
            output.push_str(&render::download_link_line(link));
            output.push('\n');
        }
    }
    if plan.wait_for_jobs && matches!(view.queue, QueueView::Rows(_)) {
        output.push_str(&render::render_queue(&view.queue));
    }
    print!("{output}");
    Ok(())
}

struct Plan {
    steps: Vec<Vec<Msg>>,
    wait_for_jobs: bool,
    show: Option<ListTarget>,
    show_links: bool,
}

fn plan_for(command: Command) -> Plan {
    let plan = |steps, show| Plan {
        steps,
        wait_for_jobs: false,
        show,
        show_links: false,
    };
    match command {
        Command::Generate { files, no_wait } => {
            let selection = files.into_iter().map(FileSelection::from_path).collect();
            // The first BOM listing must land before any launch so existing
            // BOMs are never mistaken for results.
            Plan {
                steps: vec![
                    vec![Msg::AppStarted],
                    vec![
                        Msg::SpecFilesSelected(selection),
                        Msg::StartGenerationClicked,
                    ],
                ],
                wait_for_jobs: !no_wait,
                show: Some(ListTarget::Boms),
                show_links: false,
            }
        }
        Command::Catalog(CatalogCommand::Add { files }) => {
            let selection = files.into_iter().map(FileSelection::from_path).collect();
            plan(
                vec![vec![Msg::CatalogFilesSelected(selection)]],
                Some(ListTarget::Catalog),
            )
        }
        Command::List { which } => plan(vec![vec![Msg::AppStarted]], Some(which)),
        Command::View { id } => Plan {
            show_links: true,
            ..plan(vec![vec![Msg::ViewRequested { id }]], None)
        },
        Command::Download { id } => plan(vec![vec![Msg::DownloadRequested { id }]], None),
        Command::Delete { id, .. } => plan(vec![vec![Msg::DeleteRequested { id }]], None),
        Command::Proxy { .. } => plan(Vec::new(), None),
    }
}

fn run_proxy(settings: &config::Settings, listen: std::net::SocketAddr) -> anyhow::Result<()> {
    let api_key = settings
        .api_key()
        .context("the relay needs VERTESIA_API_KEY (or --api-key) to forward requests")?;
    let state = ProxyState::new(
        &settings.engine.client.base_url,
        api_key,
        settings.engine.client.request_timeout,
    )?;
    let runtime = tokio::runtime::Runtime::new().context("starting relay runtime")?;
    runtime.block_on(specbom_proxy::serve(
        listen,
        state,
        specbom_proxy::shutdown_signal(),
    ))?;
    Ok(())
}
