use std::{
    io::Write,
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use retarget::{
    application::{
        demo::{UserStore, register_demo_targets},
        error::AppError,
        revalidate::RevalidationService,
    },
    config,
    domain::TargetId,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
    targets::TargetRegistry,
    transform::{LoadedModule, ModuleLoader},
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Transform(args) => run_transform(settings, args).await,
        config::Command::Id(args) => run_id(args),
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let registry = Arc::new(TargetRegistry::new());
    let store = Arc::new(UserStore::default());
    let demo = register_demo_targets(&registry, store.clone());
    let revalidation =
        RevalidationService::new(registry.clone()).with_timeout(settings.revalidate.timeout);

    let state = HttpState {
        demo,
        store,
        revalidation,
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        addr = %settings.server.addr,
        targets = registry.len(),
        "listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown({
        let shutdown = shutdown.clone();
        async move { shutdown.notified().await }
    });
    let mut server = std::pin::pin!(server.into_future());

    tokio::select! {
        result = &mut server => {
            return result.map_err(|err| InfraError::server(err.to_string()).into());
        }
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(InfraError::from)?;
            info!("shutdown signal received");
            shutdown.notify_one();
        }
    }

    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(result) => result.map_err(|err| InfraError::server(err.to_string()).into()),
        Err(_) => {
            warn!(
                grace_seconds = settings.server.graceful_shutdown.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
            Ok(())
        }
    }
}

async fn run_transform(
    settings: config::Settings,
    args: config::TransformArgs,
) -> Result<(), AppError> {
    let loader = ModuleLoader::new(settings.transform.runtime_module);
    let mut transformed = 0usize;

    for file in &args.files {
        let module = loader.load_file(&args.root, file).await?;
        if module.transformed {
            transformed += 1;
        }

        match args.out_dir.as_deref() {
            Some(out_dir) => write_module(out_dir, &module).await?,
            None if module.transformed => print_module(&module)?,
            None => info!(module = %module.module_path, "no targets; skipped"),
        }
    }

    info!(
        modules = args.files.len(),
        transformed, "transform complete"
    );
    Ok(())
}

async fn write_module(out_dir: &Path, module: &LoadedModule) -> Result<(), AppError> {
    let Some(source) = module.result.source.as_ref() else {
        return Ok(());
    };

    let destination: PathBuf = out_dir.join(&module.module_path);
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(InfraError::from)?;
    }
    tokio::fs::write(&destination, source)
        .await
        .map_err(InfraError::from)?;

    info!(
        module = %module.module_path,
        destination = %destination.display(),
        transformed = module.transformed,
        "module written"
    );
    Ok(())
}

fn print_module(module: &LoadedModule) -> Result<(), AppError> {
    let Some(source) = module.result.source.as_ref() else {
        return Ok(());
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "// {}", module.module_path).map_err(InfraError::from)?;
    stdout.write_all(source).map_err(InfraError::from)?;
    if !source.ends_with(b"\n") {
        writeln!(stdout).map_err(InfraError::from)?;
    }
    Ok(())
}

fn run_id(args: config::IdArgs) -> Result<(), AppError> {
    if args.module_path.trim().is_empty() || args.name.trim().is_empty() {
        return Err(AppError::validation(
            "module path and export name must not be empty",
        ));
    }

    println!("{}", TargetId::derive(&args.module_path, &args.name));
    Ok(())
}
