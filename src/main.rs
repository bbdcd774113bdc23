//! Galera Operator CLI
//!
//! Entry points around the Galera core:
//!
//! ```text
//! init          MariaDB → ClusterSpec → 1-galera.cnf (+ 2-bootstrap.cnf)
//! recovery-job  MariaDB + Pod → RecoveryPlan → Job (YAML on stdout)
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use galera_operator::adapters::SystemResolver;
use galera_operator::builder::build_recovery_job;
use galera_operator::galera::{
    self, config, recovery, state::GaleraState, state::GRASTATE_FILE_NAME, ClusterSpec,
    MemberIdentity, RecoveryTarget, VolumeLayout,
};
use galera_operator::statefulset::DEFAULT_CLUSTER_DOMAIN;
use galera_operator::{Error, MariaDB, Result};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Galera Operator - Galera cluster configuration for MariaDB
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the Galera configuration of this member (init container)
    Init(InitArgs),

    /// Print the recovery Job for a member as YAML
    RecoveryJob(TargetArgs),
}

/// Identifies the MariaDB and the member to act on
#[derive(Args, Debug)]
struct TargetArgs {
    /// Name of the MariaDB resource
    #[arg(long, env = "MARIADB_NAME")]
    mariadb_name: String,

    /// Namespace of the MariaDB resource
    #[arg(long, env = "POD_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Name of the member Pod
    #[arg(long, env = "POD_NAME")]
    pod_name: String,

    /// Read the MariaDB from a YAML manifest instead of the API server
    #[arg(long)]
    mariadb_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InitArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Root password, used for SST authentication
    #[arg(long, env = "MARIADB_ROOT_PASSWORD", default_value = "", hide_env_values = true)]
    root_password: String,

    /// Kubernetes cluster domain
    #[arg(long, env = "CLUSTER_DOMAIN", default_value = DEFAULT_CLUSTER_DOMAIN)]
    cluster_domain: String,

    /// Directory receiving the option files
    #[arg(long, default_value = recovery::CONFIG_MOUNT_PATH)]
    config_dir: PathBuf,

    /// MariaDB data directory
    #[arg(long, default_value = recovery::STORAGE_MOUNT_PATH)]
    state_dir: PathBuf,

    /// Seed a new cluster from this member
    #[arg(long, env = "GALERA_BOOTSTRAP")]
    bootstrap: bool,

    /// Print the files instead of writing them
    #[arg(long, env = "DRY_RUN")]
    dry_run: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    let result = match cli.command {
        Command::Init(args) => run_init(args).await,
        Command::RecoveryJob(args) => run_recovery_job(args).await,
    };

    if let Err(e) = &result {
        error!(retryable = e.is_retryable(), "{}", e);
    }
    result
}

// =============================================================================
// Commands
// =============================================================================

async fn run_init(args: InitArgs) -> Result<()> {
    let target = &args.target;
    info!("Initializing Galera member {}", target.pod_name);
    info!("  MariaDB: {}/{}", target.namespace, target.mariadb_name);
    info!("  Config dir: {}", args.config_dir.display());
    info!("  Dry-run mode: {}", args.dry_run);

    let mariadb = load_mariadb(target, None).await?;
    let mut spec = ClusterSpec::from_mariadb(&mariadb, &args.cluster_domain)?;
    spec.bootstrap_requested = args.bootstrap;

    let rendered = galera::render(
        &spec,
        &target.pod_name,
        &args.root_password,
        &SystemResolver::new(),
    )
    .await?;

    let has_state = has_saved_state(&args.state_dir).await?;
    let bootstrap = galera::needs_bootstrap(&spec, &target.pod_name, has_state)?;

    let config_path = args.config_dir.join(config::CONFIG_FILE_NAME);
    let bootstrap_path = args.config_dir.join(config::BOOTSTRAP_FILE_NAME);

    if args.dry_run {
        info!("Dry-run: not writing {}", config_path.display());
        print!("{}", String::from_utf8_lossy(&rendered));
        if bootstrap {
            print!("{}", String::from_utf8_lossy(config::bootstrap_marker()));
        }
        return Ok(());
    }

    tokio::fs::create_dir_all(&args.config_dir).await?;
    tokio::fs::write(&config_path, &rendered).await?;
    info!("Wrote {}", config_path.display());

    if bootstrap {
        tokio::fs::write(&bootstrap_path, config::bootstrap_marker()).await?;
        info!("Wrote {}, member will bootstrap the cluster", bootstrap_path.display());
    } else {
        remove_stale_marker(&bootstrap_path).await?;
    }

    Ok(())
}

async fn run_recovery_job(args: TargetArgs) -> Result<()> {
    let client = kube_client().await?;
    let mariadb = load_mariadb(&args, Some(client.clone())).await?;

    let recovery_spec = mariadb
        .spec
        .galera
        .as_ref()
        .filter(|g| g.enabled)
        .map(|g| g.recovery.clone())
        .ok_or_else(|| Error::Config("Galera is not enabled".to_string()))?;
    if !recovery_spec.enabled {
        return Err(Error::Config(format!(
            "Galera recovery is disabled for {}",
            args.mariadb_name
        )));
    }

    let pods: Api<Pod> = Api::namespaced(client, &args.namespace);
    let pod = pods.get(&args.pod_name).await?;
    let member = MemberIdentity::from_pod(&pod)?;

    let target = RecoveryTarget {
        member: member.clone(),
        pin_to_node: recovery_spec.pin_to_node,
    };
    let plan = recovery::plan(&target, &VolumeLayout::from_mariadb(&mariadb)?)?;
    let job = build_recovery_job(&mariadb, &member, &plan)?;

    print!("{}", serde_yaml::to_string(&job)?);
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

async fn kube_client() -> Result<Client> {
    let client = Client::try_default().await.map_err(|e| {
        error!("Failed to create Kubernetes client: {}", e);
        Error::Internal(format!("Kubernetes client creation failed: {}", e))
    })?;
    debug!("Connected to Kubernetes cluster");
    Ok(client)
}

/// Load the MariaDB from `--mariadb-file` or from the API server
async fn load_mariadb(target: &TargetArgs, client: Option<Client>) -> Result<MariaDB> {
    if let Some(path) = &target.mariadb_file {
        let text = tokio::fs::read_to_string(path).await?;
        let mut mariadb: MariaDB = serde_yaml::from_str(&text)?;
        if mariadb.metadata.namespace.is_none() {
            mariadb.metadata.namespace = Some(target.namespace.clone());
        }
        debug!(file = %path.display(), "Loaded MariaDB manifest");
        return Ok(mariadb);
    }

    let client = match client {
        Some(client) => client,
        None => kube_client().await?,
    };
    let api: Api<MariaDB> = Api::namespaced(client, &target.namespace);
    Ok(api.get(&target.mariadb_name).await?)
}

/// Whether the member has run before, judged by `grastate.dat`
async fn has_saved_state(state_dir: &Path) -> Result<bool> {
    let path = state_dir.join(GRASTATE_FILE_NAME);
    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    match GaleraState::unmarshal(&text) {
        Ok(state) => info!(
            uuid = %state.uuid,
            seqno = state.seqno,
            safe_to_bootstrap = state.safe_to_bootstrap,
            "Found saved Galera state"
        ),
        // Present but unreadable still means the member has history.
        Err(e) => warn!(error = %e, "Unreadable {}", path.display()),
    }
    Ok(true)
}

async fn remove_stale_marker(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!("Removed stale {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(cli: &Cli) {
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "kube=info", "tower=warn"] {
        match directive.parse() {
            Ok(d) => filter = filter.add_directive(d),
            Err(e) => eprintln!("Ignoring log directive {}: {}", directive, e),
        }
    }

    // Logs go to stderr so stdout stays clean for dry runs and YAML output.
    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
