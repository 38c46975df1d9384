use clap::Parser;
use mongo_rewrite::{copy, Connection, RewriteConfig};
use std::path::Path;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[clap(version = env!("CARGO_PKG_VERSION"), author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    /// configuration file path.
    #[clap(short, long, default_value = "rewrite.toml")]
    conf: String,
    /// log file path, if not specified, all log information will be output to stdout.
    #[clap(long)]
    log_path: Option<String>,
    /// override batch size in configuration file.
    #[clap(long)]
    batch_size: Option<usize>,
    /// don't re-create source indexes on target collection.
    #[clap(long)]
    no_reindex: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts: Opts = Opts::parse();
    let collector = tracing_subscriber::fmt();
    let (non_blocking, guard) = match opts.log_path {
        Some(ref path) => {
            let path = Path::new(path);
            let dir_name = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().ok_or("log path should contains a file name")?;
            let file_appender = tracing_appender::rolling::daily(dir_name, file_name);
            tracing_appender::non_blocking(file_appender)
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };
    collector.with_writer(non_blocking).init();

    let mut conf = RewriteConfig::from_path(&opts.conf)?;
    if let Some(batch_size) = opts.batch_size {
        conf.set_batch_size(batch_size);
    }
    if opts.no_reindex {
        conf.set_reindex(false);
    }
    info!("Use the following config to rewrite collection: {:?}", conf);

    let conn = Connection::new(&conf)?;
    if let Err(e) = conn.check_permissions() {
        error!(?e, "Check permission failed. ");
        drop(guard);
        std::process::exit(1);
    }

    let storage = conn.storage();
    let mut pipeline = conf.pipeline()?;
    let res = copy(
        &storage,
        conf.get_source_coll(),
        conf.get_target_coll(),
        &mut pipeline,
        &conf.options(),
    );
    match res {
        Ok(report) => {
            info!(
                inserted = report.inserted,
                batches = report.batches,
                indexes = ?report.indexes,
                "Rewrite collection complete. "
            );
            Ok(())
        }
        Err(e) => {
            error!(%e, ?e, "Rewrite collection failed. ");
            drop(guard);
            std::process::exit(1);
        }
    }
}
