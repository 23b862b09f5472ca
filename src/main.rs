//! ghg-inventory entry point: CLI wiring, table loading and reporting.

use std::process;
use std::time::Instant;

use tracing::info;

use ghg_inventory::cli::{self, DataSource};
use ghg_inventory::config::InventoryConfig;
use ghg_inventory::demo::demo_tables;
use ghg_inventory::io::DataDirectory;
use ghg_inventory::io::export::export_report;
use ghg_inventory::logging::init_tracing;
use ghg_inventory::pipeline::{InventoryTables, estimate_inventory};

fn load_config(opts: &cli::CliOptions) -> InventoryConfig {
    let loaded = if let Some(ref path) = opts.config {
        InventoryConfig::from_toml_file(path)
    } else if let Some(ref name) = opts.preset {
        InventoryConfig::from_preset(name)
    } else {
        Ok(InventoryConfig::baseline())
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    config
}

fn load_tables(data: &DataSource, config: &InventoryConfig) -> InventoryTables {
    match data {
        DataSource::Demo { seed } => {
            info!(seed, "using demo tables");
            demo_tables(*seed)
        }
        DataSource::Dir(dir) => read_dir(DataDirectory::new(dir, config.data.clone(), config.cache.ttl())),
        DataSource::Configured => read_dir(DataDirectory::new(
            &config.data.dir,
            config.data.clone(),
            config.cache.ttl(),
        )),
    }
}

fn read_dir(mut data: DataDirectory) -> InventoryTables {
    data.load_tables(Instant::now()).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    })
}

fn main() {
    init_tracing();

    let opts = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(1);
    });
    if opts.help {
        cli::print_usage();
        return;
    }

    let config = load_config(&opts);
    let tables = load_tables(&opts.data, &config);

    let report = estimate_inventory(&tables, &config).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });
    println!("{report}");

    if let Some(ref dir) = opts.out {
        match export_report(&report, dir) {
            Ok(paths) => info!(dir = %dir.display(), files = paths.len(), "tables written"),
            Err(e) => {
                eprintln!("error: failed to write CSV: {e}");
                process::exit(1);
            }
        }
    }

    if opts.serve {
        #[cfg(feature = "api")]
        {
            use std::net::SocketAddr;
            use std::sync::Arc;

            let state = Arc::new(ghg_inventory::api::AppState { report });
            let addr = SocketAddr::from(([0, 0, 0, 0], opts.port));
            let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
                eprintln!("error: failed to create tokio runtime: {e}");
                process::exit(1);
            });
            rt.block_on(ghg_inventory::api::serve(state, addr));
        }
        #[cfg(not(feature = "api"))]
        tracing::warn!("--serve ignored: built without the `api` feature");
    }
}
