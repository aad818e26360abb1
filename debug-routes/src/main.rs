use anyhow::Result;
use clap::Parser;
use log::info;
use offroad_snapper::{
    decode_collection, encode, export_collection, Config, FileStore, RecordingSurface, RouteStore,
    Session,
};

/// Restore a saved route collection the way the app would on startup, and dump what ends up on the
/// map as GeoJSON.
#[derive(Parser)]
struct Args {
    /// Path to the saved routes JSON (the app's storage contents or an export)
    #[arg(long)]
    input: String,

    /// GeoJSON file to write
    #[arg(long, default_value = "debug.geojson")]
    output: String,

    /// Also write the collection back out in the flat export format, after normalizing it
    #[arg(long)]
    export: Option<String>,
}

fn main() -> Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;
    let args = Args::parse();

    // Corrupt input restores nothing rather than failing, same as the app
    let raw = FileStore::new(&args.input).load_raw()?.unwrap_or_default();
    let routes = match decode_collection(&raw) {
        Ok(routes) => routes,
        Err(err) => {
            log::warn!("{} is unreadable, treating it as empty: {}", args.input, err);
            Vec::new()
        }
    };
    info!("Read {} saved routes from {}", routes.len(), args.input);

    let mut session = Session::new(RecordingSurface::new(), Config::default());
    let report = session.restore_all(&routes);
    info!(
        "{} checkpoints created, {} reused, {} malformed skipped, {} connectors",
        report.materialized, report.reused, report.skipped, report.connectors
    );
    for id in &report.unresolved {
        if let Some(cp) = session.checkpoints().get(*id) {
            info!(
                "Off-road checkpoint at {}, {} has no connector",
                cp.position.lat, cp.position.lng
            );
        }
    }

    std::fs::write(&args.output, session.surface().render_geojson())?;
    info!("Wrote {}", args.output);

    if let Some(path) = args.export {
        let records: Vec<_> = routes.iter().map(|r| encode(&r.to_route())).collect();
        std::fs::write(&path, export_collection(&records)?)?;
        info!("Wrote {}", path);
    }
    Ok(())
}
