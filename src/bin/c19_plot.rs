use anyhow::Context;
use c19_plot::plot::{parse_cli, run};
use c19_plot::{logger, C19Error, LocationCatalog};
use log::debug;

fn main() -> anyhow::Result<()> {
    let args = parse_cli();
    logger::init(&args.log).context("could not set up logging")?;
    debug!("arguments: {:?}", args);

    let catalog = LocationCatalog::from_csv(&args.csvin)
        .with_context(|| format!("could not read locations from {}", args.csvin.display()))?;
    let location_id = match catalog.resolve(&args.location) {
        Ok(id) => id.to_string(),
        Err(e @ C19Error::UnknownLocation { .. }) => {
            clap::Error::with_description(&e.to_string(), clap::ErrorKind::InvalidValue).exit()
        }
        Err(e) => return Err(e.into()),
    };

    let charts = run(&args, &location_id)
        .with_context(|| format!("could not plot location {}", args.location))?;
    if args.show {
        for chart in charts.iter() {
            open::that(chart).with_context(|| format!("could not open {}", chart.display()))?;
        }
    }
    log::logger().flush();
    Ok(())
}
