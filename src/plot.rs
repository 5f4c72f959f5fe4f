use super::VERSION;
use crate::error::Result;
use crate::load::{load_deaths, load_hospitalizations, DeathFraming};
use crate::logger::{LogConfig, DEFAULT_LOGFILE};
use crate::render::{plot_deaths, plot_hospitalizations, ImageFormat, RenderOptions};
use crate::DEFAULT_CSV;
use clap::{App, Arg, ArgMatches};
use log::{info, LevelFilter};
use std::path::{Path, PathBuf};

/// One of the charts that can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Deaths(DeathFraming),
    Hospitalizations,
}

impl View {
    /// e.g. new_york_TotalDeaths.svg, global_Hosp.png
    pub fn file_name(self, location: &str, format: ImageFormat) -> String {
        match self {
            View::Deaths(framing) => {
                format!("{}_{}Deaths.{}", location, framing.label(), format.extension())
            }
            View::Hospitalizations => format!("{}_Hosp.{}", location, format.extension()),
        }
    }
}

/// Everything the plotting cli needs for one run
#[derive(Debug, Clone, PartialEq)]
pub struct PlotArgs {
    pub csvin: PathBuf,
    pub location: String,
    pub hosp: bool,
    pub death: bool,
    pub total: bool,
    pub opts: RenderOptions,
    pub outdir: PathBuf,
    pub format: ImageFormat,
    pub show: bool,
    pub log: LogConfig,
}

impl PlotArgs {
    /// hospitalizations first, then deaths (total framing wins over daily)
    pub fn views(&self) -> Vec<View> {
        let mut views = Vec::with_capacity(2);
        if self.hosp {
            views.push(View::Hospitalizations);
        }
        if self.death || self.total {
            let framing = if self.total {
                DeathFraming::Total
            } else {
                DeathFraming::Daily
            };
            views.push(View::Deaths(framing));
        }
        views
    }
}

pub fn cli_app() -> App<'static, 'static> {
    let arg_csvin = Arg::with_name("input_csvfile")
        .help("name of the csv file with the projections")
        .short("f")
        .long("csvfile")
        .takes_value(true)
        .default_value(DEFAULT_CSV);
    let arg_loc = Arg::with_name("location")
        .help("jurisdiction to plot, lowercase with underscores (e.g. new_york)")
        .short("l")
        .long("loc")
        .takes_value(true)
        .default_value("global");
    let arg_tot = Arg::with_name("tot")
        .help("plot total deaths")
        .short("t")
        .long("tot");
    let arg_hosp = Arg::with_name("hosp")
        .help("plot hospitalization data")
        .short("H")
        .long("hosp");
    let arg_death = Arg::with_name("death")
        .help("plot daily death data")
        .short("d")
        .long("death");
    let arg_proj = Arg::with_name("proj")
        .help("plot projection data")
        .short("p")
        .long("proj");
    let arg_log = Arg::with_name("log")
        .help("log scale for the cases and deaths")
        .long("log");
    let arg_outdir = Arg::with_name("outdir")
        .help("directory for the output charts")
        .short("o")
        .long("outdir")
        .takes_value(true)
        .default_value(".");
    let arg_format = Arg::with_name("format")
        .help("image format of the charts")
        .long("format")
        .takes_value(true)
        .possible_values(&["svg", "png"])
        .default_value("svg");
    let arg_show = Arg::with_name("show")
        .help("open the charts with the default viewer")
        .long("show");
    let arg_logfile = Arg::with_name("logfile")
        .help("debug log file")
        .long("logfile")
        .takes_value(true)
        .default_value(DEFAULT_LOGFILE);
    let arg_verbose = Arg::with_name("verbose")
        .help("print debug information")
        .short("v")
        .long("verbose");
    App::new("c19_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Andrew Burton")
        .about("cli app to plot covid deaths and hospitalizations of a jurisdiction")
        .arg(arg_csvin)
        .arg(arg_loc)
        .arg(arg_tot)
        .arg(arg_hosp)
        .arg(arg_death)
        .arg(arg_proj)
        .arg(arg_log)
        .arg(arg_outdir)
        .arg(arg_format)
        .arg(arg_show)
        .arg(arg_logfile)
        .arg(arg_verbose)
}

/// Takes the CLI arguments that control the plotting of the projections.
pub fn parse_cli() -> PlotArgs {
    args_from_matches(&cli_app().get_matches())
}

pub fn args_from_matches(cli_args: &ArgMatches) -> PlotArgs {
    let format = match cli_args.value_of("format") {
        Some("png") => ImageFormat::Png,
        _ => ImageFormat::Svg,
    };
    let console_level = if cli_args.is_present("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    PlotArgs {
        csvin: PathBuf::from(cli_args.value_of("input_csvfile").unwrap_or(DEFAULT_CSV)),
        location: String::from(cli_args.value_of("location").unwrap_or("global")),
        hosp: cli_args.is_present("hosp"),
        death: cli_args.is_present("death"),
        total: cli_args.is_present("tot"),
        opts: RenderOptions {
            projections: cli_args.is_present("proj"),
            log_scale: cli_args.is_present("log"),
        },
        outdir: PathBuf::from(cli_args.value_of("outdir").unwrap_or(".")),
        format,
        show: cli_args.is_present("show"),
        log: LogConfig {
            file: cli_args.value_of("logfile").map(PathBuf::from),
            file_level: LevelFilter::Debug,
            console_level,
        },
    }
}

/// Loads and plots every requested view of the location,
/// returns the paths of the charts in the order they were written.
pub fn run(args: &PlotArgs, location_id: &str) -> Result<Vec<PathBuf>> {
    let views = args.views();
    if views.is_empty() {
        info!("nothing to plot, choose --hosp, --death or --tot");
    }
    let mut charts = Vec::with_capacity(views.len());
    for view in views {
        let fout = args.outdir.join(view.file_name(&args.location, args.format));
        info!(
            "read data from {} and plot {:?} to {}",
            args.csvin.display(),
            view,
            fout.display()
        );
        plot_view(view, &args.csvin, location_id, &args.location, args.opts, &fout)?;
        charts.push(fout);
    }
    Ok(charts)
}

fn plot_view(
    view: View,
    csvin: &Path,
    location_id: &str,
    location: &str,
    opts: RenderOptions,
    fout: &Path,
) -> Result<()> {
    match view {
        View::Deaths(framing) => {
            let table = load_deaths(csvin, location_id, framing)?;
            plot_deaths(table, location, framing, opts, fout)
        }
        View::Hospitalizations => {
            let table = load_hospitalizations(csvin, location_id)?;
            plot_hospitalizations(table, location, opts, fout)
        }
    }
}
