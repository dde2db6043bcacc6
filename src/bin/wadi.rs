use chrono::Utc;
use clap::{Parser, Subcommand};
use wadi::io::csv_io::write_channel_final_table;
use wadi::io::grid_io::{write_ascii_grid, AsciiGrid};
use wadi::io::ini_model_io::IniModelIO;
use wadi::simulation::Simulation;

#[derive(Parser)]
#[command(name = "wadi")]
#[command(about = "A command line interface for the wadi watershed hydrodynamics and sediment transport simulator")]
#[command(version = env!("WADI_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    #[command(visible_alias = "sim")]
    Simulate {
        /// Path to the model file (.ini)
        model_file: String,
        /// Prefix for output files (reports, final-state grids)
        #[arg(short, long)]
        output: Option<String>,
        /// Path for the mass balance summary (.json)
        #[arg(short, long)]
        mass_balance: Option<String>,
        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Read and validate a model file without running it
    Check {
        /// Path to the model file (.ini)
        model_file: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            model_file,
            output,
            mass_balance,
            quiet,
        } => {
            let mut sim = match IniModelIO::new().read_model_file(&model_file) {
                Ok(sim) => sim,
                Err(e) => {
                    eprintln!("Error loading model: {}", e);
                    std::process::exit(1);
                }
            };

            if !quiet {
                println!(
                    "wadi {} starting at {}: {} steps of {} s",
                    env!("WADI_VERSION"),
                    Utc::now().to_rfc3339(),
                    sim.n_steps,
                    sim.dt
                );
            }

            let start = std::time::Instant::now();
            let result = sim.run();

            //Flush the mass balance accumulators before acting on any
            //error: a fatal abort must still leave the accounting behind
            if let Err(e) = write_outputs(&sim, &output, &mass_balance) {
                eprintln!("Error writing outputs: {}", e);
            }

            match result {
                Ok(()) => {
                    if !quiet {
                        let summary = sim.summary();
                        println!("Run finished in {:?}", start.elapsed());
                        println!(
                            "Water balance: initial {:.6} m3, final {:.6} m3, residual {:.6} m3",
                            summary.water.initial_volume,
                            summary.water.final_volume,
                            summary.water.residual
                        );
                        println!(
                            "Max Courant number: overland {:.4}, channel {:.4}",
                            summary.max_courant_overland, summary.max_courant_channel
                        );
                    }
                }
                Err(e) => {
                    eprintln!("Simulation aborted: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { model_file } => match IniModelIO::new().read_model_file(&model_file) {
            Ok(sim) => {
                println!(
                    "Model ok: {} x {} cells, {} links, {} solids classes, {} steps",
                    sim.grid.nrows,
                    sim.grid.ncols,
                    sim.network.n_links(),
                    sim.solids.len(),
                    sim.n_steps
                );
            }
            Err(e) => {
                eprintln!("Model check failed: {}", e);
                std::process::exit(1);
            }
        },
    }
}

fn write_outputs(
    sim: &Simulation,
    output: &Option<String>,
    mass_balance: &Option<String>,
) -> Result<(), String> {
    if let Some(path) = mass_balance {
        let summary = sim.summary();
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("could not serialise mass balance: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("could not write '{}': {}", path, e))?;
    }

    if let Some(prefix) = output {
        //Reporting station series
        sim.reporter.write(&format!("{}_reports.csv", prefix))?;

        //Final-state rasters: water depth, snowpack (swe), cumulative
        //net rain volume
        let mut depth = AsciiGrid::new(sim.grid.nrows, sim.grid.ncols, sim.grid.cell_size, -9999.0);
        let mut swe = depth.clone();
        let mut rain_vol = depth.clone();
        for row in 0..sim.grid.nrows {
            for col in 0..sim.grid.ncols {
                if sim.grid.is_active(row, col) {
                    depth.values[row][col] = sim.state.h_ov[row][col];
                    swe.values[row][col] = sim.state.swe_ov[row][col];
                    rain_vol.values[row][col] = sim.state.net_rain_vol[row][col];
                }
            }
        }
        write_ascii_grid(&format!("{}_final_depth.asc", prefix), &depth)?;
        write_ascii_grid(&format!("{}_final_swe.asc", prefix), &swe)?;
        write_ascii_grid(&format!("{}_rain_volume.asc", prefix), &rain_vol)?;

        //Channel final-state table
        if sim.network.n_links() > 0 {
            write_channel_final_table(&format!("{}_channels.csv", prefix), &sim.network, &sim.state)
                .map_err(String::from)?;
        }
    }

    Ok(())
}
