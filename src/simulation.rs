//The simulator.
//
//Owns the grid, channel network, forcing, options and the State Store,
//and advances them through the fixed per-tick pipeline:
//
//  forcings -> overland water route -> channel water route ->
//  floodplain water -> water depth update -> solids processes
//  (deposition, advection, dispersion, erosion; overland then channel)
//  -> floodplain solids -> concentration integrators -> state swap ->
//  layer stack management
//
//Every pass writes only to "new" buffers and reads only "current"
//buffers, so results are independent of traversal order. A fatal
//condition aborts the run with its location; the caller is expected to
//flush the mass-balance accumulators before exiting.

use crate::errors::{ErrorKind, SimulationError};
use crate::forcing::Forcing;
use crate::grid::Grid;
use crate::hydraulics::{
    channel_water_depth, channel_water_route, floodplain_water_transfer, overland_water_depth,
    overland_water_route,
};
use crate::mass_balance::{capture_initial_state, summarize, InitialState, MassBalanceSummary};
use crate::network::ChannelNetwork;
use crate::options::ProcessOptions;
use crate::reporting::Reporter;
use crate::sediment::{
    channel_solids_advection, channel_solids_concentration, channel_solids_deposition,
    channel_solids_dispersion, channel_solids_erosion, channel_transport_capacity,
    floodplain_solids_transfer, overland_solids_advection, overland_solids_concentration,
    overland_solids_deposition, overland_solids_dispersion, overland_solids_erosion,
    overland_transport_capacity,
};
use crate::solids::SolidsClass;
use crate::state::State;

#[derive(Debug)]
pub struct Simulation {
    pub grid: Grid,
    pub network: ChannelNetwork,
    pub state: State,
    pub solids: Vec<SolidsClass>,
    pub options: ProcessOptions,
    pub forcing: Forcing,
    pub reporter: Reporter,

    pub dt: f64,            //time step (s)
    pub n_steps: usize,     //number of ticks to simulate
    pub time: f64,          //current simulation time (s)

    pub initial: InitialState,

    //run-level Courant maxima (the state carries per-tick maxima)
    pub max_courant_ov: f64,
    pub max_courant_ch: f64,
    courant_warned: bool,
}

impl Simulation {
    //Assemble a simulation from its parts. Derives and validates the
    //channel topology, sizes the state store, and installs an empty
    //default layer stack wherever none was configured.
    pub fn new(
        mut grid: Grid,
        mut network: ChannelNetwork,
        solids: Vec<SolidsClass>,
        options: ProcessOptions,
        mut forcing: Forcing,
        reporter: Reporter,
        dt: f64,
        n_steps: usize,
    ) -> Result<Simulation, SimulationError> {
        if dt <= 0.0 {
            return Err(SimulationError::new(
                ErrorKind::ConfigurationError,
                0,
                0,
                0,
                "time step must be positive",
            ));
        }
        options
            .validate()
            .map_err(|e| SimulationError::new(ErrorKind::ConfigurationError, 0, 0, 0, &e))?;
        for solid in solids.iter() {
            solid
                .validate()
                .map_err(|e| SimulationError::new(ErrorKind::ConfigurationError, 0, 0, 0, &e))?;
        }
        grid.validate()
            .map_err(|e| SimulationError::new(ErrorKind::ConfigurationError, 0, 0, 0, &e))?;

        network.derive_topology(&mut grid)?;
        network.validate()?;

        //boundary concentration slots exist for every outlet
        if forcing.cbc.len() < network.outlets.len() {
            forcing.cbc.resize(network.outlets.len(), vec![None; solids.len()]);
        }

        let mut state = State::new(&grid, &network, solids.len());

        //Default stacks: a single empty surface layer that can receive
        //deposited material but holds nothing to erode
        let w = grid.cell_size;
        for row in 0..grid.nrows {
            for col in 0..grid.ncols {
                if grid.is_active(row, col) && state.vlayer_ov[row][col].is_empty() {
                    let achsurf = match grid.channel_at(row, col) {
                        Some((l, j)) => network.links[l].nodes[j].surface_area(),
                        None => 0.0,
                    };
                    let abed = w * w - achsurf;
                    state.set_soil_stack(
                        row,
                        col,
                        vec![0.0],
                        vec![0.4],
                        abed,
                        0.0,
                        1.0e30,
                        vec![vec![0.0]; solids.len()],
                    );
                }
            }
        }
        for l in 0..network.links.len() {
            for j in 0..network.links[l].n_nodes() {
                if state.vlayer_ch[l][j].is_empty() {
                    let abed = network.links[l].nodes[j].bed_area();
                    state.set_sediment_stack(
                        l,
                        j,
                        vec![0.0],
                        vec![0.4],
                        abed,
                        0.0,
                        1.0e30,
                        vec![vec![0.0]; solids.len()],
                    );
                }
            }
        }

        let initial = capture_initial_state(&grid, &network, &state, &solids);

        Ok(Simulation {
            grid,
            network,
            state,
            solids,
            options,
            forcing,
            reporter,
            dt,
            n_steps,
            time: 0.0,
            initial,
            max_courant_ov: -1.0,
            max_courant_ch: -1.0,
            courant_warned: false,
        })
    }

    //Run all timesteps.
    pub fn run(&mut self) -> Result<(), SimulationError> {
        //Recapture the initial state in case the caller adjusted
        //depths or stacks after construction
        self.initial = capture_initial_state(&self.grid, &self.network, &self.state, &self.solids);

        for _ in 0..self.n_steps {
            self.tick()?;
        }
        Ok(())
    }

    //Advance one tick.
    pub fn tick(&mut self) -> Result<(), SimulationError> {
        let dt = self.dt;
        let t = self.time;
        //forcing values and new-state stamps use the end of the step
        let t_new = t + dt;

        //(1) evaluate forcings and paint the rate grids
        self.forcing
            .advance_all(t)
            .map_err(|e| SimulationError::new(ErrorKind::ConfigurationError, 0, 0, 0, &e))?;
        self.paint_forcing_rates();

        let channels_on = self.options.chnopt > 0 && self.network.n_links() > 0;

        //(2) water routing
        overland_water_route(&self.grid, &self.network, &mut self.state, &self.forcing, dt);
        if channels_on {
            channel_water_route(&self.network, &mut self.state, &self.forcing, &self.options, dt);

            //(3) floodplain water transfer
            floodplain_water_transfer(&self.grid, &self.network, &mut self.state, &self.options, dt);
        }

        //(4) water depth integration
        overland_water_depth(
            &self.grid,
            &self.network,
            &mut self.state,
            &self.forcing,
            &self.options,
            dt,
            t_new,
        )?;
        if channels_on {
            channel_water_depth(
                &self.grid,
                &self.network,
                &mut self.state,
                &self.forcing,
                &self.options,
                dt,
                t_new,
            )?;
        }

        //(5) solids process fluxes
        self.state.reset_solids_fluxes();

        if self.options.depovopt > 0 {
            overland_solids_deposition(
                &self.grid,
                &self.network,
                &mut self.state,
                &self.solids,
                &self.options,
                dt,
            );
        }
        if self.options.advovopt > 0 {
            overland_solids_advection(
                &self.grid,
                &self.network,
                &mut self.state,
                &self.forcing,
                &self.options,
            );
        }
        if self.options.dspovopt > 0 {
            overland_solids_dispersion(&self.grid, &mut self.state, &self.options);
        }
        if self.options.ersovopt > 0 {
            if self.options.ersovopt == 1 {
                overland_transport_capacity(&self.grid, &mut self.state, &self.solids);
            }
            overland_solids_erosion(
                &self.grid,
                &self.network,
                &mut self.state,
                &self.solids,
                &self.options,
                dt,
                t_new,
            );
        }

        if channels_on {
            if self.options.depchopt > 0 {
                channel_solids_deposition(&self.network, &mut self.state, &self.solids, &self.options, dt);
            }
            if self.options.advchopt > 0 {
                channel_solids_advection(&self.network, &mut self.state, &self.forcing, &self.options);
            }
            if self.options.dspchopt > 0 {
                channel_solids_dispersion(&self.network, &mut self.state, &self.forcing, &self.options);
            }
            if self.options.erschopt > 0 {
                if self.options.erschopt == 1 {
                    channel_transport_capacity(&self.network, &mut self.state, &self.solids);
                }
                channel_solids_erosion(
                    &self.network,
                    &mut self.state,
                    &self.solids,
                    &self.options,
                    dt,
                    t_new,
                );
            }

            //(6) floodplain solids transfer
            floodplain_solids_transfer(&self.grid, &self.network, &mut self.state, &self.options, dt);
        }

        //(7) concentration integration (water column and bed)
        overland_solids_concentration(&self.grid, &self.network, &mut self.state, &self.solids, dt, t_new);
        if channels_on {
            channel_solids_concentration(&self.network, &mut self.state, &self.solids, dt, t_new);
        }

        //reporting stations sample the flows and concentrations of
        //this tick
        self.reporter.sample(t, &self.grid, &self.network, &self.state);

        //Courant advisory (never fatal; time step control is external)
        if self.state.max_courant_ov > self.max_courant_ov {
            self.max_courant_ov = self.state.max_courant_ov;
        }
        if self.state.max_courant_ch > self.max_courant_ch {
            self.max_courant_ch = self.state.max_courant_ch;
        }
        if !self.courant_warned && (self.max_courant_ov > 1.0 || self.max_courant_ch > 1.0) {
            eprintln!(
                "advisory: maximum Courant number exceeded 1 at t = {} s (overland {}, channel {})",
                t, self.max_courant_ov, self.max_courant_ch
            );
            self.courant_warned = true;
        }

        //(8) swap new into current, then let the stack manager consume
        //any push/pop signals between ticks
        self.state.swap_states();
        self.state
            .apply_stack_signals(&self.solids, self.options.nstack_max);

        self.time = t_new;
        Ok(())
    }

    //Paint the uniform forcing rates into the per-cell grids. Net
    //rates equal gross rates here; interception and snowmelt belong to
    //external collaborators that may adjust the net grids in between.
    fn paint_forcing_rates(&mut self) {
        let rain = self.forcing.value_or_zero(self.forcing.rain);
        let swe = if self.options.snowopt > 0 {
            self.forcing.value_or_zero(self.forcing.snow)
        } else {
            0.0
        };
        for row in 0..self.grid.nrows {
            for col in 0..self.grid.ncols {
                if !self.grid.is_active(row, col) {
                    continue;
                }
                self.state.gross_rain_rate[row][col] = rain;
                self.state.net_rain_rate[row][col] = rain;
                self.state.gross_swe_rate[row][col] = swe;
                self.state.net_swe_rate[row][col] = swe;
            }
        }
    }

    //Assemble the mass-balance summary for the run so far.
    pub fn summary(&self) -> MassBalanceSummary {
        summarize(
            &self.grid,
            &self.network,
            &self.state,
            &self.solids,
            &self.options,
            &self.initial,
            self.time,
            self.max_courant_ov,
            self.max_courant_ch,
        )
    }
}
